//! Pot command handlers

use anyhow::Result;

use leafcare_core::{DocumentId, NewPot, PageRequest, PotUpdate};

use crate::commands::Session;
use crate::output::Output;
use crate::prompt;

/// Register a pot
pub async fn create(session: &Session, input: NewPot, output: &Output) -> Result<()> {
    let pot = session.api.create_pot(session.token(), input).await?;

    output.success(&format!("Created pot: {}", pot.code));
    output.print_pot(&pot);
    Ok(())
}

/// List visible pots
pub async fn list(session: &Session, request: PageRequest, output: &Output) -> Result<()> {
    let page = session.api.list_pots(session.token(), request).await?;
    output.print_pots(&page);
    Ok(())
}

/// Show a single pot
pub async fn show(session: &Session, id: DocumentId, output: &Output) -> Result<()> {
    let pot = session.api.get_pot(session.token(), id).await?;
    output.print_pot(&pot);
    Ok(())
}

/// Update a pot's code, model or assigned user
pub async fn update(
    session: &Session,
    id: DocumentId,
    update: PotUpdate,
    output: &Output,
) -> Result<()> {
    let pot = session.api.update_pot(session.token(), id, update).await?;

    output.success("Pot updated");
    output.print_pot(&pot);
    Ok(())
}

/// Delete a pot
pub async fn delete(session: &Session, id: DocumentId, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() && !prompt::confirm(&format!("Delete pot {}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }

    session.api.delete_pot(session.token(), id).await?;

    output.success(&format!("Deleted pot: {}", id));
    Ok(())
}
