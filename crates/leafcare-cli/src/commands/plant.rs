//! Plant command handlers

use anyhow::Result;

use leafcare_core::{DocumentId, PageRequest, PlantFilter};

use crate::commands::Session;
use crate::output::Output;
use crate::prompt;

/// Create a plant owned by the caller
pub async fn create(session: &Session, name: String, output: &Output) -> Result<()> {
    let plant = session.api.create_plant(session.token(), &name).await?;

    output.success(&format!("Created plant: {}", plant.name));
    output.print_plant(&plant);
    Ok(())
}

/// List visible plants
pub async fn list(
    session: &Session,
    request: PageRequest,
    filter: PlantFilter,
    output: &Output,
) -> Result<()> {
    let page = session
        .api
        .list_plants(session.token(), request, filter)
        .await?;
    output.print_plants(&page);
    Ok(())
}

/// Show a single plant
pub async fn show(session: &Session, id: DocumentId, output: &Output) -> Result<()> {
    let plant = session.api.get_plant(session.token(), id).await?;
    output.print_plant(&plant);
    Ok(())
}

/// Rename a plant
pub async fn update(
    session: &Session,
    id: DocumentId,
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    let plant = session.api.update_plant(session.token(), id, name).await?;

    output.success("Plant updated");
    output.print_plant(&plant);
    Ok(())
}

/// Delete a plant
pub async fn delete(session: &Session, id: DocumentId, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() && !prompt::confirm(&format!("Delete plant {}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }

    session.api.delete_plant(session.token(), id).await?;

    output.success(&format!("Deleted plant: {}", id));
    Ok(())
}
