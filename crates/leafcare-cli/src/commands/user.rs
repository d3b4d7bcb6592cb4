//! User command handlers

use anyhow::Result;

use leafcare_core::{DocumentId, NewUser, PageRequest, UserUpdate};

use crate::commands::Session;
use crate::output::Output;
use crate::prompt;

/// Register a user
pub async fn create(
    session: &Session,
    mut input: NewUser,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    input.password = match password {
        Some(password) => password,
        None => prompt::value("Password")?,
    };

    let user = session.api.create_user(session.token(), input).await?;

    output.success(&format!("Created user: {}", user.id));
    output.print_user(&user);
    Ok(())
}

/// List users, optionally by first or last name
pub async fn list(
    session: &Session,
    request: PageRequest,
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    let page = session
        .api
        .list_users(session.token(), request, name.as_deref())
        .await?;
    output.print_users(&page);
    Ok(())
}

/// Show a single user
pub async fn show(session: &Session, id: DocumentId, output: &Output) -> Result<()> {
    let user = session.api.get_user(session.token(), id).await?;
    output.print_user(&user);
    Ok(())
}

/// Update a user's names or password
pub async fn update(
    session: &Session,
    id: DocumentId,
    update: UserUpdate,
    output: &Output,
) -> Result<()> {
    let user = session.api.update_user(session.token(), id, update).await?;

    output.success("User updated");
    output.print_user(&user);
    Ok(())
}

/// Delete a user
pub async fn delete(session: &Session, id: DocumentId, yes: bool, output: &Output) -> Result<()> {
    if !yes && output.should_prompt() && !prompt::confirm(&format!("Delete user {}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }

    session.api.delete_user(session.token(), id).await?;

    output.success(&format!("Deleted user: {}", id));
    Ok(())
}
