//! Login command handler

use anyhow::Result;

use crate::commands::Session;
use crate::output::Output;
use crate::prompt;

/// Exchange credentials for an access token
pub async fn login(
    session: &Session,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt::value("Password")?,
    };

    let token = session.api.login(&email, &password).await?;
    output.print_token(&token);
    Ok(())
}
