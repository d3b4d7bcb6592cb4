//! LeafCare CLI
//!
//! Command-line interface for LeafCare - users, pots and plants.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use leafcare_core::models::DEFAULT_PAGE_LIMIT;
use leafcare_core::{
    Config, DocumentId, LeafCare, NewPot, NewUser, PageRequest, PlantFilter, PotUpdate,
    UserUpdate,
};

mod commands;
mod output;
mod prompt;

use commands::Session;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "leafcare")]
#[command(about = "LeafCare - users, irrigation pots and plants")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - print ids only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Access token (as printed by `leafcare login`)
    #[arg(long, global = true, env = "LEAFCARE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print an access token
    Login {
        /// Account email
        email: String,
        /// Password (prompted for if not given)
        #[arg(long, env = "LEAFCARE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage pots
    Pot {
        #[command(subcommand)]
        command: PotCommands,
    },
    /// Manage plants
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Items per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    limit: usize,
}

impl PageArgs {
    fn request(self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    #[command(alias = "add")]
    Create {
        first_name: String,
        last_name: String,
        email: String,
        /// Password (prompted for if not given)
        #[arg(long)]
        password: Option<String>,
        /// Create an admin account
        #[arg(long)]
        admin: bool,
    },
    /// List users (admins only)
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Match first or last name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show a user
    Show { id: DocumentId },
    /// Update a user
    Update {
        id: DocumentId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// New password (requires --current-password)
        #[arg(long, requires = "current_password")]
        new_password: Option<String>,
        #[arg(long)]
        current_password: Option<String>,
    },
    /// Delete a user (admins only)
    #[command(alias = "rm")]
    Delete {
        id: DocumentId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PotCommands {
    /// Register a pot (admins only)
    #[command(alias = "add")]
    Create { code: String, pot_model_id: String },
    /// List visible pots
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a pot
    Show { id: DocumentId },
    /// Update a pot (admins only)
    Update {
        id: DocumentId,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        pot_model_id: Option<String>,
        /// Assign the pot to a user
        #[arg(long)]
        user: Option<DocumentId>,
    },
    /// Delete a pot (admins only)
    #[command(alias = "rm")]
    Delete {
        id: DocumentId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PlantCommands {
    /// Create a plant
    #[command(alias = "add")]
    Create { name: String },
    /// List visible plants
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Keep plants whose name contains this text
        #[arg(short, long)]
        name: Option<String>,
        /// Keep plants whose owner has this first or last name (admins only)
        #[arg(short, long)]
        user_name: Option<String>,
    },
    /// Show a plant
    Show { id: DocumentId },
    /// Rename a plant
    Update {
        id: DocumentId,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a plant
    #[command(alias = "rm")]
    Delete {
        id: DocumentId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    // Commands that don't need the stores
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &config, output);
    }

    if config.uses_default_secret() {
        warn!("tokens are signed with the built-in development secret; set LEAFCARE_TOKEN_SECRET");
    }

    let api = LeafCare::open(&config)
        .await
        .with_context(|| format!("Failed to open data directory {:?}", config.data_dir))?;
    let session = Session::new(api, cli.token);

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&session, email, password, output).await
        }
        Commands::User { command } => handle_user_command(command, &session, output).await,
        Commands::Pot { command } => handle_pot_command(command, &session, output).await,
        Commands::Plant { command } => handle_plant_command(command, &session, output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

async fn handle_user_command(
    command: UserCommands,
    session: &Session,
    output: &Output,
) -> Result<()> {
    match command {
        UserCommands::Create {
            first_name,
            last_name,
            email,
            password,
            admin,
        } => {
            let input = NewUser {
                first_name,
                last_name,
                email,
                password: String::new(),
                is_admin: admin,
            };
            commands::user::create(session, input, password, output).await
        }
        UserCommands::List { page, name } => {
            commands::user::list(session, page.request(), name, output).await
        }
        UserCommands::Show { id } => commands::user::show(session, id, output).await,
        UserCommands::Update {
            id,
            first_name,
            last_name,
            new_password,
            current_password,
        } => {
            let update = UserUpdate {
                first_name,
                last_name,
                new_password,
                current_password,
            };
            commands::user::update(session, id, update, output).await
        }
        UserCommands::Delete { id, yes } => commands::user::delete(session, id, yes, output).await,
    }
}

async fn handle_pot_command(command: PotCommands, session: &Session, output: &Output) -> Result<()> {
    match command {
        PotCommands::Create { code, pot_model_id } => {
            commands::pot::create(session, NewPot { code, pot_model_id }, output).await
        }
        PotCommands::List { page } => commands::pot::list(session, page.request(), output).await,
        PotCommands::Show { id } => commands::pot::show(session, id, output).await,
        PotCommands::Update {
            id,
            code,
            pot_model_id,
            user,
        } => {
            let update = PotUpdate {
                code,
                pot_model_id,
                user_id: user,
            };
            commands::pot::update(session, id, update, output).await
        }
        PotCommands::Delete { id, yes } => commands::pot::delete(session, id, yes, output).await,
    }
}

async fn handle_plant_command(
    command: PlantCommands,
    session: &Session,
    output: &Output,
) -> Result<()> {
    match command {
        PlantCommands::Create { name } => commands::plant::create(session, name, output).await,
        PlantCommands::List {
            page,
            name,
            user_name,
        } => {
            let filter = PlantFilter { name, user_name };
            commands::plant::list(session, page.request(), filter, output).await
        }
        PlantCommands::Show { id } => commands::plant::show(session, id, output).await,
        PlantCommands::Update { id, name } => {
            commands::plant::update(session, id, name, output).await
        }
        PlantCommands::Delete { id, yes } => {
            commands::plant::delete(session, id, yes, output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config, output),
    }
}

/// Log to stderr; RUST_LOG wins over the configured level
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.log_level.as_deref().unwrap_or("warn");
        EnvFilter::new(format!("leafcare_core={},leafcare_cli={}", level, level))
    });

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plant_list() {
        let cli = Cli::try_parse_from([
            "leafcare", "--json", "plant", "ls", "--page", "2", "--name", "basil",
        ])
        .unwrap();
        assert!(cli.json);

        match cli.command {
            Commands::Plant {
                command: PlantCommands::List { page, name, user_name },
            } => {
                assert_eq!(page.request(), PageRequest::new(2, DEFAULT_PAGE_LIMIT));
                assert_eq!(name.as_deref(), Some("basil"));
                assert!(user_name.is_none());
            }
            _ => panic!("expected plant list"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_id() {
        assert!(Cli::try_parse_from(["leafcare", "pot", "show", "0"]).is_err());
        assert!(Cli::try_parse_from(["leafcare", "pot", "show", "abc"]).is_err());
        assert!(Cli::try_parse_from(["leafcare", "pot", "show", "3"]).is_ok());
    }

    #[test]
    fn test_new_password_requires_current() {
        let parsed = Cli::try_parse_from(["leafcare", "user", "update", "1", "--new-password", "x"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "leafcare",
            "user",
            "update",
            "1",
            "--new-password",
            "x",
            "--current-password",
            "y",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_pot_assign_user() {
        let cli = Cli::try_parse_from(["leafcare", "pot", "update", "4", "--user", "7"]).unwrap();
        match cli.command {
            Commands::Pot {
                command: PotCommands::Update { id, user, code, .. },
            } => {
                assert_eq!(id, DocumentId::new(4));
                assert_eq!(user, Some(DocumentId::new(7)));
                assert!(code.is_none());
            }
            _ => panic!("expected pot update"),
        }
    }
}
