//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag), which prints ids only

use serde::Serialize;

use leafcare_core::{ApiError, Page, Pagination, Plant, Pot, PotSummary, UserProfile};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print an access token
    pub fn print_token(&self, token: &str) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::json!({ "token": token })),
            OutputFormat::Human | OutputFormat::Quiet => println!("{}", token),
        }
    }

    /// Print a single user
    pub fn print_user(&self, user: &UserProfile) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", user.id);
                println!("Name:   {}", user.full_name());
                println!("Email:  {}", user.email);
                println!("Admin:  {}", if user.is_admin { "yes" } else { "no" });
            }
            OutputFormat::Json => println!("{}", to_json(user)),
            OutputFormat::Quiet => println!("{}", user.id),
        }
    }

    /// Print a page of users
    pub fn print_users(&self, page: &Page<UserProfile>) {
        self.print_page(page, "user", |user| user.id.to_string(), |user| {
            format!(
                "{:>4} | {} | {}{}",
                user.id,
                truncate(&user.full_name(), 30),
                user.email,
                if user.is_admin { " (admin)" } else { "" }
            )
        });
    }

    /// Print a single pot
    pub fn print_pot(&self, pot: &Pot) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", display_id(pot.id));
                println!("Code:   {}", pot.code);
                println!("Model:  {}", pot.pot_model_id);
                match pot.user_id {
                    Some(user_id) => println!("User:   {}", user_id),
                    None => println!("User:   (unassigned)"),
                }
            }
            OutputFormat::Json => println!("{}", to_json(pot)),
            OutputFormat::Quiet => println!("{}", display_id(pot.id)),
        }
    }

    /// Print a page of pots
    pub fn print_pots(&self, page: &Page<PotSummary>) {
        self.print_page(page, "pot", |pot| pot.id.to_string(), |pot| {
            format!("{:>4} | {} | {}", pot.id, truncate(&pot.code, 20), pot.pot_model)
        });
    }

    /// Print a single plant
    pub fn print_plant(&self, plant: &Plant) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:     {}", display_id(plant.id));
                println!("Name:   {}", plant.name);
                println!("Owner:  {}", plant.user_id);
            }
            OutputFormat::Json => println!("{}", to_json(plant)),
            OutputFormat::Quiet => println!("{}", display_id(plant.id)),
        }
    }

    /// Print a page of plants
    pub fn print_plants(&self, page: &Page<Plant>) {
        self.print_page(page, "plant", |plant| display_id(plant.id), |plant| {
            format!(
                "{:>4} | {} | owner {}",
                display_id(plant.id),
                truncate(&plant.name, 35),
                plant.user_id
            )
        });
    }

    fn print_page<T: Serialize>(
        &self,
        page: &Page<T>,
        noun: &str,
        id: impl Fn(&T) -> String,
        line: impl Fn(&T) -> String,
    ) {
        match self.format {
            OutputFormat::Human => {
                if page.data.is_empty() {
                    println!("No {}s found.", noun);
                } else {
                    for item in &page.data {
                        println!("{}", line(item));
                    }
                }
                println!("\n{}", page_footer(&page.pagination, noun));
            }
            OutputFormat::Json => println!("{}", to_json(page)),
            OutputFormat::Quiet => {
                for item in &page.data {
                    println!("{}", id(item));
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print a failed operation to stderr
    pub fn error(&self, err: &anyhow::Error) {
        let (status, message) = match err.downcast_ref::<ApiError>() {
            Some(api) => (Some(api.status()), api.to_string()),
            None => (None, format!("{:#}", err)),
        };

        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": status, "message": message})
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => match status {
                Some(status) => eprintln!("Error ({}): {}", status, message),
                None => eprintln!("Error: {}", message),
            },
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

fn display_id<T: ToString>(id: Option<T>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn page_footer(pagination: &Pagination, noun: &str) -> String {
    format!(
        "Page {}/{} ({} {}(s))",
        pagination.page,
        pagination.total_pages.max(1),
        pagination.total_records,
        noun
    )
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("Monstera déliciosa", 10), "Monster...");
    }

    #[test]
    fn test_page_footer() {
        let pagination = Pagination {
            total_records: 7,
            total_pages: 3,
            page: 2,
            limit: 3,
        };
        assert_eq!(page_footer(&pagination, "pot"), "Page 2/3 (7 pot(s))");

        let empty = Pagination {
            total_records: 0,
            total_pages: 0,
            page: 1,
            limit: 30,
        };
        assert_eq!(page_footer(&empty, "plant"), "Page 1/1 (0 plant(s))");
    }

    #[test]
    fn test_display_id() {
        assert_eq!(display_id(Some(4u64)), "4");
        assert_eq!(display_id::<u64>(None), "-");
    }
}
