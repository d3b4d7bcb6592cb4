//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/leafcare/config.toml)
//! 3. Environment variables (LEAFCARE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "LEAFCARE";

/// Token signing secret used when none is configured
pub const DEFAULT_TOKEN_SECRET: &str = "leafcare-development-secret";

/// Default access token lifetime
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the collection files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HMAC secret for signing access tokens
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    /// Access token lifetime in minutes
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Log filter level (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            token_secret: default_token_secret(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LEAFCARE_DATA_DIR, LEAFCARE_TOKEN_SECRET, ...)
    /// 2. Config file (~/.config/leafcare/config.toml or LEAFCARE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // LEAFCARE_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // LEAFCARE_TOKEN_SECRET
        if let Ok(val) = std::env::var(format!("{}_TOKEN_SECRET", ENV_PREFIX)) {
            if !val.is_empty() {
                self.token_secret = val;
            }
        }

        // LEAFCARE_TOKEN_TTL_MINUTES
        if let Ok(val) = std::env::var(format!("{}_TOKEN_TTL_MINUTES", ENV_PREFIX)) {
            self.token_ttl_minutes = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}_TOKEN_TTL_MINUTES: {:?}", ENV_PREFIX, val))?;
        }

        // LEAFCARE_LOG_LEVEL
        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            self.log_level = if val.is_empty() { None } else { Some(val) };
        }

        Ok(())
    }

    /// Whether tokens are signed with the built-in development secret
    pub fn uses_default_secret(&self) -> bool {
        self.token_secret == DEFAULT_TOKEN_SECRET
    }

    /// Get the config file path
    ///
    /// Can be overridden with LEAFCARE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leafcare")
            .join("config.toml")
    }

    /// Path to the users collection
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    /// Path to the pots collection
    pub fn pots_path(&self) -> PathBuf {
        self.data_dir.join("pots.json")
    }

    /// Path to the plants collection
    pub fn plants_path(&self) -> PathBuf {
        self.data_dir.join("plants.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leafcare")
}

fn default_token_secret() -> String {
    DEFAULT_TOKEN_SECRET.to_string()
}

fn default_token_ttl_minutes() -> i64 {
    DEFAULT_TOKEN_TTL_MINUTES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "LEAFCARE_DATA_DIR",
        "LEAFCARE_TOKEN_SECRET",
        "LEAFCARE_TOKEN_TTL_MINUTES",
        "LEAFCARE_LOG_LEVEL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.uses_default_secret());
        assert_eq!(config.token_ttl_minutes, 60);
        assert!(config.log_level.is_none());
        assert!(config.data_dir.ends_with("leafcare"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/srv/leafcare"),
            ..Config::default()
        };

        assert_eq!(config.users_path(), PathBuf::from("/srv/leafcare/users.json"));
        assert_eq!(config.pots_path(), PathBuf::from("/srv/leafcare/pots.json"));
        assert_eq!(
            config.plants_path(),
            PathBuf::from("/srv/leafcare/plants.json")
        );
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEAFCARE_DATA_DIR", "/tmp/leafcare-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/leafcare-test"));
    }

    #[test]
    fn test_env_override_token_settings() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEAFCARE_TOKEN_SECRET", "s3cret");
        env::set_var("LEAFCARE_TOKEN_TTL_MINUTES", "5");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.token_secret, "s3cret");
        assert_eq!(config.token_ttl_minutes, 5);
        assert!(!config.uses_default_secret());

        // Empty secret keeps the current one
        env::set_var("LEAFCARE_TOKEN_SECRET", "");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.token_secret, "s3cret");
    }

    #[test]
    fn test_env_override_bad_ttl() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("LEAFCARE_TOKEN_TTL_MINUTES", "soon");

        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_log_level() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LEAFCARE_LOG_LEVEL", "debug");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        // Empty string clears it
        env::set_var("LEAFCARE_LOG_LEVEL", "");
        config.apply_env_overrides().unwrap();
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/leafcare"),
            token_secret: "abc".to_string(),
            token_ttl_minutes: 15,
            log_level: Some("warn".to_string()),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("token_ttl_minutes"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.token_secret, config.token_secret);
        assert_eq!(parsed.token_ttl_minutes, config.token_ttl_minutes);
        assert_eq!(parsed.log_level, config.log_level);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            token_ttl_minutes = 120
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.token_ttl_minutes, 120);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert_eq!(config.token_ttl_minutes, DEFAULT_TOKEN_TTL_MINUTES);
        assert!(config.log_level.is_none());
    }
}
