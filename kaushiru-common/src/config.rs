//! Configuration loading and root folder resolution
//!
//! Two tiers:
//! 1. **TOML bootstrap**: root folder, listen address, logging, contact mail
//!    settings. Read once at startup.
//! 2. **Runtime settings**: tax rate, default regions, aggregation windows and
//!    list limits, stored in the `settings` table (see [`crate::db::init`]).
//!
//! Missing or unreadable TOML files never stop startup; compiled defaults
//! are used instead and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "KAUSHIRU_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "kaushiru.db";

pub const DEFAULT_PORT: u16 = 5730;

pub const DEFAULT_BASE_URL: &str = "https://kau-shiru.vercel.app";

pub const DEFAULT_CONTACT_EMAIL: &str = "ichigoichie.contact.0015@gmail.com";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL used for sitemap entries
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub contact: ContactConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind: default_bind(),
            port: default_port(),
            base_url: default_base_url(),
            logging: LoggingConfig::default(),
            contact: ContactConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Contact form delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Recipient of contact form mails
    #[serde(default = "default_contact_email")]
    pub email: String,

    /// Resend API key; mails are skipped when absent
    #[serde(default)]
    pub resend_api_key: Option<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            email: default_contact_email(),
            resend_api_key: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_contact_email() -> String {
    DEFAULT_CONTACT_EMAIL.to_string()
}

/// Parse a TOML bootstrap file.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}

/// Load the bootstrap config from `explicit` or the platform config path.
///
/// Never fails: a missing or broken file yields defaults with a warning.
pub fn load_toml_config_or_default(explicit: Option<&Path>) -> TomlConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_file) {
        Some(path) => path,
        None => {
            info!("No config file found, using compiled defaults");
            return TomlConfig::default();
        }
    };

    match load_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config: {}", path.display());
            config
        }
        Err(e) => {
            warn!("Could not load config {}: {} (using defaults)", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Existing platform config file, if any
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("kaushiru").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/kaushiru/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join("kaushiru"))
            .unwrap_or_else(|| PathBuf::from("./kaushiru_data"));

        Self {
            root_folder,
            log_level: default_log_level(),
        }
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `KAUSHIRU_ROOT_FOLDER` environment variable
/// 3. TOML config `root_folder`
/// 4. OS-dependent compiled default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Runtime settings loaded from the `settings` table
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    /// Multiplier applied to tax-excluded prices
    pub tax_rate: f64,
    pub default_area_group: String,
    pub default_region_big: String,
    pub area_stats_window_days: i64,
    pub item_stats_window_days: i64,
    pub recent_posts_limit: i64,
    pub my_posts_limit: i64,
    pub public_buy_logs_limit: i64,
    /// Characters of a comment copied into `daily_quotes`
    pub quote_max_chars: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tax_rate: 1.08,
            default_area_group: "愛知西部".to_string(),
            default_region_big: "中部".to_string(),
            area_stats_window_days: 7,
            item_stats_window_days: 30,
            recent_posts_limit: 3,
            my_posts_limit: 10,
            public_buy_logs_limit: 20,
            quote_max_chars: 20,
        }
    }
}

impl RuntimeSettings {
    /// Key/value pairs written by `init_default_settings`.
    pub fn default_entries() -> Vec<(&'static str, String)> {
        let d = Self::default();
        vec![
            ("tax_rate", d.tax_rate.to_string()),
            ("default_area_group", d.default_area_group),
            ("default_region_big", d.default_region_big),
            ("area_stats_window_days", d.area_stats_window_days.to_string()),
            ("item_stats_window_days", d.item_stats_window_days.to_string()),
            ("recent_posts_limit", d.recent_posts_limit.to_string()),
            ("my_posts_limit", d.my_posts_limit.to_string()),
            ("public_buy_logs_limit", d.public_buy_logs_limit.to_string()),
            ("quote_max_chars", d.quote_max_chars.to_string()),
        ]
    }

    /// Load settings; unparsable or missing values fall back to defaults.
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT key, value FROM settings")
                .fetch_all(pool)
                .await?;

        let lookup = |key: &str| -> Option<String> {
            rows.iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.clone())
        };

        let defaults = Self::default();
        let settings = Self {
            tax_rate: parse_or(lookup("tax_rate"), "tax_rate", defaults.tax_rate),
            default_area_group: lookup("default_area_group")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_area_group),
            default_region_big: lookup("default_region_big")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.default_region_big),
            area_stats_window_days: parse_or(
                lookup("area_stats_window_days"),
                "area_stats_window_days",
                defaults.area_stats_window_days,
            ),
            item_stats_window_days: parse_or(
                lookup("item_stats_window_days"),
                "item_stats_window_days",
                defaults.item_stats_window_days,
            ),
            recent_posts_limit: parse_or(
                lookup("recent_posts_limit"),
                "recent_posts_limit",
                defaults.recent_posts_limit,
            ),
            my_posts_limit: parse_or(lookup("my_posts_limit"), "my_posts_limit", defaults.my_posts_limit),
            public_buy_logs_limit: parse_or(
                lookup("public_buy_logs_limit"),
                "public_buy_logs_limit",
                defaults.public_buy_logs_limit,
            ),
            quote_max_chars: parse_or(lookup("quote_max_chars"), "quote_max_chars", defaults.quote_max_chars),
        };

        if settings.tax_rate < 1.0 {
            return Err(Error::Config(format!(
                "tax_rate must be >= 1.0, got {}",
                settings.tax_rate
            )));
        }

        Ok(settings)
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for setting '{}', using default {}", raw, key, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_defaults_fill_missing_fields() {
        let config: TomlConfig = toml::from_str("port = 8080").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.contact.email, DEFAULT_CONTACT_EMAIL);
        assert!(config.contact.resend_api_key.is_none());
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or(Some("1.1".to_string()), "tax_rate", 1.08), 1.1);
        assert_eq!(parse_or(Some("abc".to_string()), "tax_rate", 1.08), 1.08);
        assert_eq!(parse_or(None, "my_posts_limit", 10i64), 10);
    }

    #[test]
    fn test_default_entries_cover_every_setting() {
        let keys: Vec<&str> = RuntimeSettings::default_entries()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&"tax_rate"));
        assert!(keys.contains(&"quote_max_chars"));
    }
}
