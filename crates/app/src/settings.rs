//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `EXPENSA__*` environment
//! variables (e.g. `EXPENSA__SERVER__PORT=8080`).
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_level() -> String {
    "info".to_string()
}

fn default_timezone() -> Tz {
    chrono_tz::Asia::Bangkok
}

fn default_storage_root() -> String {
    "./storage".to_string()
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    /// Zone that decides what "today" is for the scheduler and the dashboard.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    #[serde(default = "default_storage_root")]
    pub root: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub storage: Storage,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("EXPENSA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
