//! Application settings, read from `settings.toml` and overridable through
//! `MANTIA__*` environment variables (e.g. `MANTIA__AUTH__JWT_SECRET`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
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
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_ttl")]
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct Uploads {
    #[serde(default = "default_upload_dir")]
    pub dir: String,
}

impl Default for Uploads {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub auth: Auth,
    #[serde(default)]
    pub uploads: Uploads,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_ttl() -> i64 {
    server::DEFAULT_TOKEN_TTL_MINUTES
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("MANTIA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_file_parses() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8000
            database = { sqlite = "mantia.db" }

            [auth]
            jwt_secret = "s3cret"
            token_ttl_minutes = 60

            [uploads]
            dir = "/var/lib/mantia"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8000);
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "mantia.db"));
        assert_eq!(settings.auth.token_ttl_minutes, 60);
        assert_eq!(settings.uploads.dir, "/var/lib/mantia");
    }

    #[test]
    fn defaults_fill_the_gaps() {
        let settings = parse(
            r#"
            [app]

            [server]
            port = 8000
            database = "memory"

            [auth]
            jwt_secret = "s3cret"
            "#,
        );
        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.server.unwrap().database, Database::Memory));
        assert_eq!(settings.auth.token_ttl_minutes, 480);
        assert_eq!(settings.uploads.dir, "uploads");
    }
}
