//! Runtime settings from the environment.

use crate::error::ConfigError;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub database_url: String,
    /// Directory of resource JSON files.
    pub config_path: PathBuf,
    pub bind: String,
    /// Path the admin routes are nested under.
    pub prefix: String,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "postgres://localhost/admin".into(),
            config_path: PathBuf::from("resources"),
            bind: "0.0.0.0:8282".into(),
            prefix: "/admin".into(),
            max_connections: 5,
            body_limit: 1024 * 1024,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Settings::default();
        if let Some(v) = lookup("DATABASE_URL") {
            s.database_url = v;
        }
        if let Some(v) = lookup("ADMIN_CONFIG_PATH") {
            s.config_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ADMIN_BIND") {
            s.bind = v;
        }
        if let Some(v) = lookup("ADMIN_PREFIX") {
            s.prefix = normalize_prefix(&v);
        }
        if let Some(v) = lookup("ADMIN_MAX_CONNECTIONS") {
            s.max_connections = parse("ADMIN_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("ADMIN_BODY_LIMIT") {
            s.body_limit = parse("ADMIN_BODY_LIMIT", &v)?;
        }
        Ok(s)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Load(format!("{} is not a valid number: '{}'", key, value)))
}

/// Leading slash, no trailing slash. An empty prefix means the root.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
