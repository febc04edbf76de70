use std::env;

/// Runtime configuration.
///
/// All profiles share the same fields; they differ only in values, so this is
/// one struct plus a lookup instead of a hierarchy.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address to bind the HTTP listener to.
    pub host: String,

    /// HTTP port to listen on.
    pub port: u16,

    /// Path to the SQLite database file (`:memory:` for an in-memory store).
    pub database_path: String,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,
}

impl AppConfig {
    pub fn development() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_path: "dev_strings.db".to_string(),
            log_level: "debug".to_string(),
        }
    }

    pub fn production() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "prod_strings.db".to_string()),
            log_level: "warn".to_string(),
        }
    }

    pub fn testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: ":memory:".to_string(),
            log_level: "debug".to_string(),
        }
    }

    /// Look up a profile by name. Unknown names fall back to development,
    /// which is also the `default` profile.
    pub fn for_profile(name: &str) -> Self {
        match name {
            "production" => Self::production(),
            "testing" => Self::testing(),
            _ => Self::development(),
        }
    }

    /// Select the profile from the `APP_ENV` environment variable.
    pub fn from_env() -> Self {
        let name = env::var("APP_ENV").unwrap_or_else(|_| "default".to_string());
        Self::for_profile(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_falls_back_to_development() {
        let cfg = AppConfig::for_profile("staging");
        assert_eq!(cfg.database_path, "dev_strings.db");
    }

    #[test]
    fn testing_profile_uses_in_memory_database() {
        let cfg = AppConfig::for_profile("testing");
        assert_eq!(cfg.database_path, ":memory:");
    }
}
