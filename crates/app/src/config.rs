use anyhow::Context;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Pool size (default: `10`).
    pub max_connections: u32,
    /// Whether read results are cached (default: `true`).
    pub cache_enabled: bool,
    /// Cached result sets kept (default: `100`).
    pub cache_capacity: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default  |
    /// |----------------------|----------|
    /// | `DATABASE_URL`       | required |
    /// | `DB_MAX_CONNECTIONS` | `10`     |
    /// | `SQL_CACHE_ENABLED`  | `true`   |
    /// | `SQL_CACHE_CAPACITY` | `100`    |
    /// | `LOG_FORMAT`         | `pretty` |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".into())
            .parse()
            .context("DB_MAX_CONNECTIONS must be a valid u32")?;

        let cache_enabled = match lookup("SQL_CACHE_ENABLED").as_deref().map(str::trim) {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => anyhow::bail!("SQL_CACHE_ENABLED must be true or false, got {other:?}"),
        };

        let cache_capacity = lookup("SQL_CACHE_CAPACITY")
            .unwrap_or_else(|| "100".into())
            .parse()
            .context("SQL_CACHE_CAPACITY must be a valid usize")?;

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            database_url,
            max_connections,
            cache_enabled,
            cache_capacity,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "mysql://localhost/hackpsu")]).unwrap();
        assert_eq!(config.max_connections, 10);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "mysql://db/hackpsu"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("SQL_CACHE_ENABLED", "false"),
            ("SQL_CACHE_CAPACITY", "8"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 4);
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_database_url_fails() {
        assert_matches!(load(&[]), Err(_));
    }

    #[test]
    fn malformed_numbers_fail() {
        let result = load(&[("DATABASE_URL", "mysql://db"), ("DB_MAX_CONNECTIONS", "many")]);
        assert!(result.unwrap_err().to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
