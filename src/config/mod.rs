use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub mod cors;

pub use cors::CorsPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid CORS policy: {0}")]
    Cors(String),

    #[error("{0} is required when SSL_ENABLED is set")]
    SslFileMissing(&'static str),
}

/// Process configuration, read once at startup and handed to the server and
/// the database connector.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsPolicy,
    pub ssl: SslConfig,
}

#[derive(Debug, Clone, Default)]
pub struct SslConfig {
    pub enabled: bool,
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; when set it wins over the individual parts.
    pub url: Option<String>,
    pub kind: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Create or upgrade the schema at startup.
    pub synchronize: bool,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub colorful: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment
    /// in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").or_else(|| lookup("NODE_ENV")).as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Production,
        };

        Self::defaults(environment).with_overrides(&lookup)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_number("PORT", &v)?;
        }
        if let Some(v) = lookup("CORS") {
            self.server.cors = CorsPolicy::parse(&v)?;
        }
        if let Some(v) = lookup("SSL_ENABLED") {
            self.server.ssl.enabled = parse_flag("SSL_ENABLED", &v)?;
        }
        if let Some(v) = lookup("SSL_KEY_FILE") {
            self.server.ssl.key_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("SSL_CERT_FILE") {
            self.server.ssl.cert_file = PathBuf::from(v);
        }
        if self.server.ssl.enabled {
            if self.server.ssl.key_file.as_os_str().is_empty() {
                return Err(ConfigError::SslFileMissing("SSL_KEY_FILE"));
            }
            if self.server.ssl.cert_file.as_os_str().is_empty() {
                return Err(ConfigError::SslFileMissing("SSL_CERT_FILE"));
            }
        }

        // Database overrides
        self.database.url = lookup("DATABASE_URL").filter(|v| !v.is_empty());
        if let Some(v) = lookup("DB_TYPE") {
            self.database.kind = v;
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = parse_number("DB_PORT", &v)?;
        }
        if let Some(v) = lookup("DB_USERNAME") {
            self.database.username = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_DATABASE") {
            self.database.database = v;
        }
        if let Some(v) = lookup("DB_SYNCHRONIZE") {
            self.database.synchronize = parse_flag("DB_SYNCHRONIZE", &v)?;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_number("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DB_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_number("DB_CONNECTION_TIMEOUT", &v)?;
        }

        // Logging overrides
        if let Some(v) = lookup("LOGGING_ENABLED") {
            self.logging.enabled = parse_flag("LOGGING_ENABLED", &v)?;
        }
        if let Some(v) = lookup("LOGGING_COLORFUL") {
            self.logging.colorful = parse_flag("LOGGING_COLORFUL", &v)?;
        }

        Ok(self)
    }

    fn defaults(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig {
                host: String::new(),
                port: 3000,
                cors: CorsPolicy::default(),
                ssl: SslConfig::default(),
            },
            database: DatabaseConfig {
                url: None,
                kind: "postgres".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                username: "postgres".to_string(),
                password: "postgres".to_string(),
                database: "watchme".to_string(),
                synchronize: false,
                max_connections: 10,
                connection_timeout: 30,
            },
            logging: LoggingConfig {
                enabled: true,
                colorful: false,
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl ServerConfig {
    /// `host:port` to listen on; an empty host means every interface.
    pub fn bind_address(&self) -> String {
        let host = if self.host.is_empty() { "0.0.0.0" } else { self.host.as_str() };
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
        assert!(!config.server.ssl.enabled);
        assert_eq!(config.database.kind, "postgres");
        assert_eq!(config.database.database, "watchme");
        assert!(!config.database.synchronize);
        assert!(config.logging.enabled);
        assert!(!config.logging.colorful);
    }

    #[test]
    fn test_node_env_fallback_selects_development() {
        assert!(config_from(&[("NODE_ENV", "development")]).unwrap().is_development());
        assert!(!config_from(&[("APP_ENV", "production"), ("NODE_ENV", "development")])
            .unwrap()
            .is_development());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8443"),
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_SYNCHRONIZE", "1"),
            ("LOGGING_COLORFUL", "true"),
            ("LOGGING_ENABLED", "0"),
        ])
        .unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:8443");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert!(config.database.synchronize);
        assert!(config.logging.colorful);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let config = config_from(&[("HOST", "::1"), ("PORT", "4000")]).unwrap();
        assert_eq!(config.server.bind_address(), "[::1]:4000");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("PORT", "seventy")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("DB_SYNCHRONIZE", "maybe")]),
            Err(ConfigError::Invalid { key: "DB_SYNCHRONIZE", .. })
        ));
        assert!(matches!(config_from(&[("CORS", "{not json")]), Err(ConfigError::Cors(_))));
    }

    #[test]
    fn test_ssl_requires_both_files() {
        assert!(matches!(
            config_from(&[("SSL_ENABLED", "1"), ("SSL_CERT_FILE", "cert.pem")]),
            Err(ConfigError::SslFileMissing("SSL_KEY_FILE"))
        ));
        let config = config_from(&[
            ("SSL_ENABLED", "1"),
            ("SSL_KEY_FILE", "key.pem"),
            ("SSL_CERT_FILE", "cert.pem"),
        ])
        .unwrap();
        assert!(config.server.ssl.enabled);
        assert_eq!(config.server.ssl.key_file, PathBuf::from("key.pem"));
    }
}
