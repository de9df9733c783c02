use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use url::Url;

/// Signing secret shipped in the defaults; refused outside development
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me-before-deploying";

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid server configuration: {0}")]
    Server(String),
    #[error("Invalid database configuration: {0}")]
    Database(String),
    #[error("Invalid logging configuration: {0}")]
    Logging(String),
    #[error("Invalid Sentry configuration: {0}")]
    Sentry(String),
    #[error("Invalid JWT configuration: {0}")]
    Jwt(String),
}

fn ensure<F>(condition: bool, error: F) -> Result<(), ConfigValidationError>
where
    F: FnOnce() -> ConfigValidationError,
{
    if condition {
        Ok(())
    } else {
        Err(error())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub sentry: SentryConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub environment: String,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.sentry.validate()?;
        self.jwt.validate()?;

        if self.is_production() && self.jwt.secret == DEFAULT_JWT_SECRET {
            return Err(ConfigValidationError::Jwt(
                "the built-in development secret is refused in production".into(),
            ));
        }

        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production" || self.environment == "prod"
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_seconds: u64,
    #[serde(default = "default_graceful_shutdown_timeout")]
    pub graceful_shutdown_timeout_seconds: u64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        use ConfigValidationError::Server;

        ensure(!self.host.is_empty(), || Server("host is empty".into()))?;
        ensure(!self.host.contains(char::is_whitespace), || {
            Server(format!("host '{}' contains whitespace", self.host))
        })?;
        ensure(self.port != 0, || Server("port must be non-zero".into()))?;
        ensure(self.timeout_seconds > 0, || Server("timeout_seconds must be positive".into()))?;
        ensure(self.graceful_shutdown_timeout_seconds > 0, || {
            Server("graceful_shutdown_timeout_seconds must be positive".into())
        })
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        let ip = if self.host == "localhost" {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            IpAddr::from_str(&self.host).map_err(|_| {
                ConfigValidationError::Server(format!("Invalid IP address: {}", self.host))
            })?
        };

        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_graceful_shutdown_timeout() -> u64 {
    30
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        use ConfigValidationError::Database;

        ensure(!self.url.is_empty(), || Database("url is empty".into()))?;
        Url::parse(&self.url).map_err(|e| Database(format!("url is not valid: {}", e)))?;
        ensure(self.max_connections > 0, || Database("max_connections must be positive".into()))?;
        ensure(self.min_connections <= self.max_connections, || {
            Database(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            ))
        })?;
        ensure(self.acquire_timeout_seconds > 0 && self.idle_timeout_seconds > 0, || {
            Database("pool timeouts must be positive".into())
        })
    }

    /// Database name, i.e. the URL path without its leading slash
    pub fn database_name(&self) -> Result<String, ConfigValidationError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigValidationError::Database(format!("url is not valid: {}", e)))?;

        match url.path().trim_start_matches('/') {
            "" => Err(ConfigValidationError::Database("url names no database".into())),
            name => Ok(name.to_string()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub include_location: bool,
    #[serde(default = "default_log_target")]
    pub target: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        one_of("level", &self.level, &["trace", "debug", "info", "warn", "error"])?;
        one_of("format", &self.format, &["json", "pretty", "compact"])?;
        one_of("target", &self.target, &["stdout", "stderr", "file"])?;

        ensure(
            !self.target.eq_ignore_ascii_case("file") || self.file_path.is_some(),
            || ConfigValidationError::Logging("file_path is required when target is 'file'".into()),
        )
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigValidationError> {
    ensure(allowed.contains(&value.to_lowercase().as_str()), || {
        ConfigValidationError::Logging(format!(
            "{} '{}' is not one of: {}",
            field,
            value,
            allowed.join(", ")
        ))
    })
}

fn default_log_target() -> String {
    "stdout".to_string()
}

/// Sentry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryConfig {
    pub dsn: String,
    pub environment: String,
    pub traces_sample_rate: f32,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

impl SentryConfig {
    /// An empty DSN is valid and disables reporting
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        use ConfigValidationError::Sentry;

        let http_dsn = self.dsn.starts_with("https://") || self.dsn.starts_with("http://");
        ensure(self.dsn.is_empty() || http_dsn, || Sentry("dsn must be an http(s) URL".into()))?;
        ensure(!self.environment.is_empty(), || Sentry("environment is empty".into()))?;
        ensure((0.0..=1.0).contains(&self.traces_sample_rate), || {
            Sentry("traces_sample_rate must be within 0.0..=1.0".into())
        })
    }

    /// Check if Sentry is enabled (has a DSN)
    pub fn is_enabled(&self) -> bool {
        !self.dsn.is_empty()
    }
}

/// Upper bound on `jwt.hours_to_expire`: one year
pub const MAX_TOKEN_HOURS: u32 = 24 * 366;

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Validity window of issued tokens
    pub hours_to_expire: u32,
    #[serde(default)]
    pub issuer: Option<String>,
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        use ConfigValidationError::Jwt;

        ensure(self.secret.len() >= 16, || Jwt("secret must be at least 16 characters".into()))?;
        ensure(self.hours_to_expire > 0, || Jwt("hours_to_expire must be positive".into()))?;
        ensure(self.hours_to_expire <= MAX_TOKEN_HOURS, || {
            Jwt(format!("hours_to_expire must not exceed {}", MAX_TOKEN_HOURS))
        })
    }
}

/// Login behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Check the submitted password against the stored hash on login
    #[serde(default)]
    pub verify_password: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            graceful_shutdown_timeout_seconds: default_graceful_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/user_manager".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            run_migrations: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            include_location: false,
            target: default_log_target(),
            file_path: None,
        }
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            environment: "development".to_string(),
            traces_sample_rate: 0.1,
            release: None,
            debug: false,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
            hours_to_expire: 8,
            issuer: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            sentry: SentryConfig::default(),
            jwt: JwtConfig::default(),
            auth: AuthConfig::default(),
            environment: "development".to_string(),
        }
    }
}
