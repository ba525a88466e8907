/// Configuration management for the inventory service
use crate::error::{InventoryError, InventoryResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: EmailConfig,
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
    pub bootstrap_admin: Option<AdminBootstrap>,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Base URL of the front-end that serves the reset-password page
    pub frontend_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Server secret used to sign JWTs and password reset tokens
    pub secret_key: String,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl: i64,
    /// Password reset link lifetime in seconds
    pub password_reset_timeout: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP connection URL. When absent, messages are written to the log.
    pub smtp_url: Option<String>,
    pub from_address: String,
}

/// Catalog and dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Components at or below this quantity are reported as alerts
    pub low_stock_threshold: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// Superuser created at startup if no account with this username exists
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> InventoryResult<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| InventoryError::Validation(format!("Invalid value for {}", name)))
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> InventoryResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("ELETRO_HOSTNAME").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("ELETRO_PORT", "8000")?;
        let frontend_url = env::var("ELETRO_FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let data_directory: PathBuf = env::var("ELETRO_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("ELETRO_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("inventory.sqlite"));

        let secret_key = env::var("ELETRO_SECRET_KEY")
            .map_err(|_| InventoryError::Validation("ELETRO_SECRET_KEY is required".to_string()))?;
        let access_token_ttl = parse_var("ELETRO_ACCESS_TOKEN_TTL", "300")?;
        let refresh_token_ttl = parse_var("ELETRO_REFRESH_TOKEN_TTL", "86400")?;
        // Three days
        let password_reset_timeout = parse_var("ELETRO_PASSWORD_RESET_TIMEOUT", "259200")?;

        let email = EmailConfig {
            smtp_url: env::var("ELETRO_EMAIL_SMTP_URL").ok(),
            from_address: env::var("ELETRO_EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| "webmaster@localhost".to_string()),
        };

        let low_stock_threshold = parse_var("ELETRO_LOW_STOCK_THRESHOLD", "2")?;

        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "eletro_rapida=debug,tower_http=debug".to_string());
        let json = env::var("ELETRO_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let bootstrap_admin = match (
            env::var("ELETRO_ADMIN_USERNAME"),
            env::var("ELETRO_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(AdminBootstrap {
                email: env::var("ELETRO_ADMIN_EMAIL")
                    .unwrap_or_else(|_| format!("{}@localhost", username)),
                username,
                password,
            }),
            _ => None,
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                frontend_url,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            authentication: AuthConfig {
                secret_key,
                access_token_ttl,
                refresh_token_ttl,
                password_reset_timeout,
            },
            email,
            inventory: InventoryConfig {
                low_stock_threshold,
            },
            logging: LoggingConfig { level, json },
            bootstrap_admin,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> InventoryResult<()> {
        if self.service.hostname.is_empty() {
            return Err(InventoryError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.secret_key.len() < 32 {
            return Err(InventoryError::Validation(
                "Secret key must be at least 32 characters".to_string(),
            ));
        }

        let auth = &self.authentication;
        if auth.access_token_ttl <= 0 || auth.refresh_token_ttl <= 0 || auth.password_reset_timeout <= 0
        {
            return Err(InventoryError::Validation(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        if self.inventory.low_stock_threshold < 0 {
            return Err(InventoryError::Validation(
                "Low stock threshold cannot be negative".to_string(),
            ));
        }

        if let Some(admin) = &self.bootstrap_admin {
            if admin.password.chars().count() < 6 {
                return Err(InventoryError::Validation(
                    "Bootstrap admin password must be at least 6 characters".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Minimal configuration for tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8000,
                frontend_url: "http://localhost:8000".to_string(),
            },
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                database: PathBuf::from(":memory:"),
            },
            authentication: AuthConfig {
                secret_key: "test-secret-key-for-testing-only-0123456789".to_string(),
                access_token_ttl: 300,
                refresh_token_ttl: 86400,
                password_reset_timeout: 259200,
            },
            email: EmailConfig {
                smtp_url: None,
                from_address: "noreply@eletro.test".to_string(),
            },
            inventory: InventoryConfig {
                low_stock_threshold: 2,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
            },
            bootstrap_admin: None,
        }
    }
}
