use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEVELOPMENT_JWT_SECRET: &str = "propertypro-development-secret";
const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub smtp: SmtpConfig,
    pub imap: ImapConfig,
    pub routing: RoutingConfig,
    pub qube: QubeConfig,
    pub policies: PolicyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = parse_port("APP_PORT", "8000")?;
        let cors_origin = var_or("CORS_ALLOWED_ORIGIN", "http://localhost:3000");

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::Missing { name: "JWT_SECRET" })
            }
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };
        let token_ttl_minutes = var_or("JWT_TTL_MINUTES", "60")
            .parse::<i64>()
            .ok()
            .filter(|minutes| (1..=MAX_TOKEN_TTL_MINUTES).contains(minutes))
            .ok_or(ConfigError::Invalid {
                name: "JWT_TTL_MINUTES",
                expected: "between 1 and 525600 minutes",
            })?;

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                cors_origin,
            },
            telemetry: TelemetryConfig { log_level },
            database: DatabaseConfig {
                path: PathBuf::from(var_or("DATABASE_PATH", "data/propertypro.db")),
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_minutes,
            },
            llm: LlmConfig {
                api_key: optional("OPENAI_API_KEY"),
                api_base: var_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
                model: var_or("OPENAI_MODEL", "gpt-4"),
            },
            smtp: SmtpConfig {
                server: var_or("SMTP_SERVER", "smtp.gmail.com"),
                port: parse_port("SMTP_PORT", "587")?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
                from_address: var_or("SMTP_FROM_EMAIL", "noreply@propertypro.com"),
            },
            imap: ImapConfig {
                server: var_or("IMAP_SERVER", "imap.gmail.com"),
                port: parse_port("IMAP_PORT", "993")?,
                address: optional("EMAIL_ADDRESS"),
                password: optional("EMAIL_PASSWORD"),
            },
            routing: RoutingConfig {
                complaints: var_or("COMPLAINTS_EMAIL", "complaints@propertypro.com"),
                arrears: var_or("ARREARS_EMAIL", "arrears@propertypro.com"),
                repairs: var_or("REPAIRS_EMAIL", "repairs@propertypro.com"),
                legal: var_or("LEGAL_EMAIL", "legal@propertypro.com"),
                customer_service: var_or(
                    "CUSTOMER_SERVICE_EMAIL",
                    "customer-service@propertypro.com",
                ),
                support: var_or("SUPPORT_EMAIL", "support@propertypro.com"),
            },
            qube: QubeConfig {
                api_url: var_or("QUBE_API_URL", "https://api.qube.com/v1"),
                client_id: optional("QUBE_CLIENT_ID"),
                client_secret: optional("QUBE_CLIENT_SECRET"),
                webhook_secret: optional("QUBE_WEBHOOK_SECRET"),
            },
            policies: PolicyConfig {
                directory: PathBuf::from(var_or("POLICY_DIR", "data/policies")),
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_port(name: &'static str, default: &str) -> Result<u16, ConfigError> {
    var_or(name, default)
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort { name })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

/// Inbox polled by the scanner.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub server: String,
    pub port: u16,
    pub address: Option<String>,
    pub password: Option<String>,
}

/// Department mailboxes receiving classified mail.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub complaints: String,
    pub arrears: String,
    pub repairs: String,
    pub legal: String,
    pub customer_service: String,
    pub support: String,
}

#[derive(Debug, Clone)]
pub struct QubeConfig {
    pub api_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub directory: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort {
        name: &'static str,
    },
    InvalidHost {
        source: std::net::AddrParseError,
    },
    Invalid {
        name: &'static str,
        expected: &'static str,
    },
    Missing {
        name: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort { name } => write!(f, "{name} must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::Invalid { name, expected } => write!(f, "{name} must be {expected}"),
            ConfigError::Missing { name } => write!(f, "{name} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort { .. }
            | ConfigError::Invalid { .. }
            | ConfigError::Missing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "JWT_SECRET",
            "JWT_TTL_MINUTES",
            "SMTP_PORT",
            "IMAP_PORT",
            "EMAIL_ADDRESS",
            "REPAIRS_EMAIL",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.auth.jwt_secret, DEVELOPMENT_JWT_SECRET);
        assert_eq!(config.auth.token_ttl_minutes, 60);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.routing.repairs, "repairs@propertypro.com");
        assert!(config.imap.address.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8000));
        reset_env();
    }

    #[test]
    fn production_requires_jwt_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let err = AppConfig::load().expect_err("secret is mandatory in production");
        assert!(matches!(err, ConfigError::Missing { name: "JWT_SECRET" }));
        reset_env();
    }

    #[test]
    fn rejects_invalid_smtp_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SMTP_PORT", "not-a-port");
        let err = AppConfig::load().expect_err("port must parse");
        assert_eq!(err.to_string(), "SMTP_PORT must be a valid u16");
        reset_env();
    }

    #[test]
    fn rejects_token_ttl_outside_one_year() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        for ttl in ["0", "525601", "10000000000000"] {
            env::set_var("JWT_TTL_MINUTES", ttl);
            let err = AppConfig::load().expect_err("ttl must be bounded");
            assert_eq!(
                err.to_string(),
                "JWT_TTL_MINUTES must be between 1 and 525600 minutes"
            );
        }
        env::set_var("JWT_TTL_MINUTES", "525600");
        let config = AppConfig::load().expect("one year is accepted");
        assert_eq!(config.auth.token_ttl_minutes, 525_600);
        reset_env();
    }

    #[test]
    fn blank_optional_values_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EMAIL_ADDRESS", "   ");
        env::set_var("REPAIRS_EMAIL", "fixit@example.com");
        let config = AppConfig::load().expect("config loads");
        assert!(config.imap.address.is_none());
        assert_eq!(config.routing.repairs, "fixit@example.com");
        reset_env();
    }
}
