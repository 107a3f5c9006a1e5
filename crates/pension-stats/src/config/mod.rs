use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SECRET_KEY: &str = "insecure-development-key";

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

/// String that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    /// Debug mode turns off aggregate caching.
    pub debug: bool,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub reporting: ReportingConfig,
    pub site: SiteConfig,
    pub identity: IdentityProviderConfig,
    pub email: EmailConfig,
    pub mailing_list: MailingListConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = AppEnvironment::from_str(&var("APP_ENV", "development"));
        let debug = parse_flag("APP_DEBUG", &var("APP_DEBUG", "false"))?;

        let host = var("APP_HOST", "127.0.0.1");
        let port = var("APP_PORT", "3000")
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var("APP_LOG_LEVEL", "info");
        let error_reporting_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty());

        let first_year = parse_number::<i32>("DATA_YEAR_START", &var("DATA_YEAR_START", "2012"))?;
        let last_year = parse_number::<i32>("DATA_YEAR_END", &var("DATA_YEAR_END", "2019"))?;
        if first_year > last_year {
            return Err(ConfigError::InvalidYearRange {
                first: first_year,
                last: last_year,
            });
        }
        let cache_timeout = parse_number::<u64>(
            "CACHE_TIMEOUT_SECONDS",
            &var("CACHE_TIMEOUT_SECONDS", "600"),
        )?;

        let allowed_hosts = var("ALLOWED_HOSTS", "")
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();

        Ok(Self {
            environment,
            debug,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                error_reporting_dsn,
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL", "sqlite://pensions.db"),
            },
            reporting: ReportingConfig {
                first_year,
                last_year,
                cache_timeout: Duration::from_secs(cache_timeout),
            },
            site: SiteConfig {
                secret_key: Secret::new(var("SECRET_KEY", DEFAULT_SECRET_KEY)),
                allowed_hosts,
                deployment_id_file: PathBuf::from(var("DEPLOYMENT_ID_FILE", "deployment.txt")),
            },
            identity: IdentityProviderConfig {
                domain: var("AUTH0_DOMAIN", ""),
                client_id: var("AUTH0_KEY", ""),
            },
            email: EmailConfig {
                host: var("EMAIL_HOST", ""),
                user: var("EMAIL_HOST_USER", ""),
                password: Secret::new(var("EMAIL_HOST_PASSWORD", "")),
                from_address: var("DEFAULT_FROM_EMAIL", ""),
            },
            mailing_list: MailingListConfig {
                api_key: Secret::new(var("MAILCHIMP_API_KEY", "")),
                list_id: var("MAILCHIMP_LIST_ID", ""),
                server: var("MAILCHIMP_SERVER", ""),
            },
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.site.secret_key.expose() == DEFAULT_SECRET_KEY
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
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

/// Log filtering and error-reporting hooks.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub error_reporting_dsn: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub first_year: i32,
    pub last_year: i32,
    pub cache_timeout: Duration,
}

impl ReportingConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub secret_key: Secret,
    /// Lowercased host patterns; empty accepts any host.
    pub allowed_hosts: Vec<String>,
    pub deployment_id_file: PathBuf,
}

/// External identity provider used for login and logout redirects.
#[derive(Debug, Clone, Default)]
pub struct IdentityProviderConfig {
    pub domain: String,
    pub client_id: String,
}

impl IdentityProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.domain.trim().is_empty() && !self.client_id.trim().is_empty()
    }
}

/// Outbound mail settings. Loaded for the newsletter integration, which
/// runs outside this service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub user: String,
    pub password: Secret,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub struct MailingListConfig {
    pub api_key: Secret,
    pub list_id: String,
    pub server: String,
}

impl MailingListConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.list_id.is_empty()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
    InvalidYearRange { first: i32, last: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, got '{value}'")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a number, got '{value}'")
            }
            ConfigError::InvalidYearRange { first, last } => write!(
                f,
                "DATA_YEAR_START ({first}) must not be after DATA_YEAR_END ({last})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = from_pairs(&[]).expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert!(!config.debug);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.error_reporting_dsn.is_none());
        assert_eq!(config.database.url, "sqlite://pensions.db");
        assert_eq!(config.reporting.years(), 2012..=2019);
        assert_eq!(config.reporting.cache_timeout, Duration::from_secs(600));
        assert!(config.site.allowed_hosts.is_empty());
        assert!(config.uses_default_secret());
        assert!(!config.identity.is_configured());
        assert!(!config.mailing_list.is_configured());
    }

    #[test]
    fn parses_hosts_flags_and_ranges() {
        let config = from_pairs(&[
            ("APP_ENV", "production"),
            ("APP_DEBUG", "yes"),
            ("ALLOWED_HOSTS", "Pensions.Example.org, .example.net,,"),
            ("DATA_YEAR_START", "2014"),
            ("DATA_YEAR_END", "2018"),
            ("CACHE_TIMEOUT_SECONDS", "30"),
            ("SECRET_KEY", "s3cret"),
            ("AUTH0_DOMAIN", "login.example.org"),
            ("AUTH0_KEY", "client-123"),
        ])
        .expect("config loads");

        assert_eq!(config.environment, AppEnvironment::Production);
        assert!(config.debug);
        assert_eq!(
            config.site.allowed_hosts,
            vec!["pensions.example.org".to_string(), ".example.net".to_string()]
        );
        assert_eq!(config.reporting.years(), 2014..=2018);
        assert_eq!(config.reporting.cache_timeout, Duration::from_secs(30));
        assert!(!config.uses_default_secret());
        assert!(config.identity.is_configured());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            from_pairs(&[("APP_PORT", "http")]),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            from_pairs(&[("APP_DEBUG", "maybe")]),
            Err(ConfigError::InvalidFlag {
                name: "APP_DEBUG",
                ..
            })
        ));
        assert!(matches!(
            from_pairs(&[("DATA_YEAR_START", "2020"), ("DATA_YEAR_END", "2012")]),
            Err(ConfigError::InvalidYearRange {
                first: 2020,
                last: 2012
            })
        ));
        assert!(matches!(
            from_pairs(&[("CACHE_TIMEOUT_SECONDS", "ten")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = from_pairs(&[("SECRET_KEY", "hunter2")]).expect("config loads");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("Secret(<redacted>)"));
    }

    #[test]
    fn load_reads_process_environment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::set_var("APP_HOST", "localhost");
        env::set_var("APP_PORT", "8081");
        let config = AppConfig::load().expect("config loads");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");

        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8081));
    }
}
