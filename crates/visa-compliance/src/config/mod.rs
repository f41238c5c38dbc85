use crate::workflows::visa::ComplianceConfig;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ComplianceConfig::default();
        let buffer_days = match env::var("APP_APPLY_BUFFER_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidBufferDays(raw))?,
            Err(_) => defaults.buffer_days,
        };
        let reminder_intervals = match env::var("APP_REMINDER_INTERVALS") {
            Ok(raw) => parse_intervals(&raw)?,
            Err(_) => defaults.reminder_intervals,
        };
        let source_version =
            env::var("APP_RULE_SOURCE_VERSION").unwrap_or_else(|_| "provider-v1".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig {
                compliance: ComplianceConfig::new(buffer_days, reminder_intervals),
                source_version,
            },
        })
    }
}

/// Reminders further out than this from the apply-by date are not useful.
const MAX_REMINDER_INTERVAL_DAYS: u32 = 3650;

fn parse_intervals(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let parsed = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::InvalidReminderIntervals(raw.to_string()))?;

    if parsed.is_empty()
        || parsed
            .iter()
            .any(|&interval| interval > MAX_REMINDER_INTERVAL_DAYS)
    {
        return Err(ConfigError::InvalidReminderIntervals(raw.to_string()));
    }

    Ok(parsed)
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the compliance engine and the rule normalizer.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub compliance: ComplianceConfig,
    pub source_version: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBufferDays(String),
    InvalidReminderIntervals(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBufferDays(raw) => write!(
                f,
                "APP_APPLY_BUFFER_DAYS must be a non-negative integer (found '{}')",
                raw
            ),
            ConfigError::InvalidReminderIntervals(raw) => write!(
                f,
                "APP_REMINDER_INTERVALS must be a comma-separated list of day counts up to {} (found '{}')",
                MAX_REMINDER_INTERVAL_DAYS, raw
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBufferDays(_)
            | ConfigError::InvalidReminderIntervals(_) => None,
        }
    }
}
