use std::net::SocketAddr;

use config::{Config, ConfigError};
use serde::Deserialize;

pub mod application;
pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct BankrollConfig {
    pub server: Server,
    pub logger: Logger,
}

impl BankrollConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name("bankroll").required(false))
            .add_source(
                config::Environment::with_prefix("BANKROLL")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<BankrollConfig>()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("logger.level", "INFO")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub tls: Option<Tls>,
}

impl Server {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// PEM files used to serve over HTTPS
#[derive(Clone, Debug, Deserialize)]
pub struct Tls {
    pub cert: String,
    pub key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BankrollConfig::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<BankrollConfig>()
            .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.server.addr().unwrap(),
            "0.0.0.0:3000".parse::<SocketAddr>().unwrap()
        );
        assert!(config.server.tls.is_none());
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::INFO);
    }

    #[test]
    fn test_override() {
        let config = BankrollConfig::builder()
            .unwrap()
            .set_override("server.port", 8443_i64)
            .unwrap()
            .set_override("server.tls.cert", "localhost.pem")
            .unwrap()
            .set_override("server.tls.key", "localhost.key")
            .unwrap()
            .set_override("logger.level", "DEBUG")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<BankrollConfig>()
            .unwrap();
        assert_eq!(config.server.port, 8443);
        assert_eq!(config.server.tls.unwrap().cert, "localhost.pem");
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::DEBUG);
    }
}
