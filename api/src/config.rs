use crate::database::DEFAULT_DATABASE_URL;
use anyhow::{Context, Result};
use std::env;
use std::sync::OnceLock;
use strum::{Display, EnumString};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Deployment environment, selects how much error detail clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Reads `ENVIRONMENT`, falling back to development.
    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT") {
            Ok(value) => value.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %value, "Unknown ENVIRONMENT, using development");
                Environment::Development
            }),
            Err(_) => Environment::Development,
        }
    }

    /// Process-wide environment, read once on first use
    pub fn current() -> Self {
        *ENVIRONMENT.get_or_init(Self::from_env)
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {}", port))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            environment: Environment::current(),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests;
