//! Environment-based configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::api::IdpConfig;

/// Runtime configuration, assembled from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub idp: IdpConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVariable(&'static str),
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `IDP_CLIENT_SECRET` is mandatory (token validation is impossible
    /// without it); everything else has a sensible default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        let database_path = std::env::var("RESOURCES_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("resources-manager.db"));

        let client_secret = std::env::var("IDP_CLIENT_SECRET")
            .map_err(|_| ConfigError::MissingVariable("IDP_CLIENT_SECRET"))?;

        let idp = IdpConfig {
            client_secret,
            issuer: std::env::var("IDP_ISSUER").ok(),
            admin_role: std::env::var("IDP_ADMIN_ROLE").unwrap_or_else(|_| "admin".to_string()),
            testbed_admin_role: std::env::var("IDP_TESTBED_ADMIN_ROLE")
                .unwrap_or_else(|_| "testbed-admin".to_string()),
        };

        Ok(Self {
            bind_addr,
            database_path,
            idp,
        })
    }
}
