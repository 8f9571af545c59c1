//! Environment-driven configuration.

use std::net::SocketAddr;

use thiserror::Error;

use bookwell_auth::{DenialPolicy, ScopeConflictPolicy};

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres connection string; in-memory stores when unset.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub login_path: String,
    pub landing_path: String,
    pub scope_conflict_policy: ScopeConflictPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            database_url: None,
            db_max_connections: 10,
            login_path: "/login".to_string(),
            landing_path: "/".to_string(),
            scope_conflict_policy: ScopeConflictPolicy::Deny,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            cfg.bind_addr = addr.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "BIND_ADDR",
                    message: e.to_string(),
                }
            })?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => cfg.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        cfg.database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());

        if let Some(n) = lookup("DB_MAX_CONNECTIONS") {
            cfg.db_max_connections = n.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS",
                    message: e.to_string(),
                }
            })?;
        }

        if let Some(path) = lookup("LOGIN_PATH") {
            cfg.login_path = path;
        }
        if let Some(path) = lookup("LANDING_PATH") {
            cfg.landing_path = path;
        }

        if let Some(policy) = lookup("SCOPE_CONFLICT_POLICY") {
            cfg.scope_conflict_policy = policy.parse().map_err(|message| ConfigError::Invalid {
                var: "SCOPE_CONFLICT_POLICY",
                message,
            })?;
        }

        Ok(cfg)
    }

    pub fn denial_policy(&self) -> DenialPolicy {
        DenialPolicy::new(self.login_path.clone(), self.landing_path.clone())
    }
}
