// src/config.rs
use crate::error::ConfigError;
use log::LevelFilter;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const BIND_ADDR: &str = "SCROOGE_BIND_ADDR";
pub const STORE: &str = "SCROOGE_STORE";
pub const SCYLLA_NODE: &str = "SCROOGE_SCYLLA_NODE";
pub const JWT_SECRET: &str = "SCROOGE_JWT_SECRET";
pub const SESSION_TTL_SECS: &str = "SCROOGE_SESSION_TTL_SECS";
pub const SEED_FILE: &str = "SCROOGE_SEED_FILE";
pub const LOG_LEVEL: &str = "SCROOGE_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "scylla" => Ok(StoreBackend::Scylla),
            _ => Err("expected `memory` or `scylla`".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub scylla_node: String,
    pub jwt_secret: String,
    pub session_ttl_secs: i64,
    pub seed_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any `name -> value` source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get(JWT_SECRET).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET.to_string()))?;
        let session_ttl_secs = parse_or(&get, SESSION_TTL_SECS, 86_400i64)?;
        if session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: SESSION_TTL_SECS.to_string(),
                value: session_ttl_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or(&get, BIND_ADDR, SocketAddr::from(([127, 0, 0, 1], 3030)))?,
            store: parse_or(&get, STORE, StoreBackend::Memory)?,
            scylla_node: get(SCYLLA_NODE).unwrap_or_else(|| "127.0.0.1:9042".to_string()),
            jwt_secret,
            session_ttl_secs,
            seed_file: get(SEED_FILE).map(PathBuf::from),
            log_level: parse_or(&get, LOG_LEVEL, LevelFilter::Info)?,
        })
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
            value,
        }),
    }
}
