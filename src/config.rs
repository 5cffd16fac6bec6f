use std::net::{SocketAddr, ToSocketAddrs};

use crate::index::{ConflictPolicy, RoomScope, UnknownRoomScope};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TIMETABLE_PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),

    #[error("TIMETABLE_ROOM_SCOPE: {0}")]
    InvalidRoomScope(#[from] UnknownRoomScope),

    #[error("{host}:{port} does not resolve to a bind address")]
    InvalidAddress { host: String, port: u16 },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `7860`).
    pub port: u16,
    /// Room double-booking scope used by every resolver call.
    pub policy: ConflictPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
            policy: ConflictPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default     |
    /// |------------------------|-------------|
    /// | `TIMETABLE_HOST`       | `0.0.0.0`   |
    /// | `TIMETABLE_PORT`       | `7860`      |
    /// | `TIMETABLE_ROOM_SCOPE` | `day-block` |
    ///
    /// The host may be an IP address or a hostname.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = get("TIMETABLE_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);

        let port = match get("TIMETABLE_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let room_scope = match get("TIMETABLE_ROOM_SCOPE") {
            Some(raw) => raw.parse::<RoomScope>()?,
            None => defaults.policy.room_scope,
        };

        Ok(Self {
            host,
            port,
            policy: ConflictPolicy { room_scope },
        })
    }

    /// Resolves the bind address. The host may be an IP literal or a name
    /// such as `localhost`; the first resolved address wins.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = || ConfigError::InvalidAddress {
            host: self.host.clone(),
            port: self.port,
        };
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }
}
