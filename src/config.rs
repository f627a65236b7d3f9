//! Station configuration
//!
//! Every section is optional in the TOML file; missing fields fall back to
//! the defaults in [`crate::constants`].

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::ConfigError;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub server: ServerConfig,
    pub rotation: RotationConfig,
    pub generation: GenerationConfig,
    pub slots: SlotConfig,
    pub presence: PresenceConfig,
}

/// HTTP / WebSocket server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    pub http_port: u16,
    /// Directory served for any path not handled by the API
    pub web_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: DEFAULT_HTTP_PORT,
            web_dir: PathBuf::from("web"),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.http_port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub tick_secs: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            tick_secs: DEFAULT_TICK_SECS,
        }
    }
}

impl RotationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

/// How a batch is written to the slot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Each payload is written as soon as it arrives
    #[default]
    Streaming,
    /// All five payloads are written after the last one arrives
    Buffered,
}

/// Generation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// WebSocket endpoint; an empty string disables generation
    pub endpoint: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub commit: CommitMode,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            commit: CommitMode::default(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Slot storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotBackend {
    #[default]
    Disk,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub backend: SlotBackend,
    /// Directory holding `0.mp3` .. `9.mp3` for the disk backend
    pub dir: PathBuf,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            backend: SlotBackend::default(),
            dir: PathBuf::from("."),
        }
    }
}

/// What identifies a listener in the active set
///
/// `connection` gives exact counts. `address` approximates them: every
/// connection from one IP shares a single membership, so when any of them
/// pauses or disconnects, the address stops counting even if a sibling
/// connection is still playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerIdentity {
    /// Remote IP address, shared by every connection from it
    #[default]
    Address,
    /// Opaque id assigned per accepted connection, exact counts
    Connection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub identity: ListenerIdentity,
}

impl StationConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load from an explicit path, else the platform config file if present,
    /// else defaults. The generation endpoint environment override is applied last.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_override(std::env::var(GENERATION_ENDPOINT_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// A set, non-empty value replaces the configured endpoint
    pub fn apply_env_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            self.generation.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation.tick_secs == 0 {
            return Err(ConfigError::Invalid("rotation.tick_secs must be > 0".into()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid("generation.timeout_secs must be > 0".into()));
        }
        if self.generation.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.connect_timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// `station.toml` in the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "rotating-station")
        .map(|dirs| dirs.config_dir().join("station.toml"))
}
