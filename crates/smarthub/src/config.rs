//! Client configuration.
//!
//! Everything here has a working default, so a config file is optional.
//! When one is given it is JSON and may set any subset of fields:
//!
//! ```json
//! { "name": "HUB", "window": { "window_ms": 300 }, "http": { "timeout_ms": 5000 } }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smarthub_protocol::{Address, DEFAULT_HUB_NAME};
use smarthub_tick::WindowConfig;

use crate::HubError;

// ---------------------------------------------------------------------------
// HttpConfig
// ---------------------------------------------------------------------------

/// HTTP transport settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in milliseconds. `None` (the default) waits as
    /// long as the hub takes.
    pub timeout_ms: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// HubConfig
// ---------------------------------------------------------------------------

/// Full configuration for a [`HubClient`](crate::HubClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Name the client announces in `WhoIsHere` and `IAmHere`.
    pub name: String,
    pub window: WindowConfig,
    pub http: HttpConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_HUB_NAME.to_owned(),
            window: WindowConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl HubConfig {
    /// Longest name that fits the one-byte length prefix.
    pub const MAX_NAME_LEN: usize = 255;

    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HubError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| HubError::Config(format!("{}: {e}", path.display())))
    }

    /// Parses a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Checks the name and clamps the window.
    ///
    /// # Errors
    /// [`HubError::Config`] if the name is empty or longer than 255 bytes.
    pub fn validated(mut self) -> Result<Self, HubError> {
        if self.name.is_empty() {
            return Err(HubError::Config("hub name must not be empty".into()));
        }
        if self.name.len() > Self::MAX_NAME_LEN {
            return Err(HubError::Config(format!(
                "hub name is {} bytes, at most {} allowed",
                self.name.len(),
                Self::MAX_NAME_LEN
            )));
        }
        self.window = self.window.validated();
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Hub address parsing
// ---------------------------------------------------------------------------

/// Parses the hub's own address from hex, with or without a `0x` prefix.
///
/// The broadcast address is rejected: the hub needs an address devices can
/// reply to.
pub fn parse_hub_address(text: &str) -> Result<Address, HubError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let raw = u16::from_str_radix(digits, 16)
        .map_err(|e| HubError::InvalidAddress(format!("{text:?}: {e}")))?;

    match Address::new(raw) {
        Some(address) if !address.is_broadcast() => Ok(address),
        Some(_) => Err(HubError::InvalidAddress(format!(
            "{text:?} is the broadcast address"
        ))),
        None => Err(HubError::InvalidAddress(format!(
            "{text:?} is above {:#x}",
            Address::MAX
        ))),
    }
}
