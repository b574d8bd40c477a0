//! `[serve]` section configuration.
//!
//! Contains live server and watch loop settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[serve]` section in letterpress.toml - live server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"    # Listen on all interfaces
/// port = 3000
/// poll_interval_ms = 500   # Browser staleness check interval
/// debounce_ms = 100        # Fold bursts of file events into one build
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 3000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// How often the page asks the server whether it changed.
    #[serde(default = "defaults::serve::poll_interval_ms")]
    #[educe(Default = defaults::serve::poll_interval_ms())]
    pub poll_interval_ms: u64,

    /// Window for folding rapid file events into one rebuild.
    /// `0` (default) rebuilds once per event.
    #[serde(default = "defaults::serve::debounce_ms")]
    #[educe(Default = defaults::serve::debounce_ms())]
    pub debounce_ms: u64,
}

impl ServeConfig {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Debounce window, `None` when disabled.
    pub const fn debounce(&self) -> Option<Duration> {
        match self.debounce_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
