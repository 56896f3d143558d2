//! Daemon configuration.
//!
//! Reads `stepbit_config.json` if present. Every field is optional; anything
//! missing falls back to the built-in default, and command line flags
//! override the file.

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG: &str = "stepbit_config.json";
pub const DEFAULT_PULSE_SOCKET: &str = "/tmp/stepbit_edges.sock";
pub const DEFAULT_DEBUG_PORT: u16 = 8826;
/// Level 2.0: the bike boots at the minimum and is stepped up once.
pub const DEFAULT_RESISTANCE: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BikeConfig {
    /// Unix socket of the edge source.
    pub pulse_socket: String,
    pub debug_port: u16,
    /// Resistance level * 10 at startup.
    pub initial_resistance: u8,
}

impl Default for BikeConfig {
    fn default() -> Self {
        Self {
            pulse_socket: DEFAULT_PULSE_SOCKET.to_string(),
            debug_port: DEFAULT_DEBUG_PORT,
            initial_resistance: DEFAULT_RESISTANCE,
        }
    }
}

/// Load config from disk. Returns None if file missing or invalid.
pub fn load(path: &str) -> Option<BikeConfig> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<BikeConfig>(&data) {
        Ok(cfg) => {
            info!(
                "Loaded config {}: pulse_socket={}, debug_port={}, resistance={}",
                path, cfg.pulse_socket, cfg.debug_port, cfg.initial_resistance
            );
            Some(cfg)
        }
        Err(e) => {
            warn!("Failed to parse config {}: {}", path, e);
            None
        }
    }
}

/// Build the effective config from command line arguments (program name
/// excluded): `--config`, `--pulse-socket`, `--debug-port`.
pub fn from_args<I>(args: I) -> BikeConfig
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let mut config_path = DEFAULT_CONFIG.to_string();
    let mut pulse_socket = None;
    let mut debug_port = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(path) = args.get(i + 1) {
                    config_path = path.clone();
                    i += 1;
                }
            }
            "--pulse-socket" => {
                if let Some(path) = args.get(i + 1) {
                    pulse_socket = Some(path.clone());
                    i += 1;
                }
            }
            "--debug-port" => {
                if let Some(port) = args.get(i + 1) {
                    match port.parse() {
                        Ok(p) => debug_port = Some(p),
                        Err(e) => warn!("Ignoring --debug-port {}: {}", port, e),
                    }
                    i += 1;
                }
            }
            other => warn!("Ignoring unknown argument '{}'", other),
        }
        i += 1;
    }

    let mut config = load(&config_path).unwrap_or_default();
    if let Some(path) = pulse_socket {
        config.pulse_socket = path;
    }
    if let Some(port) = debug_port {
        config.debug_port = port;
    }
    config
}
