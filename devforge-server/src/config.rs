// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use devforge_core::dashboard::StaticTelemetry;
use devforge_core::workflow::SimulationSettings;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// DevForge MCP Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: McpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub workflow: SimulationSettings,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub telemetry: StaticTelemetry,
}

/// How MCP messages reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpServerConfig {
    #[serde(default)]
    pub transport: TransportKind,

    /// HTTP listen address (e.g., "127.0.0.1:47200")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON platform snapshot; an empty platform is served when unset
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Shift snapshot timestamps so the newest record lands on startup time
    #[serde(default = "default_rebase_timestamps")]
    pub rebase_timestamps: bool,
}

/// Fixed scores for categories without a real signal source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(default = "default_cost_score")]
    pub cost: f64,
    #[serde(default = "default_compliance_score")]
    pub compliance: f64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:47200".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_rebase_timestamps() -> bool {
    true
}

fn default_cost_score() -> f64 {
    85.0
}

fn default_compliance_score() -> f64 {
    90.0
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            rebase_timestamps: default_rebase_timestamps(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cost: default_cost_score(),
            compliance: default_compliance_score(),
        }
    }
}

const ENV_TRANSPORT: &str = "DEVFORGE_TRANSPORT";
const ENV_LISTEN_ADDR: &str = "DEVFORGE_LISTEN_ADDR";
const ENV_REQUEST_TIMEOUT: &str = "DEVFORGE_REQUEST_TIMEOUT";
const ENV_LOG_FORMAT: &str = "DEVFORGE_LOG_FORMAT";
const ENV_SNAPSHOT_PATH: &str = "DEVFORGE_SNAPSHOT_PATH";
const ENV_REBASE_TIMESTAMPS: &str = "DEVFORGE_REBASE_TIMESTAMPS";
const ENV_TEST_FAILURE_RATE: &str = "DEVFORGE_TEST_FAILURE_RATE";

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

fn env_enum<T: clap::ValueEnum>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match T::from_str(&raw, true) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unknown environment value");
            None
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - DEVFORGE_TRANSPORT: stdio or http (default: stdio)
    /// - DEVFORGE_LISTEN_ADDR: HTTP listen address (default: 127.0.0.1:47200)
    /// - DEVFORGE_REQUEST_TIMEOUT: Request timeout in seconds (default: 30)
    /// - DEVFORGE_LOG_FORMAT: text or json (default: text)
    /// - DEVFORGE_SNAPSHOT_PATH: Platform snapshot JSON file
    /// - DEVFORGE_REBASE_TIMESTAMPS: Rebase snapshot timestamps (default: true)
    /// - DEVFORGE_TEST_FAILURE_RATE: Simulated test node failure rate (default: 0.1)
    pub fn from_env() -> Self {
        Self::merge_with_env(Self::default())
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "Loading configuration from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        Ok(Self::merge_with_env(config))
    }

    /// Overlay explicitly set environment variables onto `config`
    fn merge_with_env(mut config: Self) -> Self {
        if let Some(transport) = env_enum(ENV_TRANSPORT) {
            config.server.transport = transport;
        }
        if let Ok(addr) = std::env::var(ENV_LISTEN_ADDR) {
            config.server.listen_addr = addr;
        }
        if let Some(timeout) = env_parsed(ENV_REQUEST_TIMEOUT) {
            config.server.request_timeout_secs = timeout;
        }
        if let Some(format) = env_enum(ENV_LOG_FORMAT) {
            config.server.log_format = format;
        }
        if let Ok(path) = std::env::var(ENV_SNAPSHOT_PATH) {
            config.storage.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(rebase) = env_parsed(ENV_REBASE_TIMESTAMPS) {
            config.storage.rebase_timestamps = rebase;
        }
        if let Some(rate) = env_parsed(ENV_TEST_FAILURE_RATE) {
            config.workflow.test_failure_rate = rate;
        }

        config
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        let rate = self.workflow.test_failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("test_failure_rate must be within [0, 1], got {}", rate);
        }

        for (name, score) in [("cost", self.scoring.cost), ("compliance", self.scoring.compliance)] {
            if !(0.0..=100.0).contains(&score) {
                anyhow::bail!("scoring.{} must be within [0, 100], got {}", name, score);
            }
        }

        if let Some(path) = &self.storage.snapshot_path {
            if !path.is_file() {
                anyhow::bail!("Snapshot file not found: {}", path.display());
            }
        }

        Ok(())
    }
}
