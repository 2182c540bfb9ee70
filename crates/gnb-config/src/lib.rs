//! Configuration loading for the `gnb` binary: a `toml` file deserialized
//! with `serde`, falling back to documented defaults for anything omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnbConfig {
    pub gnb_id: GnbIdConfig,
    pub cu_cp: CuCpConfig,
    pub rx_buffer_pool: RxBufferPoolConfigToml,
    pub log: LogConfig,
}

impl Default for GnbConfig {
    fn default() -> Self {
        Self {
            gnb_id: GnbIdConfig::default(),
            cu_cp: CuCpConfig::default(),
            rx_buffer_pool: RxBufferPoolConfigToml::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GnbIdConfig {
    /// gNB identifier, occupying the top `bit_length` bits of every served
    /// cell's NR Cell Identity.
    pub id: u32,
    pub bit_length: u8,
}

impl Default for GnbIdConfig {
    fn default() -> Self {
        Self {
            id: 0x0000_1,
            bit_length: 22,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CuCpConfig {
    pub max_nof_dus: usize,
    pub max_nof_cu_ups: usize,
    pub max_nof_ues: usize,
    pub ue_sequencer_queue_capacity: usize,
    /// Seconds before an outstanding transaction (NG/F1/E1 request-response
    /// correlation) is timed out.
    pub transaction_timeout_secs: u64,
}

impl Default for CuCpConfig {
    fn default() -> Self {
        Self {
            max_nof_dus: 6,
            max_nof_cu_ups: 4,
            max_nof_ues: 4096,
            ue_sequencer_queue_capacity: 16,
            transaction_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RxBufferPoolConfigToml {
    pub max_codeblock_size: usize,
    pub nof_buffers: usize,
    pub nof_codeblocks: usize,
    pub expire_timeout_slots: u64,
    pub external_soft_bits: bool,
}

impl Default for RxBufferPoolConfigToml {
    fn default() -> Self {
        Self {
            max_codeblock_size: 8448,
            nof_buffers: 16,
            nof_codeblocks: 64,
            expire_timeout_slots: 200,
            external_soft_bits: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,cu_cp=debug"`.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl GnbConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = GnbConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: GnbConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.cu_cp.max_nof_dus, config.cu_cp.max_nof_dus);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: GnbConfig = toml::from_str("[cu_cp]\nmax_nof_dus = 2\n").unwrap();
        assert_eq!(parsed.cu_cp.max_nof_dus, 2);
        assert_eq!(parsed.cu_cp.max_nof_cu_ups, CuCpConfig::default().max_nof_cu_ups);
    }

    #[test]
    fn missing_file_surfaces_read_error() {
        let err = GnbConfig::from_file("/nonexistent/gnb.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
