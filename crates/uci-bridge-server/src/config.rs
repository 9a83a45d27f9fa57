//! サーバ設定。`[supervisor]` テーブルはそのまま [`SupervisorConfig`] になる。
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 5001
//! metrics_bind = "127.0.0.1:9464"
//!
//! [supervisor]
//! engine_path = "/opt/engine/engine"
//! search_margin_ms = 10000
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uci_bridge::{ConfigError, SupervisorConfig};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prometheus exporter の listen アドレス。未指定なら exporter を立てない。
    pub metrics_bind: Option<SocketAddr>,
    pub supervisor: SupervisorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            metrics_bind: None,
            supervisor: SupervisorConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
