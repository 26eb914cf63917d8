use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snap_core::BoardConfig;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Externally reachable base URL, used to build image URLs.
    pub public_url: String,
    /// Where the item collection and blobs live. In memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Where per-device like records live. In memory when unset.
    pub device_state_dir: Option<PathBuf>,
    pub max_image_bytes: usize,
    pub board: BoardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            public_url: "http://127.0.0.1:8080".into(),
            data_dir: None,
            device_state_dir: None,
            max_image_bytes: 10 * 1024 * 1024,
            board: BoardConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Base URL of the blob route, e.g. `http://host:8080/v1/blobs`.
    pub fn blob_base_url(&self) -> String {
        format!("{}/v1/blobs", self.public_url.trim_end_matches('/'))
    }
}
