//! Configuration
//!
//! Layered configuration built with the `config` crate. Precedence, lowest
//! to highest: built-in defaults, global file
//! (`$XDG_CONFIG_HOME/canopy/config.toml`), workspace file (`canopy.toml`),
//! environment (`CANOPY__SECTION__KEY`).

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod storage;

pub use facade::ConfigLoader;
pub use storage::StorageConfig;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Name of the workspace-level config file
pub const WORKSPACE_CONFIG_FILE: &str = "canopy.toml";

/// Default bound on ancestor hops per save
pub const DEFAULT_MAX_DEPTH: usize = 256;

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Ripple propagation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Longest ancestor chain a single save may walk before giving up
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub propagation: PropagationConfig,
}
