//! Built-in defaults every builder starts from.

use crate::config::DEFAULT_MAX_DEPTH;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.store_path", crate::config::storage::DEFAULT_STORE_PATH)?
        .set_default("propagation.max_depth", DEFAULT_MAX_DEPTH as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")
}
