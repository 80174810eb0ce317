//! Environment variable source: CANOPY_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses CANOPY prefix and __ as separator for nested keys,
/// e.g. `CANOPY__PROPAGATION__MAX_DEPTH=64`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("CANOPY")
            .separator("__")
            .try_parsing(true),
    ))
}
