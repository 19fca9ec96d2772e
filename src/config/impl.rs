use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults (plus environment
/// overrides) when `init_config` has not been called yet.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load(DEFAULT_CONFIG_PATH)))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or "config.toml" in the current
/// directory). If the file doesn't exist, uses in-memory defaults.
///
/// # Examples
/// ```no_run
/// use weblocation::config::init_config;
/// init_config(None);
/// ```
pub fn init_config(path: Option<&str>) {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load(path)));
}
