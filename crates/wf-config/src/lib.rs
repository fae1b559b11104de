//! wf-config: canonical configuration file format and validation.
//!
//! The daemon is driven by a YAML snapshot that can be re-read while running
//! (hot reload between control cycles). Out-of-range values are never
//! rejected: each field is independently clamped to its safe range and the
//! corrected value is what takes effect.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::clamp_config;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Load a configuration snapshot, applying range clamping to every field.
///
/// A missing file is not an error for operation, but the caller decides; this
/// function surfaces the I/O failure and lets the daemon fall back to
/// [`Config::default`].
pub fn load_yaml(path: &std::path::Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = serde_yaml::from_str(&content)?;
    clamp_config(&mut config);
    Ok(config)
}

pub fn save_yaml(path: &std::path::Path, config: &Config) -> ConfigResult<()> {
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
