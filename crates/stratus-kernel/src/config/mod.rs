//! Configuration loading.
//!
//! Gateway settings may be written in YAML, TOML, JSON, INI, RON or JSON5;
//! the format is detected from the file extension.  `${VAR}` and `$VAR`
//! references are substituted from the process environment before parsing,
//! and `PREFIX__SECTION__KEY` environment variables override file values.

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat as Format;

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static BARE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("bare env var pattern is valid")
});

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension.
///
/// Supported: `.yaml`/`.yml`, `.toml`, `.json`, `.ini`, `.ron`, `.json5`.
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string.
///
/// `${VAR}` is replaced first, then bare `$VAR`.  Unset variables are left
/// untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Whether `value` still holds a `${VAR}` or `$VAR` reference, i.e. one
/// that [`substitute_env_vars`] left in place because the variable is unset.
pub fn has_env_reference(value: &str) -> bool {
    BRACED_VAR.is_match(value) || BARE_VAR.is_match(value)
}

fn deserialize<T: DeserializeOwned>(builder: ConfigBuilder<DefaultState>) -> ConfigResult<T> {
    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from a file.
pub fn load_config<T>(path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Load configuration from a string with explicit format.
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);
    deserialize(Cfg::builder().add_source(File::from_str(&substituted, format)))
}

/// Load configuration from a file, then apply environment overrides.
///
/// Environment variables are prefixed with `env_prefix` and use `__` for
/// nesting: `STRATUS__SERVER__PORT=9090` overrides `server.port`.
pub fn load_with_env<T>(path: &str, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&content);

    deserialize(
        Cfg::builder()
            .add_source(File::from_str(&substituted, format))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__"),
            ),
    )
}
