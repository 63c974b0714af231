use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::{models::EnvelopeConfig, validation::EnvelopeConfigValidator};

/// Read an [`EnvelopeConfig`] without validating it.
///
/// The format follows the file extension; unknown extensions are read as YAML.
/// Regex patterns are compiled here, so a bad `pattern` already fails loading.
pub async fn load_config(config_path: &str) -> Result<EnvelopeConfig> {
    load_config_sync(config_path)
}

pub fn load_config_sync(config_path: &str) -> Result<EnvelopeConfig> {
    let path = Path::new(config_path);
    let source = File::new(config_path, file_format(path));

    Config::builder()
        .add_source(source)
        .build()
        .with_context(|| format!("Failed to read envelope config {}", path.display()))?
        .try_deserialize::<EnvelopeConfig>()
        .with_context(|| format!("Envelope config {} has an invalid shape", path.display()))
}

fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml,
    }
}

/// Load and validate; the form used at application startup
pub fn load_validated_config(config_path: &str) -> Result<EnvelopeConfig> {
    let config = load_config_sync(config_path)?;
    EnvelopeConfigValidator::validate(&config)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;
    Ok(config)
}
