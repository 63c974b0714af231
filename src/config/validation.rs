#![allow(clippy::collapsible_if)]

use std::{collections::HashSet, net::SocketAddr};

use eyre::Result;
use http::HeaderName;
use tracing_subscriber::EnvFilter;

use crate::config::models::{ApiConfig, EnvelopeConfig, LogConfig, PathConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
///
/// These are configuration errors: they are raised while the application
/// starts and never at request time.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Path conflict detected: {message}")]
    PathConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Envelope configuration validator
pub struct EnvelopeConfigValidator;

impl EnvelopeConfigValidator {
    /// Validate the entire envelope configuration
    pub fn validate(config: &EnvelopeConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.default_serializer.trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: "default_serializer".to_string(),
                message: "Serializer name cannot be empty".to_string(),
            });
        }

        if let Err(mut default_errors) = Self::validate_api_config("defaults", &config.defaults) {
            errors.append(&mut default_errors);
        }

        for (i, path) in config.paths.iter().enumerate() {
            if let Err(mut path_errors) = Self::validate_path_config(i, path) {
                errors.append(&mut path_errors);
            }
        }

        if let Err(mut conflicts) = Self::check_path_conflicts(&config.paths) {
            errors.append(&mut conflicts);
        }

        if let Err(e) = Self::validate_log_config(&config.log) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate a single path rule
    fn validate_path_config(index: usize, path: &PathConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let label = format!("paths[{index}] ({})", path.label());

        if path.prefix.is_none() && path.pattern.is_none() {
            errors.push(ValidationError::MissingField {
                field: format!("{label}: prefix or pattern"),
            });
        }

        if let Some(prefix) = &path.prefix {
            if !prefix.starts_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("{label} prefix"),
                    message: "Path prefixes must start with '/'".to_string(),
                });
            }
        }

        if let Err(mut config_errors) = Self::validate_api_config(&label, &path.config) {
            errors.append(&mut config_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate the fields shared by defaults and path rules
    fn validate_api_config(label: &str, config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(serializer) = &config.serializer {
            if serializer.trim().is_empty() {
                errors.push(ValidationError::InvalidField {
                    field: format!("{label} serializer"),
                    message: "Serializer name cannot be empty".to_string(),
                });
            }
        }

        if let Some(groups) = &config.groups {
            if groups.iter().any(|g| g.trim().is_empty()) {
                errors.push(ValidationError::InvalidField {
                    field: format!("{label} serialize_groups"),
                    message: "Group names cannot be empty".to_string(),
                });
            }
        }

        if let Some(headers) = &config.cors_allow_headers {
            for header in headers {
                if HeaderName::try_from(header.as_str()).is_err() {
                    errors.push(ValidationError::InvalidField {
                        field: format!("{label} cors_allow_headers"),
                        message: format!("Invalid header name: '{header}'"),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Duplicate names make log lines and error messages ambiguous
    fn check_path_conflicts(paths: &[PathConfig]) -> Result<(), Vec<ValidationError>> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for name in paths.iter().filter_map(|p| p.name.as_deref()) {
            if !seen.insert(name) {
                errors.push(ValidationError::PathConflict {
                    message: format!("path name '{name}' is used more than once"),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_log_config(log: &LogConfig) -> ValidationResult<()> {
        EnvFilter::try_new(&log.level).map_err(|e| ValidationError::InvalidField {
            field: "log.level".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
