//! Configuration data structures for the envelope pipeline.
//!
//! These types map directly to YAML (also JSON / TOML) configuration files. They are
//! serde‑friendly and include defaults so that minimal configs remain concise.
//! `ApiConfig` doubles as the per-request resolved configuration: every field is
//! optional so that layers can be merged field by field.
use std::{fmt, str::FromStr};

use http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Built-in serializer tokens.
pub mod serializer_names {
    pub const JSON_ENCODE: &str = "json_encode";
    pub const JSON_GROUP_ENCODE: &str = "json_group_encode";
    pub const ARRAY: &str = "array";
    pub const EXTERNAL: &str = "external";

    pub const BUILT_IN: [&str; 4] = [JSON_ENCODE, JSON_GROUP_ENCODE, ARRAY, EXTERNAL];
}

/// Max age sent with CORS responses when nothing else is configured (one day).
pub const DEFAULT_CORS_MAX_AGE: u64 = 86_400;

fn default_serializer() -> String {
    serializer_names::JSON_ENCODE.to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// A compiled regular expression that (de)serializes as its source text.
///
/// Matching is an unanchored search; anchor the expression with `^`/`$` to
/// require a full match.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl FromStr for Pattern {
    type Err = regex::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source)
            .map_err(|e| serde::de::Error::custom(format!("invalid pattern '{source}': {e}")))
    }
}

/// Resolved (or partial) envelope settings.
///
/// `None` on any field means "no opinion": merging keeps the base value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Serializer token; `None` uses the process default
    pub serializer: Option<String>,
    /// Visibility groups handed to the serializer
    #[serde(rename = "serialize_groups")]
    pub groups: Option<Vec<String>>,
    /// Origins allowed for CORS; `None` disables CORS headers
    pub cors_allow_origin_regex: Option<Pattern>,
    /// Value list for `Access-Control-Allow-Headers`
    pub cors_allow_headers: Option<Vec<String>>,
    /// Value for `Access-Control-Max-Age`, in seconds
    pub cors_max_age: Option<u64>,
}

impl ApiConfig {
    /// The hardcoded bottom layer under the global defaults.
    pub fn fallback() -> Self {
        Self {
            cors_allow_headers: Some(Vec::new()),
            cors_max_age: Some(DEFAULT_CORS_MAX_AGE),
            ..Self::default()
        }
    }

    /// Merge the present fields of `other` over `self`.
    pub fn merge(&mut self, other: &ApiConfig) {
        if let Some(serializer) = &other.serializer {
            self.serializer = Some(serializer.clone());
        }
        if let Some(groups) = &other.groups {
            self.groups = Some(groups.clone());
        }
        if let Some(regex) = &other.cors_allow_origin_regex {
            self.cors_allow_origin_regex = Some(regex.clone());
        }
        if let Some(headers) = &other.cors_allow_headers {
            self.cors_allow_headers = Some(headers.clone());
        }
        if let Some(max_age) = other.cors_max_age {
            self.cors_max_age = Some(max_age);
        }
    }

    /// Consuming variant of [`ApiConfig::merge`].
    pub fn merged(mut self, other: &ApiConfig) -> Self {
        self.merge(other);
        self
    }

    pub fn with_serializer(mut self, serializer: impl Into<String>) -> Self {
        self.serializer = Some(serializer.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cors_allow_origin(mut self, pattern: Pattern) -> Self {
        self.cors_allow_origin_regex = Some(pattern);
        self
    }

    pub fn with_cors_allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_allow_headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cors_max_age(mut self, seconds: u64) -> Self {
        self.cors_max_age = Some(seconds);
        self
    }
}

/// Overrides applied to requests whose path matches `prefix` or `pattern`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PathConfig {
    /// Optional label used in logs and validation messages
    #[serde(default)]
    pub name: Option<String>,
    /// Unanchored regex tested against the request path
    #[serde(default)]
    pub pattern: Option<Pattern>,
    /// Literal path prefix; takes precedence over `pattern` when both are set
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(flatten)]
    pub config: ApiConfig,
}

impl PathConfig {
    pub fn with_prefix(prefix: impl Into<String>, config: ApiConfig) -> Self {
        Self {
            name: None,
            pattern: None,
            prefix: Some(prefix.into()),
            config,
        }
    }

    pub fn with_pattern(pattern: Pattern, config: ApiConfig) -> Self {
        Self {
            name: None,
            pattern: Some(pattern),
            prefix: None,
            config,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label for logs: the name, else the prefix, else the pattern.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.prefix.clone())
            .or_else(|| self.pattern.as_ref().map(|p| p.as_str().to_string()))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// Per-endpoint overrides attached to a single route.
///
/// Its presence alone opts the route into the envelope pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionConfig {
    pub config: ApiConfig,
    /// Status code for successful responses (200 when unset)
    pub status: Option<StatusCode>,
}

impl ActionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serializer(mut self, serializer: impl Into<String>) -> Self {
        self.config.serializer = Some(serializer.into());
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_groups(groups);
        self
    }

    pub fn cors_allow_origin(mut self, pattern: Pattern) -> Self {
        self.config.cors_allow_origin_regex = Some(pattern);
        self
    }

    pub fn cors_allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_cors_allow_headers(headers);
        self
    }

    pub fn cors_max_age(mut self, seconds: u64) -> Self {
        self.config.cors_max_age = Some(seconds);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

/// Logging options for the binary.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `api_envelope=debug`
    pub level: String,
    /// JSON lines when true, pretty console output otherwise
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

/// Root of the configuration file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnvelopeConfig {
    /// Expose fault details in unclassified error envelopes
    #[serde(default)]
    pub debug: bool,
    /// Serializer used when no layer names one
    #[serde(default = "default_serializer")]
    pub default_serializer: String,
    /// Global defaults, applied to every handled request
    #[serde(default)]
    pub defaults: ApiConfig,
    /// Ordered path rules; the first match wins
    #[serde(default)]
    pub paths: Vec<PathConfig>,
    /// Address for the `serve` command
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub log: LogConfig,
}

impl EnvelopeConfig {
    /// Create a new configuration builder
    pub fn builder() -> EnvelopeConfigBuilder {
        EnvelopeConfigBuilder::default()
    }

    /// Every serializer token named anywhere in this configuration.
    pub fn serializer_names(&self) -> Vec<&str> {
        let mut names = vec![self.default_serializer.as_str()];
        names.extend(self.defaults.serializer.as_deref());
        names.extend(
            self.paths
                .iter()
                .filter_map(|path| path.config.serializer.as_deref()),
        );
        names
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_serializer: default_serializer(),
            defaults: ApiConfig::default(),
            paths: Vec::new(),
            listen_addr: default_listen_addr(),
            log: LogConfig::default(),
        }
    }
}

/// Builder for EnvelopeConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct EnvelopeConfigBuilder {
    debug: bool,
    default_serializer: Option<String>,
    defaults: Option<ApiConfig>,
    paths: Vec<PathConfig>,
    listen_addr: Option<String>,
    log: Option<LogConfig>,
}

impl EnvelopeConfigBuilder {
    /// Enable verbose fault details
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the process-wide default serializer token
    pub fn default_serializer(mut self, name: impl Into<String>) -> Self {
        self.default_serializer = Some(name.into());
        self
    }

    /// Set the global default layer
    pub fn defaults(mut self, defaults: ApiConfig) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Append a path rule (evaluated in insertion order)
    pub fn path(mut self, path: PathConfig) -> Self {
        self.paths.push(path);
        self
    }

    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set logging options
    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = Some(log);
        self
    }

    /// Build and validate the final EnvelopeConfig
    pub fn build(self) -> crate::config::ValidationResult<EnvelopeConfig> {
        let config = EnvelopeConfig {
            debug: self.debug,
            default_serializer: self.default_serializer.unwrap_or_else(default_serializer),
            defaults: self.defaults.unwrap_or_default(),
            paths: self.paths,
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            log: self.log.unwrap_or_default(),
        };

        crate::config::EnvelopeConfigValidator::validate(&config)?;
        Ok(config)
    }
}
