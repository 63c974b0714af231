use tracing::debug;

use crate::config::{ActionConfig, ApiConfig, EnvelopeConfig, PathConfig, Pattern};

/// How a path rule decides whether it applies.
#[derive(Debug, Clone, PartialEq)]
pub enum PathMatcher {
    Prefix(String),
    Pattern(Pattern),
}

impl PathMatcher {
    /// Prefix wins when both are configured; `None` when neither is.
    pub fn from_path_config(path: &PathConfig) -> Option<Self> {
        match (&path.prefix, &path.pattern) {
            (Some(prefix), _) => Some(PathMatcher::Prefix(prefix.clone())),
            (None, Some(pattern)) => Some(PathMatcher::Pattern(pattern.clone())),
            (None, None) => None,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathMatcher::Pattern(pattern) => pattern.is_match(path),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledPath {
    label: String,
    matcher: PathMatcher,
    config: ApiConfig,
}

/// Resolves the [`ApiConfig`] of one request.
///
/// Layers, lowest first: hardcoded fallback, global defaults, the first
/// matching path rule, the route's [`ActionConfig`].
#[derive(Debug, Clone)]
pub struct ApiConfigCompiler {
    default_config: ApiConfig,
    paths: Vec<CompiledPath>,
}

impl ApiConfigCompiler {
    /// Path rules without a matcher never match; validation rejects them earlier.
    pub fn new(defaults: &ApiConfig, paths: &[PathConfig]) -> Self {
        let paths = paths
            .iter()
            .filter_map(|path| {
                PathMatcher::from_path_config(path).map(|matcher| CompiledPath {
                    label: path.label(),
                    matcher,
                    config: path.config.clone(),
                })
            })
            .collect();

        Self {
            default_config: ApiConfig::fallback().merged(defaults),
            paths,
        }
    }

    pub fn from_config(config: &EnvelopeConfig) -> Self {
        Self::new(&config.defaults, &config.paths)
    }

    /// Fallback merged with the global defaults.
    pub fn default_config(&self) -> &ApiConfig {
        &self.default_config
    }

    /// `None` when neither a path rule nor an action config claims the request.
    pub fn compile(&self, path: &str, action: Option<&ActionConfig>) -> Option<ApiConfig> {
        let mut config = self.default_config.clone();
        let mut matched = false;

        if let Some(rule) = self.paths.iter().find(|rule| rule.matcher.matches(path)) {
            debug!(path, rule = %rule.label, "API path config matched");
            config.merge(&rule.config);
            matched = true;
        }

        if let Some(action) = action {
            config.merge(&action.config);
            matched = true;
        }

        matched.then_some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> Pattern {
        Pattern::new(source).unwrap()
    }

    #[test]
    fn unmatched_request_is_not_handled() {
        let compiler = ApiConfigCompiler::new(
            &ApiConfig::default(),
            &[PathConfig::with_prefix("/api", ApiConfig::default())],
        );

        assert!(compiler.compile("/web/index", None).is_none());
        assert!(compiler.compile("/api/users", None).is_some());
    }

    #[test]
    fn action_config_alone_claims_request() {
        let compiler = ApiConfigCompiler::new(&ApiConfig::default(), &[]);
        let action = ActionConfig::new().serializer("array");

        let config = compiler.compile("/anything", Some(&action)).unwrap();
        assert_eq!(config.serializer.as_deref(), Some("array"));
    }

    #[test]
    fn first_matching_path_wins() {
        let compiler = ApiConfigCompiler::new(
            &ApiConfig::default(),
            &[
                PathConfig::with_pattern(pattern("^/api"), ApiConfig::default().with_serializer("first")),
                PathConfig::with_pattern(
                    pattern("^/api/v2"),
                    ApiConfig::default()
                        .with_serializer("second")
                        .with_cors_max_age(5),
                ),
            ],
        );

        let config = compiler.compile("/api/v2/users", None).unwrap();
        assert_eq!(config.serializer.as_deref(), Some("first"));
        // The later rule is not consulted at all.
        assert_eq!(config.cors_max_age, Some(86_400));
    }

    #[test]
    fn prefix_takes_precedence_over_pattern() {
        let mut path = PathConfig::with_prefix("/api", ApiConfig::default());
        path.pattern = Some(pattern("^/nothing-else$"));
        let compiler = ApiConfigCompiler::new(&ApiConfig::default(), &[path]);

        assert!(compiler.compile("/api/users", None).is_some());
        assert!(compiler.compile("/nothing-else", None).is_none());
    }

    #[test]
    fn pattern_is_an_unanchored_search() {
        let compiler = ApiConfigCompiler::new(
            &ApiConfig::default(),
            &[PathConfig::with_pattern(pattern("/v[0-9]+/"), ApiConfig::default())],
        );

        assert!(compiler.compile("/public/v2/items", None).is_some());
    }

    #[test]
    fn each_field_merges_independently() {
        let defaults = ApiConfig::default()
            .with_serializer("json_group_encode")
            .with_groups(["public"])
            .with_cors_allow_origin(pattern("example\\.com"))
            .with_cors_allow_headers(["X-Default"])
            .with_cors_max_age(100);
        let path = ApiConfig::default()
            .with_groups(Vec::<String>::new())
            .with_cors_max_age(200);
        let compiler =
            ApiConfigCompiler::new(&defaults, &[PathConfig::with_prefix("/api", path)]);
        let action = ActionConfig::new().cors_allow_headers(["X-Action"]);

        let config = compiler.compile("/api/x", Some(&action)).unwrap();

        assert_eq!(config.serializer.as_deref(), Some("json_group_encode"));
        assert_eq!(config.groups, Some(Vec::new()));
        assert_eq!(config.cors_allow_origin_regex, Some(pattern("example\\.com")));
        assert_eq!(config.cors_allow_headers, Some(vec!["X-Action".to_string()]));
        assert_eq!(config.cors_max_age, Some(200));
    }

    #[test]
    fn default_config_layers_fallback_under_defaults() {
        let compiler = ApiConfigCompiler::new(&ApiConfig::default().with_cors_max_age(60), &[]);

        assert_eq!(compiler.default_config().cors_max_age, Some(60));
        assert_eq!(compiler.default_config().cors_allow_headers, Some(Vec::new()));
        assert_eq!(compiler.default_config().serializer, None);
    }
}
