//! Class-name strategies for generated endpoint classes.

use indexmap::IndexMap;

use super::name_normalizer::{normalize_class_name, route_to_name};
use crate::config::OpenApiConfig;
use crate::error::ResolveError;
use crate::parse::operation::Operation;

/// Computes the class name of the endpoint at `method path`.
pub trait NamingStrategy: Send + Sync {
    fn class_name(&self, path: &str, method: &str, operation: &Operation) -> String;
}

impl<F> NamingStrategy for F
where
    F: Fn(&str, &str, &Operation) -> String + Send + Sync,
{
    fn class_name(&self, path: &str, method: &str, operation: &Operation) -> String {
        self(path, method, operation)
    }
}

fn api_name(base: &str) -> String {
    format!("{}API", normalize_class_name(base))
}

fn route_api_name(path: &str, method: &str) -> String {
    api_name(&route_to_name(method, path))
}

/// `operationId` → `<OperationId>API`.
pub struct OperationIdStrategy;

impl NamingStrategy for OperationIdStrategy {
    fn class_name(&self, path: &str, method: &str, operation: &Operation) -> String {
        match operation.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => api_name(id),
            None => route_api_name(path, method),
        }
    }
}

/// `summary` → `<Summary>API`.
pub struct SummaryStrategy;

impl NamingStrategy for SummaryStrategy {
    fn class_name(&self, path: &str, method: &str, operation: &Operation) -> String {
        match operation.summary.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(summary) => api_name(summary),
            None => route_api_name(path, method),
        }
    }
}

/// First tag followed by the route name: `users` + `GET /users/{id}` → `UsersGetUserAPI`.
pub struct TagsStrategy;

impl NamingStrategy for TagsStrategy {
    fn class_name(&self, path: &str, method: &str, operation: &Operation) -> String {
        let route = route_to_name(method, path);
        match operation.tags.first().filter(|t| !t.trim().is_empty()) {
            Some(tag) => {
                let tag = normalize_class_name(tag);
                api_name(&format!("{}{route}", tag.trim_end_matches('_')))
            }
            None => api_name(&route),
        }
    }
}

/// Route-derived names only.
pub struct PathMethodStrategy;

impl NamingStrategy for PathMethodStrategy {
    fn class_name(&self, path: &str, method: &str, _operation: &Operation) -> String {
        route_api_name(path, method)
    }
}

pub const OPERATION_ID: &str = "apitk.strategies.operation_id";
pub const SUMMARY: &str = "apitk.strategies.summary";
pub const TAGS: &str = "apitk.strategies.tags";
pub const PATH_METHOD: &str = "apitk.strategies.path_method";

/// Naming strategies addressable by dotted name.
pub struct StrategyRegistry {
    strategies: IndexMap<String, Box<dyn NamingStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self {
            strategies: IndexMap::new(),
        };
        registry.register(OPERATION_ID, OperationIdStrategy);
        registry.register(SUMMARY, SummaryStrategy);
        registry.register(TAGS, TagsStrategy);
        registry.register(PATH_METHOD, PathMethodStrategy);
        registry
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy, replacing any previous one under `name`.
    pub fn register(&mut self, name: impl Into<String>, strategy: impl NamingStrategy + 'static) {
        self.strategies.insert(name.into(), Box::new(strategy));
    }

    pub fn get(&self, name: &str) -> Result<&dyn NamingStrategy, ResolveError> {
        self.strategies
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| ResolveError::UnknownStrategy(name.to_string()))
    }

    /// The strategy selected by `config`: `custom_strategy` when set,
    /// otherwise the built-in named by `class_name_strategy`.
    pub fn resolve(&self, config: &OpenApiConfig) -> Result<&dyn NamingStrategy, ResolveError> {
        match &config.custom_strategy {
            Some(custom) => self.get(custom),
            None => self.get(&format!(
                "apitk.strategies.{}",
                config.class_name_strategy.as_str()
            )),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassNameStrategy;

    fn op(id: Option<&str>, summary: Option<&str>, tags: &[&str]) -> Operation {
        Operation {
            operation_id: id.map(String::from),
            summary: summary.map(String::from),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn operation_id_strategy() {
        let s = OperationIdStrategy;
        assert_eq!(s.class_name("/ping", "get", &op(Some("ping"), None, &[])), "PingAPI");
        assert_eq!(
            s.class_name("/users", "get", &op(Some("list_users"), None, &[])),
            "ListUsersAPI"
        );
        assert_eq!(
            s.class_name("/users/{id}", "get", &op(None, None, &[])),
            "GetUserAPI"
        );
    }

    #[test]
    fn summary_strategy() {
        let s = SummaryStrategy;
        assert_eq!(
            s.class_name("/u", "get", &op(None, Some("fetch current user"), &[])),
            "FetchCurrentUserAPI"
        );
        assert_eq!(s.class_name("/u", "post", &op(None, None, &[])), "CreateUAPI");
    }

    #[test]
    fn tags_strategy() {
        let s = TagsStrategy;
        assert_eq!(
            s.class_name("/users/{id}", "get", &op(None, None, &["users"])),
            "UsersGetUserAPI"
        );
        assert_eq!(s.class_name("/users", "get", &op(None, None, &[])), "ListUsersAPI");
    }

    #[test]
    fn closures_are_strategies() {
        let mut registry = StrategyRegistry::new();
        registry.register("my.naming", |path: &str, method: &str, _: &Operation| {
            format!("{}{}", method.to_uppercase(), path.len())
        });
        let strategy = registry.get("my.naming").unwrap();
        assert_eq!(strategy.class_name("/abc", "get", &Operation::default()), "GET4");
    }

    #[test]
    fn resolve_prefers_custom() {
        let registry = StrategyRegistry::new();
        let mut config = OpenApiConfig {
            class_name_strategy: ClassNameStrategy::Summary,
            ..Default::default()
        };
        let operation = op(Some("ping"), Some("say hello"), &[]);
        let chosen = registry.resolve(&config).unwrap();
        assert_eq!(chosen.class_name("/ping", "get", &operation), "SayHelloAPI");

        config.custom_strategy = Some(OPERATION_ID.to_string());
        let chosen = registry.resolve(&config).unwrap();
        assert_eq!(chosen.class_name("/ping", "get", &operation), "PingAPI");

        config.custom_strategy = Some("missing.strategy".to_string());
        assert!(matches!(
            registry.resolve(&config),
            Err(ResolveError::UnknownStrategy(_))
        ));
    }
}
