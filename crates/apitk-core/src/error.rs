use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {0} as JSON or YAML: {1}")]
    Parse(String, String),

    #[error("unsupported spec source: {0}")]
    UnsupportedSource(String),
}

/// Structural defects found after Swagger 2 adaptation.
#[derive(Debug, Error)]
#[error("invalid OpenAPI document:\n  - {}", .0.join("\n  - "))]
pub struct ValidationError(pub Vec<String>);

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("model `{0}` was looked up while still a placeholder")]
    PlaceholderLookup(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("unknown naming strategy: {0}")]
    UnknownStrategy(String),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("transform failed: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_defect() {
        let err = ValidationError(vec![
            "missing `info`".to_string(),
            "missing `paths`".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("  - missing `info`"));
        assert!(msg.contains("  - missing `paths`"));
    }
}
