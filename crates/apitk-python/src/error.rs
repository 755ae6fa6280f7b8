use apitk_core::error::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("`{name}` from `{module}` imported both as `{first}` and as `{second}`")]
    ImportConflict {
        module: String,
        name: String,
        first: String,
        second: String,
    },

    #[error("cannot format {path}: line {line}: {message}\n{excerpt}")]
    Format {
        path: String,
        line: usize,
        message: String,
        excerpt: String,
    },

    #[error("failed to run formatter `{command}`: {source}")]
    FormatterUnavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),
}
