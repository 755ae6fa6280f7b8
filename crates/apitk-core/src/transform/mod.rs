pub mod name_normalizer;
pub mod naming;
pub mod openapi_parser;
pub mod reference_resolver;
pub mod schema_parser;

pub use naming::{NamingStrategy, StrategyRegistry};
pub use openapi_parser::OpenApiParser;
pub use reference_resolver::ReferenceResolver;
pub use schema_parser::JsonSchemaParser;

use crate::config::OpenApiConfig;
use crate::error::ResolveError;
use crate::ir::APIGroup;
use crate::parse::spec::OpenApiSpec;

/// Build tag groups with the naming strategy and recursion limit from `config`.
pub fn transform(
    spec: &OpenApiSpec,
    strategies: &StrategyRegistry,
    config: &OpenApiConfig,
) -> Result<Vec<APIGroup>, ResolveError> {
    let strategy = strategies.resolve(config)?;
    OpenApiParser::new(spec, strategy, config.max_recursion_depth).parse()
}
