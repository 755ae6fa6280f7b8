//! Intermediate representation produced by the schema engine and the
//! OpenAPI parser, consumed by generators.

pub mod data_type;
pub mod endpoint;
pub mod model;
pub mod registry;

pub use data_type::{DataType, Import, MODELS_MODULE, TypeKind, python_literal};
pub use endpoint::{APIGroup, Endpoint, EndpointBody, HttpMethod};
pub use model::{
    DataModel, DataModelField, FieldConstraints, dedupe_field_names, sort_required_first,
};
pub use registry::ModelRegistry;
