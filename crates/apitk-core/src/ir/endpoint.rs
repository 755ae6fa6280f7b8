use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::data_type::{DataType, Import};
use super::model::{DataModel, DataModelField};

/// HTTP methods client classes are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn from_lowercase(method: &str) -> Option<Self> {
        match method {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Lowercase name, as used by the route decorator.
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }
}

/// Request body of an endpoint: a model for object schemas, a bare type otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EndpointBody {
    Model(DataModel),
    Type(DataType),
}

impl EndpointBody {
    /// Annotation naming the body type.
    pub fn type_hint(&self) -> &str {
        match self {
            EndpointBody::Model(model) => &model.normalized_name,
            EndpointBody::Type(ty) => &ty.type_hint,
        }
    }
}

/// One HTTP method at one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub class_name: String,
    pub path: String,
    pub method: HttpMethod,
    pub endpoint_id: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deprecated: bool,
    pub path_parameters: Vec<DataModelField>,
    pub query_parameters: Vec<DataModelField>,
    pub header_parameters: Vec<DataModelField>,
    pub request_body: Option<EndpointBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_content_type: Option<String>,
    /// Model of the first 2xx JSON response, when it is one.
    pub response: Option<DataModel>,
    /// Full type of the first 2xx JSON response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<DataType>,
    #[serde(skip)]
    pub imports: BTreeSet<Import>,
}

impl Endpoint {
    pub fn parameters(&self) -> impl Iterator<Item = &DataModelField> {
        self.path_parameters
            .iter()
            .chain(&self.query_parameters)
            .chain(&self.header_parameters)
    }

    /// Every type mentioned by the endpoint signature. A model body counts
    /// through its name only.
    pub fn data_types(&self) -> Vec<&DataType> {
        let mut types: Vec<&DataType> = self.parameters().map(|f| &f.data_type).collect();
        if let Some(EndpointBody::Type(ty)) = &self.request_body {
            types.push(ty);
        }
        if let Some(ty) = &self.response_type {
            types.push(ty);
        }
        types
    }

    /// Names of the models the endpoint refers to directly.
    pub fn referenced_models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(EndpointBody::Model(model)) = &self.request_body {
            names.push(&model.normalized_name);
        }
        for ty in self.data_types() {
            for name in ty.custom_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn collect_imports(&mut self) {
        let mut imports: BTreeSet<Import> = BTreeSet::new();
        for ty in self.data_types() {
            imports.extend(ty.imports.iter().cloned());
        }
        if let Some(EndpointBody::Model(model)) = &self.request_body {
            imports.insert(Import::model(&model.normalized_name));
        }
        self.imports = imports;
    }
}

/// Endpoints and models sharing one tag; rendered as one package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct APIGroup {
    pub tag: String,
    /// Directory name of the generated package.
    pub package: String,
    pub endpoints: Vec<Endpoint>,
    pub models: IndexMap<String, DataModel>,
    #[serde(skip)]
    pub endpoint_names: BTreeSet<String>,
}

impl APIGroup {
    pub fn new(tag: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            package: package.into(),
            endpoints: Vec::new(),
            models: IndexMap::new(),
            endpoint_names: BTreeSet::new(),
        }
    }

    /// Add an endpoint, renaming it `<Name>_1`, `<Name>_2`, … on collision.
    pub fn add_endpoint(&mut self, mut endpoint: Endpoint) {
        endpoint.class_name = self.unique_class_name(&endpoint.class_name);
        self.endpoint_names.insert(endpoint.class_name.clone());
        self.endpoints.push(endpoint);
    }

    fn unique_class_name(&self, base: &str) -> String {
        if !self.endpoint_names.contains(base) {
            return base.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{base}_{counter}");
            if !self.endpoint_names.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}
