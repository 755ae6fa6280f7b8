//! Walks `paths` and builds endpoint groups, one per tag.

use std::collections::{BTreeSet, HashSet, VecDeque};

use heck::ToSnakeCase;
use indexmap::IndexMap;

use super::name_normalizer::{normalize_field_name, normalize_package_name, route_to_name};
use super::naming::NamingStrategy;
use super::reference_resolver::ReferenceResolver;
use super::schema_parser::JsonSchemaParser;
use crate::error::ResolveError;
use crate::ir::{
    APIGroup, DataModel, DataModelField, DataType, Endpoint, EndpointBody, FieldConstraints,
    HttpMethod, ModelRegistry, dedupe_field_names, sort_required_first,
};
use crate::parse::components::Components;
use crate::parse::media_type::MediaType;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::parameter::{Parameter, ParameterLocation};
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::OpenApiSpec;

pub const DEFAULT_TAG: &str = "default";

const JSON_MEDIA_TYPE: &str = "application/json";

pub struct OpenApiParser<'a> {
    spec: &'a OpenApiSpec,
    strategy: &'a dyn NamingStrategy,
    schemas: JsonSchemaParser,
}

impl<'a> OpenApiParser<'a> {
    pub fn new(spec: &'a OpenApiSpec, strategy: &'a dyn NamingStrategy, max_depth: usize) -> Self {
        let resolver = ReferenceResolver::new(spec.components.schemas.clone());
        Self {
            spec,
            strategy,
            schemas: JsonSchemaParser::new(resolver, max_depth),
        }
    }

    /// Parse every generated operation into tag groups, in first-seen tag order.
    pub fn parse(mut self) -> Result<Vec<APIGroup>, ResolveError> {
        let spec = self.spec;
        let mut groups: IndexMap<String, APIGroup> = IndexMap::new();
        let mut packages: HashSet<String> = HashSet::new();

        for (path, item) in &spec.paths {
            for (method_name, operation) in item.operations() {
                let Some(method) = HttpMethod::from_lowercase(method_name) else {
                    log::debug!("skipping {} {path}", method_name.to_uppercase());
                    continue;
                };
                let tags = if operation.tags.is_empty() {
                    vec![DEFAULT_TAG.to_string()]
                } else {
                    operation.tags.clone()
                };
                self.schemas.set_tags(&tags);
                let endpoint = self.parse_endpoint(path, method, item, operation, &tags)?;
                log::debug!(
                    "{} {path} -> {} ({})",
                    method.as_str(),
                    endpoint.class_name,
                    tags.join(", ")
                );

                for tag in &tags {
                    let group = groups.entry(tag.clone()).or_insert_with(|| {
                        APIGroup::new(tag.clone(), unique_package(&mut packages, tag))
                    });
                    group.add_endpoint(endpoint.clone());
                }
            }
        }

        let registry = self.schemas.registry();
        for group in groups.values_mut() {
            group.models = collect_models(registry, group)?;
        }
        Ok(groups.into_values().collect())
    }

    /// Registry of every model parsed so far.
    pub fn registry(&self) -> &ModelRegistry {
        self.schemas.registry()
    }

    fn parse_endpoint(
        &mut self,
        path: &str,
        method: HttpMethod,
        item: &'a PathItem,
        operation: &'a Operation,
        tags: &[String],
    ) -> Result<Endpoint, ResolveError> {
        let class_name = self.strategy.class_name(path, method.as_lower(), operation);
        let stem = class_name
            .strip_suffix("API")
            .filter(|s| !s.is_empty())
            .unwrap_or(&class_name)
            .to_string();

        let mut path_parameters = Vec::new();
        let mut query_parameters = Vec::new();
        let mut header_parameters = Vec::new();
        let spec = self.spec;
        for param in merged_parameters(&spec.components, item, operation) {
            let bucket = match param.location {
                ParameterLocation::Path => &mut path_parameters,
                ParameterLocation::Query => &mut query_parameters,
                ParameterLocation::Header => &mut header_parameters,
                ParameterLocation::Cookie => {
                    log::debug!("skipping cookie parameter `{}` of {path}", param.name);
                    continue;
                }
            };
            bucket.push(self.parse_parameter(param)?);
        }
        for bucket in [&mut path_parameters, &mut query_parameters, &mut header_parameters] {
            dedupe_field_names(bucket.as_mut_slice());
            sort_required_first(bucket.as_mut_slice());
        }

        let (request_body, request_content_type) = self.parse_request_body(operation, &stem)?;
        let response_type = self.parse_response(operation, &stem)?;
        let response = match &response_type {
            Some(ty) => self.model_of(ty)?,
            None => None,
        };

        let endpoint_id = match &operation.operation_id {
            Some(id) => id.clone(),
            None => route_to_name(method.as_lower(), path).to_snake_case(),
        };

        let mut endpoint = Endpoint {
            class_name,
            path: path.to_string(),
            method,
            endpoint_id,
            tags: tags.to_vec(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            deprecated: operation.deprecated,
            path_parameters,
            query_parameters,
            header_parameters,
            request_body,
            request_content_type,
            response,
            response_type,
            imports: BTreeSet::new(),
        };
        endpoint.collect_imports();
        Ok(endpoint)
    }

    fn parse_parameter(&mut self, param: &Parameter) -> Result<DataModelField, ResolveError> {
        let context = format!("{}Param", param.name);
        let schema = match (&param.schema, param.content.get(JSON_MEDIA_TYPE)) {
            (Some(schema), _) => Some(schema),
            (None, Some(media)) => media.schema.as_ref(),
            (None, None) => {
                if let Some(media_type) = param.content.keys().next() {
                    log::warn!(
                        "parameter `{}` uses unsupported media type {media_type}; using Any",
                        param.name
                    );
                }
                None
            }
        };
        let data_type = match schema {
            Some(schema) => self.schemas.parse_schema(schema, &context)?,
            None => DataType::any(),
        };

        let (name, alias) = normalize_field_name(&param.name);
        let mut field = DataModelField::new(name, data_type);
        field.alias = alias;
        field.required = param.required || param.location == ParameterLocation::Path;
        field.description = param.description.clone();
        if let Some(SchemaOrRef::Schema(inner)) = schema {
            field.default = inner.default_value.clone();
            field.constraints = FieldConstraints::from_schema(inner);
            if field.description.is_none() {
                field.description = inner.description.clone();
            }
        }
        field.schema = schema.cloned();
        Ok(field)
    }

    fn parse_request_body(
        &mut self,
        operation: &Operation,
        stem: &str,
    ) -> Result<(Option<EndpointBody>, Option<String>), ResolveError> {
        let spec = self.spec;
        let Some(body) = operation
            .request_body
            .as_ref()
            .and_then(|b| spec.components.resolve_request_body(b))
        else {
            return Ok((None, None));
        };
        let Some((content_type, media)) = body.preferred_content() else {
            if let Some(media_type) = body.content.keys().next() {
                log::warn!("request body media type {media_type} is not supported; skipping body");
            }
            return Ok((None, None));
        };
        let Some(schema) = &media.schema else {
            return Ok((None, Some(content_type.to_string())));
        };

        let ty = self
            .schemas
            .parse_schema(schema, &format!("{stem}RequestBody"))?;
        let body = match self.model_of(&ty)? {
            Some(model) => EndpointBody::Model(model),
            None => EndpointBody::Type(ty),
        };
        Ok((Some(body), Some(content_type.to_string())))
    }

    /// Type of the first 2xx JSON response.
    fn parse_response(
        &mut self,
        operation: &Operation,
        stem: &str,
    ) -> Result<Option<DataType>, ResolveError> {
        let spec = self.spec;
        let Some((status, response)) = operation
            .responses
            .iter()
            .find(|(code, _)| code.starts_with('2'))
        else {
            return Ok(None);
        };
        let Some(response) = spec.components.resolve_response(response) else {
            return Ok(None);
        };
        let Some(schema) = json_content(&response.content).and_then(|m| m.schema.as_ref()) else {
            log::debug!("{status} response of {stem} carries no JSON schema");
            return Ok(None);
        };
        self.schemas
            .parse_schema(schema, &format!("{stem}Response"))
            .map(Some)
    }

    /// The registered model behind a plain custom type.
    fn model_of(&self, ty: &DataType) -> Result<Option<DataModel>, ResolveError> {
        if ty.is_forward_ref {
            return Ok(None);
        }
        match ty.model_name() {
            Some(name) => Ok(self.schemas.model(name)?.cloned()),
            None => Ok(None),
        }
    }
}

/// `application/json`, then any JSON-flavoured media type.
fn json_content(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content.get(JSON_MEDIA_TYPE).or_else(|| {
        content
            .iter()
            .find(|(media_type, _)| {
                media_type.starts_with(JSON_MEDIA_TYPE) || media_type.ends_with("+json")
            })
            .map(|(_, media)| media)
    })
}

/// Path-level parameters overridden by operation-level ones with the same
/// `(name, in)`.
fn merged_parameters<'s>(
    components: &'s Components,
    item: &'s PathItem,
    operation: &'s Operation,
) -> Vec<&'s Parameter> {
    let mut merged: Vec<&Parameter> = Vec::new();
    for param in item.parameters.iter().chain(&operation.parameters) {
        let Some(param) = components.resolve_parameter(param) else {
            continue;
        };
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    merged
}

fn unique_package(used: &mut HashSet<String>, tag: &str) -> String {
    let base = normalize_package_name(tag);
    let mut package = base.clone();
    let mut counter = 2;
    while used.contains(&package) {
        package = format!("{base}_{counter}");
        counter += 1;
    }
    used.insert(package.clone());
    package
}

/// Models a group needs: everything its endpoints reference, everything
/// tagged with its tag, and their transitive dependencies. Registry order.
fn collect_models(
    registry: &ModelRegistry,
    group: &APIGroup,
) -> Result<IndexMap<String, DataModel>, ResolveError> {
    let mut queue: VecDeque<String> = VecDeque::new();
    for endpoint in &group.endpoints {
        queue.extend(endpoint.referenced_models().into_iter().map(String::from));
    }
    queue.extend(
        registry
            .models()
            .filter(|m| m.tags.contains(&group.tag))
            .map(|m| m.normalized_name.clone()),
    );

    let mut wanted: HashSet<String> = HashSet::new();
    while let Some(name) = queue.pop_front() {
        if !wanted.insert(name.clone()) {
            continue;
        }
        match registry.get(&name)? {
            Some(model) => queue.extend(model.dependencies().into_iter().map(String::from)),
            None => log::warn!("model `{name}` used by tag `{}` was never registered", group.tag),
        }
    }

    Ok(registry
        .models()
        .filter(|m| wanted.contains(&m.normalized_name))
        .map(|m| (m.normalized_name.clone(), m.clone()))
        .collect())
}
