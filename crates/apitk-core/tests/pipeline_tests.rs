use apitk_core::config::{ClassNameStrategy, OpenApiConfig};
use apitk_core::ir::{APIGroup, EndpointBody};
use apitk_core::load::{DocumentFormat, parse_document};
use apitk_core::transform::{self, StrategyRegistry};
use apitk_core::spec_from_value;
use serde_json::json;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const SWAGGER_UPLOAD: &str = include_str!("fixtures/swagger-upload.json");
const CYCLIC: &str = include_str!("fixtures/cyclic.yaml");

fn groups_from(source: &str, content: &str, config: &OpenApiConfig) -> Vec<APIGroup> {
    let document = parse_document(source, content, DocumentFormat::Unknown).unwrap();
    let spec = spec_from_value(&document).unwrap();
    transform::transform(&spec, &StrategyRegistry::new(), config).unwrap()
}

fn groups_of(content: &str) -> Vec<APIGroup> {
    groups_from("inline", content, &OpenApiConfig::default())
}

fn group<'a>(groups: &'a [APIGroup], tag: &str) -> &'a APIGroup {
    groups
        .iter()
        .find(|g| g.tag == tag)
        .unwrap_or_else(|| panic!("no group tagged {tag}"))
}

fn field_names(fields: &[apitk_core::ir::DataModelField]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn petstore_groups_in_first_seen_order() {
    let groups = groups_of(PETSTORE);
    let tags: Vec<&str> = groups.iter().map(|g| g.tag.as_str()).collect();
    assert_eq!(tags, vec!["pets", "admin", "store", "default"]);

    let pets = group(&groups, "pets");
    let classes: Vec<&str> = pets.endpoints.iter().map(|e| e.class_name.as_str()).collect();
    assert_eq!(
        classes,
        vec!["ListPetsAPI", "CreatePetAPI", "ShowPetByIdAPI", "DeletePetAPI"]
    );
    let models: Vec<&str> = pets.models.keys().map(String::as_str).collect();
    assert_eq!(models, vec!["PetStatus", "NewPet", "Pet", "PetPage"]);

    // OPTIONS is never generated; /health has no tag.
    let default = group(&groups, "default");
    assert_eq!(default.endpoints.len(), 1);
    assert_eq!(default.endpoints[0].class_name, "ListHealthAPI");
    assert!(group(&groups, "admin").models.is_empty());
}

#[test]
fn petstore_parameters_and_bodies() {
    let groups = groups_of(PETSTORE);
    let pets = group(&groups, "pets");

    let list = &pets.endpoints[0];
    assert_eq!(list.query_parameters[0].name, "limit");
    assert_eq!(list.query_parameters[0].default, Some(json!(20)));
    assert!(!list.query_parameters[0].required);
    assert_eq!(list.header_parameters[0].data_type.type_hint, "UUID");
    assert_eq!(list.header_parameters[0].alias.as_deref(), Some("X-Trace-Id"));
    assert_eq!(list.response.as_ref().unwrap().normalized_name, "PetPage");

    let create = &pets.endpoints[1];
    match &create.request_body {
        Some(EndpointBody::Model(model)) => assert_eq!(model.normalized_name, "NewPet"),
        other => panic!("unexpected body {other:?}"),
    }

    let show = &pets.endpoints[2];
    assert_eq!(show.path_parameters[0].name, "petId");
    assert!(show.path_parameters[0].required);

    let delete = &pets.endpoints[3];
    assert!(delete.deprecated);
    assert!(delete.response_type.is_none());

    let store = group(&groups, "store");
    let inventory = &store.endpoints[0];
    assert_eq!(inventory.response_type.as_ref().unwrap().type_hint, "Dict[str, int]");
    assert!(inventory.response.is_none());
}

#[test]
fn petstore_all_of_model() {
    let groups = groups_of(PETSTORE);
    let pet = &group(&groups, "pets").models["Pet"];
    assert_eq!(field_names(&pet.fields), vec!["name", "id", "tag", "status", "born"]);
    assert_eq!(pet.description.as_deref(), Some("A pet in the store."));
    assert_eq!(pet.fields[2].data_type.type_hint, "Optional[str]");
    assert_eq!(pet.fields[3].data_type.type_hint, "PetStatus");
    assert_eq!(pet.fields[4].data_type.type_hint, "datetime");
    assert!(pet.required.contains("name") && pet.required.contains("id"));
}

#[test]
fn swagger_upload_is_adapted_end_to_end() {
    let groups = groups_of(SWAGGER_UPLOAD);
    let files = group(&groups, "files");

    let upload = &files.endpoints[0];
    assert_eq!(upload.class_name, "UploadFileAPI");
    assert_eq!(upload.request_content_type.as_deref(), Some("multipart/form-data"));
    let Some(EndpointBody::Model(body)) = &upload.request_body else {
        panic!("expected a merged form model");
    };
    assert_eq!(field_names(&body.fields), vec!["name", "file", "size", "labels"]);
    assert_eq!(body.fields[1].data_type.type_hint, "bytes");
    assert_eq!(body.fields[1].description.as_deref(), Some("payload"));
    assert_eq!(body.fields[2].data_type.type_hint, "Optional[int]");
    assert_eq!(upload.response.as_ref().unwrap().normalized_name, "Stored");

    let fetch = &files.endpoints[1];
    assert_eq!(fetch.class_name, "FetchFileMetadataAPI");
    assert_eq!(fetch.path_parameters[0].data_type.type_hint, "str");
    assert_eq!(fetch.query_parameters[0].data_type.type_hint, "List[str]");
    assert_eq!(fetch.response.as_ref().unwrap().normalized_name, "Meta");
}

#[test]
fn cycles_resolve_to_forward_refs() {
    let groups = groups_of(CYCLIC);
    let default = group(&groups, "default");
    let models: Vec<&str> = default.models.keys().map(String::as_str).collect();
    assert_eq!(models, vec!["Tree", "Company", "Person"]);

    let tree = &default.models["Tree"];
    assert_eq!(tree.fields[0].data_type.type_hint, "Optional[int]");
    assert!(tree.fields[1].data_type.data_types[0].is_forward_ref);

    let company = &default.models["Company"];
    assert!(company.fields[0].data_type.is_forward_ref);
    let person = &default.models["Person"];
    assert!(!person.fields[1].data_type.is_forward_ref);
}

#[test]
fn missing_component_degrades_to_any() {
    let groups = groups_of(CYCLIC);
    let ghosts = &group(&groups, "default").endpoints[2];
    assert_eq!(ghosts.class_name, "ListGhostsAPI");
    assert!(ghosts.response_type.as_ref().unwrap().is_any());
    assert!(ghosts.response.is_none());
}

#[test]
fn scenario_minimal_path_without_tags() {
    let doc = json!({
        "openapi": "3.0.0",
        "info": { "title": "t", "version": "1" },
        "paths": { "/ping": { "get": { "operationId": "ping", "responses": { "200": { "description": "ok" } } } } }
    });
    let groups = groups_of(&doc.to_string());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].tag, "default");
    let ep = &groups[0].endpoints[0];
    assert_eq!(ep.class_name, "PingAPI");
    assert!(ep.path_parameters.is_empty() && ep.query_parameters.is_empty());
    assert!(ep.header_parameters.is_empty());
    assert!(ep.request_body.is_none());
    assert!(ep.response.is_none());
}

#[test]
fn scenario_integer_path_parameter() {
    let doc = json!({
        "openapi": "3.0.0",
        "info": { "title": "t", "version": "1" },
        "paths": { "/users/{user_id}": { "get": {
            "parameters": [{ "name": "user_id", "in": "path", "required": true, "schema": { "type": "integer" } }],
            "responses": {}
        } } }
    });
    for strategy in [ClassNameStrategy::OperationId, ClassNameStrategy::Summary, ClassNameStrategy::Tags] {
        let config = OpenApiConfig {
            class_name_strategy: strategy,
            ..Default::default()
        };
        let groups = groups_from("inline", &doc.to_string(), &config);
        let ep = &groups[0].endpoints[0];
        assert_eq!(ep.path, "/users/{user_id}");
        assert_eq!(ep.path_parameters.len(), 1);
        assert_eq!(ep.path_parameters[0].name, "user_id");
        assert_eq!(ep.path_parameters[0].data_type.type_hint, "int");
        assert!(ep.path_parameters[0].required);
    }
}

#[test]
fn scenario_inline_body_with_chinese_keys() {
    let doc = json!({
        "openapi": "3.0.0",
        "info": { "title": "t", "version": "1" },
        "paths": { "/订单": { "post": {
            "requestBody": { "content": { "application/json": { "schema": {
                "type": "object",
                "properties": { "price": { "type": "number" }, "订单号": { "type": "string" } },
                "required": ["订单号"]
            } } } },
            "responses": {}
        } } }
    });
    let groups = groups_of(&doc.to_string());
    let Some(EndpointBody::Model(body)) = &groups[0].endpoints[0].request_body else {
        panic!("expected a model body");
    };
    assert!(body.normalized_name.ends_with("RequestBody"));
    assert!(body.is_inline);
    let first = &body.fields[0];
    assert!(first.required);
    assert_eq!(first.alias.as_deref(), Some("订单号"));
    assert!(first.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    assert_eq!(body.fields[1].name, "price");
}

#[test]
fn scenario_enum_with_keywords() {
    let doc = json!({
        "openapi": "3.0.0",
        "info": { "title": "t", "version": "1" },
        "paths": { "/jobs": { "get": {
            "operationId": "listJobs",
            "responses": { "200": { "description": "ok", "content": { "application/json": {
                "schema": { "$ref": "#/components/schemas/Status" }
            } } } }
        } } },
        "components": { "schemas": { "Status": { "type": "string", "enum": ["for", "while", "done"] } } }
    });
    let groups = groups_of(&doc.to_string());
    let status = &groups[0].models["Status"];
    assert!(status.is_enum);
    assert_eq!(field_names(&status.fields), vec!["for_", "while_", "done"]);
    let aliases: Vec<Option<&str>> = status.fields.iter().map(|f| f.alias.as_deref()).collect();
    assert_eq!(aliases, vec![Some("for"), Some("while"), None]);
}

#[test]
fn invalid_documents_are_rejected_before_parsing() {
    let document = json!({ "openapi": "3.0.0", "paths": { "users": {} } });
    let err = spec_from_value(&document).unwrap_err().to_string();
    assert!(err.contains("missing `info`"));
    assert!(err.contains("path `users` must start with `/`"));
}

#[test]
fn scenario_subtype_cycle_and_colliding_inline_name() {
    let doc = json!({
        "openapi": "3.0.0",
        "info": { "title": "t", "version": "1" },
        "paths": {
            "/orders/{id}": { "get": {
                "operationId": "getOrder",
                "parameters": [{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }],
                "responses": { "200": { "description": "ok", "content": { "application/json": { "schema": {
                    "type": "object",
                    "properties": { "order": { "$ref": "#/components/schemas/GetOrderResponse" } }
                } } } } }
            } },
            "/staff": { "get": {
                "operationId": "listStaff",
                "responses": { "200": { "description": "ok", "content": { "application/json": {
                    "schema": { "$ref": "#/components/schemas/Employee" }
                } } } }
            } }
        },
        "components": { "schemas": {
            "GetOrderResponse": {
                "type": "object",
                "properties": { "name": { "type": "string" }, "total": { "type": "number" } }
            },
            "Person": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "reports": { "type": "array", "items": { "$ref": "#/components/schemas/Employee" } }
                },
                "required": ["name"]
            },
            "Employee": {
                "allOf": [
                    { "$ref": "#/components/schemas/Person" },
                    { "type": "object", "properties": { "salary": { "type": "number" } } }
                ]
            }
        } }
    });
    let groups = groups_of(&doc.to_string());
    let models = &groups[0].models;

    assert_eq!(field_names(&models["GetOrderResponse"].fields), vec!["name", "total"]);
    assert!(!models["GetOrderResponse"].is_inline);
    let inline: Vec<&str> = models
        .values()
        .filter(|m| m.is_inline)
        .map(|m| m.normalized_name.as_str())
        .collect();
    assert_eq!(inline.len(), 1);
    assert_ne!(inline[0], "GetOrderResponse");

    assert_eq!(field_names(&models["Employee"].fields), vec!["name", "reports", "salary"]);
}
