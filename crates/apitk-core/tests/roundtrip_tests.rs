use apitk_core::compat;
use apitk_core::ir::DataModel;
use apitk_core::load::{DocumentFormat, parse_document};
use apitk_core::parse::schema::SchemaOrRef;
use apitk_core::transform::schema_parser::DEFAULT_MAX_RECURSION_DEPTH;
use apitk_core::transform::{JsonSchemaParser, ReferenceResolver};
use indexmap::IndexMap;
use serde_json::{Value, json};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const SWAGGER_UPLOAD: &str = include_str!("fixtures/swagger-upload.json");

fn parse_components(schemas: IndexMap<String, SchemaOrRef>) -> Vec<DataModel> {
    let names: Vec<String> = schemas.keys().cloned().collect();
    let mut parser =
        JsonSchemaParser::new(ReferenceResolver::new(schemas), DEFAULT_MAX_RECURSION_DEPTH);
    for name in &names {
        parser.parse_component(name).unwrap();
    }
    parser.registry().models().cloned().collect()
}

fn petstore_schemas() -> IndexMap<String, SchemaOrRef> {
    let doc = parse_document("petstore.yaml", PETSTORE, DocumentFormat::Yaml).unwrap();
    serde_json::from_value(doc["components"]["schemas"].clone()).unwrap()
}

#[test]
fn models_survive_reserialization() {
    let models = parse_components(petstore_schemas());
    assert_eq!(models.len(), 5);

    // Re-emit every model under its own name, in the same order.
    let reserialized: IndexMap<String, SchemaOrRef> = petstore_schemas()
        .keys()
        .map(|raw| {
            let model = models.iter().find(|m| &m.name == raw).unwrap();
            (raw.clone(), SchemaOrRef::from(model.to_schema()))
        })
        .collect();
    let reparsed = parse_components(reserialized);

    for model in &models {
        let again = reparsed
            .iter()
            .find(|m| m.normalized_name == model.normalized_name)
            .unwrap();
        assert_eq!(again, model, "model {} changed", model.normalized_name);
    }
}

#[test]
fn openapi3_adaptation_is_a_no_op() {
    let doc = parse_document("petstore.yaml", PETSTORE, DocumentFormat::Yaml).unwrap();
    assert_eq!(compat::adapt(&doc), doc);
}

#[test]
fn adaptation_is_idempotent_for_swagger() {
    let doc = parse_document("upload.json", SWAGGER_UPLOAD, DocumentFormat::Json).unwrap();
    let once = compat::adapt(&doc);
    assert_eq!(compat::adapt(&once), once);
}

#[test]
fn swagger_body_and_form_data_merge() {
    let doc = parse_document("upload.json", SWAGGER_UPLOAD, DocumentFormat::Json).unwrap();
    let adapted = compat::prepare(&doc).unwrap();

    assert_eq!(adapted["openapi"], json!("3.0.0"));
    assert_eq!(adapted["servers"][0]["url"], json!("https://files.example.com/api"));
    assert!(adapted["components"]["schemas"]["Meta"].is_object());

    let op = &adapted["paths"]["/upload"]["post"];
    let schema = &op["requestBody"]["content"]["multipart/form-data"]["schema"];
    assert_eq!(schema["type"], json!("object"));
    assert_eq!(
        schema["properties"]["file"],
        json!({ "type": "string", "format": "binary", "description": "payload" })
    );
    assert_eq!(schema["allOf"], json!([{ "$ref": "#/components/schemas/Meta" }]));
    assert_eq!(op["requestBody"]["required"], json!(true));

    let fetch = &adapted["paths"]["/files/{fileId}"]["get"];
    assert_eq!(fetch["operationId"], json!("fetch_file_metadata"));
    let params = fetch["parameters"].as_array().unwrap();
    let names: Vec<&str> = params.iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names, vec!["fileId", "fields"]);
    assert!(params[1].get("collectionFormat").is_none());
    assert_eq!(params[1]["schema"]["items"], json!({ "type": "string" }));

    let size = &adapted["components"]["schemas"]["Meta"]["properties"]["size"];
    assert_eq!(size["nullable"], Value::Bool(true));
    assert!(size.get("x-nullable").is_none());
}
