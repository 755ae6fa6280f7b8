//! Swagger 2.0 → OpenAPI 3.0 rewriting.

use serde_json::{Map, Value, json};

use super::schema_walk::normalize_schema_node;

const METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Keys moved from a Swagger 2 non-body parameter into its `schema`.
const SCHEMA_KEYS: [&str; 16] = [
    "type",
    "format",
    "enum",
    "items",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";
const JSON_MEDIA: &str = "application/json";

/// Ref prefix migrations, Swagger namespace → components namespace.
const REF_MIGRATIONS: [(&str, &str); 4] = [
    ("#/definitions/", "#/components/schemas/"),
    ("#/parameters/", "#/components/parameters/"),
    ("#/responses/", "#/components/responses/"),
    ("#/securityDefinitions/", "#/components/securitySchemes/"),
];

/// Nesting bound for the `$ref` migration walk.
const MAX_MIGRATION_DEPTH: usize = 512;

/// Returns `true` when the document declares `swagger: "2.x"`, quoted or not.
pub fn is_swagger2(doc: &Value) -> bool {
    doc.get("swagger")
        .and_then(super::version_text)
        .is_some_and(|v| v.starts_with('2'))
}

/// Document-wide defaults and lookup tables used while rewriting operations.
struct SwaggerContext<'a> {
    consumes: Vec<String>,
    produces: Vec<String>,
    parameters: Option<&'a Map<String, Value>>,
}

/// Rewrite a Swagger 2.0 document into an OpenAPI 3.0 shaped tree.
pub fn convert(doc: &Map<String, Value>) -> Map<String, Value> {
    let ctx = SwaggerContext {
        consumes: string_list(doc.get("consumes")),
        produces: string_list(doc.get("produces")),
        parameters: doc.get("parameters").and_then(Value::as_object),
    };

    let mut out = Map::new();
    out.insert("openapi".to_string(), json!("3.0.0"));
    out.insert("info".to_string(), convert_info(doc.get("info")));
    out.insert("servers".to_string(), Value::Array(build_servers(doc)));

    let mut paths = Map::new();
    if let Some(src_paths) = doc.get("paths").and_then(Value::as_object) {
        for (path, item) in src_paths {
            let converted = match item.as_object() {
                Some(item) => Value::Object(convert_path_item(item, &ctx)),
                None => item.clone(),
            };
            paths.insert(path.clone(), converted);
        }
    }
    if doc.contains_key("paths") {
        out.insert("paths".to_string(), Value::Object(paths));
    }

    let components = build_components(doc, &ctx);
    if !components.is_empty() {
        out.insert("components".to_string(), Value::Object(components));
    }

    for key in ["tags", "security", "externalDocs"] {
        if let Some(v) = doc.get(key) {
            out.insert(key.to_string(), v.clone());
        }
    }
    for (key, v) in doc {
        if key.starts_with("x-") {
            out.insert(key.clone(), v.clone());
        }
    }

    let mut converted = Value::Object(out);
    migrate_refs(&mut converted, 0);
    match converted {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn convert_info(info: Option<&Value>) -> Value {
    let mut info = info.and_then(Value::as_object).cloned().unwrap_or_default();
    if !info.get("title").is_some_and(Value::is_string) {
        info.insert("title".to_string(), json!("API"));
    }
    if !info.get("version").is_some_and(Value::is_string) {
        let version = info
            .get("version")
            .filter(|v| v.is_number())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "1.0.0".to_string());
        info.insert("version".to_string(), Value::String(version));
    }
    Value::Object(info)
}

fn build_servers(doc: &Map<String, Value>) -> Vec<Value> {
    let base_path = doc.get("basePath").and_then(Value::as_str).unwrap_or("");
    let base_path = base_path.trim_end_matches('/');
    match doc.get("host").and_then(Value::as_str) {
        Some(host) => {
            let mut schemes = string_list(doc.get("schemes"));
            if schemes.is_empty() {
                schemes.push("https".to_string());
            }
            schemes
                .iter()
                .map(|scheme| json!({ "url": format!("{scheme}://{host}{base_path}") }))
                .collect()
        }
        None if !base_path.is_empty() => vec![json!({ "url": base_path })],
        None => vec![json!({ "url": "/" })],
    }
}

fn build_components(doc: &Map<String, Value>, ctx: &SwaggerContext<'_>) -> Map<String, Value> {
    let mut components = Map::new();

    if let Some(defs) = doc.get("definitions").and_then(Value::as_object) {
        let mut schemas = Map::new();
        for (name, schema) in defs {
            let mut schema = schema.clone();
            normalize_schema_node(&mut schema);
            schemas.insert(name.clone(), schema);
        }
        components.insert("schemas".to_string(), Value::Object(schemas));
    }

    if let Some(security) = doc.get("securityDefinitions").and_then(Value::as_object) {
        let schemes: Map<String, Value> = security
            .iter()
            .map(|(name, scheme)| (name.clone(), convert_security_scheme(scheme)))
            .collect();
        components.insert("securitySchemes".to_string(), Value::Object(schemes));
    }

    if let Some(params) = ctx.parameters {
        let mut converted = Map::new();
        for (name, param) in params {
            match param.get("in").and_then(Value::as_str) {
                // Body and form parameters are folded into request bodies at each use site.
                Some("body" | "formData") => {
                    log::debug!("inlining Swagger {name} parameter at its use sites")
                }
                _ => {
                    converted.insert(name.clone(), normalize_parameter(param));
                }
            }
        }
        if !converted.is_empty() {
            components.insert("parameters".to_string(), Value::Object(converted));
        }
    }

    if let Some(responses) = doc.get("responses").and_then(Value::as_object) {
        let converted: Map<String, Value> = responses
            .iter()
            .map(|(name, resp)| (name.clone(), convert_response(resp, &ctx.produces)))
            .collect();
        components.insert("responses".to_string(), Value::Object(converted));
    }

    components
}

fn convert_security_scheme(scheme: &Value) -> Value {
    let mut scheme = scheme.clone();
    if let Some(map) = scheme.as_object_mut() {
        if map.get("type").and_then(Value::as_str) == Some("basic") {
            map.insert("type".to_string(), json!("http"));
            map.insert("scheme".to_string(), json!("basic"));
        }
    }
    scheme
}

fn convert_path_item(item: &Map<String, Value>, ctx: &SwaggerContext<'_>) -> Map<String, Value> {
    let path_params: Vec<Value> = item
        .get("parameters")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut out = Map::new();
    for (key, value) in item {
        if key == "parameters" {
            continue;
        }
        match (METHODS.contains(&key.as_str()), value.as_object()) {
            (true, Some(op)) => {
                out.insert(key.clone(), Value::Object(convert_operation(op, &path_params, ctx)));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

/// Merge path-level parameters into an operation's list. Operation entries
/// replace path entries with the same `name`.
fn merge_parameters(path_params: &[Value], op_params: &[Value], ctx: &SwaggerContext<'_>) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::new();
    for param in path_params.iter().chain(op_params) {
        let param = inline_form_ref(param, ctx);
        let name = param.get("name").and_then(Value::as_str).map(str::to_string);
        let existing = name.as_deref().and_then(|n| {
            merged
                .iter()
                .position(|p| p.get("name").and_then(Value::as_str) == Some(n))
        });
        match existing {
            Some(idx) => merged[idx] = param,
            None => merged.push(param),
        }
    }
    merged
}

/// References to top-level body / formData parameters are inlined because
/// they become part of the request body.
fn inline_form_ref(param: &Value, ctx: &SwaggerContext<'_>) -> Value {
    let target = param
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix("#/parameters/"))
        .and_then(|name| ctx.parameters.and_then(|p| p.get(name)));
    match target {
        Some(t) if matches!(t.get("in").and_then(Value::as_str), Some("body" | "formData")) => {
            t.clone()
        }
        // A ref to a regular parameter carries its name for de-duplication.
        Some(t) => {
            let mut with_name = param.clone();
            if let (Some(map), Some(name)) = (with_name.as_object_mut(), t.get("name")) {
                map.insert("name".to_string(), name.clone());
            }
            with_name
        }
        None => param.clone(),
    }
}

fn convert_operation(
    op: &Map<String, Value>,
    path_params: &[Value],
    ctx: &SwaggerContext<'_>,
) -> Map<String, Value> {
    let op_params: Vec<Value> = op
        .get("parameters")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let params = merge_parameters(path_params, &op_params, ctx);

    let consumes = non_empty_or(string_list(op.get("consumes")), &ctx.consumes);
    let produces = non_empty_or(string_list(op.get("produces")), &ctx.produces);

    let mut parameters = Vec::new();
    let mut body: Option<&Value> = None;
    let mut form_params: Vec<&Value> = Vec::new();
    for param in &params {
        match param.get("in").and_then(Value::as_str) {
            Some("body") => body = Some(param),
            Some("formData") => form_params.push(param),
            _ => parameters.push(normalize_parameter(param)),
        }
    }

    let mut out = Map::new();
    for (key, value) in op {
        match key.as_str() {
            "parameters" | "consumes" | "produces" | "schemes" | "responses" => {}
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if !out.contains_key("operationId") {
        out.insert("operationId".to_string(), json!(synthesize_operation_id(op)));
    }

    if !parameters.is_empty() {
        out.insert("parameters".to_string(), Value::Array(parameters));
    }

    let request_body = match (body, form_params.is_empty()) {
        (Some(body), true) => Some(body_to_request_body(body, &consumes)),
        (body, false) => Some(form_to_request_body(body, &form_params, &consumes)),
        (None, true) => None,
    };
    if let Some(rb) = request_body {
        out.insert("requestBody".to_string(), rb);
    }

    let mut responses = Map::new();
    if let Some(src) = op.get("responses").and_then(Value::as_object) {
        for (code, resp) in src {
            responses.insert(code.clone(), convert_response(resp, &produces));
        }
    }
    out.insert("responses".to_string(), Value::Object(responses));
    out
}

/// `operationId` from `summary`, else the first 30 characters of
/// `description`, else a random `operation_<hex>`.
fn synthesize_operation_id(op: &Map<String, Value>) -> String {
    let from_text = |text: &str| -> String {
        text.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    };
    if let Some(summary) = op.get("summary").and_then(Value::as_str) {
        let id = from_text(summary);
        if !id.is_empty() {
            return id;
        }
    }
    if let Some(description) = op.get("description").and_then(Value::as_str) {
        let head: String = description.chars().take(30).collect();
        let id = from_text(&head);
        if !id.is_empty() {
            return id;
        }
    }
    format!("operation_{:08x}", rand::random::<u32>())
}

fn body_to_request_body(body: &Value, consumes: &[String]) -> Value {
    let mut schema = body.get("schema").cloned().unwrap_or_else(|| json!({}));
    normalize_schema_node(&mut schema);

    let mut content = Map::new();
    let media_types: Vec<&str> = if consumes.is_empty() {
        vec![JSON_MEDIA]
    } else {
        consumes.iter().map(String::as_str).collect()
    };
    for media in media_types {
        content.insert(media.to_string(), json!({ "schema": schema.clone() }));
    }

    let mut rb = Map::new();
    if let Some(desc) = body.get("description") {
        rb.insert("description".to_string(), desc.clone());
    }
    rb.insert("content".to_string(), Value::Object(content));
    rb.insert(
        "required".to_string(),
        json!(body.get("required").and_then(Value::as_bool).unwrap_or(false)),
    );
    Value::Object(rb)
}

fn form_to_request_body(body: Option<&Value>, form_params: &[&Value], consumes: &[String]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut has_file = false;

    for param in form_params {
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        if param.get("type").and_then(Value::as_str) == Some("file") {
            has_file = true;
        }
        let mut schema = extract_param_schema(param);
        if let Some(desc) = param.get("description") {
            if let Some(map) = schema.as_object_mut() {
                map.insert("description".to_string(), desc.clone());
            }
        }
        properties.insert(name.to_string(), schema);
        if param.get("required").and_then(Value::as_bool) == Some(true) {
            required.push(json!(name));
        }
    }

    let media = if has_file {
        MULTIPART
    } else {
        consumes
            .iter()
            .map(String::as_str)
            .find(|c| *c == FORM_URLENCODED || *c == MULTIPART)
            .unwrap_or(FORM_URLENCODED)
    };

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    // A body parameter next to form fields is merged into the form object.
    if let Some(body_schema) = body.and_then(|b| b.get("schema")) {
        let mut body_schema = body_schema.clone();
        normalize_schema_node(&mut body_schema);
        schema.insert("allOf".to_string(), json!([body_schema]));
    }

    let body_required = body
        .and_then(|b| b.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let form_required = form_params
        .iter()
        .any(|p| p.get("required").and_then(Value::as_bool) == Some(true));

    json!({
        "content": { media: { "schema": Value::Object(schema) } },
        "required": body_required || form_required,
    })
}

/// Wrap a non-body parameter's inline type keywords into a `schema` object.
fn normalize_parameter(param: &Value) -> Value {
    let Some(map) = param.as_object() else {
        return param.clone();
    };
    if map.contains_key("$ref") {
        return param.clone();
    }
    let mut out = Map::new();
    let wraps = map.contains_key("type") && !map.contains_key("schema");
    for (key, value) in map {
        if key == "collectionFormat" || (wraps && SCHEMA_KEYS.contains(&key.as_str())) {
            continue;
        }
        if key == "x-nullable" {
            continue;
        }
        out.insert(key.clone(), value.clone());
    }
    if wraps {
        out.insert("schema".to_string(), extract_param_schema(param));
    } else if let Some(schema) = out.get_mut("schema") {
        normalize_schema_node(schema);
    }
    Value::Object(out)
}

fn extract_param_schema(param: &Value) -> Value {
    let mut schema = Map::new();
    if let Some(map) = param.as_object() {
        for key in SCHEMA_KEYS {
            if let Some(value) = map.get(key) {
                schema.insert(key.to_string(), value.clone());
            }
        }
        if map.get("x-nullable").and_then(Value::as_bool) == Some(true) {
            schema.insert("nullable".to_string(), json!(true));
        }
    }
    let mut schema = Value::Object(schema);
    normalize_schema_node(&mut schema);
    schema
}

fn convert_response(resp: &Value, produces: &[String]) -> Value {
    let Some(map) = resp.as_object() else {
        return resp.clone();
    };
    if map.contains_key("$ref") {
        return resp.clone();
    }

    let mut out = Map::new();
    out.insert(
        "description".to_string(),
        map.get("description").cloned().unwrap_or_else(|| json!("")),
    );

    let mut content = Map::new();
    match map.get("schema") {
        Some(schema) => {
            let mut schema = schema.clone();
            normalize_schema_node(&mut schema);
            let media_types: Vec<&str> = if produces.is_empty() {
                vec![JSON_MEDIA]
            } else {
                produces.iter().map(String::as_str).collect()
            };
            for media in media_types {
                content.insert(media.to_string(), json!({ "schema": schema.clone() }));
            }
        }
        None => {
            content.insert(JSON_MEDIA.to_string(), json!({ "schema": { "type": "object" } }));
        }
    }
    out.insert("content".to_string(), Value::Object(content));

    if let Some(headers) = map.get("headers").and_then(Value::as_object) {
        let converted: Map<String, Value> = headers
            .iter()
            .map(|(name, header)| (name.clone(), convert_header(header)))
            .collect();
        out.insert("headers".to_string(), Value::Object(converted));
    }
    for (key, value) in map {
        if key.starts_with("x-") {
            out.insert(key.clone(), value.clone());
        }
    }
    Value::Object(out)
}

fn convert_header(header: &Value) -> Value {
    let mut out = Map::new();
    if let Some(desc) = header.get("description") {
        out.insert("description".to_string(), desc.clone());
    }
    out.insert("schema".to_string(), extract_param_schema(header));
    Value::Object(out)
}

/// Rewrite Swagger `$ref` namespaces to their `#/components/...` counterparts.
/// Subtrees nested deeper than the bound are replaced by a placeholder schema.
fn migrate_refs(value: &mut Value, depth: usize) {
    if depth > MAX_MIGRATION_DEPTH {
        log::warn!("reference migration exceeded nesting bound; substituting placeholder schema");
        *value = json!({ "type": "object" });
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get_mut("$ref") {
                if let Some(migrated) = migrate_ref(r) {
                    *r = migrated;
                }
            }
            if let Some(Value::Object(mapping)) = map
                .get_mut("discriminator")
                .and_then(|d| d.get_mut("mapping"))
            {
                for target in mapping.values_mut() {
                    if let Value::String(r) = target {
                        if let Some(migrated) = migrate_ref(r) {
                            *r = migrated;
                        }
                    }
                }
            }
            for (key, child) in map.iter_mut() {
                if key != "$ref" {
                    migrate_refs(child, depth + 1);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                migrate_refs(item, depth + 1);
            }
        }
        _ => {}
    }
}

fn migrate_ref(r: &str) -> Option<String> {
    REF_MIGRATIONS
        .iter()
        .find_map(|(from, to)| r.strip_prefix(from).map(|rest| format!("{to}{rest}")))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty_or(list: Vec<String>, fallback: &[String]) -> Vec<String> {
    if list.is_empty() {
        fallback.to_vec()
    } else {
        list
    }
}
