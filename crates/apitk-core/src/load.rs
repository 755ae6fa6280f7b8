//! Fetching and decoding of OpenAPI / Swagger documents.
//!
//! The loader only produces a generic JSON tree; adaptation and typed
//! decoding happen downstream.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Number, Value};

use crate::error::LoadError;

/// Timeout applied to HTTP fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Syntax hint derived from a file extension or `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Unknown,
}

impl DocumentFormat {
    fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Unknown,
        }
    }

    fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime.ends_with("json") {
            DocumentFormat::Json
        } else if mime.contains("yaml") || mime.contains("yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Unknown
        }
    }
}

/// Load a document from an HTTP(S) URL or a local `.json` / `.yaml` / `.yml` file.
pub fn load_document(source: &str) -> Result<Value, LoadError> {
    load_document_with_timeout(source, DEFAULT_TIMEOUT)
}

pub fn load_document_with_timeout(source: &str, timeout: Duration) -> Result<Value, LoadError> {
    if is_url(source) {
        let (body, content_type) = fetch_url(source, timeout)?;
        let format = content_type
            .as_deref()
            .map(DocumentFormat::from_content_type)
            .unwrap_or(DocumentFormat::Unknown);
        let format = match format {
            DocumentFormat::Unknown => DocumentFormat::from_extension(Path::new(source)),
            known => known,
        };
        return parse_document(source, &body, format);
    }

    let path = Path::new(source);
    let format = DocumentFormat::from_extension(path);
    if format == DocumentFormat::Unknown {
        return Err(LoadError::UnsupportedSource(format!(
            "{source} (expected an http(s) URL or a .json, .yaml or .yml file)"
        )));
    }
    let content = fs::read_to_string(path).map_err(|source_err| LoadError::Io {
        path: source.to_string(),
        source: source_err,
    })?;
    parse_document(source, &content, format)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_url(url: &str, timeout: Duration) -> Result<(String, Option<String>), LoadError> {
    let fetch_err = |source| LoadError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;
    log::debug!("fetching {url}");
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().map_err(fetch_err)?;
    Ok((body, content_type))
}

/// Decode `content` as JSON or YAML. An unknown format tries JSON first.
pub fn parse_document(
    source: &str,
    content: &str,
    format: DocumentFormat,
) -> Result<Value, LoadError> {
    let parse_err = |msg: String| LoadError::Parse(source.to_string(), msg);
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        DocumentFormat::Yaml => parse_yaml(content).map_err(parse_err),
        DocumentFormat::Unknown => serde_json::from_str(content)
            .or_else(|json_err| {
                parse_yaml(content).map_err(|yaml_err| {
                    format!("not JSON ({json_err}); not YAML ({yaml_err})")
                })
            })
            .map_err(parse_err),
    }
}

fn parse_yaml(content: &str) -> Result<Value, String> {
    let yaml: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(content).map_err(|e| e.to_string())?;
    Ok(yaml_to_json(yaml))
}

/// Convert a YAML tree to JSON. Non-string keys such as `200:` become strings.
fn yaml_to_json(value: serde_yaml_ng::Value) -> Value {
    use serde_yaml_ng::Value as Yaml;
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                map.insert(yaml_key(k), yaml_to_json(v));
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml_ng::Value) -> String {
    use serde_yaml_ng::Value as Yaml;
    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
