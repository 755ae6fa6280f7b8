use std::collections::HashMap;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

use super::name_normalizer::normalize_class_name;
use crate::parse::ref_resolve::decode_pointer_segment;
use crate::parse::schema::SchemaOrRef;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Lookup table over `components.schemas`.
///
/// [`get`](Self::get) accepts, in priority order, a raw component name, a
/// full `#/components/schemas/...` reference, a URL-encoded name and a
/// normalized class name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    schemas: IndexMap<String, SchemaOrRef>,
    normalized: HashMap<String, String>,
}

impl ReferenceResolver {
    pub fn new(schemas: IndexMap<String, SchemaOrRef>) -> Self {
        let mut normalized = HashMap::new();
        for raw in schemas.keys() {
            let name = normalize_class_name(raw);
            if let Some(previous) = normalized.get(&name) {
                log::warn!("schemas `{previous}` and `{raw}` both normalize to `{name}`");
                continue;
            }
            normalized.insert(name, raw.clone());
        }
        Self {
            schemas,
            normalized,
        }
    }

    /// Find a component schema, returning its raw name and definition.
    pub fn get(&self, key: &str) -> Option<(&str, &SchemaOrRef)> {
        if let Some((raw, schema)) = self.schemas.get_key_value(key) {
            return Some((raw.as_str(), schema));
        }
        if let Some(name) = key.strip_prefix(SCHEMA_REF_PREFIX) {
            let decoded = decode_pointer_segment(name);
            if let Some((raw, schema)) = self.schemas.get_key_value(decoded.as_str()) {
                return Some((raw.as_str(), schema));
            }
            return self.by_normalized(&decoded);
        }
        let decoded = percent_decode_str(key).decode_utf8_lossy();
        if let Some((raw, schema)) = self.schemas.get_key_value(decoded.as_ref()) {
            return Some((raw.as_str(), schema));
        }
        self.by_normalized(key)
    }

    fn by_normalized(&self, key: &str) -> Option<(&str, &SchemaOrRef)> {
        let raw = self
            .normalized
            .get(key)
            .or_else(|| self.normalized.get(&normalize_class_name(key)))?;
        self.schemas
            .get_key_value(raw)
            .map(|(raw, schema)| (raw.as_str(), schema))
    }

    /// Decoded target name of a reference, whether or not it exists.
    pub fn target_name(ref_path: &str) -> String {
        match ref_path.strip_prefix(SCHEMA_REF_PREFIX) {
            Some(name) => decode_pointer_segment(name),
            None => ref_path.rsplit('/').next().unwrap_or(ref_path).to_string(),
        }
    }

    /// Canonical reference string for a raw component name.
    pub fn reference_for(raw: &str) -> String {
        format!("{SCHEMA_REF_PREFIX}{}", raw.replace('~', "~0").replace('/', "~1"))
    }

    /// Whether some component schema normalizes to `name`.
    pub fn contains_normalized(&self, name: &str) -> bool {
        self.normalized.contains_key(name)
    }

    pub fn schemas(&self) -> &IndexMap<String, SchemaOrRef> {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
