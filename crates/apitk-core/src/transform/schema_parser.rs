//! Recursive JSON-Schema → [`DataType`] conversion.
//!
//! Dispatch order for an inline schema: union (`anyOf`/`oneOf`), `allOf`,
//! `const`, `enum`, object, array, basic type. References go through the
//! [`ReferenceResolver`]; a target still being parsed yields a forward
//! reference instead of recursing.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;

use super::name_normalizer::{normalize_class_name, normalize_enum_name, normalize_field_name};
use super::reference_resolver::ReferenceResolver;
use crate::error::ResolveError;
use crate::ir::{
    DataModel, DataModelField, DataType, FieldConstraints, Import, ModelRegistry, dedupe_field_names,
};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 15;

/// Identity of the component schema currently being parsed.
#[derive(Clone, Copy)]
struct ComponentTarget<'a> {
    raw: &'a str,
    name: &'a str,
    reference: &'a str,
}

pub struct JsonSchemaParser {
    resolver: ReferenceResolver,
    registry: ModelRegistry,
    recursion_path: Vec<String>,
    max_depth: usize,
    /// Component schemas that are not models, by normalized name.
    aliases: HashMap<String, DataType>,
    /// Tags stamped onto models registered or reached from here on.
    tags: Vec<String>,
}

impl JsonSchemaParser {
    pub fn new(resolver: ReferenceResolver, max_depth: usize) -> Self {
        Self {
            resolver,
            registry: ModelRegistry::new(),
            recursion_path: Vec::new(),
            max_depth,
            aliases: HashMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn set_tags(&mut self, tags: &[String]) {
        self.tags = tags.to_vec();
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ModelRegistry {
        self.registry
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn model(&self, name: &str) -> Result<Option<&DataModel>, ResolveError> {
        self.registry.get(name)
    }

    /// Current depth of the recursion path; zero between top-level calls.
    pub fn recursion_depth(&self) -> usize {
        self.recursion_path.len()
    }

    /// Parse a component schema by name or reference.
    pub fn parse_component(&mut self, key: &str) -> Result<DataType, ResolveError> {
        self.parse_ref(key)
    }

    /// Parse `schema` found under `context`. Inline objects and enums are
    /// registered as models named after the context.
    pub fn parse_schema(
        &mut self,
        schema: &SchemaOrRef,
        context: &str,
    ) -> Result<DataType, ResolveError> {
        self.parse_guarded(schema, context, None)
    }

    fn parse_guarded(
        &mut self,
        schema: &SchemaOrRef,
        context: &str,
        component: Option<ComponentTarget<'_>>,
    ) -> Result<DataType, ResolveError> {
        if self.recursion_path.len() >= self.max_depth {
            log::warn!(
                "recursion limit {} reached at `{}`; using Any",
                self.max_depth,
                self.recursion_path.join(" > ")
            );
            return Ok(DataType::any());
        }
        self.recursion_path.push(context.to_string());
        let result = match schema {
            SchemaOrRef::Ref { ref_path } => self.parse_ref(ref_path),
            SchemaOrRef::Schema(s) => self.parse_inline(s, context, component),
        };
        self.recursion_path.pop();
        result
    }

    fn parse_ref(&mut self, ref_path: &str) -> Result<DataType, ResolveError> {
        let Some((raw, target)) = self.resolver.get(ref_path) else {
            log::warn!("unresolved reference {ref_path}; using Any");
            return Ok(DataType::any());
        };
        let raw = raw.to_string();
        let target = target.clone();
        let name = normalize_class_name(&raw);
        let reference = ReferenceResolver::reference_for(&raw);

        if let Some(alias) = self.aliases.get(&name) {
            return Ok(alias.clone());
        }
        if self.registry.is_placeholder(&name) {
            return Ok(DataType::forward_ref(&name, Some(reference)));
        }
        if self.registry.contains(&name) {
            self.registry.add_tags(&name, &self.tags);
            return Ok(DataType::custom(&name, Some(reference)));
        }

        self.registry.reserve(&name);
        let component = ComponentTarget {
            raw: &raw,
            name: &name,
            reference: &reference,
        };
        let ty = match self.parse_guarded(&target, &name, Some(component)) {
            Ok(ty) => ty,
            Err(e) => {
                self.registry.release(&name);
                return Err(e);
            }
        };
        if self.registry.contains(&name) {
            return Ok(DataType::custom(&name, Some(reference)));
        }

        self.registry.release(&name);
        if ty.custom_names().contains(&name.as_str()) {
            log::warn!("schema `{raw}` refers to itself without defining a model; using Any");
            return Ok(DataType::any());
        }
        // Depth-limited results and aliases still pointing at unfinished
        // models are not cached; another path may get further.
        let pending = ty
            .custom_names()
            .iter()
            .any(|n| self.registry.is_placeholder(n));
        if !ty.is_any() && !pending {
            self.aliases.insert(name, ty.clone());
        }
        Ok(ty)
    }

    fn parse_inline(
        &mut self,
        s: &Schema,
        context: &str,
        component: Option<ComponentTarget<'_>>,
    ) -> Result<DataType, ResolveError> {
        let ty = if !s.any_of.is_empty() || !s.one_of.is_empty() {
            self.parse_union(s, context)?
        } else if !s.all_of.is_empty() {
            self.parse_all_of(s, context, component)?
        } else if let Some(value) = &s.const_value {
            parse_const(s, value)
        } else if !s.enum_values.is_empty() {
            self.parse_enum(s, context, component)
        } else if s.is_object() {
            self.parse_object(s, context, component)?
        } else if s.is_array() {
            self.parse_array(s, context)?
        } else {
            basic_type(s)
        };

        let null_in_types = matches!(
            &s.schema_type,
            Some(TypeSet::Multiple(types)) if types.contains(&SchemaType::Null) && types.len() > 1
        );
        if s.is_nullable() || null_in_types {
            Ok(DataType::optional(ty))
        } else {
            Ok(ty)
        }
    }

    fn parse_union(&mut self, s: &Schema, context: &str) -> Result<DataType, ResolveError> {
        let mut nullable = false;
        let mut branches: Vec<&SchemaOrRef> = Vec::new();
        for branch in s.any_of.iter().chain(&s.one_of) {
            match branch {
                SchemaOrRef::Schema(inner) if inner.is_null() => nullable = true,
                _ => branches.push(branch),
            }
        }

        let literals: Option<Vec<Value>> = branches.iter().map(|b| single_value(b)).collect();
        let ty = match literals {
            Some(values) if !values.is_empty() => DataType::literal(&values),
            _ => {
                let mut members = Vec::with_capacity(branches.len());
                for (i, branch) in branches.iter().enumerate() {
                    let branch_context = if branches.len() == 1 {
                        context.to_string()
                    } else {
                        format!("{context}Variant{}", i + 1)
                    };
                    members.push(self.parse_schema(branch, &branch_context)?);
                }
                DataType::union(members)
            }
        };
        Ok(if nullable { DataType::optional(ty) } else { ty })
    }

    fn parse_all_of(
        &mut self,
        s: &Schema,
        context: &str,
        component: Option<ComponentTarget<'_>>,
    ) -> Result<DataType, ResolveError> {
        if s.all_of.len() == 1 && s.properties.is_empty() {
            return self.parse_schema(&s.all_of[0], context);
        }

        let (name, raw, reference) = self.claim_name(component, &format!("{context}Combined"));
        let mut fields: IndexMap<String, DataModelField> = IndexMap::new();
        let mut required: BTreeSet<String> = BTreeSet::new();
        let mut descriptions: Vec<String> = Vec::new();

        for (i, branch) in s.all_of.iter().enumerate() {
            match branch {
                SchemaOrRef::Schema(inner) if is_mergeable_inline(inner) => {
                    for field in self.object_fields(inner, &name)? {
                        fields.insert(field.wire_name().to_string(), field);
                    }
                    required.extend(inner.required.iter().cloned());
                    descriptions.extend(inner.description.clone());
                }
                _ => {
                    let ty = self.parse_schema(branch, &format!("{context}Part{}", i + 1))?;
                    let pending = ty
                        .model_name()
                        .filter(|n| self.registry.is_placeholder(n))
                        .map(str::to_string);
                    if let Some(pending) = pending {
                        // The target is an ancestor still being parsed: merge
                        // its declared properties instead of its model.
                        let target = self.resolver.get(&pending).map(|(_, t)| t.clone());
                        match target {
                            Some(SchemaOrRef::Schema(target)) if is_mergeable_inline(&target) => {
                                for field in self.object_fields(&target, &name)? {
                                    fields.insert(field.wire_name().to_string(), field);
                                }
                                required.extend(target.required.iter().cloned());
                                descriptions.extend(target.description.clone());
                            }
                            _ => log::warn!(
                                "allOf branch {} of `{context}` refers back to `{pending}`, which cannot be merged; ignored",
                                i + 1
                            ),
                        }
                        continue;
                    }
                    let model = match ty.model_name() {
                        Some(model_name) => self.registry.get(model_name)?.cloned(),
                        None => None,
                    };
                    match model {
                        Some(model) if !model.is_enum => {
                            required.extend(
                                model
                                    .fields
                                    .iter()
                                    .filter(|f| f.required)
                                    .map(|f| f.wire_name().to_string()),
                            );
                            descriptions.extend(model.description.clone());
                            for field in model.fields {
                                fields.insert(field.wire_name().to_string(), field);
                            }
                        }
                        _ => log::warn!(
                            "allOf branch {} of `{context}` is not an object ({}); ignored",
                            i + 1,
                            ty.type_hint
                        ),
                    }
                }
            }
        }

        if !s.properties.is_empty() {
            for field in self.object_fields(s, &name)? {
                fields.insert(field.wire_name().to_string(), field);
            }
        }
        required.extend(s.required.iter().cloned());
        descriptions.extend(s.description.clone());

        let mut model = DataModel::new(raw, name.clone());
        model.fields = fields
            .into_values()
            .map(|mut f| {
                f.required = required.contains(f.wire_name());
                f
            })
            .collect();
        dedupe_field_names(&mut model.fields);
        let description = descriptions.join("\n\n");
        model.description = (!description.is_empty()).then_some(description);
        model.reference = reference.clone();
        model.is_inline = component.is_none();
        model.tags = self.tags.clone();
        model.finish();
        self.registry.register(model);
        Ok(model_type(&name, reference, component.is_none()))
    }

    fn parse_enum(
        &mut self,
        s: &Schema,
        context: &str,
        component: Option<ComponentTarget<'_>>,
    ) -> DataType {
        let values: Vec<&Value> = s.enum_values.iter().filter(|v| !v.is_null()).collect();
        if values.is_empty() {
            return DataType::any();
        }
        let has_null = values.len() != s.enum_values.len();

        let (name, raw, reference) = self.claim_name(component, context);
        let mut model = DataModel::new(raw, name.clone());
        model.is_enum = true;

        let mut used: HashSet<String> = HashSet::new();
        for value in values {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let base = normalize_enum_name(&text);
            let mut member = base.clone();
            let mut counter = 2;
            while used.contains(&member) {
                member = format!("{base}_{counter}");
                counter += 1;
            }
            used.insert(member.clone());

            let mut field = DataModelField::new(member.clone(), enum_value_type(value));
            field.alias = (member != text).then_some(text);
            field.default = Some(value.clone());
            field.required = true;
            model.fields.push(field);
        }
        model.description = s.description.clone();
        model.reference = reference.clone();
        model.is_inline = component.is_none();
        model.tags = self.tags.clone();
        model.finish();
        self.registry.register(model);

        let ty = model_type(&name, reference, component.is_none());
        if has_null { DataType::optional(ty) } else { ty }
    }

    fn parse_object(
        &mut self,
        s: &Schema,
        context: &str,
        component: Option<ComponentTarget<'_>>,
    ) -> Result<DataType, ResolveError> {
        if s.properties.is_empty() {
            if let Some(AdditionalProperties::Schema(value)) = &s.additional_properties {
                let value_type = self.parse_schema(value, &format!("{context}Value"))?;
                return Ok(DataType::dict(value_type));
            }
            // Request bodies always get a model, even an empty one.
            if !context.ends_with("RequestBody") {
                return Ok(DataType::bare_dict());
            }
        }

        let (name, raw, reference) = self.claim_name(component, context);
        let fields = self.object_fields(s, &name)?;
        let mut model = DataModel::new(raw, name.clone());
        model.fields = fields;
        model.description = s.description.clone();
        model.reference = reference.clone();
        model.is_inline = component.is_none();
        model.tags = self.tags.clone();
        model.finish();
        self.registry.register(model);
        Ok(model_type(&name, reference, component.is_none()))
    }

    fn parse_array(&mut self, s: &Schema, context: &str) -> Result<DataType, ResolveError> {
        match &s.items {
            Some(items) => {
                let item = self.parse_schema(items, &format!("{context}Item"))?;
                Ok(DataType::list(item))
            }
            None => Ok(DataType::bare_list()),
        }
    }

    /// Parse properties in declaration order. Nested inline schemas are
    /// named `<Model><Property>`.
    fn object_fields(
        &mut self,
        s: &Schema,
        model_name: &str,
    ) -> Result<Vec<DataModelField>, ResolveError> {
        let mut fields = Vec::with_capacity(s.properties.len());
        for (prop, prop_schema) in &s.properties {
            let (name, alias) = normalize_field_name(prop);
            let context = format!(
                "{model_name}{}",
                normalize_class_name(prop).trim_start_matches('_')
            );
            let data_type = self.parse_schema(prop_schema, &context)?;

            let mut field = DataModelField::new(name, data_type);
            field.alias = alias;
            field.required = s.required.iter().any(|r| r == prop);
            if let SchemaOrRef::Schema(inner) = prop_schema {
                field.default = inner.default_value.clone();
                field.description = inner.description.clone();
                field.constraints = FieldConstraints::from_schema(inner);
            }
            field.schema = Some(prop_schema.clone());
            fields.push(field);
        }
        dedupe_field_names(&mut fields);
        Ok(fields)
    }

    /// Name for a model about to be built: the component's own name, or a
    /// unique reserved name derived from the context. Synthesized names never
    /// take a component's name, parsed or not.
    fn claim_name(
        &mut self,
        component: Option<ComponentTarget<'_>>,
        context: &str,
    ) -> (String, String, Option<String>) {
        match component {
            Some(c) => (
                c.name.to_string(),
                c.raw.to_string(),
                Some(c.reference.to_string()),
            ),
            None => {
                let resolver = &self.resolver;
                let name = self
                    .registry
                    .unique_name(&normalize_class_name(context), |n| resolver.contains_normalized(n));
                self.registry.reserve(&name);
                (name, context.to_string(), None)
            }
        }
    }
}

fn model_type(name: &str, reference: Option<String>, inline: bool) -> DataType {
    let ty = DataType::custom(name, reference);
    if inline { ty.inline() } else { ty }
}

/// An inline `allOf` branch whose properties can be merged without
/// registering a model of its own.
fn is_mergeable_inline(s: &Schema) -> bool {
    let object_like = match &s.schema_type {
        None => true,
        Some(types) => types.contains(SchemaType::Object),
    };
    object_like
        && s.all_of.is_empty()
        && s.any_of.is_empty()
        && s.one_of.is_empty()
        && s.enum_values.is_empty()
        && s.const_value.is_none()
        && s.additional_properties.is_none()
}

/// The single scalar value a union branch admits, if it is a one-value enum or a const.
fn single_value(branch: &SchemaOrRef) -> Option<Value> {
    let SchemaOrRef::Schema(s) = branch else {
        return None;
    };
    let value = match s.enum_values.as_slice() {
        [only] => Some(only.clone()),
        _ => s.const_value.clone(),
    };
    value.filter(|v| !v.is_array() && !v.is_object())
}

fn parse_const(s: &Schema, value: &Value) -> DataType {
    match value {
        Value::Array(_) | Value::Object(_) => basic_type(s),
        scalar => DataType::literal(std::slice::from_ref(scalar)),
    }
}

fn enum_value_type(value: &Value) -> DataType {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => DataType::basic("int"),
        Value::Number(_) => DataType::basic("float"),
        Value::Bool(_) => DataType::basic("bool"),
        _ => DataType::basic("str"),
    }
}

/// Map `(type, format)` to a basic type.
pub fn basic_type(s: &Schema) -> DataType {
    let format = s.format.as_deref();
    match &s.schema_type {
        None => DataType::any(),
        Some(TypeSet::Single(t)) => map_basic(*t, format),
        Some(TypeSet::Multiple(types)) => {
            let non_null: Vec<SchemaType> = types
                .iter()
                .copied()
                .filter(|t| *t != SchemaType::Null)
                .collect();
            let has_null = non_null.len() != types.len();
            match non_null.first() {
                None => DataType::none(),
                Some(first) if has_null => DataType::optional(map_basic(*first, format)),
                Some(_) => DataType::union(non_null.iter().map(|t| map_basic(*t, format)).collect()),
            }
        }
    }
}

fn map_basic(t: SchemaType, format: Option<&str>) -> DataType {
    match t {
        SchemaType::String => match format {
            Some("date-time") => {
                DataType::basic_with_import("datetime", Import::new("datetime", "datetime"))
            }
            Some("date") => DataType::basic_with_import("date", Import::new("datetime", "date")),
            Some("uuid") => DataType::basic_with_import("UUID", Import::new("uuid", "UUID")),
            Some("byte" | "binary") => DataType::basic("bytes"),
            _ => DataType::basic("str"),
        },
        SchemaType::Integer => DataType::basic("int"),
        SchemaType::Number => DataType::basic("float"),
        SchemaType::Boolean => DataType::basic("bool"),
        SchemaType::Array => DataType::bare_list(),
        SchemaType::Object => DataType::bare_dict(),
        SchemaType::Null => DataType::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser(schemas: Value) -> JsonSchemaParser {
        let schemas: IndexMap<String, SchemaOrRef> = serde_json::from_value(schemas).unwrap();
        JsonSchemaParser::new(ReferenceResolver::new(schemas), DEFAULT_MAX_RECURSION_DEPTH)
    }

    fn schema(value: Value) -> SchemaOrRef {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn basic_mapping_table() {
        let cases = [
            (json!({ "type": "string" }), "str"),
            (json!({ "type": "string", "format": "date-time" }), "datetime"),
            (json!({ "type": "string", "format": "date" }), "date"),
            (json!({ "type": "string", "format": "uuid" }), "UUID"),
            (json!({ "type": "string", "format": "binary" }), "bytes"),
            (json!({ "type": "string", "format": "email" }), "str"),
            (json!({ "type": "integer" }), "int"),
            (json!({ "type": "number" }), "float"),
            (json!({ "type": "boolean" }), "bool"),
            (json!({ "type": "array" }), "List"),
            (json!({ "type": "object" }), "Dict"),
            (json!({ "type": ["integer", "null"] }), "Optional[int]"),
            (json!({ "type": ["integer", "string"] }), "Union[int, str]"),
            (json!({}), "Any"),
        ];
        let mut p = parser(json!({}));
        for (input, expected) in cases {
            let ty = p.parse_schema(&schema(input.clone()), "Ctx").unwrap();
            assert_eq!(ty.type_hint, expected, "for {input}");
        }
        assert!(p.registry().is_empty());
    }

    #[test]
    fn datetime_brings_its_import() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(&schema(json!({ "type": "string", "format": "date-time" })), "T")
            .unwrap();
        assert!(ty.imports.contains(&Import::new("datetime", "datetime")));
    }

    #[test]
    fn referenced_object_becomes_model() {
        let mut p = parser(json!({
            "User": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "id": { "type": "integer" }
                },
                "required": ["id"]
            }
        }));
        let ty = p
            .parse_schema(&SchemaOrRef::reference("#/components/schemas/User"), "X")
            .unwrap();
        assert!(ty.is_custom_type);
        assert_eq!(ty.type_hint, "User");
        let user = p.model("User").unwrap().unwrap();
        let order: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["id", "name"]);
        assert!(!user.is_inline);
    }

    #[test]
    fn enum_members_are_keyword_safe() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(
                &schema(json!({ "type": "string", "enum": ["for", "while", "done"] })),
                "Status",
            )
            .unwrap();
        assert_eq!(ty.type_hint, "Status");
        let status = p.model("Status").unwrap().unwrap();
        assert!(status.is_enum);
        let members: Vec<(&str, Option<&str>)> = status
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.alias.as_deref()))
            .collect();
        assert_eq!(
            members,
            vec![("for_", Some("for")), ("while_", Some("while")), ("done", None)]
        );
    }

    #[test]
    fn self_reference_is_forward() {
        let mut p = parser(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "value": { "type": "integer" },
                    "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } }
                }
            }
        }));
        p.parse_component("Node").unwrap();
        let node = p.model("Node").unwrap().unwrap();
        let children = &node.fields[1].data_type;
        assert_eq!(children.type_hint, "List[Node]");
        assert!(children.data_types[0].is_forward_ref);
        assert_eq!(p.recursion_depth(), 0);
        assert_eq!(p.registry().placeholder_count(), 0);
    }

    #[test]
    fn mutual_references_close_with_forward_ref() {
        let mut p = parser(json!({
            "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
            "B": { "type": "object", "properties": { "a": { "$ref": "#/components/schemas/A" } } }
        }));
        p.parse_component("A").unwrap();
        let a = p.model("A").unwrap().unwrap();
        let b = p.model("B").unwrap().unwrap();
        assert!(!a.fields[0].data_type.is_forward_ref);
        assert!(b.fields[0].data_type.is_forward_ref);
    }

    #[test]
    fn missing_ref_degrades_to_any() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(&SchemaOrRef::reference("#/components/schemas/Ghost"), "X")
            .unwrap();
        assert!(ty.is_any());
    }

    #[test]
    fn depth_limit_degrades_to_any() {
        let mut p = JsonSchemaParser::new(ReferenceResolver::default(), 2);
        let deep = schema(json!({
            "type": "array",
            "items": { "type": "array", "items": { "type": "array", "items": { "type": "string" } } }
        }));
        let ty = p.parse_schema(&deep, "Deep").unwrap();
        assert_eq!(ty.type_hint, "List[List[Any]]");
        assert_eq!(p.recursion_depth(), 0);
    }

    #[test]
    fn union_of_single_enums_is_literal() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(
                &schema(json!({ "oneOf": [{ "enum": ["a"] }, { "const": "b" }, { "type": "null" }] })),
                "Mode",
            )
            .unwrap();
        assert_eq!(ty.type_hint, r#"Optional[Literal["a", "b"]]"#);
    }

    #[test]
    fn union_with_null_collapses_to_optional() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(
                &schema(json!({ "anyOf": [{ "type": "string" }, { "type": "null" }] })),
                "Name",
            )
            .unwrap();
        assert_eq!(ty.type_hint, "Optional[str]");
    }

    #[test]
    fn all_of_merges_fields_and_required() {
        let mut p = parser(json!({
            "Base": {
                "type": "object",
                "description": "base",
                "properties": { "id": { "type": "integer" }, "kind": { "type": "string" } },
                "required": ["id"]
            }
        }));
        let ty = p
            .parse_schema(
                &schema(json!({
                    "description": "extended",
                    "allOf": [
                        { "$ref": "#/components/schemas/Base" },
                        {
                            "properties": { "kind": { "type": "integer" }, "extra": { "type": "boolean" } },
                            "required": ["extra"]
                        }
                    ]
                })),
                "Pet",
            )
            .unwrap();
        assert_eq!(ty.type_hint, "PetCombined");
        let model = p.model("PetCombined").unwrap().unwrap();
        let fields: Vec<(&str, &str, bool)> = model
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.data_type.type_hint.as_str(), f.required))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("id", "int", true),
                ("extra", "bool", true),
                ("kind", "int", false)
            ]
        );
        assert_eq!(model.description.as_deref(), Some("base\n\nextended"));
    }

    #[test]
    fn single_all_of_passes_through() {
        let mut p = parser(json!({ "Id": { "type": "string", "format": "uuid" } }));
        let ty = p
            .parse_schema(&schema(json!({ "allOf": [{ "$ref": "#/components/schemas/Id" }] })), "X")
            .unwrap();
        assert_eq!(ty.type_hint, "UUID");
    }

    #[test]
    fn all_of_back_reference_merges_declared_properties() {
        let mut p = parser(json!({
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
                    { "properties": { "salary": { "type": "number" } } }
                ]
            }
        }));
        let person = p.parse_component("Person").unwrap();
        assert_eq!(person.type_hint, "Person");
        assert_eq!(p.registry().placeholder_count(), 0);

        let employee = p.model("Employee").unwrap().unwrap();
        let fields: Vec<(&str, &str, bool)> = employee
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.data_type.type_hint.as_str(), f.required))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("name", "str", true),
                ("reports", "List[Employee]", false),
                ("salary", "float", false)
            ]
        );
        let person = p.model("Person").unwrap().unwrap();
        assert_eq!(person.fields[1].data_type.type_hint, "List[Employee]");
    }

    #[test]
    fn all_of_listing_itself_keeps_other_branches() {
        let mut p = parser(json!({
            "Loop": {
                "allOf": [
                    { "$ref": "#/components/schemas/Loop" },
                    { "properties": { "id": { "type": "integer" } } }
                ]
            }
        }));
        let ty = p.parse_component("Loop").unwrap();
        assert_eq!(ty.type_hint, "Loop");
        let fields: Vec<&str> = p
            .model("Loop")
            .unwrap()
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["id"]);
        assert_eq!(p.registry().placeholder_count(), 0);
    }

    #[test]
    fn synthesized_names_skip_component_names() {
        let mut p = parser(json!({
            "GetOrderResponse": {
                "type": "object",
                "properties": { "name": { "type": "string" }, "total": { "type": "integer" } }
            }
        }));
        let inline = p
            .parse_schema(
                &schema(json!({ "type": "object", "properties": { "id": { "type": "integer" } } })),
                "GetOrderResponse",
            )
            .unwrap();
        assert_eq!(inline.type_hint, "GetOrderResponse2");

        let component = p.parse_component("GetOrderResponse").unwrap();
        assert_eq!(component.type_hint, "GetOrderResponse");
        let fields: Vec<&str> = p
            .model("GetOrderResponse")
            .unwrap()
            .unwrap()
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["name", "total"]);
    }

    #[test]
    fn colliding_property_names_are_suffixed() {
        let mut p = parser(json!({}));
        p.parse_schema(
            &schema(json!({
                "type": "object",
                "properties": { "a-b": { "type": "string" }, "a_b": { "type": "integer" } }
            })),
            "Pair",
        )
        .unwrap();
        let model = p.model("Pair").unwrap().unwrap();
        let fields: Vec<(&str, Option<&str>)> = model
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.alias.as_deref()))
            .collect();
        assert_eq!(fields, vec![("a_b", Some("a-b")), ("a_b_2", Some("a_b"))]);
    }

    #[test]
    fn additional_properties_yield_dict() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(
                &schema(json!({ "type": "object", "additionalProperties": { "type": "integer" } })),
                "Counts",
            )
            .unwrap();
        assert_eq!(ty.type_hint, "Dict[str, int]");
    }

    #[test]
    fn empty_object_only_modelled_for_request_bodies() {
        let mut p = parser(json!({}));
        let plain = p.parse_schema(&schema(json!({ "type": "object" })), "Meta").unwrap();
        assert_eq!(plain.type_hint, "Dict");
        let body = p
            .parse_schema(&schema(json!({ "type": "object" })), "PingRequestBody")
            .unwrap();
        assert_eq!(body.type_hint, "PingRequestBody");
        assert!(body.is_inline);
    }

    #[test]
    fn alias_components_yield_underlying_type() {
        let mut p = parser(json!({
            "UserId": { "type": "integer" },
            "Ids": { "type": "array", "items": { "$ref": "#/components/schemas/UserId" } }
        }));
        let ty = p.parse_component("Ids").unwrap();
        assert_eq!(ty.type_hint, "List[int]");
        assert!(p.registry().is_empty());
    }

    #[test]
    fn inline_names_are_unique() {
        let mut p = parser(json!({}));
        let obj = schema(json!({ "type": "object", "properties": { "a": { "type": "string" } } }));
        let first = p.parse_schema(&obj, "Filter").unwrap();
        let second = p.parse_schema(&obj, "Filter").unwrap();
        assert_eq!(first.type_hint, "Filter");
        assert_eq!(second.type_hint, "Filter2");
    }

    #[test]
    fn nullable_wraps_optional() {
        let mut p = parser(json!({}));
        let ty = p
            .parse_schema(&schema(json!({ "type": "string", "nullable": true })), "X")
            .unwrap();
        assert_eq!(ty.type_hint, "Optional[str]");
    }

    #[test]
    fn field_constraints_are_copied() {
        let mut p = parser(json!({
            "Item": {
                "type": "object",
                "properties": {
                    "sku": { "type": "string", "minLength": 3, "pattern": "^[A-Z]+$" },
                    "qty": { "type": "integer", "minimum": 1, "default": 1 }
                }
            }
        }));
        p.parse_component("Item").unwrap();
        let item = p.model("Item").unwrap().unwrap();
        assert_eq!(item.fields[0].constraints.min_length, Some(3));
        assert_eq!(item.fields[1].default, Some(json!(1)));
        assert!(item.fields[1].constraints.minimum.is_some());
    }

    #[test]
    fn tags_are_appended_on_reuse() {
        let mut p = parser(json!({ "User": { "type": "object", "properties": { "id": {} } } }));
        p.set_tags(&["users".to_string()]);
        p.parse_component("User").unwrap();
        p.set_tags(&["admin".to_string()]);
        p.parse_component("User").unwrap();
        assert_eq!(p.model("User").unwrap().unwrap().tags, vec!["users", "admin"]);
    }
}
