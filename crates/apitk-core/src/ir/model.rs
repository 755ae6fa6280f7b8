use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::data_type::{DataType, Import};
use crate::parse::schema::{ExclusiveBound, Schema, SchemaOrRef, SchemaType, TypeSet};

/// JSON-Schema validation keywords carried onto a field verbatim.
///
/// Serializes to a JSON-Schema fragment holding only the constraints that are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldConstraints {
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(rename = "uniqueItems", skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

impl FieldConstraints {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            min_length: schema.min_length,
            max_length: schema.max_length,
            pattern: schema.pattern.clone(),
            minimum: schema.minimum.clone(),
            maximum: schema.maximum.clone(),
            exclusive_minimum: schema.exclusive_minimum.clone(),
            exclusive_maximum: schema.exclusive_maximum.clone(),
            multiple_of: schema.multiple_of.clone(),
            min_items: schema.min_items,
            max_items: schema.max_items,
            unique_items: schema.unique_items,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The set constraints keyed by their JSON-Schema keyword.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// A named field of a [`DataModel`], or a parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataModelField {
    pub name: String,
    pub data_type: DataType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Original wire name when `name` had to be rewritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "FieldConstraints::is_empty")]
    pub constraints: FieldConstraints,
    /// Schema the field was parsed from.
    #[serde(skip)]
    pub schema: Option<SchemaOrRef>,
}

impl DataModelField {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: false,
            default: None,
            description: None,
            alias: None,
            constraints: FieldConstraints::default(),
            schema: None,
        }
    }

    /// Name used on the wire.
    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Stable sort putting required fields first.
pub fn sort_required_first(fields: &mut [DataModelField]) {
    fields.sort_by_key(|f| !f.required);
}

/// Give every field a distinct Python name. The first holder keeps a
/// clashing name; later ones become `name_2`, `name_3`, … and keep their wire
/// name as alias.
pub fn dedupe_field_names(fields: &mut [DataModelField]) {
    let mut used: HashSet<String> = HashSet::new();
    for field in fields.iter_mut() {
        if used.insert(field.name.clone()) {
            continue;
        }
        let mut counter = 2;
        let mut candidate = format!("{}_{counter}", field.name);
        while used.contains(&candidate) {
            counter += 1;
            candidate = format!("{}_{counter}", field.name);
        }
        if field.alias.is_none() {
            field.alias = Some(field.name.clone());
        }
        field.name = candidate.clone();
        used.insert(candidate);
    }
}

/// A generated data-class (or enum) record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataModel {
    /// Name as written in the document, or the synthesized context name.
    pub name: String,
    pub normalized_name: String,
    pub fields: Vec<DataModelField>,
    pub tags: Vec<String>,
    pub is_enum: bool,
    pub is_inline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub imports: BTreeSet<Import>,
    pub required: BTreeSet<String>,
}

impl DataModel {
    pub fn new(name: impl Into<String>, normalized_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalized_name: normalized_name.into(),
            fields: Vec::new(),
            tags: Vec::new(),
            is_enum: false,
            is_inline: false,
            reference: None,
            description: None,
            imports: BTreeSet::new(),
            required: BTreeSet::new(),
        }
    }

    /// Order fields required-first and recompute the derived sets.
    pub fn finish(&mut self) {
        sort_required_first(&mut self.fields);
        self.required = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect();
        self.imports = self
            .fields
            .iter()
            .flat_map(|f| f.data_type.imports.iter().cloned())
            .collect();
    }

    /// Append tags not already present.
    pub fn add_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
    }

    /// Models referenced by field types, excluding this model itself.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for field in &self.fields {
            for name in field.data_type.custom_names() {
                if name != self.normalized_name && !deps.contains(&name) {
                    deps.push(name);
                }
            }
        }
        deps
    }

    /// Re-emit the JSON-Schema this model was built from.
    pub fn to_schema(&self) -> Schema {
        if self.is_enum {
            return Schema {
                schema_type: self
                    .fields
                    .first()
                    .and_then(|f| enum_value_type(&f.data_type))
                    .map(TypeSet::Single),
                description: self.description.clone(),
                enum_values: self.fields.iter().filter_map(|f| f.default.clone()).collect(),
                ..Schema::default()
            };
        }
        Schema {
            schema_type: Some(TypeSet::Single(SchemaType::Object)),
            description: self.description.clone(),
            properties: self
                .fields
                .iter()
                .map(|f| {
                    let schema = f
                        .schema
                        .clone()
                        .unwrap_or_else(|| SchemaOrRef::from(Schema::default()));
                    (f.wire_name().to_string(), schema)
                })
                .collect(),
            required: self
                .fields
                .iter()
                .filter(|f| f.required)
                .map(|f| f.wire_name().to_string())
                .collect(),
            ..Schema::default()
        }
    }
}

fn enum_value_type(ty: &DataType) -> Option<SchemaType> {
    match ty.type_hint.as_str() {
        "str" => Some(SchemaType::String),
        "int" => Some(SchemaType::Integer),
        "float" => Some(SchemaType::Number),
        "bool" => Some(SchemaType::Boolean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, required: bool) -> DataModelField {
        DataModelField {
            required,
            ..DataModelField::new(name, DataType::basic("str"))
        }
    }

    #[test]
    fn clashing_field_names_are_suffixed() {
        let mut fields = vec![field("a_b", true), field("a_b", false), field("c", false)];
        fields[0].alias = Some("a-b".to_string());
        dedupe_field_names(&mut fields);
        let names: Vec<(&str, &str)> = fields.iter().map(|f| (f.name.as_str(), f.wire_name())).collect();
        assert_eq!(names, vec![("a_b", "a-b"), ("a_b_2", "a_b"), ("c", "c")]);
    }

    #[test]
    fn finish_orders_required_first_stably() {
        let mut model = DataModel::new("M", "M");
        model.fields = vec![
            field("a", false),
            field("b", true),
            field("c", false),
            field("d", true),
        ];
        model.finish();
        let order: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert_eq!(
            model.required.iter().cloned().collect::<Vec<_>>(),
            vec!["b".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn constraints_serialize_only_set_keys() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "string", "minLength": 1, "pattern": "^a"
        }))
        .unwrap();
        let constraints = FieldConstraints::from_schema(&schema);
        assert_eq!(
            Value::Object(constraints.to_map()),
            json!({ "minLength": 1, "pattern": "^a" })
        );
        assert!(FieldConstraints::default().is_empty());
    }

    #[test]
    fn to_schema_uses_wire_names() {
        let mut model = DataModel::new("Order", "Order");
        let mut id = field("order_id", true);
        id.alias = Some("order-id".to_string());
        id.schema = Some(SchemaOrRef::from(Schema {
            schema_type: Some(TypeSet::Single(SchemaType::String)),
            ..Schema::default()
        }));
        model.fields.push(id);
        model.finish();

        let schema = model.to_schema();
        assert_eq!(schema.required, vec!["order-id".to_string()]);
        assert!(schema.properties.contains_key("order-id"));
    }

    #[test]
    fn enum_to_schema_lists_values() {
        let mut model = DataModel::new("Status", "Status");
        model.is_enum = true;
        let mut member = field("for_", true);
        member.default = Some(json!("for"));
        model.fields.push(member);
        let schema = model.to_schema();
        assert_eq!(schema.enum_values, vec![json!("for")]);
        assert_eq!(schema.schema_type, Some(TypeSet::Single(SchemaType::String)));
    }
}
