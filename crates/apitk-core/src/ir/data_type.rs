use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

/// Module generated models are imported from, relative to a tag package.
pub const MODELS_MODULE: &str = ".models";

/// An import directive: `from <from> import <name> as <alias>` or
/// `import <name> as <alias>` when `from` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Import {
    pub from: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(from: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            name: name.into(),
            alias: None,
        }
    }

    /// A bare `import <module>`.
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            from: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn typing(name: &str) -> Self {
        Self::new("typing", name)
    }

    /// Import of a generated model from the sibling models module.
    pub fn model(name: &str) -> Self {
        Self::new(MODELS_MODULE, name)
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Build an import from a dotted path such as `pkg.mod.Name`.
    pub fn from_dotted(path: &str) -> Self {
        match path.rsplit_once('.') {
            Some((module, name)) if !module.is_empty() => Self::new(module, name),
            _ => Self::module(path),
        }
    }

    /// Identity used to detect alias conflicts.
    pub fn key(&self) -> (Option<&str>, &str) {
        (self.from.as_deref(), self.name.as_str())
    }

    /// Name the import binds in the importing module.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Structural shape of a [`DataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Basic,
    Custom,
    List,
    Dict,
    Optional,
    Union,
    Literal,
}

/// A language-neutral type descriptor. `type_hint` holds the rendered
/// annotation, children live in `data_types`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataType {
    #[serde(rename = "type")]
    pub type_hint: String,
    pub kind: TypeKind,
    pub is_optional: bool,
    pub is_list: bool,
    pub is_dict: bool,
    pub is_custom_type: bool,
    pub is_forward_ref: bool,
    pub is_inline: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_types: Vec<DataType>,
    #[serde(skip)]
    pub imports: BTreeSet<Import>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl DataType {
    fn leaf(kind: TypeKind, hint: impl Into<String>) -> Self {
        Self {
            type_hint: hint.into(),
            kind,
            is_optional: false,
            is_list: false,
            is_dict: false,
            is_custom_type: false,
            is_forward_ref: false,
            is_inline: false,
            data_types: Vec::new(),
            imports: BTreeSet::new(),
            reference: None,
        }
    }

    /// A builtin such as `str` or `int` that needs no import.
    pub fn basic(hint: &str) -> Self {
        Self::leaf(TypeKind::Basic, hint)
    }

    pub fn basic_with_import(hint: &str, import: Import) -> Self {
        let mut ty = Self::leaf(TypeKind::Basic, hint);
        ty.imports.insert(import);
        ty
    }

    pub fn any() -> Self {
        Self::basic_with_import("Any", Import::typing("Any"))
    }

    pub fn none() -> Self {
        Self::basic("None")
    }

    /// A reference to a generated model.
    pub fn custom(name: &str, reference: Option<String>) -> Self {
        let mut ty = Self::leaf(TypeKind::Custom, name);
        ty.is_custom_type = true;
        ty.imports.insert(Import::model(name));
        ty.reference = reference;
        ty
    }

    /// A reference to a model whose definition is still being built.
    pub fn forward_ref(name: &str, reference: Option<String>) -> Self {
        let mut ty = Self::custom(name, reference);
        ty.is_forward_ref = true;
        ty
    }

    pub fn list(item: DataType) -> Self {
        let mut ty = Self::leaf(TypeKind::List, format!("List[{}]", item.type_hint));
        ty.is_list = true;
        ty.imports = item.imports.clone();
        ty.imports.insert(Import::typing("List"));
        ty.data_types.push(item);
        ty
    }

    /// `List` without an item type.
    pub fn bare_list() -> Self {
        let mut ty = Self::basic_with_import("List", Import::typing("List"));
        ty.kind = TypeKind::List;
        ty.is_list = true;
        ty
    }

    /// `Dict[str, V]`.
    pub fn dict(value: DataType) -> Self {
        let mut ty = Self::leaf(TypeKind::Dict, format!("Dict[str, {}]", value.type_hint));
        ty.is_dict = true;
        ty.imports = value.imports.clone();
        ty.imports.insert(Import::typing("Dict"));
        ty.data_types.push(value);
        ty
    }

    /// `Dict` without key or value types.
    pub fn bare_dict() -> Self {
        let mut ty = Self::basic_with_import("Dict", Import::typing("Dict"));
        ty.kind = TypeKind::Dict;
        ty.is_dict = true;
        ty
    }

    /// Wrap in `Optional[...]`. Already-optional types are returned unchanged.
    pub fn optional(inner: DataType) -> Self {
        if inner.is_optional {
            return inner;
        }
        let mut ty = Self::leaf(TypeKind::Optional, format!("Optional[{}]", inner.type_hint));
        ty.is_optional = true;
        ty.imports = inner.imports.clone();
        ty.imports.insert(Import::typing("Optional"));
        ty.data_types.push(inner);
        ty
    }

    /// `Union[...]` of the distinct members. Zero members yield `Any`, one
    /// member is returned as-is.
    pub fn union(members: Vec<DataType>) -> Self {
        let mut distinct: Vec<DataType> = Vec::new();
        for member in members {
            if !distinct.iter().any(|m| m.type_hint == member.type_hint) {
                distinct.push(member);
            }
        }
        match distinct.len() {
            0 => Self::any(),
            1 => distinct.remove(0),
            _ => {
                let hints: Vec<&str> = distinct.iter().map(|m| m.type_hint.as_str()).collect();
                let mut ty = Self::leaf(TypeKind::Union, format!("Union[{}]", hints.join(", ")));
                for member in &distinct {
                    ty.imports.extend(member.imports.iter().cloned());
                }
                ty.imports.insert(Import::typing("Union"));
                ty.data_types = distinct;
                ty
            }
        }
    }

    /// `Literal[...]` over scalar values.
    pub fn literal(values: &[Value]) -> Self {
        let rendered: Vec<String> = values.iter().filter_map(python_literal).collect();
        Self::basic_with_import(
            &format!("Literal[{}]", rendered.join(", ")),
            Import::typing("Literal"),
        )
        .with_kind(TypeKind::Literal)
    }

    fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn inline(mut self) -> Self {
        self.is_inline = true;
        self
    }

    pub fn is_any(&self) -> bool {
        self.kind == TypeKind::Basic && self.type_hint == "Any"
    }

    /// Name of the referenced model when this is a custom type.
    pub fn model_name(&self) -> Option<&str> {
        self.is_custom_type.then_some(self.type_hint.as_str())
    }

    /// Every model name referenced anywhere in this type, in first-seen order.
    pub fn custom_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_custom(&mut names, true);
        names
    }

    /// Model names referenced through edges that are not forward references.
    pub fn eager_custom_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_custom(&mut names, false);
        names
    }

    fn collect_custom<'a>(&'a self, names: &mut Vec<&'a str>, include_forward: bool) {
        if self.is_custom_type {
            if (include_forward || !self.is_forward_ref) && !names.contains(&self.type_hint.as_str())
            {
                names.push(&self.type_hint);
            }
            return;
        }
        for child in &self.data_types {
            child.collect_custom(names, include_forward);
        }
    }

    /// Render the annotation, quoting model names for which `declared` is false.
    pub fn render(&self, declared: &dyn Fn(&str) -> bool) -> String {
        match self.kind {
            TypeKind::Custom if declared(&self.type_hint) => self.type_hint.clone(),
            TypeKind::Custom => format!("\"{}\"", self.type_hint),
            TypeKind::Basic | TypeKind::Literal => self.type_hint.clone(),
            _ if self.data_types.is_empty() => self.type_hint.clone(),
            TypeKind::List => format!("List[{}]", self.data_types[0].render(declared)),
            TypeKind::Dict => format!("Dict[str, {}]", self.data_types[0].render(declared)),
            TypeKind::Optional => format!("Optional[{}]", self.data_types[0].render(declared)),
            TypeKind::Union => {
                let members: Vec<String> =
                    self.data_types.iter().map(|m| m.render(declared)).collect();
                format!("Union[{}]", members.join(", "))
            }
        }
    }
}

/// Render a scalar JSON value as a Python literal. Arrays and objects yield `None`.
pub fn python_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("None".to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        // JSON string escapes are valid Python string escapes.
        Value::String(_) => serde_json::to_string(value).ok(),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn custom_type_imports_its_model() {
        let ty = DataType::custom("User", Some("#/components/schemas/User".into()));
        assert!(ty.is_custom_type);
        assert_eq!(
            ty.imports.iter().collect::<Vec<_>>(),
            vec![&Import::model("User")]
        );
    }

    #[test]
    fn containers_accumulate_imports() {
        let ty = DataType::optional(DataType::list(DataType::custom("Pet", None)));
        assert_eq!(ty.type_hint, "Optional[List[Pet]]");
        let names: Vec<&str> = ty.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Pet", "List", "Optional"]);
    }

    #[test]
    fn optional_is_not_nested() {
        let once = DataType::optional(DataType::basic("int"));
        let twice = DataType::optional(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn union_collapses_duplicates() {
        let single = DataType::union(vec![DataType::basic("str"), DataType::basic("str")]);
        assert_eq!(single.type_hint, "str");
        let pair = DataType::union(vec![DataType::basic("str"), DataType::basic("int")]);
        assert_eq!(pair.type_hint, "Union[str, int]");
    }

    #[test]
    fn literal_renders_python_values() {
        let ty = DataType::literal(&[json!("a"), json!(1), json!(true)]);
        assert_eq!(ty.type_hint, r#"Literal["a", 1, True]"#);
        assert_eq!(ty.kind, TypeKind::Literal);
    }

    #[test]
    fn render_quotes_undeclared_models() {
        let ty = DataType::list(DataType::forward_ref("Node", None));
        assert_eq!(ty.render(&|_| false), r#"List["Node"]"#);
        assert_eq!(ty.render(&|n| n == "Node"), "List[Node]");
    }

    #[test]
    fn eager_names_skip_forward_refs() {
        let ty = DataType::union(vec![
            DataType::custom("A", None),
            DataType::forward_ref("B", None),
        ]);
        assert_eq!(ty.custom_names(), vec!["A", "B"]);
        assert_eq!(ty.eager_custom_names(), vec!["A"]);
    }

    #[test]
    fn dotted_imports() {
        assert_eq!(
            Import::from_dotted("apitk.core.BaseAPI"),
            Import::new("apitk.core", "BaseAPI")
        );
        assert_eq!(Import::from_dotted("json"), Import::module("json"));
    }
}
