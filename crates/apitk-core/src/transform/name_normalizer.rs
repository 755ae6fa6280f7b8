use heck::{ToPascalCase, ToSnakeCase};

/// Python reserved words.
pub const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

pub fn is_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// ASCII identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Characters kept verbatim in class names: ASCII word characters and CJK
/// unified ideographs.
fn is_class_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Normalize a schema or context name into a PascalCase class name.
///
/// - `Wrapper«Inner»` → `WrapperOfInner`, nesting included
/// - other characters outside `[A-Za-z0-9_]` and CJK become separators
/// - pieces are capitalized and joined
/// - a result not starting with an ASCII uppercase letter is prefixed with `_`
/// - an empty result becomes `UnnamedModel`
pub fn normalize_class_name(name: &str) -> String {
    let expanded = name.replace('«', "_Of_").replace('»', "_");
    let replaced: String = expanded
        .chars()
        .map(|c| if is_class_char(c) { c } else { '_' })
        .collect();

    let mut result = String::with_capacity(replaced.len());
    for piece in replaced.split('_').filter(|p| !p.is_empty()) {
        let mut chars = piece.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    if result.is_empty() {
        return "UnnamedModel".to_string();
    }
    if !result.starts_with(|c: char| c.is_ascii_uppercase()) {
        result.insert(0, '_');
    }
    if is_keyword(&result) {
        result.push('_');
    }
    result
}

/// Map identifier-hostile characters: ASCII word characters are kept,
/// other alphanumerics become `u<hex>`, everything else `_`.
fn push_identifier_char(out: &mut String, c: char) {
    if c.is_ascii_alphanumeric() || c == '_' {
        out.push(c);
    } else if c.is_alphanumeric() {
        out.push_str(&format!("u{:x}", c as u32));
    } else {
        out.push('_');
    }
}

/// Normalize a property name into a Python attribute name.
///
/// Returns `(name, alias)`; `alias` carries the original wire name whenever
/// the name had to be rewritten.
pub fn normalize_field_name(name: &str) -> (String, Option<String>) {
    if is_valid_identifier(name) && !is_keyword(name) {
        return (name.to_string(), None);
    }

    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        push_identifier_char(&mut out, c);
    }
    if out.is_empty() {
        out.push_str("field");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if is_keyword(&out) {
        out.push('_');
    }
    (out, Some(name.to_string()))
}

/// Normalize an enum value into a lowercase member name.
pub fn normalize_enum_name(value: &str) -> String {
    let mut raw = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        push_identifier_char(&mut raw, c);
    }
    let collapsed = collapse_underscores(&raw);

    if collapsed.is_empty() {
        return "value_".to_string();
    }
    let mut out = if collapsed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("value_{collapsed}")
    } else {
        collapsed
    };
    if is_keyword(&out) {
        out.push('_');
    }
    out
}

/// Directory name for a tag package: lowercase snake case, `default` when
/// nothing usable remains.
pub fn normalize_package_name(tag: &str) -> String {
    let snake = tag.to_snake_case();
    let replaced: String = snake
        .chars()
        .map(|c| if is_class_char(c) { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let mut out = collapse_underscores(&replaced);
    if out.is_empty() {
        return "default".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if is_keyword(&out) {
        out.push('_');
    }
    out
}

fn collapse_underscores(s: &str) -> String {
    s.split('_')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Derive a PascalCase name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `ListUsers`
/// - `POST /users` → `CreateUsers`
/// - `GET /users/{userId}` → `GetUser`
/// - `DELETE /users/{userId}` → `DeleteUser`
/// - `GET /users/{userId}/messages/{messageId}` → `GetUsersMessage`
pub fn route_to_name(method: &str, path: &str) -> String {
    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg);
            ends_with_param = false;
        }
    }

    let prefix = match method.to_ascii_lowercase().as_str() {
        "get" if ends_with_param => "Get".to_string(),
        "get" => "List".to_string(),
        "post" => "Create".to_string(),
        "put" => "Update".to_string(),
        "delete" => "Delete".to_string(),
        other => other.to_pascal_case(),
    };

    let last = resource_parts.len().saturating_sub(1);
    let mut name = prefix;
    for (i, part) in resource_parts.iter().enumerate() {
        // Single-resource routes name the singular resource.
        let word = if i == last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        name.push_str(&word.to_pascal_case());
    }
    name
}

/// Naive singularization.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}
