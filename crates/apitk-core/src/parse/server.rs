use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A server URL template with its variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variable name → raw variable object (`default`, `enum`, `description`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, serde_json::Value>,
}

impl Server {
    /// The URL with every `{variable}` replaced by its default.
    pub fn default_url(&self) -> String {
        self.variables.iter().fold(self.url.clone(), |url, (name, var)| {
            match var.get("default").and_then(serde_json::Value::as_str) {
                Some(default) => url.replace(&format!("{{{name}}}"), default),
                None => url,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_variable_defaults() {
        let server: Server = serde_json::from_value(serde_json::json!({
            "url": "https://{env}.example.com/v1",
            "variables": { "env": { "default": "api" } }
        }))
        .unwrap();
        assert_eq!(server.default_url(), "https://api.example.com/v1");
    }
}
