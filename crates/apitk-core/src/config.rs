use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level project configuration loaded from `apitk.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub openapi: OpenApiConfig,
}

/// Generator defaults stored under the `openapi` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    /// URL or file path of the OpenAPI / Swagger document.
    pub spec: Option<String>,
    pub output: String,
    pub class_name_strategy: ClassNameStrategy,
    /// Registered name of a custom naming strategy. Takes precedence over
    /// `class_name_strategy` when set.
    pub custom_strategy: Option<String>,
    /// Dotted import path of the class generated APIs inherit from.
    pub base_api_class: String,
    pub base_api_class_alias: Option<String>,
    /// Dotted import path of the route decorator object.
    pub router: String,
    pub max_recursion_depth: usize,
    pub formatter: FormatterKind,
    /// Module prefixes rendered in the internal import group.
    pub internal_packages: Vec<String>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            spec: None,
            output: "apis".to_string(),
            class_name_strategy: ClassNameStrategy::OperationId,
            custom_strategy: None,
            base_api_class: "apitk.core.BaseAPI".to_string(),
            base_api_class_alias: None,
            router: "apitk.core.router".to_string(),
            max_recursion_depth: 15,
            formatter: FormatterKind::Builtin,
            internal_packages: Vec::new(),
        }
    }
}

/// Built-in class naming strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassNameStrategy {
    #[default]
    OperationId,
    Summary,
    Tags,
}

impl ClassNameStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassNameStrategy::OperationId => "operation_id",
            ClassNameStrategy::Summary => "summary",
            ClassNameStrategy::Tags => "tags",
        }
    }
}

/// Which formatter normalizes rendered Python source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    #[default]
    Builtin,
    Ruff,
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub spec: Option<String>,
    pub output: Option<String>,
    pub class_name_strategy: Option<ClassNameStrategy>,
    pub custom_strategy: Option<String>,
    pub base_api_class: Option<String>,
    pub base_api_class_alias: Option<String>,
}

impl OpenApiConfig {
    /// Apply command-line values on top of the file configuration.
    ///
    /// When both a class name strategy and a custom strategy are given on the
    /// command line the custom strategy wins. When only the class name strategy
    /// is given, a custom strategy from the config file is dropped.
    pub fn merge_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(spec) = cli.spec {
            self.spec = Some(spec);
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(base) = cli.base_api_class {
            self.base_api_class = base;
        }
        if let Some(alias) = cli.base_api_class_alias {
            self.base_api_class_alias = Some(alias);
        }

        match (cli.class_name_strategy, cli.custom_strategy) {
            (Some(strategy), Some(custom)) => {
                log::warn!(
                    "both --class-name-strategy ({}) and --custom-strategy ({custom}) given; using the custom strategy",
                    strategy.as_str()
                );
                self.class_name_strategy = strategy;
                self.custom_strategy = Some(custom);
            }
            (Some(strategy), None) => {
                if let Some(ignored) = self.custom_strategy.take() {
                    log::debug!("ignoring configured custom strategy {ignored}");
                }
                self.class_name_strategy = strategy;
            }
            (None, Some(custom)) => self.custom_strategy = Some(custom),
            (None, None) => {}
        }
        self
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "apitk.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ProjectConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: ProjectConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}
