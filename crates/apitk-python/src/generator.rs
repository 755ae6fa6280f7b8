use apitk_core::config::{FormatterKind, OpenApiConfig};
use apitk_core::ir::{APIGroup, Import};
use apitk_core::{CodeGenerator, GeneratedFile};

use crate::emitters;
use crate::error::GenerateError;
use crate::format::{SourceFormatter, formatter_for};

/// Options of the Python emitters, taken from the `openapi` config section.
#[derive(Debug, Clone)]
pub struct PythonConfig {
    /// Dotted path of the class every request class inherits from.
    pub base_api_class: String,
    pub base_api_class_alias: Option<String>,
    /// Dotted path of the route decorator object.
    pub router: String,
    pub formatter: FormatterKind,
    pub internal_packages: Vec<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self::from(&OpenApiConfig::default())
    }
}

impl From<&OpenApiConfig> for PythonConfig {
    fn from(config: &OpenApiConfig) -> Self {
        Self {
            base_api_class: config.base_api_class.clone(),
            base_api_class_alias: config.base_api_class_alias.clone(),
            router: config.router.clone(),
            formatter: config.formatter,
            internal_packages: config.internal_packages.clone(),
        }
    }
}

impl PythonConfig {
    pub fn base_import(&self) -> Import {
        let import = Import::from_dotted(&self.base_api_class);
        match &self.base_api_class_alias {
            Some(alias) if alias != &import.name => import.with_alias(alias),
            _ => import,
        }
    }

    pub fn router_import(&self) -> Import {
        Import::from_dotted(&self.router)
    }
}

/// Renders one package per [`APIGroup`]: `__init__.py`, `models.py`, `apis.py`.
pub struct PythonGenerator {
    formatter: Box<dyn SourceFormatter>,
}

impl PythonGenerator {
    pub fn new(formatter: Box<dyn SourceFormatter>) -> Self {
        Self { formatter }
    }

    pub fn for_config(config: &PythonConfig) -> Self {
        Self::new(formatter_for(config.formatter))
    }

    fn formatted(&self, path: String, source: &str) -> Result<GeneratedFile, GenerateError> {
        let content = self.formatter.format(&path, source)?;
        Ok(GeneratedFile::new(path, content))
    }
}

impl Default for PythonGenerator {
    fn default() -> Self {
        Self::for_config(&PythonConfig::default())
    }
}

impl CodeGenerator for PythonGenerator {
    type Config = PythonConfig;
    type Error = GenerateError;

    fn generate(
        &self,
        groups: &[APIGroup],
        config: &PythonConfig,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let mut files = Vec::with_capacity(groups.len() * 3);
        for group in groups {
            log::debug!(
                "rendering package `{}` ({} endpoints, {} models)",
                group.package,
                group.endpoints.len(),
                group.models.len()
            );
            let models = emitters::models::emit_models(group, config)?;
            let apis = emitters::apis::emit_apis(group, config)?;

            files.push(GeneratedFile::new(format!("{}/__init__.py", group.package), ""));
            files.push(self.formatted(format!("{}/models.py", group.package), &models)?);
            files.push(self.formatted(format!("{}/apis.py", group.package), &apis)?);
        }
        Ok(files)
    }
}
