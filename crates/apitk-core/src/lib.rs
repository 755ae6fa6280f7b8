pub mod compat;
pub mod config;
pub mod error;
pub mod ir;
pub mod load;
pub mod parse;
pub mod transform;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use error::TransformError;
use parse::spec::OpenApiSpec;

/// A generated file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Write under `root` through a sibling temp file and a rename, so a
    /// reader never observes a half-written file.
    pub fn write_to(&self, root: &Path) -> std::io::Result<PathBuf> {
        let target = root.join(&self.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = target.with_extension(format!("tmp{}", std::process::id()));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(self.content.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(target)
    }
}

/// Trait for code generators that turn tag groups into files.
pub trait CodeGenerator {
    type Config;
    type Error: std::error::Error;
    fn generate(
        &self,
        groups: &[ir::APIGroup],
        config: &Self::Config,
    ) -> Result<Vec<GeneratedFile>, Self::Error>;
}

/// Load, adapt, validate and decode a document from a URL or file path.
pub fn load_spec(source: &str) -> Result<OpenApiSpec, TransformError> {
    let document = load::load_document(source)?;
    spec_from_value(&document)
}

/// Adapt, validate and decode an already-loaded document tree.
pub fn spec_from_value(document: &serde_json::Value) -> Result<OpenApiSpec, TransformError> {
    let prepared = compat::prepare(document)?;
    Ok(parse::from_value(prepared)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_to_creates_parents_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = GeneratedFile::new("pets/models.py", "x = 1\n");
        let written = file.write_to(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), "x = 1\n");

        let entries: Vec<_> = fs::read_dir(dir.path().join("pets"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("models.py")]);
    }

    #[test]
    fn write_to_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        GeneratedFile::new("a.py", "old\n").write_to(dir.path()).unwrap();
        GeneratedFile::new("a.py", "new\n").write_to(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "new\n");
    }
}
