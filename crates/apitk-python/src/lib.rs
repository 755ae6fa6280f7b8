//! Python client package generator.
//!
//! Turns the [`APIGroup`](apitk_core::ir::APIGroup)s produced by
//! `apitk-core` into one package per tag holding `attrs` data classes
//! (`models.py`) and request classes (`apis.py`).

pub mod emitters;
pub mod error;
pub mod fields;
pub mod format;
pub mod generator;
pub mod imports;

pub use error::GenerateError;
pub use format::{CanonicalFormatter, RuffFormatter, SourceFormatter};
pub use generator::{PythonConfig, PythonGenerator};
