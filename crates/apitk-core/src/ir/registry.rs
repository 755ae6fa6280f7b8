use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::model::DataModel;
use crate::error::ResolveError;

/// Arena of parsed models keyed by normalized name.
///
/// A name is either a placeholder (its schema is still being parsed) or a
/// registered model, never both. Registered models are write-once apart
/// from tag appends.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, DataModel>,
    placeholders: BTreeSet<String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as being parsed. No-op for registered names.
    pub fn reserve(&mut self, name: &str) {
        if !self.models.contains_key(name) {
            self.placeholders.insert(name.to_string());
        }
    }

    /// Drop a placeholder whose schema turned out not to be a model.
    pub fn release(&mut self, name: &str) {
        self.placeholders.remove(name);
    }

    /// Register a finished model, clearing its placeholder. Registering an
    /// existing name only merges tags.
    pub fn register(&mut self, model: DataModel) {
        self.placeholders.remove(&model.normalized_name);
        match self.models.get_mut(&model.normalized_name) {
            Some(existing) => existing.add_tags(&model.tags),
            None => {
                self.models.insert(model.normalized_name.clone(), model);
            }
        }
    }

    /// Look up a registered model. Looking up a placeholder is an error.
    pub fn get(&self, name: &str) -> Result<Option<&DataModel>, ResolveError> {
        if self.placeholders.contains(name) {
            return Err(ResolveError::PlaceholderLookup(name.to_string()));
        }
        Ok(self.models.get(name))
    }

    pub fn add_tags(&mut self, name: &str, tags: &[String]) {
        if let Some(model) = self.models.get_mut(name) {
            model.add_tags(tags);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        self.placeholders.contains(name)
    }

    /// `true` when the name is neither registered nor reserved.
    pub fn is_free(&self, name: &str) -> bool {
        !self.contains(name) && !self.is_placeholder(name)
    }

    /// `base`, or `base2`, `base3`, … when taken here or by `reserved`.
    pub fn unique_name(&self, base: &str, reserved: impl Fn(&str) -> bool) -> String {
        let available = |name: &str| self.is_free(name) && !reserved(name);
        if available(base) {
            return base.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base}{counter}");
            if available(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Registered models in registration order.
    pub fn models(&self) -> impl Iterator<Item = &DataModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }
}
