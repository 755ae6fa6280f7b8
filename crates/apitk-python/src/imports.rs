//! Import collection and ordering for generated modules.

use std::collections::BTreeMap;

use apitk_core::ir::Import;

use crate::error::GenerateError;

/// Top-level modules of the Python standard library that generated code uses
/// or may import through custom base classes.
const STDLIB_MODULES: &[&str] = &[
    "abc", "asyncio", "collections", "dataclasses", "datetime", "decimal", "enum", "functools",
    "io", "ipaddress", "itertools", "json", "logging", "os", "pathlib", "re", "sys", "time",
    "typing", "uuid",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportGroup {
    Stdlib,
    ThirdParty,
    Internal,
}

/// Import set of one generated module.
///
/// Rendering is deterministic: groups in `stdlib`, third-party, internal
/// order separated by a blank line; within a group `from` imports precede
/// bare imports and everything is alphabetized.
#[derive(Debug, Clone, Default)]
pub struct ImportManager {
    internal_packages: Vec<String>,
    /// module → imported name → alias
    from_imports: BTreeMap<String, BTreeMap<String, Option<String>>>,
    /// module → alias
    bare_imports: BTreeMap<String, Option<String>>,
}

impl ImportManager {
    pub fn new(internal_packages: &[String]) -> Self {
        Self {
            internal_packages: internal_packages.to_vec(),
            ..Self::default()
        }
    }

    /// Register an import. Registering the same `(from, name)` twice with
    /// different aliases is an error.
    pub fn add(&mut self, import: &Import) -> Result<(), GenerateError> {
        let slot = match &import.from {
            Some(module) => self
                .from_imports
                .entry(module.clone())
                .or_default()
                .entry(import.name.clone()),
            None => self.bare_imports.entry(import.name.clone()),
        };
        match slot {
            std::collections::btree_map::Entry::Vacant(v) => {
                v.insert(import.alias.clone());
            }
            std::collections::btree_map::Entry::Occupied(o) => {
                if o.get() != &import.alias {
                    return Err(GenerateError::ImportConflict {
                        module: import.from.clone().unwrap_or_default(),
                        name: import.name.clone(),
                        first: alias_label(o.get(), &import.name),
                        second: alias_label(&import.alias, &import.name),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn extend<'a>(
        &mut self,
        imports: impl IntoIterator<Item = &'a Import>,
    ) -> Result<(), GenerateError> {
        for import in imports {
            self.add(import)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.from_imports.is_empty() && self.bare_imports.is_empty()
    }

    pub fn classify(&self, module: &str) -> ImportGroup {
        if module.starts_with('.') {
            return ImportGroup::Internal;
        }
        let is_internal = self.internal_packages.iter().any(|p| {
            module == p || module.strip_prefix(p.as_str()).is_some_and(|rest| rest.starts_with('.'))
        });
        if is_internal {
            return ImportGroup::Internal;
        }
        let top = module.split('.').next().unwrap_or(module);
        if STDLIB_MODULES.contains(&top) {
            ImportGroup::Stdlib
        } else {
            ImportGroup::ThirdParty
        }
    }

    /// Render the import block, without a trailing newline.
    pub fn render(&self) -> String {
        let mut groups: BTreeMap<ImportGroup, (Vec<String>, Vec<String>)> = BTreeMap::new();

        for (module, names) in &self.from_imports {
            let names: Vec<String> = names
                .iter()
                .map(|(name, alias)| match alias {
                    Some(alias) if alias != name => format!("{name} as {alias}"),
                    _ => name.clone(),
                })
                .collect();
            groups
                .entry(self.classify(module))
                .or_default()
                .0
                .push(format!("from {module} import {}", names.join(", ")));
        }
        for (module, alias) in &self.bare_imports {
            let line = match alias {
                Some(alias) if alias != module => format!("import {module} as {alias}"),
                _ => format!("import {module}"),
            };
            groups.entry(self.classify(module)).or_default().1.push(line);
        }

        groups
            .into_values()
            .map(|(from_lines, bare_lines)| {
                from_lines
                    .into_iter()
                    .chain(bare_lines)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn alias_label(alias: &Option<String>, name: &str) -> String {
    alias.clone().unwrap_or_else(|| name.to_string())
}
