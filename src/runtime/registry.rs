//! Extension registry
//!
//! Collects the function definitions contributed by registered extensions.
//! Registration happens once, while the engine context is being built;
//! afterwards the registry is read-only and shared by every environment.

use crate::runtime::extension::{Extension, NativeFunctionDef};
use std::collections::HashSet;

#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<&'static str>,
    functions: Vec<NativeFunctionDef>,
    seen_names: HashSet<Vec<u8>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension, pulling in its function definitions.
    /// Duplicate function names (case-insensitive) are rejected.
    pub fn register_extension(&mut self, ext: Box<dyn Extension>) -> Result<(), String> {
        for def in ext.functions() {
            let lower = def.name.to_ascii_lowercase();
            if !self.seen_names.insert(lower) {
                return Err(format!(
                    "Extension {} redeclares function {}",
                    ext.name(),
                    String::from_utf8_lossy(def.name)
                ));
            }
            self.functions.push(def);
        }
        self.extensions.push(ext.name());
        Ok(())
    }

    pub fn functions(&self) -> &[NativeFunctionDef] {
        &self.functions
    }

    pub fn extension_names(&self) -> &[&'static str] {
        &self.extensions
    }
}
