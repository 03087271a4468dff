//! Engine context
//!
//! The process-wide, immutable-after-build side of the engine: the registry
//! of native functions contributed by extensions. Built once, shared by
//! every execution environment through an `Arc`; per-invocation mutable
//! state lives in `interp::env::Env`, never here, so isolated environments
//! can run on separate threads.

use crate::runtime::core_extension::CoreExtension;
use crate::runtime::extension::Extension;
use crate::runtime::registry::ExtensionRegistry;
use std::sync::Arc;

pub struct EngineContext {
    pub registry: ExtensionRegistry,
}

impl EngineContext {
    /// Context with the core extension registered.
    pub fn new() -> Arc<Self> {
        EngineBuilder::new()
            .with_core_extensions()
            .build()
            .expect("core extension registration cannot conflict")
    }
}

/// Builder for constructing an EngineContext with a chosen extension set.
pub struct EngineBuilder {
    extensions: Vec<Box<dyn Extension>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    pub fn with_extension<E: Extension + 'static>(mut self, ext: E) -> Self {
        self.extensions.push(Box::new(ext));
        self
    }

    pub fn with_core_extensions(self) -> Self {
        self.with_extension(CoreExtension)
    }

    pub fn build(self) -> Result<Arc<EngineContext>, String> {
        let mut registry = ExtensionRegistry::new();
        for ext in self.extensions {
            registry.register_extension(ext)?;
        }
        Ok(Arc::new(EngineContext { registry }))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
