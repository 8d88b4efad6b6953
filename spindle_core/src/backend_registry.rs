//! Backend registry.
//!
//! Maps a configuration `type` name to a backend constructor. Built at
//! startup and passed to the spindle builder by reference; no global state.

use std::collections::HashMap;
use std::sync::Arc;

use spindle_common::spindle::collaborator::OutputDriver;
use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::SpindleError;

use crate::backend::SpindleBackend;
use crate::backends::{LaserBackend, NullBackend, PwmBackend, RelayBackend};

/// Constructor for one backend type.
pub type BackendFactory = fn(&SpindleConfig, Arc<dyn OutputDriver>) -> Box<dyn SpindleBackend>;

/// Registry of available spindle backends.
pub struct BackendRegistry {
    factories: HashMap<&'static str, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding the built-in `pwm`, `relay`, `laser` and `null`
    /// backends.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(PwmBackend::TYPE_NAME, PwmBackend::create);
        reg.register(RelayBackend::TYPE_NAME, RelayBackend::create);
        reg.register(LaserBackend::TYPE_NAME, LaserBackend::create);
        reg.register(NullBackend::TYPE_NAME, NullBackend::create);
        reg
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        if self.factories.contains_key(name) {
            panic!("Spindle backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).copied()
    }

    /// Create the backend named by `config.kind`.
    ///
    /// # Errors
    /// Returns `SpindleError::UnknownBackend` if nothing is registered under
    /// that name.
    pub fn create_backend(
        &self,
        config: &SpindleConfig,
        output: Arc<dyn OutputDriver>,
    ) -> Result<Box<dyn SpindleBackend>, SpindleError> {
        let factory = self
            .get_factory(&config.kind)
            .ok_or_else(|| SpindleError::UnknownBackend(config.kind.clone()))?;
        Ok(factory(config, output))
    }

    /// List all registered backend names.
    pub fn list_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
