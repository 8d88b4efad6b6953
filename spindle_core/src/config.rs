//! Configuration loading and spindle-set construction.
//!
//! Startup flow: parse and validate the TOML document, then build one
//! [`SpindleCore`] per `[[spindles]]` entry through the backend registry,
//! bind tool changers and hand the set to an [`ActiveSpindleRegistry`].
//! Any failure aborts the whole build; no partial spindle set is returned.

use std::path::Path;
use std::sync::Arc;

use spindle_common::config::ConfigLoader;
use spindle_common::spindle::collaborator::{MacroRunner, OutputDriver};
use spindle_common::spindle::config::{SpindleConfig, SpindleMachineConfig};
use spindle_common::spindle::error::SpindleError;
use tracing::{debug, info};

use crate::atc::{AtcRegistry, ToolChangeLink};
use crate::backend_registry::BackendRegistry;
use crate::delay::{Dwell, ThreadDwell};
use crate::registry::ActiveSpindleRegistry;
use crate::spindle::SpindleCore;

/// Load and validate a spindle configuration file.
pub fn load_config(path: &Path) -> Result<SpindleMachineConfig, SpindleError> {
    let config = SpindleMachineConfig::load(path)?;
    config.validate()?;
    info!(
        "Loaded {} spindles, {} tool changers from {:?}",
        config.spindles.len(),
        config.atc.len(),
        path
    );
    Ok(config)
}

/// Parse and validate an in-memory configuration document.
pub fn load_config_from_str(content: &str) -> Result<SpindleMachineConfig, SpindleError> {
    let config = SpindleMachineConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

/// Builds spindles from configuration and runtime collaborators.
pub struct SpindleSetBuilder {
    backends: BackendRegistry,
    changers: AtcRegistry,
    macros: Option<Arc<dyn MacroRunner>>,
    dwell: Arc<dyn Dwell>,
}

impl SpindleSetBuilder {
    /// Built-in backends, no tool changers, no macro engine, thread-sleep
    /// settling.
    pub fn new() -> Self {
        Self {
            backends: BackendRegistry::with_builtin(),
            changers: AtcRegistry::new(),
            macros: None,
            dwell: Arc::new(ThreadDwell),
        }
    }

    pub fn with_backends(mut self, backends: BackendRegistry) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_changers(mut self, changers: AtcRegistry) -> Self {
        self.changers = changers;
        self
    }

    pub fn with_macros(mut self, macros: Arc<dyn MacroRunner>) -> Self {
        self.macros = Some(macros);
        self
    }

    pub fn with_dwell(mut self, dwell: Arc<dyn Dwell>) -> Self {
        self.dwell = dwell;
        self
    }

    /// Tool changers available for binding.
    pub fn changers(&self) -> &AtcRegistry {
        &self.changers
    }

    /// Build one spindle and bind its tool changer.
    pub fn build_spindle(
        &self,
        config: &SpindleConfig,
        output: Arc<dyn OutputDriver>,
    ) -> Result<Arc<SpindleCore>, SpindleError> {
        config.validate()?;
        let backend = self.backends.create_backend(config, output)?;
        let link = ToolChangeLink::new(
            config.atc.clone(),
            config.m6_macro().map(str::to_string),
            self.macros.clone(),
        );
        let spindle = SpindleCore::new(config, backend, link, Arc::clone(&self.dwell))?;
        spindle.init_link(&self.changers)?;
        debug!("Built spindle '{}' ({})", spindle.name(), spindle.type_name());
        Ok(Arc::new(spindle))
    }

    /// Build every configured spindle and activate the first.
    ///
    /// `outputs` supplies the output driver for each spindle.
    pub fn build_registry<F>(
        &self,
        machine: &SpindleMachineConfig,
        mut outputs: F,
    ) -> Result<ActiveSpindleRegistry, SpindleError>
    where
        F: FnMut(&SpindleConfig) -> Arc<dyn OutputDriver>,
    {
        let spindles = machine
            .spindles
            .iter()
            .map(|config| self.build_spindle(config, outputs(config)))
            .collect::<Result<Vec<_>, _>>()?;
        ActiveSpindleRegistry::new(spindles)
    }
}

impl Default for SpindleSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
