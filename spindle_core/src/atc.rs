//! Tool-changer integration.
//!
//! A spindle may name a tool changer (`atc`) or an `m6_macro`. The changer is
//! an external collaborator that several spindles can share, so the link
//! holds it through an `Arc` and resolves the name lazily in
//! [`ToolChangeLink::init_link`].
//!
//! Tool bookkeeping (`current_tool`, `last_tool`) is kept here so that it can
//! be restored after a restart without contacting the changer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use spindle_common::consts::MAX_TOOL_NUMBER;
use spindle_common::spindle::collaborator::{MacroRunner, ToolChanger};
use spindle_common::spindle::error::SpindleError;
use spindle_common::spindle::state::ToolNumber;
use tracing::{debug, info, warn};

/// Name → tool changer lookup, built at startup.
#[derive(Clone, Default)]
pub struct AtcRegistry {
    changers: HashMap<String, Arc<dyn ToolChanger>>,
}

impl AtcRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a changer under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, changer: Arc<dyn ToolChanger>) {
        self.changers.insert(changer.name().to_string(), changer);
    }

    /// Changer by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolChanger>> {
        self.changers.get(name).cloned()
    }

    /// Number of registered changers.
    pub fn len(&self) -> usize {
        self.changers.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.changers.is_empty()
    }
}

/// A spindle's association with its tool changer or m6 macro.
pub struct ToolChangeLink {
    atc_name: Option<String>,
    m6_macro: Option<String>,
    macros: Option<Arc<dyn MacroRunner>>,
    changer: OnceLock<Arc<dyn ToolChanger>>,
    current_tool: AtomicU32,
    last_tool: AtomicU32,
}

impl ToolChangeLink {
    /// Unbound link.
    pub fn new(
        atc_name: Option<String>,
        m6_macro: Option<String>,
        macros: Option<Arc<dyn MacroRunner>>,
    ) -> Self {
        Self {
            atc_name: atc_name.filter(|n| !n.is_empty()),
            m6_macro: m6_macro.filter(|m| !m.is_empty()),
            macros,
            changer: OnceLock::new(),
            current_tool: AtomicU32::new(0),
            last_tool: AtomicU32::new(0),
        }
    }

    /// Link with neither changer nor macro.
    pub fn none() -> Self {
        Self::new(None, None, None)
    }

    /// Resolve the configured changer name. Idempotent.
    ///
    /// # Errors
    /// `SpindleError::AtcNotFound` if the name is not registered.
    pub fn init_link(&self, spindle: &str, changers: &AtcRegistry) -> Result<(), SpindleError> {
        let Some(name) = &self.atc_name else {
            return Ok(());
        };
        if self.changer.get().is_some() {
            return Ok(());
        }
        let changer = changers.get(name).ok_or_else(|| SpindleError::AtcNotFound {
            spindle: spindle.to_string(),
            atc: name.clone(),
        })?;
        // A concurrent init may have won; either way the same changer is bound.
        let _ = self.changer.set(changer);
        info!("Spindle '{}' bound to ATC '{}'", spindle, name);
        Ok(())
    }

    /// Returns true once a changer is bound.
    pub fn is_bound(&self) -> bool {
        self.changer.get().is_some()
    }

    /// `"atc:<name>"`, `"m6_macro"` or empty.
    pub fn atc_info(&self) -> String {
        match (&self.atc_name, &self.m6_macro) {
            (Some(name), _) => format!("atc:{name}"),
            (None, Some(_)) => "m6_macro".to_string(),
            (None, None) => String::new(),
        }
    }

    /// Configured changer name.
    pub fn atc_name(&self) -> Option<&str> {
        self.atc_name.as_deref()
    }

    /// Perform a tool change.
    ///
    /// - bound changer: the request is forwarded as-is
    /// - no changer, `m6_macro` set: a full change runs the macro;
    ///   pre-select and `set_tool` requests do nothing
    /// - neither: bookkeeping only
    ///
    /// The tool is committed unless `pre_select` is set, and only after the
    /// collaborator reports success.
    pub fn tool_change(
        &self,
        spindle: &str,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), SpindleError> {
        if tool > MAX_TOOL_NUMBER {
            return Err(SpindleError::ToolOutOfRange(tool));
        }

        if let Some(changer) = self.changer.get() {
            debug!(
                "Spindle '{}': ATC '{}' tool {} (pre_select={}, set_tool={})",
                spindle,
                changer.name(),
                tool,
                pre_select,
                set_tool
            );
            changer.tool_change(tool, pre_select, set_tool)?;
        } else if let Some(body) = &self.m6_macro {
            if !pre_select && !set_tool {
                match &self.macros {
                    Some(runner) => runner.run("m6_macro", body)?,
                    None => warn!("Spindle '{}': m6_macro set but no macro engine", spindle),
                }
            }
        } else if self.atc_name.is_some() {
            warn!("Spindle '{}': ATC not bound, recording tool {} only", spindle, tool);
        }

        if !pre_select {
            self.commit(tool);
            info!("Spindle '{}': tool {} in place", spindle, tool);
        }
        Ok(())
    }

    /// Last committed tool.
    #[inline]
    pub fn current_tool(&self) -> ToolNumber {
        self.current_tool.load(Ordering::Acquire)
    }

    /// Tool committed before the current one.
    #[inline]
    pub fn last_tool(&self) -> ToolNumber {
        self.last_tool.load(Ordering::Acquire)
    }

    /// Reinstate the tool after a restart without contacting any
    /// collaborator.
    pub fn restore_tool(&self, tool: ToolNumber) {
        self.current_tool.store(tool, Ordering::Release);
    }

    fn commit(&self, tool: ToolNumber) {
        let previous = self.current_tool.swap(tool, Ordering::AcqRel);
        self.last_tool.store(previous, Ordering::Release);
    }
}

impl std::fmt::Debug for ToolChangeLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolChangeLink")
            .field("atc_name", &self.atc_name)
            .field("m6_macro", &self.m6_macro)
            .field("bound", &self.is_bound())
            .field("current_tool", &self.current_tool())
            .field("last_tool", &self.last_tool())
            .finish()
    }
}
