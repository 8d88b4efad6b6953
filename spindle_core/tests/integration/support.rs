//! Collaborator doubles shared by the integration tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use spindle_common::prelude::*;
use spindle_core::atc::AtcRegistry;
use spindle_core::delay::Dwell;
use spindle_core::{ActiveSpindleRegistry, SpindleSetBuilder, load_config_from_str};

/// Two spindles: A serves tools 0-1, B serves tool 2 and up.
pub const TWO_SPINDLES: &str = r#"
[shared]
service_name = "spindle-it"

[[atc]]
name = "rack"

[[spindles]]
name = "A"
type = "pwm"
tool_num = 0
spinup_ms = 1000
spindown_ms = 1000
speed_map = "0=0% 1000=100%"
reversible = true
off_on_alarm = true

[[spindles]]
name = "B"
type = "pwm"
tool_num = 2
spinup_ms = 500
spindown_ms = 500
speed_map = "0=0% 24000=100%"
atc = "rack"
"#;

/// Output driver that keeps only the latest values.
#[derive(Debug, Default)]
pub struct LatchOutput {
    pub speed: AtomicU32,
    pub enabled: AtomicBool,
}

impl OutputDriver for LatchOutput {
    fn write_speed(&self, value: u32) {
        self.speed.store(value, Ordering::Release);
    }

    fn set_direction(&self, _direction: Direction) {}

    fn set_enable(&self, on: bool) {
        self.enabled.store(on, Ordering::Release);
    }
}

/// Dwell that accumulates instead of sleeping.
#[derive(Debug, Default)]
pub struct CountingDwell {
    pub total_ms: AtomicU32,
}

impl Dwell for CountingDwell {
    fn dwell_ms(&self, ms: u32) {
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

/// Tool changer that records every request.
#[derive(Debug)]
pub struct LoggedChanger {
    pub name: String,
    pub calls: Mutex<Vec<(ToolNumber, bool, bool)>>,
}

impl LoggedChanger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ToolNumber, bool, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolChanger for LoggedChanger {
    fn name(&self) -> &str {
        &self.name
    }

    fn tool_change(
        &self,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), ToolChangeError> {
        self.calls.lock().unwrap().push((tool, pre_select, set_tool));
        Ok(())
    }
}

/// A freshly built machine plus handles on its collaborators.
pub struct Machine {
    pub registry: ActiveSpindleRegistry,
    pub changer: Arc<LoggedChanger>,
    pub dwell: Arc<CountingDwell>,
    pub outputs: Vec<(String, Arc<LatchOutput>)>,
}

impl Machine {
    pub fn output(&self, name: &str) -> &LatchOutput {
        &self
            .outputs
            .iter()
            .find(|(n, _)| n == name)
            .expect("output exists")
            .1
    }
}

pub fn build(toml: &str) -> Machine {
    let config = load_config_from_str(toml).unwrap();
    let changer = Arc::new(LoggedChanger::new("rack"));
    let dwell = Arc::new(CountingDwell::default());
    let mut changers = AtcRegistry::new();
    changers.register(changer.clone());

    let mut outputs = Vec::new();
    let registry = SpindleSetBuilder::new()
        .with_changers(changers)
        .with_dwell(dwell.clone())
        .build_registry(&config, |spindle| {
            let output = Arc::new(LatchOutput::default());
            outputs.push((spindle.name.clone(), output.clone()));
            output as Arc<dyn OutputDriver>
        })
        .unwrap();

    Machine {
        registry,
        changer,
        dwell,
        outputs,
    }
}
