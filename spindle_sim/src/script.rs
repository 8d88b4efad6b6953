//! Line-oriented command scripts.
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! tool 2          # full tool change, may switch spindle
//! preselect 5     # tell the changer what comes next
//! settool 5       # record tool 5 without moving anything
//! cw 12000
//! ccw 8000
//! isr 512         # raw device value through the interrupt path
//! stop
//! alarm
//! status
//! ```

use std::io::BufRead;
use std::str::FromStr;

use spindle_common::prelude::*;
use spindle_core::ActiveSpindleRegistry;
use spindle_core::persist::SpindleStatePersistence;
use thiserror::Error;
use tracing::{info, warn};

/// Parsed script command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cw(SpindleSpeed),
    Ccw(SpindleSpeed),
    Stop,
    Tool(ToolNumber),
    Preselect(ToolNumber),
    SetTool(ToolNumber),
    Isr(u32),
    Alarm,
    Status,
}

/// Script syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{0}' expects a number")]
    MissingArgument(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Failure that ends a script run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("line {line}: {source}")]
    Syntax {
        line: usize,
        #[source]
        source: ScriptError,
    },

    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Spindle(#[from] SpindleError),
}

impl FromStr for Command {
    type Err = ScriptError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let command = match name {
            "cw" => Self::Cw(number("cw", words.next())?),
            "ccw" => Self::Ccw(number("ccw", words.next())?),
            "tool" => Self::Tool(number("tool", words.next())?),
            "preselect" => Self::Preselect(number("preselect", words.next())?),
            "settool" => Self::SetTool(number("settool", words.next())?),
            "isr" => Self::Isr(number("isr", words.next())?),
            "stop" => Self::Stop,
            "alarm" => Self::Alarm,
            "status" => Self::Status,
            other => return Err(ScriptError::UnknownCommand(other.to_string())),
        };
        match words.next() {
            Some(extra) => Err(ScriptError::UnexpectedArgument(extra.to_string())),
            None => Ok(command),
        }
    }
}

fn number(command: &'static str, word: Option<&str>) -> Result<u32, ScriptError> {
    let word = word.ok_or(ScriptError::MissingArgument(command))?;
    word.parse()
        .map_err(|_| ScriptError::InvalidNumber(word.to_string()))
}

/// Parse one script line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ScriptError> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

/// Runs commands against a spindle set, persisting after each one.
pub struct Session {
    registry: ActiveSpindleRegistry,
    persistence: Option<SpindleStatePersistence>,
    rejected: usize,
}

impl Session {
    pub fn new(
        registry: ActiveSpindleRegistry,
        persistence: Option<SpindleStatePersistence>,
    ) -> Self {
        Self {
            registry,
            persistence,
            rejected: 0,
        }
    }

    pub fn registry(&self) -> &ActiveSpindleRegistry {
        &self.registry
    }

    /// Commands refused by the core so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Restore the last saved state, if any.
    pub fn restore(&mut self) -> Result<bool, SpindleError> {
        let Some(persistence) = &self.persistence else {
            return Ok(false);
        };
        match persistence.load()? {
            Some(state) => {
                self.registry.restore(&state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Execute one command.
    ///
    /// A command the core rejects is logged and counted; the run goes on.
    /// Persistence failures are returned.
    pub fn execute(&mut self, command: Command) -> Result<(), SpindleError> {
        if let Err(e) = self.apply(command) {
            warn!("{:?} rejected: {}", command, e);
            self.rejected += 1;
        }
        self.save()
    }

    /// Execute every line from `reader`. Returns the number of commands run.
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<usize, RunError> {
        let mut count = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let command = parse_line(&line).map_err(|source| RunError::Syntax {
                line: index + 1,
                source,
            })?;
            if let Some(command) = command {
                self.execute(command)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// One-line description of the active spindle.
    pub fn status_line(&self) -> String {
        let spindle = self.registry.active();
        let status = spindle.status();
        format!(
            "{}: {:?} speed {} device {} tool {}",
            spindle.name(),
            status.state,
            status.speed,
            spindle.device_value(),
            spindle.current_tool()
        )
    }

    fn apply(&mut self, command: Command) -> Result<(), SpindleError> {
        match command {
            Command::Cw(speed) => self.registry.active().set_state(SpindleState::Cw, speed),
            Command::Ccw(speed) => self.registry.active().set_state(SpindleState::Ccw, speed),
            Command::Stop => self.registry.active().stop(),
            Command::Tool(tool) => self.registry.tool_change(tool, false, false),
            Command::Preselect(tool) => self.registry.tool_change(tool, true, false),
            Command::SetTool(tool) => self.registry.tool_change(tool, false, true),
            Command::Isr(value) => {
                self.registry.interrupt_path().push_speed(value);
                Ok(())
            }
            Command::Alarm => {
                if !self.registry.handle_alarm()? {
                    info!("Alarm: '{}' left running", self.registry.active().name());
                }
                Ok(())
            }
            Command::Status => {
                info!("{}", self.status_line());
                Ok(())
            }
        }
    }

    fn save(&self) -> Result<(), SpindleError> {
        match &self.persistence {
            Some(persistence) => persistence.save(&self.registry.snapshot()),
            None => Ok(()),
        }
    }
}
