//! Tool-to-spindle switching decision.
//!
//! Each spindle may claim a tool number; it serves every tool from that
//! number up to the next claim. A request is routed to the spindle with the
//! highest claim not above the requested tool. Ties go to the spindle listed
//! first. When nothing claims the tool the current spindle keeps it.
//!
//! `decide` only decides. The caller stops the old spindle (including its
//! settling delay) before starting the new one.

use std::sync::Arc;

use spindle_common::spindle::state::ToolNumber;

use crate::spindle::SpindleCore;

/// Anything with an optional tool-number claim.
pub trait ToolAssignment {
    /// Lowest tool number served, `None` for no claim.
    fn tool_num(&self) -> Option<ToolNumber>;
}

impl ToolAssignment for SpindleCore {
    fn tool_num(&self) -> Option<ToolNumber> {
        SpindleCore::tool_num(self)
    }
}

impl<T: ToolAssignment + ?Sized> ToolAssignment for Arc<T> {
    fn tool_num(&self) -> Option<ToolNumber> {
        (**self).tool_num()
    }
}

impl ToolAssignment for Option<ToolNumber> {
    fn tool_num(&self) -> Option<ToolNumber> {
        *self
    }
}

/// Outcome of a switching decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDecision {
    /// Index of the spindle that will serve the tool.
    pub next: usize,
    /// Current spindle must be stopped first.
    pub stop_current: bool,
    /// `next` must be initialised and started.
    pub start_next: bool,
}

impl SwitchDecision {
    /// True when the active spindle changes.
    pub fn is_switch(&self) -> bool {
        self.start_next
    }
}

/// Decide which spindle serves `requested_tool`.
///
/// Returns `None` only for an empty spindle list. An out-of-range `current`
/// is treated as no current spindle.
pub fn decide<S: ToolAssignment>(
    requested_tool: ToolNumber,
    spindles: &[S],
    current: Option<usize>,
) -> Option<SwitchDecision> {
    if spindles.is_empty() {
        return None;
    }
    let current = current.filter(|&i| i < spindles.len());

    let mut best: Option<(usize, ToolNumber)> = None;
    for (index, spindle) in spindles.iter().enumerate() {
        let Some(claim) = spindle.tool_num() else {
            continue;
        };
        if claim > requested_tool {
            continue;
        }
        if best.is_none_or(|(_, found)| claim > found) {
            best = Some((index, claim));
        }
    }

    let next = best.map(|(index, _)| index).or(current).unwrap_or(0);
    Some(match current {
        Some(current) if current == next => SwitchDecision {
            next,
            stop_current: false,
            start_next: false,
        },
        Some(_) => SwitchDecision {
            next,
            stop_current: true,
            start_next: true,
        },
        None => SwitchDecision {
            next,
            stop_current: false,
            start_next: true,
        },
    })
}
