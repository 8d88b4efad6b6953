//! Integration test: tool changes across a two-spindle machine.

use std::sync::atomic::Ordering;

use spindle_common::prelude::*;

use super::support::{TWO_SPINDLES, build};

#[test]
fn tool_two_moves_to_spindle_b_after_stopping_a() {
    let mut m = build(TWO_SPINDLES);
    m.registry.active().set_state(SpindleState::Cw, 1000).unwrap();
    assert!(m.output("A").enabled.load(Ordering::Acquire));
    m.dwell.total_ms.store(0, Ordering::Relaxed);

    m.registry.tool_change(2, false, false).unwrap();

    let a = m.registry.get("A").unwrap();
    assert_eq!(a.get_state(), SpindleState::Disable);
    assert!(!m.output("A").enabled.load(Ordering::Acquire));
    // Full spin-down of A: 1000 speed units at 1000 ms per 1000.
    assert_eq!(m.dwell.total_ms.load(Ordering::Relaxed), 1000);

    assert_eq!(m.registry.active().name(), "B");
    assert_eq!(m.registry.active().current_tool(), 2);
    assert_eq!(m.changer.calls(), vec![(2, false, false)]);
}

#[test]
fn tool_on_current_spindle_keeps_it_running() {
    let mut m = build(TWO_SPINDLES);
    m.registry.active().set_state(SpindleState::Ccw, 400).unwrap();
    m.registry.tool_change(1, false, false).unwrap();

    assert_eq!(m.registry.active().name(), "A");
    assert_eq!(m.registry.active().get_state(), SpindleState::Ccw);
    assert_eq!(m.registry.active().current_tool(), 1);
    assert!(m.changer.calls().is_empty());
}

#[test]
fn pre_select_reaches_the_changer_without_switching() {
    let mut m = build(TWO_SPINDLES);
    m.registry.tool_change(7, true, false).unwrap();

    assert_eq!(m.registry.active().name(), "A");
    assert_eq!(m.changer.calls(), vec![(7, true, false)]);
    assert_eq!(m.registry.get("B").unwrap().current_tool(), 0);
}

#[test]
fn ccw_rejected_on_spindle_b() {
    let mut m = build(TWO_SPINDLES);
    m.registry.tool_change(2, false, false).unwrap();
    let err = m.registry.active().set_state(SpindleState::Ccw, 100).unwrap_err();
    assert!(matches!(err, SpindleError::NotReversible { .. }));
}

#[test]
fn alarm_stops_a_but_not_b() {
    let mut m = build(TWO_SPINDLES);
    m.registry.active().set_state(SpindleState::Cw, 300).unwrap();
    assert!(m.registry.handle_alarm().unwrap());
    assert_eq!(m.registry.active().get_state(), SpindleState::Disable);

    m.registry.tool_change(2, false, false).unwrap();
    m.registry.active().set_state(SpindleState::Cw, 300).unwrap();
    assert!(!m.registry.handle_alarm().unwrap());
    assert_eq!(m.registry.active().get_state(), SpindleState::Cw);
}
