//! Integration test: restart-state recovery.
//!
//! Run, persist, rebuild from the same configuration, restore, and check the
//! spindle and tool come back without a second tool-change sequence.

use spindle_common::prelude::*;
use spindle_core::persist::SpindleStatePersistence;
use tempfile::tempdir;

use super::support::{TWO_SPINDLES, build};

#[test]
fn state_and_tool_survive_restart() {
    let dir = tempdir().unwrap();
    let persistence = SpindleStatePersistence::new(dir.path().join("spindle.bin"));

    {
        let mut m = build(TWO_SPINDLES);
        m.registry.tool_change(3, false, false).unwrap();
        m.registry.active().set_state(SpindleState::Cw, 500).unwrap();
        persistence.save(&m.registry.snapshot()).unwrap();
    }

    let mut m = build(TWO_SPINDLES);
    let saved = persistence.load().unwrap().expect("state saved");
    m.registry.restore(&saved).unwrap();

    let active = m.registry.active();
    assert_eq!(active.name(), "B");
    assert_eq!(active.get_state(), SpindleState::Cw);
    assert_eq!(active.get_speed(), 500);
    assert_eq!(active.current_tool(), 3);
    assert!(m.changer.calls().is_empty());
}

#[test]
fn missing_state_file_leaves_power_up_state() {
    let dir = tempdir().unwrap();
    let persistence = SpindleStatePersistence::new(dir.path().join("absent.bin"));
    let m = build(TWO_SPINDLES);

    assert!(persistence.load().unwrap().is_none());
    assert_eq!(m.registry.active().name(), "A");
    assert_eq!(m.registry.active().status(), SpindleStatus::POWER_UP);
}

#[test]
fn restored_disable_keeps_spindle_off() {
    let dir = tempdir().unwrap();
    let persistence = SpindleStatePersistence::new(dir.path().join("spindle.bin"));

    {
        let m = build(TWO_SPINDLES);
        m.registry.active().set_state(SpindleState::Cw, 800).unwrap();
        m.registry.active().stop().unwrap();
        persistence.save(&m.registry.snapshot()).unwrap();
    }

    let mut m = build(TWO_SPINDLES);
    m.registry.restore(&persistence.load().unwrap().unwrap()).unwrap();
    assert_eq!(m.registry.active().get_state(), SpindleState::Disable);
}
