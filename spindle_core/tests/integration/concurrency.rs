//! Integration test: interrupt path vs. main loop.
//!
//! The main loop alternates Cw at even speeds and Ccw at odd speeds while the
//! interrupt thread hammers `push_speed`. A third thread checks that every
//! `(state, speed)` it observes is a pair the main loop actually wrote.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use spindle_common::prelude::*;

use super::support::{TWO_SPINDLES, build};

const ROUNDS: u32 = 20_000;

fn consistent(status: SpindleStatus) -> bool {
    match status.state {
        SpindleState::Unknown => status.speed == 0,
        SpindleState::Cw => status.speed % 2 == 0,
        SpindleState::Ccw => status.speed % 2 == 1,
        SpindleState::Disable => false,
    }
}

#[test]
fn no_torn_state_speed_pairs() {
    let m = build(TWO_SPINDLES);
    let spindle = Arc::clone(m.registry.active());
    let isr = m.registry.interrupt_path();
    let reader = m.registry.interrupt_path();
    let done = Arc::new(AtomicBool::new(false));

    let isr_thread = {
        let done = done.clone();
        let value = spindle.map_speed(SpindleState::Cw, 250);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                isr.push_speed(value);
            }
        })
    };

    let reader_thread = {
        let done = done.clone();
        thread::spawn(move || {
            let mut seen = 0u64;
            while !done.load(Ordering::Acquire) {
                let status = reader.status();
                assert!(consistent(status), "torn read: {status:?}");
                seen += 1;
            }
            seen
        })
    };

    for i in 0..ROUNDS {
        let speed = i % 1000;
        let state = if speed % 2 == 0 {
            SpindleState::Cw
        } else {
            SpindleState::Ccw
        };
        spindle.set_state(state, speed).unwrap();
    }

    done.store(true, Ordering::Release);
    isr_thread.join().unwrap();
    let seen = reader_thread.join().unwrap();
    assert!(seen > 0);
    assert!(consistent(spindle.status()));
}

#[test]
fn push_speed_does_not_change_commanded_pair() {
    let m = build(TWO_SPINDLES);
    let spindle = m.registry.active();
    spindle.set_state(SpindleState::Cw, 600).unwrap();

    let isr = m.registry.interrupt_path();
    isr.push_speed(17);

    assert_eq!(spindle.device_value(), 17);
    assert_eq!(m.output("A").speed.load(Ordering::Acquire), 17);
    assert_eq!(spindle.status(), SpindleStatus::new(SpindleState::Cw, 600));
}
