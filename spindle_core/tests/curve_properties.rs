//! Property tests for speed curves and settling delays.

use proptest::prelude::*;

use spindle_common::prelude::*;
use spindle_core::curve::SpeedCurve;
use spindle_core::delay::SettleTiming;

/// Strictly increasing speeds with non-decreasing offsets.
fn table() -> impl Strategy<Value = Vec<(SpindleSpeed, u32)>> {
    prop::collection::vec((1u32..5_000, 0u32..2_000), 1..MAX_SPEED_ENTRIES).prop_map(|steps| {
        let mut speed = 0;
        let mut offset = 0;
        steps
            .into_iter()
            .map(|(ds, doff)| {
                let point = (speed, offset);
                speed += ds;
                offset += doff;
                point
            })
            .collect()
    })
}

fn kind() -> impl Strategy<Value = CurveKind> {
    prop_oneof![Just(CurveKind::Linear), Just(CurveKind::Shelf)]
}

proptest! {
    #[test]
    fn evaluate_is_monotonic(points in table(), kind in kind(), a in 0u32..100_000, b in 0u32..100_000) {
        let curve = SpeedCurve::from_offsets(kind, &points).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(curve.evaluate(SpindleState::Cw, lo) <= curve.evaluate(SpindleState::Cw, hi));
    }

    #[test]
    fn evaluate_stays_within_table(points in table(), kind in kind(), speed in any::<u32>()) {
        let curve = SpeedCurve::from_offsets(kind, &points).unwrap();
        let value = curve.evaluate(SpindleState::Ccw, speed);
        prop_assert!(value >= points[0].1);
        prop_assert!(value <= points[points.len() - 1].1);
    }

    #[test]
    fn disable_is_always_off(points in table(), kind in kind(), speed in any::<u32>()) {
        let curve = SpeedCurve::from_offsets(kind, &points).unwrap();
        prop_assert_eq!(curve.evaluate(SpindleState::Disable, speed), curve.off_offset());
    }

    #[test]
    fn full_range_spinup_never_exceeds_setting(ms in 0u32..=60_000, max_speed in 1u32..1_000_000) {
        let timing = SettleTiming::new(ms, ms, max_speed);
        let delay = timing.delay(
            SpindleStatus::new(SpindleState::Disable, 0),
            SpindleStatus::new(SpindleState::Cw, max_speed),
        );
        prop_assert!(delay.spin_up_ms <= ms);
        prop_assert_eq!(delay.spin_down_ms, 0);
    }
}
