//! Speed curve: logical speed → device output.
//!
//! A curve is a small fixed table of breakpoints held in a `heapless::Vec`, so
//! building it is the only step that can fail and evaluating it never
//! allocates. Offsets are device-level values; every segment also carries a
//! 16.16 fixed-point slope computed at build time, so linear interpolation is
//! one multiply and one shift.
//!
//! Shelf curves use inclusive-lower step lookup: a speed exactly on a
//! breakpoint gets that breakpoint's offset.

use spindle_common::consts::{FIXED_POINT_SHIFT, MAX_SPEED_ENTRIES};
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, Percent, SpeedMap, SpeedMapEntry};
use spindle_common::spindle::state::{SpindleSpeed, SpindleState};

/// One evaluated breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedEntry {
    /// Logical speed.
    pub speed: SpindleSpeed,
    /// Device value at `speed`.
    pub offset: u32,
    /// Slope to the next breakpoint, device units per speed unit, 16.16.
    scale: u64,
}

/// Ordered breakpoint table with its evaluation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedCurve {
    kind: CurveKind,
    entries: heapless::Vec<SpeedEntry, MAX_SPEED_ENTRIES>,
}

impl SpeedCurve {
    /// Convert a configured percent map into device offsets
    /// (`percent * max_dev / 100`) and precompute segment slopes.
    pub fn from_map(map: &SpeedMap, kind: CurveKind, max_dev: u32) -> Result<Self, CurveError> {
        map.check_order()?;
        let mut points = heapless::Vec::<(SpindleSpeed, u32), MAX_SPEED_ENTRIES>::new();
        for entry in map.entries() {
            points
                .push((entry.speed, entry.percent.of(max_dev)))
                .map_err(|_| CurveError::TooManyEntries)?;
        }
        Self::from_offsets(kind, &points)
    }

    /// Build from raw `(speed, device offset)` points.
    pub fn from_offsets(kind: CurveKind, points: &[(SpindleSpeed, u32)]) -> Result<Self, CurveError> {
        if points.is_empty() {
            return Err(CurveError::Empty);
        }
        let mut entries = heapless::Vec::<SpeedEntry, MAX_SPEED_ENTRIES>::new();
        for (index, &(speed, offset)) in points.iter().enumerate() {
            if let Some(prev) = entries.last_mut() {
                if speed <= prev.speed {
                    return Err(CurveError::NotIncreasing { index, speed });
                }
                if offset < prev.offset {
                    return Err(CurveError::Decreasing {
                        index,
                        value: offset,
                    });
                }
                prev.scale = (((offset - prev.offset) as u64) << FIXED_POINT_SHIFT)
                    / (speed - prev.speed) as u64;
            }
            entries
                .push(SpeedEntry {
                    speed,
                    offset,
                    scale: 0,
                })
                .map_err(|_| CurveError::TooManyEntries)?;
        }
        Ok(Self { kind, entries })
    }

    /// Step curve: off below `min`, the `min / max` share of the device range
    /// from `min` up to `max`, full range from `max` on.
    pub fn build_shelf(min: SpindleSpeed, max: SpindleSpeed, max_dev: u32) -> Result<Self, CurveError> {
        Self::from_map(&shelf_map(min, max)?, CurveKind::Shelf, max_dev)
    }

    /// Proportional curve reaching `max_percent` of the device range at
    /// `max_speed`.
    pub fn build_linear(
        max_speed: SpindleSpeed,
        max_percent: Percent,
        max_dev: u32,
    ) -> Result<Self, CurveError> {
        Self::from_map(&linear_map(max_speed, max_percent)?, CurveKind::Linear, max_dev)
    }

    /// Device value for `state` at `speed`.
    ///
    /// Any state other than `Cw`/`Ccw` yields the off value. Speeds outside
    /// the table clamp to the nearest endpoint.
    pub fn evaluate(&self, state: SpindleState, speed: SpindleSpeed) -> u32 {
        let Some(first) = self.entries.first() else {
            return 0;
        };
        if !state.is_running() || speed <= first.speed {
            return first.offset;
        }

        // first.speed < speed, so at least one entry satisfies the predicate.
        let index = self.entries.partition_point(|e| e.speed <= speed) - 1;
        let entry = &self.entries[index];
        match self.kind {
            CurveKind::Shelf => entry.offset,
            CurveKind::Linear if index + 1 == self.entries.len() => entry.offset,
            CurveKind::Linear => {
                let delta = (speed - entry.speed) as u64;
                entry.offset + ((delta * entry.scale) >> FIXED_POINT_SHIFT) as u32
            }
        }
    }

    /// Device value used for Disable.
    #[inline]
    pub fn off_offset(&self) -> u32 {
        self.entries.first().map_or(0, |e| e.offset)
    }

    /// Speed of the last breakpoint.
    #[inline]
    pub fn max_speed(&self) -> SpindleSpeed {
        self.entries.last().map_or(0, |e| e.speed)
    }

    /// Evaluation mode.
    #[inline]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Breakpoints in speed order.
    pub fn entries(&self) -> &[SpeedEntry] {
        &self.entries
    }
}

/// Percent-level shelf map, see [`SpeedCurve::build_shelf`].
pub fn shelf_map(min: SpindleSpeed, max: SpindleSpeed) -> Result<SpeedMap, CurveError> {
    if max == 0 {
        return Err(CurveError::ZeroMaxSpeed);
    }
    let bottom = SpeedMapEntry::new(0, Percent::ZERO);
    let top = SpeedMapEntry::new(max, Percent::FULL);
    if min == 0 || min >= max {
        return SpeedMap::from_entries(&[bottom, top]);
    }
    let share = (min as u64 * Percent::FULL.hundredths() as u64 / max as u64) as u32;
    SpeedMap::from_entries(&[
        bottom,
        SpeedMapEntry::new(min, Percent::from_hundredths(share)),
        top,
    ])
}

/// Percent-level linear map, see [`SpeedCurve::build_linear`].
pub fn linear_map(max_speed: SpindleSpeed, max_percent: Percent) -> Result<SpeedMap, CurveError> {
    if max_speed == 0 {
        return Err(CurveError::ZeroMaxSpeed);
    }
    SpeedMap::from_entries(&[
        SpeedMapEntry::new(0, Percent::ZERO),
        SpeedMapEntry::new(max_speed, max_percent.check()?),
    ])
}
