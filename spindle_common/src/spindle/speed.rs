//! Speed-map configuration types.
//!
//! A speed map is written in configuration as whitespace separated
//! `speed=percent%` pairs, e.g. `"0=0% 1000=0% 24000=100%"`. Percentages are
//! parsed into fixed-point hundredths; no floating point is involved anywhere
//! between the configuration text and the device value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CurveError;
use super::state::SpindleSpeed;
use crate::consts::MAX_SPEED_ENTRIES;

/// Percentage of device range in hundredths of a percent (`10000` = 100 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Percent(u32);

impl Percent {
    /// 0 %.
    pub const ZERO: Self = Self(0);
    /// 100 %.
    pub const FULL: Self = Self(10_000);

    /// Whole percent, e.g. `from_whole(80)` is 80 %.
    #[inline]
    pub const fn from_whole(percent: u32) -> Self {
        Self(percent.saturating_mul(100))
    }

    /// Hundredths of a percent, e.g. `from_hundredths(1250)` is 12.5 %.
    #[inline]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Raw hundredths.
    #[inline]
    pub const fn hundredths(&self) -> u32 {
        self.0
    }

    /// This percentage of `range`, truncated.
    #[inline]
    pub const fn of(&self, range: u32) -> u32 {
        (range as u64 * self.0 as u64 / Self::FULL.0 as u64) as u32
    }

    /// Returns an error if above 100 %.
    pub fn check(self) -> Result<Self, CurveError> {
        if self > Self::FULL {
            Err(CurveError::PercentOutOfRange(self))
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Percent {
    type Err = CurveError;

    /// Accepts `"80"`, `"80%"`, `"12.5%"` and `"12.34%"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CurveError::Malformed(s.to_string());
        let digits = s.trim().trim_end_matches('%');
        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };
        if whole.is_empty() || frac.len() > 2 {
            return Err(malformed());
        }
        let whole: u32 = whole.parse().map_err(|_| malformed())?;
        let frac: u32 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u32>().map_err(|_| malformed())? * 10,
            _ => frac.parse().map_err(|_| malformed())?,
        };
        let hundredths = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(malformed)?;
        Self(hundredths).check()
    }
}

/// How the breakpoints of a speed map are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// Proportional interpolation between breakpoints.
    #[default]
    Linear,
    /// Step lookup: a speed maps to the offset of the highest breakpoint at
    /// or below it.
    Shelf,
}

/// One configured breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeedMapEntry {
    /// Logical speed at this breakpoint.
    pub speed: SpindleSpeed,
    /// Output at this breakpoint as a share of the device range.
    pub percent: Percent,
}

impl SpeedMapEntry {
    /// Create a breakpoint.
    pub const fn new(speed: SpindleSpeed, percent: Percent) -> Self {
        Self { speed, percent }
    }
}

/// Ordered speed-map breakpoints, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpeedMap {
    entries: heapless::Vec<SpeedMapEntry, MAX_SPEED_ENTRIES>,
}

impl SpeedMap {
    /// Build from breakpoints, checking capacity, speed order and percentages.
    pub fn from_entries(entries: &[SpeedMapEntry]) -> Result<Self, CurveError> {
        let mut map = Self::default();
        for entry in entries {
            entry.percent.check()?;
            map.entries
                .push(*entry)
                .map_err(|_| CurveError::TooManyEntries)?;
        }
        map.check_order()?;
        Ok(map)
    }

    /// Configured breakpoints.
    pub fn entries(&self) -> &[SpeedMapEntry] {
        &self.entries
    }

    /// Number of breakpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no breakpoint is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Speeds must strictly increase and output must not decrease.
    pub fn check_order(&self) -> Result<(), CurveError> {
        if self.entries.is_empty() {
            return Err(CurveError::Empty);
        }
        for (index, pair) in self.entries.windows(2).enumerate() {
            if pair[1].speed <= pair[0].speed {
                return Err(CurveError::NotIncreasing {
                    index: index + 1,
                    speed: pair[1].speed,
                });
            }
            if pair[1].percent < pair[0].percent {
                return Err(CurveError::Decreasing {
                    index: index + 1,
                    value: pair[1].percent.hundredths(),
                });
            }
        }
        Ok(())
    }
}

impl FromStr for SpeedMap {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = heapless::Vec::<SpeedMapEntry, MAX_SPEED_ENTRIES>::new();
        for token in s.split_whitespace() {
            let (speed, percent) = token
                .split_once('=')
                .ok_or_else(|| CurveError::Malformed(token.to_string()))?;
            let speed: SpindleSpeed = speed
                .parse()
                .map_err(|_| CurveError::Malformed(token.to_string()))?;
            let percent: Percent = percent.parse()?;
            entries
                .push(SpeedMapEntry::new(speed, percent))
                .map_err(|_| CurveError::TooManyEntries)?;
        }
        Self::from_entries(&entries)
    }
}

impl TryFrom<String> for SpeedMap {
    type Error = CurveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpeedMap> for String {
    fn from(map: SpeedMap) -> Self {
        map.to_string()
    }
}

impl fmt::Display for SpeedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", entry.speed, entry.percent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_parsing() {
        assert_eq!("80".parse::<Percent>().unwrap(), Percent::from_whole(80));
        assert_eq!("80%".parse::<Percent>().unwrap(), Percent::from_whole(80));
        assert_eq!(
            "12.5%".parse::<Percent>().unwrap(),
            Percent::from_hundredths(1250)
        );
        assert_eq!(
            "0.05%".parse::<Percent>().unwrap(),
            Percent::from_hundredths(5)
        );
        assert!(matches!(
            "100.01%".parse::<Percent>(),
            Err(CurveError::PercentOutOfRange(_))
        ));
        assert!(matches!(
            "1.234%".parse::<Percent>(),
            Err(CurveError::Malformed(_))
        ));
        assert!(matches!(
            "%".parse::<Percent>(),
            Err(CurveError::Malformed(_))
        ));
    }

    #[test]
    fn percent_of_range() {
        assert_eq!(Percent::FULL.of(1023), 1023);
        assert_eq!(Percent::from_whole(50).of(1000), 500);
        assert_eq!(Percent::from_hundredths(1250).of(1000), 125);
        assert_eq!(Percent::ZERO.of(u32::MAX), 0);
    }

    #[test]
    fn percent_display() {
        assert_eq!(Percent::from_hundredths(1250).to_string(), "12.50%");
        assert_eq!(Percent::FULL.to_string(), "100.00%");
    }

    #[test]
    fn speed_map_parsing() {
        let map: SpeedMap = "0=0% 1000=0% 24000=100%".parse().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.entries()[2], SpeedMapEntry::new(24000, Percent::FULL));
    }

    #[test]
    fn speed_map_rejects_unordered_speeds() {
        let err = "0=0% 2000=10% 1000=20%".parse::<SpeedMap>().unwrap_err();
        assert_eq!(
            err,
            CurveError::NotIncreasing {
                index: 2,
                speed: 1000
            }
        );
    }

    #[test]
    fn speed_map_rejects_duplicate_speeds() {
        assert!(matches!(
            "0=0% 0=10%".parse::<SpeedMap>(),
            Err(CurveError::NotIncreasing { .. })
        ));
    }

    #[test]
    fn speed_map_rejects_decreasing_output() {
        assert!(matches!(
            "0=50% 1000=10%".parse::<SpeedMap>(),
            Err(CurveError::Decreasing { .. })
        ));
    }

    #[test]
    fn speed_map_rejects_empty_and_malformed() {
        assert_eq!("".parse::<SpeedMap>().unwrap_err(), CurveError::Empty);
        assert!(matches!(
            "1000:50%".parse::<SpeedMap>(),
            Err(CurveError::Malformed(_))
        ));
    }

    #[test]
    fn speed_map_capacity() {
        let text: Vec<String> = (0..=MAX_SPEED_ENTRIES as u32)
            .map(|i| format!("{}=0%", i * 100))
            .collect();
        assert_eq!(
            text.join(" ").parse::<SpeedMap>().unwrap_err(),
            CurveError::TooManyEntries
        );
    }

    #[test]
    fn speed_map_toml_roundtrip() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Wrapper {
            speed_map: SpeedMap,
        }

        let parsed: Wrapper = toml::from_str(r#"speed_map = "0=0% 12000=50% 24000=100%""#).unwrap();
        let text = toml::to_string(&parsed).unwrap();
        let again: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(parsed, again);
    }
}
