//! Date-time and time-span scalar values.

use std::fmt;

use crate::error::DecodeError;

/// Largest legal tick count (one tick short of year 10000).
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

const TICKS_MASK: u64 = 0x3fff_ffff_ffff_ffff;
const KIND_SHIFT: u32 = 62;

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// The 2-bit discriminator packed above the tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    Unspecified = 0,
    Utc = 1,
    Local = 2,
    /// Local time inside the repeated hour of a daylight-saving fallback.
    LocalAmbiguousDst = 3,
}

impl DateTimeKind {
    fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => Self::Unspecified,
            1 => Self::Utc,
            2 => Self::Local,
            _ => Self::LocalAmbiguousDst,
        }
    }
}

/// A calendar instant as ticks of 100ns since 0001-01-01, plus its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    ticks: i64,
    kind: DateTimeKind,
}

impl DateTime {
    pub const MIN: DateTime = DateTime {
        ticks: 0,
        kind: DateTimeKind::Unspecified,
    };

    pub const MAX: DateTime = DateTime {
        ticks: MAX_TICKS,
        kind: DateTimeKind::Unspecified,
    };

    /// Returns `None` when `ticks` is outside `0..=MAX_TICKS`.
    pub fn new(ticks: i64, kind: DateTimeKind) -> Option<Self> {
        (0..=MAX_TICKS)
            .contains(&ticks)
            .then_some(Self { ticks, kind })
    }

    /// Unpacks the 64-bit wire slot, validating the tick range.
    pub fn from_raw(raw: u64) -> Result<Self, DecodeError> {
        let ticks = (raw & TICKS_MASK) as i64;
        let kind = DateTimeKind::from_bits(raw >> KIND_SHIFT);
        Self::new(ticks, kind).ok_or(DecodeError::InvalidDateTime(raw))
    }

    /// Packs kind and ticks into the 64-bit wire slot.
    pub fn to_raw(self) -> u64 {
        ((self.kind as u64) << KIND_SHIFT) | (self.ticks as u64)
    }

    pub fn ticks(self) -> i64 {
        self.ticks
    }

    pub fn kind(self) -> DateTimeKind {
        self.kind
    }
}

/// A signed duration in 100ns ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan {
    pub ticks: i64,
}

impl TimeSpan {
    pub const MIN: TimeSpan = TimeSpan { ticks: i64::MIN };
    pub const MAX: TimeSpan = TimeSpan { ticks: i64::MAX };

    pub fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            ticks: seconds.saturating_mul(TICKS_PER_SECOND),
        }
    }
}

impl fmt::Display for TimeSpan {
    /// `[-][d.]hh:mm:ss[.fffffff]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.ticks < 0;
        let ticks = self.ticks.unsigned_abs();
        let per_second = TICKS_PER_SECOND as u64;
        let fraction = ticks % per_second;
        let total_seconds = ticks / per_second;
        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = (total_seconds / 3600) % 24;
        let days = total_seconds / 86_400;
        if negative {
            f.write_str("-")?;
        }
        if days > 0 {
            write!(f, "{days}.")?;
        }
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")?;
        if fraction > 0 {
            write!(f, ".{fraction:07}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_packing_keeps_kind_bits() {
        for kind in [
            DateTimeKind::Unspecified,
            DateTimeKind::Utc,
            DateTimeKind::Local,
            DateTimeKind::LocalAmbiguousDst,
        ] {
            let value = DateTime::new(637_000_000_000_000_000, kind).unwrap();
            let raw = value.to_raw();
            assert_eq!(raw >> 62, kind as u64);
            assert_eq!(DateTime::from_raw(raw), Ok(value));
        }
    }

    #[test]
    fn out_of_range_ticks_rejected_after_masking_kind() {
        let raw = (1u64 << 62) | (MAX_TICKS as u64 + 1);
        assert_eq!(DateTime::from_raw(raw), Err(DecodeError::InvalidDateTime(raw)));
        assert!(DateTime::from_raw((2u64 << 62) | MAX_TICKS as u64).is_ok());
    }

    #[test]
    fn time_span_display() {
        assert_eq!(TimeSpan::from_seconds(3600).to_string(), "01:00:00");
        assert_eq!(
            TimeSpan::from_ticks(-(86_400 * TICKS_PER_SECOND + 5)).to_string(),
            "-1.00:00:00.0000005"
        );
    }
}
