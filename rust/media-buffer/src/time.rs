//! Signed media time offsets with microsecond precision.

use std::ops::{Add, Neg, Sub};

/// A signed time offset, stored as a count of microseconds.
///
/// Two extreme values double as sentinels: [`TimeDelta::NO_TIMESTAMP`] (unknown or
/// invalid time) and [`TimeDelta::INFINITE`]. Arithmetic saturates, so the sentinels
/// survive addition and subtraction instead of wrapping into ordinary values.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimeDelta {
    micros: i64,
}

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta { micros: 0 };
    pub const MIN: TimeDelta = TimeDelta { micros: i64::MIN };
    pub const MAX: TimeDelta = TimeDelta { micros: i64::MAX };

    /// Marks a timestamp or duration that is unknown.
    pub const NO_TIMESTAMP: TimeDelta = Self::MIN;

    pub const INFINITE: TimeDelta = Self::MAX;

    pub const MICROSECONDS_PER_MILLISECOND: i64 = 1_000;
    pub const MICROSECONDS_PER_SECOND: i64 = 1_000_000;

    #[inline]
    pub const fn from_microseconds(micros: i64) -> TimeDelta {
        TimeDelta { micros }
    }

    #[inline]
    pub const fn from_milliseconds(millis: i64) -> TimeDelta {
        TimeDelta {
            micros: millis.saturating_mul(Self::MICROSECONDS_PER_MILLISECOND),
        }
    }

    #[inline]
    pub const fn from_seconds(seconds: i64) -> TimeDelta {
        TimeDelta {
            micros: seconds.saturating_mul(Self::MICROSECONDS_PER_SECOND),
        }
    }

    #[inline]
    pub const fn in_microseconds(&self) -> i64 {
        self.micros
    }

    #[inline]
    pub const fn in_milliseconds(&self) -> i64 {
        self.micros / Self::MICROSECONDS_PER_MILLISECOND
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.micros == 0
    }

    #[inline]
    pub const fn is_no_timestamp(&self) -> bool {
        self.micros == i64::MIN
    }

    #[inline]
    pub const fn is_infinite(&self) -> bool {
        self.micros == i64::MAX
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta::from_microseconds(self.micros.saturating_add(rhs.micros))
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta::from_microseconds(self.micros.saturating_sub(rhs.micros))
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    fn neg(self) -> TimeDelta {
        TimeDelta::from_microseconds(self.micros.saturating_neg())
    }
}

impl std::fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}us", self.micros)
    }
}

/// Amount of decoded output to trim around a buffer, used for gapless audio.
///
/// `front` is dropped from the start of the decoded output of the buffer and
/// `back` from its end.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
pub struct DiscardPadding {
    pub front: TimeDelta,
    pub back: TimeDelta,
}

impl DiscardPadding {
    pub const fn new(front: TimeDelta, back: TimeDelta) -> DiscardPadding {
        DiscardPadding { front, back }
    }

    /// Returns `true` if nothing is trimmed on either side.
    pub const fn is_empty(&self) -> bool {
        self.front.is_zero() && self.back.is_zero()
    }
}

impl From<(TimeDelta, TimeDelta)> for DiscardPadding {
    fn from((front, back): (TimeDelta, TimeDelta)) -> Self {
        DiscardPadding { front, back }
    }
}
