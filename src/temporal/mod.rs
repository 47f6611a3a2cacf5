//! Time expression handling
//!
//! Resolves relative phrases ("明天下午", "next week") and absolute dates
//! ("2025年1月21日", "1/21") in query text into concrete UTC time ranges.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::TimeRangeConfig;

pub mod keywords;
mod resolver;

pub use keywords::{Anchor, DayPart, TimeKeyword, TIME_KEYWORDS};
pub use resolver::TimeExpressionResolver;

/// A half-open UTC interval `[start, end)` with a human-readable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

/// Reasons a time range is rejected before it reaches storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("end ({end}) is not after start ({start})")]
    EndNotAfterStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("start ({start}) is more than {max_days} days in the future")]
    TooFarInFuture { start: DateTime<Utc>, max_days: u32 },

    #[error("span of {days} days exceeds the limit of {max_days} days")]
    SpanTooLong { days: i64, max_days: u32 },
}

impl TimeRange {
    /// Build a range, returning `None` unless `end > start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, label: impl Into<String>) -> Option<Self> {
        if end <= start {
            return None;
        }
        Some(Self {
            start,
            end,
            label: label.into(),
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `t` lies inside the range (start inclusive, end exclusive)
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    pub fn is_well_formed(&self) -> bool {
        self.end > self.start
    }

    /// Check the range against the configured limits
    ///
    /// # Arguments
    /// * `now` - Reference instant for the future-start check
    /// * `limits` - Maximum future offset and maximum span, in days
    pub fn validate(&self, now: DateTime<Utc>, limits: &TimeRangeConfig) -> Result<(), TimeRangeError> {
        if !self.is_well_formed() {
            return Err(TimeRangeError::EndNotAfterStart {
                start: self.start,
                end: self.end,
            });
        }

        if self.start > now + Duration::days(i64::from(limits.max_future_days)) {
            return Err(TimeRangeError::TooFarInFuture {
                start: self.start,
                max_days: limits.max_future_days,
            });
        }

        if self.duration() > Duration::days(i64::from(limits.max_range_days)) {
            return Err(TimeRangeError::SpanTooLong {
                days: self.duration().num_days(),
                max_days: limits.max_range_days,
            });
        }

        Ok(())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} .. {})",
            self.label,
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}

/// Where a resolved range came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// An explicit calendar date in the text
    Absolute,
    /// A relative keyword such as 明天 or "next week"
    Relative,
}

/// A resolved time range together with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTime {
    pub range: TimeRange,
    pub source: TimeSource,
}

/// How schedule storage should match a time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleQueryMode {
    /// No time constraint was expressed
    #[default]
    Auto,
    /// Schedules overlapping the range
    Standard,
    /// Schedules fully contained in the range
    Strict,
}

impl ScheduleQueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Standard => "standard",
            Self::Strict => "strict",
        }
    }
}

impl From<Option<TimeSource>> for ScheduleQueryMode {
    fn from(source: Option<TimeSource>) -> Self {
        match source {
            None => Self::Auto,
            Some(TimeSource::Relative) => Self::Standard,
            Some(TimeSource::Absolute) => Self::Strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_or_inverted() {
        assert!(TimeRange::new(at(2025, 1, 2, 0), at(2025, 1, 2, 0), "x").is_none());
        assert!(TimeRange::new(at(2025, 1, 3, 0), at(2025, 1, 2, 0), "x").is_none());
        assert!(TimeRange::new(at(2025, 1, 2, 0), at(2025, 1, 3, 0), "x").is_some());
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = TimeRange::new(at(2025, 1, 2, 0), at(2025, 1, 3, 0), "day").unwrap();
        assert!(range.contains(at(2025, 1, 2, 0)));
        assert!(range.contains(at(2025, 1, 2, 23)));
        assert!(!range.contains(at(2025, 1, 3, 0)));
        assert_eq!(range.duration(), Duration::hours(24));
    }

    #[test]
    fn test_validate_limits() {
        let limits = TimeRangeConfig::default();
        let now = at(2025, 1, 1, 12);

        let ok = TimeRange::new(at(2025, 1, 2, 0), at(2025, 1, 3, 0), "tomorrow").unwrap();
        assert!(ok.validate(now, &limits).is_ok());

        let far = TimeRange::new(at(2025, 6, 1, 0), at(2025, 6, 2, 0), "june").unwrap();
        assert!(matches!(
            far.validate(now, &limits),
            Err(TimeRangeError::TooFarInFuture { .. })
        ));

        let long = TimeRange::new(at(2024, 1, 1, 0), at(2025, 1, 1, 0), "year").unwrap();
        assert!(matches!(
            long.validate(now, &limits),
            Err(TimeRangeError::SpanTooLong { days: 366, .. })
        ));

        let inverted = TimeRange {
            start: at(2025, 1, 3, 0),
            end: at(2025, 1, 2, 0),
            label: "bad".to_string(),
        };
        assert!(matches!(
            inverted.validate(now, &limits),
            Err(TimeRangeError::EndNotAfterStart { .. })
        ));
    }

    #[test]
    fn test_mode_from_source() {
        assert_eq!(ScheduleQueryMode::from(None), ScheduleQueryMode::Auto);
        assert_eq!(
            ScheduleQueryMode::from(Some(TimeSource::Relative)),
            ScheduleQueryMode::Standard
        );
        assert_eq!(
            ScheduleQueryMode::from(Some(TimeSource::Absolute)),
            ScheduleQueryMode::Strict
        );
    }
}
