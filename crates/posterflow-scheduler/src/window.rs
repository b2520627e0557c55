//! Tick-window resolution in one fixed timezone.
//!
//! `scheduled_at` values are stored as absolute UTC instants, but they are
//! *collected* from timezone-naive date-time pickers. This module is the
//! single place that decides what a naive schedule time means and which
//! calendar minute "now" belongs to — always against the configured offset,
//! never against the host's local timezone.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};
use thiserror::Error;

use posterflow_core::config::DeliveryConfig;
use posterflow_core::error::PosterflowError;

#[derive(Debug, Error)]
#[error("invalid schedule time {value:?}: {reason}")]
pub struct InvalidScheduleTime {
    pub value: String,
    pub reason: String,
}

/// Resolves the canonical due window for a dispatch tick.
#[derive(Debug, Clone, Copy)]
pub struct TickWindow {
    offset: FixedOffset,
}

impl TickWindow {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build from `delivery.timezone`, e.g. `"+05:30"` or `"-03:00"`.
    pub fn from_config(delivery: &DeliveryConfig) -> Result<Self, PosterflowError> {
        let offset = parse_utc_offset(&delivery.timezone).ok_or_else(|| {
            PosterflowError::Config(format!(
                "delivery.timezone {:?} is not a valid UTC offset (expected ±HH:MM)",
                delivery.timezone
            ))
        })?;
        Ok(Self::new(offset))
    }

    /// Inclusive start and end of the calendar minute containing `reference`
    /// in the configured zone, as UTC instants.
    ///
    /// The end is the last representable millisecond of the minute, so a
    /// `BETWEEN start AND end` query with millisecond-precision storage is
    /// inclusive without overlapping the next minute's window.
    pub fn current_tick(&self, reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let local = reference.with_timezone(&self.offset);
        let floor = local
            - Duration::seconds(local.second() as i64)
            - Duration::nanoseconds(local.nanosecond() as i64);
        let start = floor.with_timezone(&Utc);
        let end = start + Duration::milliseconds(59_999);
        (start, end)
    }

    /// Parse a schedule time from API input.
    ///
    /// RFC 3339 input carries its own offset and is honored as-is; a naive
    /// `YYYY-MM-DDTHH:MM[:SS]` is interpreted in the configured zone.
    pub fn parse_schedule_time(&self, raw: &str) -> Result<DateTime<Utc>, InvalidScheduleTime> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
            .map_err(|e| InvalidScheduleTime {
                value: raw.to_string(),
                reason: e.to_string(),
            })?;

        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| InvalidScheduleTime {
                value: raw.to_string(),
                reason: "ambiguous local time".to_string(),
            })
    }
}

/// Parse `"+05:30"` / `"-03:00"` into a [`FixedOffset`].
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
