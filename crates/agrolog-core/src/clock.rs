//! Real-time-clock access and timestamp handling.

use core::fmt;

use log::warn;
use thiserror_no_std::Error;

/// Calendar date-time with second resolution.
///
/// Subseconds reported by the underlying RTC driver are dropped at this
/// boundary; nothing downstream uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// Day of week, 0-based. Carried for the RTC registers, never logged.
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Sentinel stamped on records when the clock cannot be read.
    pub const INVALID: Self = Self {
        year: 0,
        month: 0,
        day: 0,
        weekday: 0,
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub const fn is_valid(&self) -> bool {
        self.year != 0
    }

    /// Parse the `YYYY-MM-DD HH:MM:SS` form produced by [`Display`].
    /// The weekday is not part of the text form and comes back as 0.
    pub fn parse(text: &str) -> Option<Self> {
        let (date, time) = text.split_once(' ')?;

        let mut date_fields = date.split('-');
        let year = date_fields.next()?.parse().ok()?;
        let month = date_fields.next()?.parse().ok()?;
        let day = date_fields.next()?.parse().ok()?;
        if date_fields.next().is_some() {
            return None;
        }

        let mut time_fields = time.split(':');
        let hour = time_fields.next()?.parse().ok()?;
        let minute = time_fields.next()?.parse().ok()?;
        let second = time_fields.next()?.parse().ok()?;
        if time_fields.next().is_some() {
            return None;
        }

        Some(Self {
            year,
            month,
            day,
            weekday: 0,
            hour,
            minute,
            second,
        })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Device driver for the battery-backed real-time clock.
pub trait Rtc {
    type Error: core::fmt::Debug;

    fn set_datetime(&mut self, datetime: &DateTime) -> impl Future<Output = Result<(), Self::Error>>;

    fn datetime(&mut self) -> impl Future<Output = Result<DateTime, Self::Error>>;
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    #[error("real-time clock unreachable")]
    Unreachable,
}

/// Current time plus one-time initialization of the series epoch.
pub struct ClockService<R> {
    rtc: R,
}

impl<R: Rtc> ClockService<R> {
    pub fn new(rtc: R) -> Self {
        Self { rtc }
    }

    /// Set the device clock to the series epoch.
    ///
    /// Intended to run at most once per deployment: re-running resets the
    /// log's time origin, which is an operational hazard, not a software
    /// bug. Fails loudly when the device is unreachable.
    pub async fn initialize(&mut self, epoch: DateTime) -> Result<(), ClockError> {
        warn!("setting clock epoch to {}; earlier records keep their old origin", epoch);
        self.rtc.set_datetime(&epoch).await.map_err(|e| {
            warn!("clock set failed: {:?}", e);
            ClockError::Unreachable
        })
    }

    /// Current time, or [`DateTime::INVALID`] when the device fails.
    ///
    /// A clock failure never blocks a log append; the caller writes the
    /// sentinel instead of refusing to record the cycle.
    pub async fn now(&mut self) -> DateTime {
        match self.rtc.datetime().await {
            Ok(datetime) => datetime,
            Err(e) => {
                warn!("clock read failed, stamping sentinel: {:?}", e);
                DateTime::INVALID
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{DeadRtc, FixedRtc};
    use embassy_futures::block_on;
    use std::string::ToString;

    fn reference_time() -> DateTime {
        DateTime {
            year: 2025,
            month: 5,
            day: 14,
            weekday: 0,
            hour: 18,
            minute: 50,
            second: 0,
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(reference_time().to_string(), "2025-05-14 18:50:00");
        assert_eq!(DateTime::INVALID.to_string(), "0000-00-00 00:00:00");
    }

    #[test]
    fn test_parse_roundtrip() {
        let text = reference_time().to_string();
        assert_eq!(DateTime::parse(&text), Some(reference_time()));
        assert_eq!(DateTime::parse("not a timestamp"), None);
        assert_eq!(DateTime::parse("2025-05-14"), None);
    }

    #[test]
    fn test_now_reads_device_time() {
        let mut clock = ClockService::new(FixedRtc::new(reference_time()));
        assert_eq!(block_on(clock.now()), reference_time());
    }

    #[test]
    fn test_now_substitutes_sentinel_on_failure() {
        let mut clock = ClockService::new(DeadRtc);
        let stamped = block_on(clock.now());
        assert_eq!(stamped, DateTime::INVALID);
        assert!(!stamped.is_valid());
    }

    #[test]
    fn test_initialize_fails_loudly_when_unreachable() {
        let mut clock = ClockService::new(DeadRtc);
        assert_eq!(
            block_on(clock.initialize(reference_time())),
            Err(ClockError::Unreachable)
        );
    }

    #[test]
    fn test_initialize_sets_epoch() {
        let mut clock = ClockService::new(FixedRtc::new(DateTime::INVALID));
        block_on(clock.initialize(reference_time())).unwrap();
        assert_eq!(block_on(clock.now()), reference_time());
    }
}
