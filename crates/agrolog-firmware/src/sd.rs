//! SD card assembly helpers for the log medium.

use embedded_sdmmc::{TimeSource, Timestamp};

/// FAT metadata time source stamping a fixed build-era date.
///
/// File creation times never appear in the record format and the RTC is
/// owned by the clock service, so the medium driver carries no clock
/// dependency.
pub struct BuildTimeSource;

impl TimeSource for BuildTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 55,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}
