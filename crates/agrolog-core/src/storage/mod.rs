//! Append-only persistent log on removable storage.
//!
//! The store is a single UTF-8 text file: one header line followed by one
//! semicolon-delimited record per aggregation cycle. It is created on
//! first boot and only ever appended to afterwards; this module never
//! truncates or rewrites it.

pub mod record;
pub mod sd_card;

pub use record::{LogRecord, MAX_LINE_LEN};
pub use sd_card::SdCardMedium;

use heapless::String;
use log::{debug, info};
use thiserror_no_std::Error;

/// Name of the record store on the storage medium.
pub const LOG_FILE: &str = "readings.csv";

/// Header naming the timestamp column plus the four channel columns, in
/// the fixed [`crate::reading::SensorChannel::ALL`] order. Written exactly
/// once, as the first line of a newly created store.
pub const LOG_HEADER: &str = "TIMESTAMP;TEMP;HUM_EXT;HUM_HIG;LUM";

/// Narrow view of the block-storage/filesystem driver.
///
/// Implementations must open and release any file handle within a single
/// call; the log holds no handle across cycles.
pub trait LogMedium {
    type Error: core::fmt::Debug;

    /// Make the medium ready for file operations. Fails when the medium
    /// is absent or unreadable.
    fn mount(&mut self) -> Result<(), Self::Error>;

    /// Whether a file of this name exists on the medium.
    fn exists(&mut self, name: &str) -> Result<bool, Self::Error>;

    /// Append bytes to a file, creating it first if missing.
    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Self::Error>;
}

impl<M: LogMedium> LogMedium for &mut M {
    type Error = M::Error;

    fn mount(&mut self) -> Result<(), Self::Error> {
        (**self).mount()
    }

    fn exists(&mut self, name: &str) -> Result<bool, Self::Error> {
        (**self).exists(name)
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Self::Error> {
        (**self).append(name, data)
    }
}

#[derive(Debug, Error)]
pub enum StorageError<E: core::fmt::Debug> {
    #[error("storage medium is not mounted")]
    NotMounted,
    #[error("log store has not been initialized")]
    NotReady,
    #[error("record does not fit in a log line")]
    RecordTooLong,
    #[error("failed to mount storage medium: {0:?}")]
    Mount(E),
    #[error("failed to write to log store: {0:?}")]
    Write(E),
}

/// Lifecycle of the log store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    Unmounted,
    Mounted,
    Ready,
}

/// Append-only record store with idempotent initialization.
///
/// State machine: `Unmounted` → [`mount`](PersistentLog::mount) →
/// `Mounted` → [`ensure_header`](PersistentLog::ensure_header) → `Ready` →
/// [`append`](PersistentLog::append) loop. `ensure_header` being a no-op
/// when the store already exists is what makes initialization safe across
/// power cycles; that is the central correctness property here.
pub struct PersistentLog<M: LogMedium> {
    medium: M,
    state: LogState,
}

impl<M: LogMedium> PersistentLog<M> {
    pub fn new(medium: M) -> Self {
        Self {
            medium,
            state: LogState::Unmounted,
        }
    }

    pub fn state(&self) -> LogState {
        self.state
    }

    /// Read-only access to the underlying medium.
    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Mount the storage medium.
    ///
    /// Failure is fatal for the boot sequence; there is no retry loop
    /// here, the caller decides whether to abort or retry the whole boot.
    pub fn mount(&mut self) -> Result<(), StorageError<M::Error>> {
        self.medium.mount().map_err(StorageError::Mount)?;
        if self.state == LogState::Unmounted {
            self.state = LogState::Mounted;
        }
        debug!("storage medium mounted");
        Ok(())
    }

    /// Create the store with its header exactly once; a no-op when the
    /// store already exists.
    pub fn ensure_header(&mut self) -> Result<(), StorageError<M::Error>> {
        if self.state == LogState::Unmounted {
            return Err(StorageError::NotMounted);
        }

        if self.medium.exists(LOG_FILE).map_err(StorageError::Write)? {
            debug!("log store present, keeping existing header");
        } else {
            let mut header: String<64> = String::new();
            if header.push_str(LOG_HEADER).is_err() || header.push('\n').is_err() {
                return Err(StorageError::RecordTooLong);
            }
            self.medium
                .append(LOG_FILE, header.as_bytes())
                .map_err(StorageError::Write)?;
            info!("created log store {} with header", LOG_FILE);
        }

        self.state = LogState::Ready;
        Ok(())
    }

    /// Append one newline-terminated record.
    ///
    /// The file handle is held only for the duration of the call, so a
    /// crash between appends loses at most the in-flight record and never
    /// corrupts prior ones. A failed append is surfaced, not retried; that
    /// cycle's record is lost.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), StorageError<M::Error>> {
        match self.state {
            LogState::Unmounted => return Err(StorageError::NotMounted),
            LogState::Mounted => return Err(StorageError::NotReady),
            LogState::Ready => {}
        }

        let line = record.to_line().map_err(|_| StorageError::RecordTooLong)?;
        self.medium
            .append(LOG_FILE, line.as_bytes())
            .map_err(StorageError::Write)?;
        debug!("appended record at {}", record.timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::DateTime;
    use crate::reading::{Reading, ReadingVector};
    use crate::testutil::MemoryMedium;

    fn sample_record() -> LogRecord {
        LogRecord::new(
            DateTime {
                year: 2025,
                month: 5,
                day: 14,
                weekday: 0,
                hour: 18,
                minute: 50,
                second: 0,
            },
            ReadingVector::new([
                Reading::Valid(24.3),
                Reading::Valid(41.2),
                Reading::Valid(55.0),
                Reading::Valid(62.7),
            ]),
        )
    }

    #[test]
    fn test_header_written_exactly_once() {
        let mut log = PersistentLog::new(MemoryMedium::default());
        log.mount().unwrap();
        log.ensure_header().unwrap();
        log.ensure_header().unwrap();

        let contents = log.medium.contents_str();
        assert_eq!(contents.matches(LOG_HEADER).count(), 1);
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_second_boot_skips_header_and_keeps_lines() {
        let mut medium = MemoryMedium::default();
        {
            let mut log = PersistentLog::new(&mut medium);
            log.mount().unwrap();
            log.ensure_header().unwrap();
            log.append(&sample_record()).unwrap();
        }
        let lines_before = medium.contents_str().lines().count();

        // Simulated power cycle: new log over the same medium.
        let mut log = PersistentLog::new(&mut medium);
        log.mount().unwrap();
        log.ensure_header().unwrap();

        let contents = log.medium.contents_str();
        assert_eq!(contents.lines().count(), lines_before);
        assert_eq!(contents.matches(LOG_HEADER).count(), 1);
    }

    #[test]
    fn test_append_before_mount_is_rejected() {
        let mut log = PersistentLog::new(MemoryMedium::default());
        assert!(matches!(
            log.append(&sample_record()),
            Err(StorageError::NotMounted)
        ));
    }

    #[test]
    fn test_append_before_header_is_rejected() {
        let mut log = PersistentLog::new(MemoryMedium::default());
        log.mount().unwrap();
        assert!(matches!(
            log.append(&sample_record()),
            Err(StorageError::NotReady)
        ));
    }

    #[test]
    fn test_mount_failure_is_surfaced() {
        let mut medium = MemoryMedium::default();
        medium.fail_mount = true;
        let mut log = PersistentLog::new(medium);
        assert!(matches!(log.mount(), Err(StorageError::Mount(_))));
        assert_eq!(log.state(), LogState::Unmounted);
    }

    #[test]
    fn test_failed_append_loses_only_that_record() {
        let mut log = PersistentLog::new(MemoryMedium::default());
        log.mount().unwrap();
        log.ensure_header().unwrap();
        log.append(&sample_record()).unwrap();

        log.medium.fail_append = true;
        assert!(matches!(
            log.append(&sample_record()),
            Err(StorageError::Write(_))
        ));

        log.medium.fail_append = false;
        log.append(&sample_record()).unwrap();
        // Header plus the two appends that succeeded.
        assert_eq!(log.medium.contents_str().lines().count(), 3);
    }

    #[test]
    fn test_record_roundtrip_through_store() {
        let mut log = PersistentLog::new(MemoryMedium::default());
        log.mount().unwrap();
        log.ensure_header().unwrap();
        log.append(&sample_record()).unwrap();

        let contents = log.medium.contents_str();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(LOG_HEADER));
        let parsed = LogRecord::parse_line(lines.next().unwrap()).unwrap();
        assert_eq!(parsed, sample_record());
    }
}
