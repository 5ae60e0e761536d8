//! Log record serialization: one semicolon-delimited line per cycle.

use core::fmt::{self, Write};

use heapless::String;

use crate::clock::DateTime;
use crate::reading::{Reading, ReadingVector, SensorChannel};

/// Upper bound for one serialized record line.
pub const MAX_LINE_LEN: usize = 128;

/// One aggregation cycle: timestamp plus per-channel means. Immutable once
/// written to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime,
    pub readings: ReadingVector,
}

impl LogRecord {
    pub fn new(timestamp: DateTime, readings: ReadingVector) -> Self {
        Self {
            timestamp,
            readings,
        }
    }

    /// Serialize as `YYYY-MM-DD HH:MM:SS;T;H;S;L\n` with one decimal per
    /// value. Invalid readings serialize as 0.0.
    pub fn to_line(&self) -> Result<String<MAX_LINE_LEN>, fmt::Error> {
        let mut line = String::new();
        write!(line, "{}", self.timestamp)?;
        for channel in SensorChannel::ALL {
            write!(line, ";{:.1}", self.readings.get(channel).value_or_zero())?;
        }
        line.push('\n').map_err(|_| fmt::Error)?;
        Ok(line)
    }

    /// Parse a line previously produced by [`to_line`](Self::to_line).
    /// Accepts the line with or without its trailing newline.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.split(';');

        let timestamp = DateTime::parse(fields.next()?)?;

        let mut readings = ReadingVector::invalid();
        for channel in SensorChannel::ALL {
            let value: f32 = fields.next()?.trim().parse().ok()?;
            readings.set(channel, Reading::Valid(value));
        }
        if fields.next().is_some() {
            return None;
        }

        Some(Self {
            timestamp,
            readings,
        })
    }
}
