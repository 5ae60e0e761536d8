//! Shared mock drivers for unit tests.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use std::vec::Vec;

use crate::clock::{DateTime, Rtc};
use crate::sensors::{AnalogInput, ClimateSample, ClimateSensor};
use crate::storage::LogMedium;

/// Error type for every scripted failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptFault;

/// Delay that completes immediately; burst timing is irrelevant to the
/// logic under test.
pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Climate sensor replaying a fixed script of transactions. `None` steps
/// (and reads past the end of the script) fail the whole transaction.
pub struct ScriptedClimate {
    script: Vec<Option<(f32, f32)>>,
    cursor: usize,
}

impl ScriptedClimate {
    pub fn new(script: &[Option<(f32, f32)>]) -> Self {
        Self {
            script: script.to_vec(),
            cursor: 0,
        }
    }
}

impl ClimateSensor for ScriptedClimate {
    type Error = ScriptFault;

    async fn measure(&mut self) -> Result<ClimateSample, ScriptFault> {
        let step = self.script.get(self.cursor).copied().flatten();
        self.cursor += 1;
        match step {
            Some((temperature, humidity)) => Ok(ClimateSample {
                temperature,
                humidity,
            }),
            None => Err(ScriptFault),
        }
    }
}

/// Analog input replaying raw converter codes; `None` steps fail the read.
pub struct ScriptedAnalog {
    script: Vec<Option<u16>>,
    cursor: usize,
}

impl ScriptedAnalog {
    pub fn new(script: &[Option<u16>]) -> Self {
        Self {
            script: script.to_vec(),
            cursor: 0,
        }
    }
}

impl AnalogInput for ScriptedAnalog {
    type Error = ScriptFault;

    fn read_raw(&mut self) -> Result<u16, ScriptFault> {
        let step = self.script.get(self.cursor).copied().flatten();
        self.cursor += 1;
        step.ok_or(ScriptFault)
    }
}

/// RTC holding a settable fixed time.
pub struct FixedRtc {
    now: DateTime,
}

impl FixedRtc {
    pub fn new(now: DateTime) -> Self {
        Self { now }
    }
}

impl Rtc for FixedRtc {
    type Error = ScriptFault;

    async fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), ScriptFault> {
        self.now = *datetime;
        Ok(())
    }

    async fn datetime(&mut self) -> Result<DateTime, ScriptFault> {
        Ok(self.now)
    }
}

/// RTC whose bus never answers.
pub struct DeadRtc;

impl Rtc for DeadRtc {
    type Error = ScriptFault;

    async fn set_datetime(&mut self, _datetime: &DateTime) -> Result<(), ScriptFault> {
        Err(ScriptFault)
    }

    async fn datetime(&mut self) -> Result<DateTime, ScriptFault> {
        Err(ScriptFault)
    }
}

/// In-memory log medium with switchable fault injection.
#[derive(Default)]
pub struct MemoryMedium {
    pub fail_mount: bool,
    pub fail_append: bool,
    pub mounted: bool,
    created: bool,
    contents: Vec<u8>,
}

impl MemoryMedium {
    /// The store contents as text.
    pub fn contents_str(&self) -> &str {
        core::str::from_utf8(&self.contents).expect("log store is UTF-8")
    }
}

impl LogMedium for MemoryMedium {
    type Error = ScriptFault;

    fn mount(&mut self) -> Result<(), ScriptFault> {
        if self.fail_mount {
            return Err(ScriptFault);
        }
        self.mounted = true;
        Ok(())
    }

    fn exists(&mut self, _name: &str) -> Result<bool, ScriptFault> {
        Ok(self.created)
    }

    fn append(&mut self, _name: &str, data: &[u8]) -> Result<(), ScriptFault> {
        if self.fail_append {
            return Err(ScriptFault);
        }
        self.created = true;
        self.contents.extend_from_slice(data);
        Ok(())
    }
}

/// Output pin that records its level and counts rising edges.
#[derive(Default)]
pub struct CountingPin {
    pub is_high: bool,
    pub rises: usize,
}

impl ErrorType for CountingPin {
    type Error = Infallible;
}

impl OutputPin for CountingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.is_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.is_high {
            self.rises += 1;
        }
        self.is_high = true;
        Ok(())
    }
}
