//! The periodic monitoring cycle: sample, timestamp, append.

use embedded_hal_async::delay::DelayNs;
use log::{debug, info};

use crate::clock::{ClockService, Rtc};
use crate::sampling::{BurstSummary, SampleAggregator};
use crate::sensors::{AnalogInput, ClimateSensor, SensorReader};
use crate::storage::{LogMedium, LogRecord, PersistentLog, StorageError};

/// Owns the aggregation, clock, and log ends of the pipeline.
///
/// The sensor reader is passed per call rather than owned, so the one
/// reader instance can also serve the diagnostic pass between cycles.
/// Storage is only ever touched from this path.
pub struct MonitorAgent<D, R, M: LogMedium> {
    aggregator: SampleAggregator<D>,
    clock: ClockService<R>,
    log: PersistentLog<M>,
}

impl<D, R, M> MonitorAgent<D, R, M>
where
    D: DelayNs,
    R: Rtc,
    M: LogMedium,
{
    pub fn new(
        aggregator: SampleAggregator<D>,
        clock: ClockService<R>,
        log: PersistentLog<M>,
    ) -> Self {
        Self {
            aggregator,
            clock,
            log,
        }
    }

    /// Mount the medium and make sure the store exists with its header.
    ///
    /// Runs once per boot. Mount failure is fatal for the boot sequence;
    /// the caller decides whether to halt or retry the whole boot.
    pub fn start(&mut self) -> Result<(), StorageError<M::Error>> {
        self.log.mount()?;
        self.log.ensure_header()?;
        info!("log store ready");
        Ok(())
    }

    /// Access the clock, e.g. for the one-time epoch setup on first boot.
    pub fn clock_mut(&mut self) -> &mut ClockService<R> {
        &mut self.clock
    }

    /// One full cycle: burst-collect means, stamp, append.
    ///
    /// A clock failure stamps the sentinel and the record is written
    /// anyway; a failed append loses this record only.
    pub async fn run_cycle<C, S, L>(
        &mut self,
        reader: &mut SensorReader<C, S, L>,
    ) -> Result<LogRecord, StorageError<M::Error>>
    where
        C: ClimateSensor,
        S: AnalogInput,
        L: AnalogInput,
    {
        let BurstSummary { means, valid } = self.aggregator.collect(reader).await;
        debug!("burst complete, valid samples per channel: {:?}", valid);

        let timestamp = self.clock.now().await;
        let record = LogRecord::new(timestamp, means);
        self.log.append(&record)?;
        info!("recorded cycle at {}", record.timestamp);
        Ok(record)
    }
}
