//! Burst sampling and averaging.
//!
//! One aggregation cycle reads every channel `burst_size` times with a
//! fixed pause between passes, then reduces each channel to a single mean
//! for the log record.

use embedded_hal_async::delay::DelayNs;
use log::debug;

use crate::config::SamplingConfig;
use crate::reading::{CHANNEL_COUNT, Reading, ReadingVector, SensorChannel};
use crate::sensors::{AnalogInput, ClimateSensor, SensorReader};

/// Result of one burst: per-channel means plus how many samples of each
/// channel were actually valid.
#[derive(Debug, Clone, Copy)]
pub struct BurstSummary {
    /// Per-channel means, always `Valid` (0.0 when nothing was valid)
    pub means: ReadingVector,
    /// Valid samples per channel, out of `burst_size`
    pub valid: [u8; CHANNEL_COUNT],
}

/// Owns the transient accumulators for one cycle. Nothing else sees a
/// burst in progress.
pub struct SampleAggregator<D> {
    config: SamplingConfig,
    delay: D,
}

impl<D: DelayNs> SampleAggregator<D> {
    pub fn new(config: SamplingConfig, delay: D) -> Self {
        Self { config, delay }
    }

    /// Run one full burst and reduce it to per-channel means.
    ///
    /// Invalid samples contribute zero to the sum, but the divisor is
    /// always the configured burst size, never the valid count. Any failed
    /// pass therefore pulls the mean toward zero. This is intentional and
    /// part of the log format's meaning; do not "correct" it to
    /// sum / valid-count.
    pub async fn collect<C, S, L>(&mut self, reader: &mut SensorReader<C, S, L>) -> BurstSummary
    where
        C: ClimateSensor,
        S: AnalogInput,
        L: AnalogInput,
    {
        let mut sums = [0.0f32; CHANNEL_COUNT];
        let mut valid = [0u8; CHANNEL_COUNT];

        for pass in 0..self.config.burst_size {
            let readings = reader.read_all().await;
            for (channel, reading) in readings.iter() {
                if let Reading::Valid(value) = reading {
                    sums[channel.index()] += value;
                    valid[channel.index()] += 1;
                }
            }
            debug!("burst pass {}/{} done", pass + 1, self.config.burst_size);
            self.delay.delay_ms(self.config.sample_interval_ms).await;
        }

        // An empty burst degenerates to all-zero means instead of NaN.
        let divisor = f32::from(self.config.burst_size.max(1));

        let mut means = ReadingVector::invalid();
        for channel in SensorChannel::ALL {
            means.set(channel, Reading::Valid(sums[channel.index()] / divisor));
        }

        BurstSummary { means, valid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{NoDelay, ScriptedAnalog, ScriptedClimate};
    use embassy_futures::block_on;

    fn config(burst_size: u8) -> SamplingConfig {
        SamplingConfig {
            burst_size,
            sample_interval_ms: 0,
        }
    }

    fn mean_of(summary: &BurstSummary, channel: SensorChannel) -> f32 {
        summary.means.get(channel).value_or_zero()
    }

    #[test]
    fn test_all_invalid_channel_means_zero() {
        // Soil raw reads are all zero, i.e. invalid by convention.
        let mut reader = SensorReader::new(
            ScriptedClimate::new(&[Some((24.0, 41.0)); 5]),
            ScriptedAnalog::new(&[Some(0); 5]),
            ScriptedAnalog::new(&[Some(32767); 5]),
        );
        let mut aggregator = SampleAggregator::new(config(5), NoDelay);

        let summary = block_on(aggregator.collect(&mut reader));

        let soil = summary.means.get(SensorChannel::SoilMoisture);
        assert_eq!(soil, Reading::Valid(0.0), "mean must be 0.0, not NaN or an error");
        assert_eq!(summary.valid[SensorChannel::SoilMoisture.index()], 0);
    }

    #[test]
    fn test_mean_divides_by_burst_size_not_valid_count() {
        // Raw soil readings [0, 32767, 32767, 32767, 32767]: four valid
        // samples of ~50%, divided by the full burst size of 5.
        let mut reader = SensorReader::new(
            ScriptedClimate::new(&[Some((24.0, 41.0)); 5]),
            ScriptedAnalog::new(&[Some(0), Some(32767), Some(32767), Some(32767), Some(32767)]),
            ScriptedAnalog::new(&[Some(65535); 5]),
        );
        let mut aggregator = SampleAggregator::new(config(5), NoDelay);

        let summary = block_on(aggregator.collect(&mut reader));

        assert_eq!(summary.valid[SensorChannel::SoilMoisture.index()], 4);
        let soil_mean = mean_of(&summary, SensorChannel::SoilMoisture);
        assert!((soil_mean - 40.0).abs() < 0.01, "got {}", soil_mean);
        assert!(
            (soil_mean - 50.0).abs() > 5.0,
            "mean must not be sum / valid-count"
        );
    }

    #[test]
    fn test_climate_failures_shrink_both_counts_but_not_divisor() {
        // Transactions 2 and 4 of 5 fail; temperature and humidity each
        // keep three valid samples and still divide by five.
        let script = [
            Some((25.0, 40.0)),
            None,
            Some((25.0, 40.0)),
            None,
            Some((25.0, 40.0)),
        ];
        let mut reader = SensorReader::new(
            ScriptedClimate::new(&script),
            ScriptedAnalog::new(&[Some(32767); 5]),
            ScriptedAnalog::new(&[Some(32767); 5]),
        );
        let mut aggregator = SampleAggregator::new(config(5), NoDelay);

        let summary = block_on(aggregator.collect(&mut reader));

        assert_eq!(summary.valid[SensorChannel::Temperature.index()], 3);
        assert_eq!(summary.valid[SensorChannel::ExternalHumidity.index()], 3);
        let temp_mean = mean_of(&summary, SensorChannel::Temperature);
        assert!((temp_mean - 3.0 * 25.0 / 5.0).abs() < 1e-4);
        let hum_mean = mean_of(&summary, SensorChannel::ExternalHumidity);
        assert!((hum_mean - 3.0 * 40.0 / 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_fully_valid_burst_mean_is_plain_average() {
        let mut reader = SensorReader::new(
            ScriptedClimate::new(&[Some((20.0, 50.0)), Some((30.0, 50.0))]),
            ScriptedAnalog::new(&[Some(32767); 2]),
            ScriptedAnalog::new(&[Some(32767); 2]),
        );
        let mut aggregator = SampleAggregator::new(config(2), NoDelay);

        let summary = block_on(aggregator.collect(&mut reader));

        let temp_mean = mean_of(&summary, SensorChannel::Temperature);
        assert!((temp_mean - 25.0).abs() < 1e-4);
        assert_eq!(summary.valid[SensorChannel::Temperature.index()], 2);
    }
}
