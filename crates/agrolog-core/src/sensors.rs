//! Sensor driver traits and the validated reading layer.
//!
//! The physical drivers live in the firmware crate (or in the simulator);
//! this module only sees them through [`ClimateSensor`] and [`AnalogInput`].
//! Driver failures never cross the [`SensorReader`] boundary: callers
//! receive [`Reading::Invalid`] and decide what to do with it.

use log::{debug, warn};

use crate::reading::{Reading, ReadingVector};

/// Full-scale code of the analog converters. Raw values are normalized to
/// a 16-bit range by the drivers regardless of the converter's native width.
pub const ADC_FULL_SCALE: u16 = u16::MAX;

/// Converter reference voltage. Used for diagnostic display only; the
/// voltage equivalent of a raw code is never persisted.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;

/// One temperature + humidity transaction from the digital climate sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// Air temperature in °C
    pub temperature: f32,
    /// Relative humidity in %
    pub humidity: f32,
}

/// Digital temperature/humidity sensor (DHT-style).
///
/// A transaction yields both co-located values or fails as a whole; there
/// is no way to get one without the other.
pub trait ClimateSensor {
    type Error: core::fmt::Debug;

    fn measure(&mut self) -> impl Future<Output = Result<ClimateSample, Self::Error>>;
}

/// One analog channel, raw converter code in `[0, ADC_FULL_SCALE]`.
pub trait AnalogInput {
    type Error: core::fmt::Debug;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// Convert a raw converter code to a percentage reading.
///
/// Zero maps to `Invalid` (the zero-is-invalid convention, see
/// [`Reading`]); the full-scale code maps to exactly 100.0.
pub fn percentage_from_raw(raw: u16) -> Reading {
    if raw == 0 {
        Reading::Invalid
    } else {
        Reading::Valid(f32::from(raw) / f32::from(ADC_FULL_SCALE) * 100.0)
    }
}

/// Voltage equivalent of a raw code, for diagnostic display only.
pub fn volts_from_raw(raw: u16) -> f32 {
    f32::from(raw) / f32::from(ADC_FULL_SCALE) * ADC_REFERENCE_VOLTS
}

/// Wraps the three physical sensors and converts their raw output into
/// validated [`Reading`]s.
pub struct SensorReader<C, S, L> {
    climate: C,
    soil: S,
    light: L,
}

impl<C, S, L> SensorReader<C, S, L>
where
    C: ClimateSensor,
    S: AnalogInput,
    L: AnalogInput,
{
    pub fn new(climate: C, soil: S, light: L) -> Self {
        Self { climate, soil, light }
    }

    /// Read both co-located climate channels in one transaction.
    ///
    /// A failed transaction marks both invalid; a failure on one implies a
    /// failure on both for this device.
    pub async fn read_climate(&mut self) -> (Reading, Reading) {
        match self.climate.measure().await {
            Ok(sample) => {
                debug!(
                    "climate: {:.1} C, {:.1} %",
                    sample.temperature, sample.humidity
                );
                (
                    Reading::from_nonzero(sample.temperature),
                    Reading::from_nonzero(sample.humidity),
                )
            }
            Err(e) => {
                warn!("climate transaction failed: {:?}", e);
                (Reading::Invalid, Reading::Invalid)
            }
        }
    }

    /// Soil moisture as a percentage of the converter full scale.
    pub fn read_soil(&mut self) -> Reading {
        analog_reading("soil moisture", &mut self.soil)
    }

    /// Luminosity as a percentage of the converter full scale.
    pub fn read_light(&mut self) -> Reading {
        analog_reading("luminosity", &mut self.light)
    }

    /// Read every channel once, in column order.
    pub async fn read_all(&mut self) -> ReadingVector {
        let (temperature, humidity) = self.read_climate().await;
        let soil = self.read_soil();
        let light = self.read_light();
        ReadingVector::new([temperature, humidity, soil, light])
    }
}

fn analog_reading(name: &str, input: &mut impl AnalogInput) -> Reading {
    match input.read_raw() {
        Ok(raw) => {
            debug!("{}: raw {} ({:.2} V)", name, raw, volts_from_raw(raw));
            percentage_from_raw(raw)
        }
        Err(e) => {
            warn!("{} read failed: {:?}", name, e);
            Reading::Invalid
        }
    }
}
