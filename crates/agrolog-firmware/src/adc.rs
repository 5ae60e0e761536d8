//! Analog probe wrappers over the on-chip one-shot ADCs.
//!
//! The converters are 12-bit; raw codes are stretched to the 16-bit
//! range `agrolog_core` expects before they cross the trait boundary.
//! Soil moisture and luminosity sit on different ADC units so each probe
//! can own its converter outright.

use agrolog_core::sensors::AnalogInput;
use esp_hal::Blocking;
use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::{ADC1, ADC2, GPIO4, GPIO11};
use thiserror_no_std::Error;

/// Full-scale code of the 12-bit converters.
const NATIVE_FULL_SCALE: u32 = 4095;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AdcError {
    #[error("one-shot conversion failed")]
    Conversion,
}

fn stretch_to_u16(raw: u16) -> u16 {
    (u32::from(raw) * u32::from(u16::MAX) / NATIVE_FULL_SCALE) as u16
}

/// Resistive soil-moisture probe on GPIO4 / ADC1.
pub struct SoilProbe {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO4<'static>, ADC1<'static>>,
}

impl SoilProbe {
    pub fn new(
        adc: Adc<'static, ADC1<'static>, Blocking>,
        pin: AdcPin<GPIO4<'static>, ADC1<'static>>,
    ) -> Self {
        Self { adc, pin }
    }
}

impl AnalogInput for SoilProbe {
    type Error = AdcError;

    fn read_raw(&mut self) -> Result<u16, AdcError> {
        let raw = nb::block!(self.adc.read_oneshot(&mut self.pin))
            .map_err(|_| AdcError::Conversion)?;
        Ok(stretch_to_u16(raw))
    }
}

/// LDR divider on GPIO11 / ADC2.
pub struct LightProbe {
    adc: Adc<'static, ADC2<'static>, Blocking>,
    pin: AdcPin<GPIO11<'static>, ADC2<'static>>,
}

impl LightProbe {
    pub fn new(
        adc: Adc<'static, ADC2<'static>, Blocking>,
        pin: AdcPin<GPIO11<'static>, ADC2<'static>>,
    ) -> Self {
        Self { adc, pin }
    }
}

impl AnalogInput for LightProbe {
    type Error = AdcError;

    fn read_raw(&mut self) -> Result<u16, AdcError> {
        let raw = nb::block!(self.adc.read_oneshot(&mut self.pin))
            .map_err(|_| AdcError::Conversion)?;
        Ok(stretch_to_u16(raw))
    }
}
