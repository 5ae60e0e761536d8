//! Bit-banged DHT11 driver on a single open-drain GPIO.
//!
//! The wire protocol: the host pulls the line low for at least 18 ms,
//! releases it, the sensor answers with an 80 us low / 80 us high
//! preamble and then clocks out 40 bits. Bit value is encoded in the
//! length of the high phase (~27 us for 0, ~70 us for 1), so each bit is
//! sampled 40 us into its high phase.

use agrolog_core::sensors::{ClimateSample, ClimateSensor};
use embedded_hal::delay::DelayNs;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Flex, Pull};
use thiserror_no_std::Error;

/// Polling steps of 1 us while waiting for a line edge.
const EDGE_TIMEOUT_US: u32 = 100;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    #[error("sensor did not answer within the protocol timeout")]
    Timeout,
    #[error("frame checksum mismatch")]
    Checksum,
}

pub struct Dht11 {
    pin: Flex<'static>,
    delay: Delay,
}

impl Dht11 {
    /// The pin is reconfigured as open-drain with pull-up; an idle line
    /// reads high.
    pub fn new(mut pin: Flex<'static>, delay: Delay) -> Self {
        pin.set_as_open_drain(Pull::Up);
        pin.set_high();
        Self { pin, delay }
    }

    /// One blocking transaction, roughly 25 ms end to end. The sensor
    /// needs about a second between transactions to refresh its values.
    fn read_frame(&mut self) -> Result<[u8; 5], DhtError> {
        // Start signal: hold low, then release the line.
        self.pin.set_low();
        self.delay.delay_ms(20);
        self.pin.set_high();
        self.delay.delay_us(30);

        // Sensor preamble: low, high, then the first bit's low phase.
        self.wait_for_level(false)?;
        self.wait_for_level(true)?;
        self.wait_for_level(false)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_for_level(true)?;
            self.delay.delay_us(40);
            let byte = &mut frame[bit / 8];
            *byte <<= 1;
            if self.pin.is_high() {
                *byte |= 1;
            }
            self.wait_for_level(false)?;
        }

        let sum = frame[0]
            .wrapping_add(frame[1])
            .wrapping_add(frame[2])
            .wrapping_add(frame[3]);
        if sum != frame[4] {
            return Err(DhtError::Checksum);
        }
        Ok(frame)
    }

    fn wait_for_level(&mut self, high: bool) -> Result<(), DhtError> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.pin.is_high() == high {
                return Ok(());
            }
            self.delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }
}

impl ClimateSensor for Dht11 {
    type Error = DhtError;

    async fn measure(&mut self) -> Result<ClimateSample, DhtError> {
        // Integral humidity is byte 0, integral temperature byte 2; the
        // DHT11 leaves the fractional bytes at zero.
        let frame = self.read_frame()?;
        Ok(ClimateSample {
            temperature: f32::from(frame[2]),
            humidity: f32::from(frame[0]),
        })
    }
}
