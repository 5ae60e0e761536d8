//! Channel and reading data model for the sampling pipeline.

/// Number of sensor channels recorded per cycle.
pub const CHANNEL_COUNT: usize = 4;

/// One measured quantity.
///
/// The set is closed and the declaration order is the on-disk column order
/// of the log store. Changing it is a log-format change and needs a format
/// version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorChannel {
    /// Air temperature from the digital climate sensor (°C)
    Temperature,
    /// Relative air humidity from the digital climate sensor (%)
    ExternalHumidity,
    /// Soil moisture from the analog hygrometer (%)
    SoilMoisture,
    /// Luminosity from the analog light sensor (%)
    Luminosity,
}

impl SensorChannel {
    /// All channels in column order.
    pub const ALL: [Self; CHANNEL_COUNT] = [
        Self::Temperature,
        Self::ExternalHumidity,
        Self::SoilMoisture,
        Self::Luminosity,
    ];

    /// Position of this channel in a [`ReadingVector`] and in a log line.
    pub const fn index(self) -> usize {
        match self {
            Self::Temperature => 0,
            Self::ExternalHumidity => 1,
            Self::SoilMoisture => 2,
            Self::Luminosity => 3,
        }
    }

    /// Column label used in the log store header.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "TEMP",
            Self::ExternalHumidity => "HUM_EXT",
            Self::SoilMoisture => "HUM_HIG",
            Self::Luminosity => "LUM",
        }
    }
}

/// A single channel sample, or the marker for "no usable value".
///
/// A value of exactly zero is indistinguishable from a missing or failed
/// sensor in this design and is mapped to `Invalid` by convention. Total
/// darkness on the luminosity channel therefore reads as a failed sample.
/// Deployed log archives already carry this meaning, so the conflation is
/// deliberate and load-bearing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Valid(f32),
    Invalid,
}

impl Reading {
    /// Wrap a measured value, applying the zero-is-invalid convention.
    pub fn from_nonzero(value: f32) -> Self {
        if value == 0.0 {
            Self::Invalid
        } else {
            Self::Valid(value)
        }
    }

    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The carried value, with `Invalid` contributing zero.
    pub fn value_or_zero(self) -> f32 {
        match self {
            Self::Valid(value) => value,
            Self::Invalid => 0.0,
        }
    }
}

/// Ordered tuple of one [`Reading`] per channel, always length
/// [`CHANNEL_COUNT`], in the fixed [`SensorChannel::ALL`] order.
///
/// Used both for raw burst reads (where entries may be `Invalid`) and for
/// per-cycle means (always `Valid`, 0.0 when a channel had no valid sample).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingVector([Reading; CHANNEL_COUNT]);

impl ReadingVector {
    pub const fn new(readings: [Reading; CHANNEL_COUNT]) -> Self {
        Self(readings)
    }

    /// A vector with every channel marked invalid.
    pub const fn invalid() -> Self {
        Self([Reading::Invalid; CHANNEL_COUNT])
    }

    pub fn get(&self, channel: SensorChannel) -> Reading {
        self.0[channel.index()]
    }

    pub fn set(&mut self, channel: SensorChannel, reading: Reading) {
        self.0[channel.index()] = reading;
    }

    /// Iterate channels with their readings, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorChannel, Reading)> + '_ {
        SensorChannel::ALL.iter().map(|&channel| (channel, self.0[channel.index()]))
    }
}

impl Default for ReadingVector {
    fn default() -> Self {
        Self::invalid()
    }
}
