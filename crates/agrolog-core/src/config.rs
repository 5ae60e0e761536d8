//! Runtime configuration for the monitoring agent.

use serde::{Deserialize, Serialize};

/// Burst sampling parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Number of reads averaged into one log record
    pub burst_size: u8,
    /// Pause between consecutive reads within a burst
    pub sample_interval_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            burst_size: 5,
            sample_interval_ms: 1_000,
        }
    }
}

/// Indicator timings for the diagnostic pass. Cosmetic choreography; the
/// pass/fail distinction is what matters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticConfig {
    /// Both LEDs held on at the start and end of a pass
    pub announce_ms: u32,
    /// On-time of the slow marker pulses before each test
    pub marker_ms: u32,
    /// On-time of the fast result pulses
    pub pulse_ms: u32,
    /// Number of result pulses per test
    pub result_pulses: u8,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            announce_ms: 3_000,
            marker_ms: 1_000,
            pulse_ms: 400,
            result_pulses: 3,
        }
    }
}

/// Top-level agent configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentConfig {
    pub sampling: SamplingConfig,
    pub diagnostic: DiagnosticConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_burst_parameters() {
        let config = SamplingConfig::default();
        assert_eq!(config.burst_size, 5);
        assert_eq!(config.sample_interval_ms, 1_000);
    }
}
