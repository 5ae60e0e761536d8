//! Button-triggered diagnostic pass over every sensor.
//!
//! One pass re-reads each sensor once through the same [`SensorReader`]
//! the sampling pipeline uses and reports per-sensor pass/fail on two
//! indicator LEDs: slow marker pulses on the ok LED announce which test is
//! next, then a short pulse train on the ok or fault LED reports the
//! outcome.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use crate::config::DiagnosticConfig;
use crate::sensors::{AnalogInput, ClimateSensor, SensorReader};

/// Raised by the firmware's button edge handler, drained by the monitor
/// loop between cycles.
///
/// Routing the request through this signal keeps the sensor reader and the
/// indicator LEDs owned by a single task, so a diagnostic pass can never
/// interleave with an aggregation burst and no locking is needed. The main
/// cycle never touches the indicators; if that ever changes, this contract
/// has to be revisited.
pub static DIAGNOSTIC_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Where a diagnostic pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticPhase {
    Idle,
    /// Both indicators held on before the first test
    Announcing,
    TestingClimate,
    TestingSoilMoisture,
    TestingLuminosity,
    /// Both indicators held on after the last test
    Closing,
}

/// Per-sensor outcome of one diagnostic pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    /// Temperature and humidity both came back valid
    pub climate_ok: bool,
    pub soil_ok: bool,
    pub light_ok: bool,
}

impl DiagnosticReport {
    pub const fn all_ok(self) -> bool {
        self.climate_ok && self.soil_ok && self.light_ok
    }
}

/// Runs the diagnostic state machine and owns the two indicator outputs.
pub struct DiagnosticController<O, F, D> {
    ok_led: O,
    fault_led: F,
    delay: D,
    config: DiagnosticConfig,
    phase: DiagnosticPhase,
}

impl<O, F, D> DiagnosticController<O, F, D>
where
    O: OutputPin,
    F: OutputPin,
    D: DelayNs,
{
    pub fn new(ok_led: O, fault_led: F, delay: D, config: DiagnosticConfig) -> Self {
        Self {
            ok_led,
            fault_led,
            delay,
            config,
            phase: DiagnosticPhase::Idle,
        }
    }

    pub fn phase(&self) -> DiagnosticPhase {
        self.phase
    }

    /// Run one full pass: announce, test each sensor once, close.
    pub async fn run<C, S, L>(&mut self, reader: &mut SensorReader<C, S, L>) -> DiagnosticReport
    where
        C: ClimateSensor,
        S: AnalogInput,
        L: AnalogInput,
    {
        info!("diagnostic pass starting");

        self.phase = DiagnosticPhase::Announcing;
        self.hold_both().await;

        self.phase = DiagnosticPhase::TestingClimate;
        self.marker(1).await;
        let (temperature, humidity) = reader.read_climate().await;
        let climate_ok = temperature.is_valid() && humidity.is_valid();
        self.result(climate_ok).await;

        self.phase = DiagnosticPhase::TestingSoilMoisture;
        self.marker(2).await;
        let soil_ok = reader.read_soil().is_valid();
        self.result(soil_ok).await;

        self.phase = DiagnosticPhase::TestingLuminosity;
        self.marker(3).await;
        let light_ok = reader.read_light().is_valid();
        self.result(light_ok).await;

        self.phase = DiagnosticPhase::Closing;
        self.hold_both().await;
        self.phase = DiagnosticPhase::Idle;

        let report = DiagnosticReport {
            climate_ok,
            soil_ok,
            light_ok,
        };
        if report.all_ok() {
            info!("diagnostic pass clean");
        } else {
            warn!("diagnostic failures: {:?}", report);
        }
        report
    }

    /// Both indicators on for the announce duration. Brackets a pass.
    async fn hold_both(&mut self) {
        // Indicator pin errors are not actionable; the pass carries on.
        let _ = self.ok_led.set_high();
        let _ = self.fault_led.set_high();
        self.delay.delay_ms(self.config.announce_ms).await;
        let _ = self.ok_led.set_low();
        let _ = self.fault_led.set_low();
        self.delay.delay_ms(self.config.marker_ms).await;
    }

    /// Slow pulses on the ok LED marking which test is next.
    async fn marker(&mut self, count: u8) {
        let on_ms = self.config.marker_ms;
        Self::pulse(&mut self.ok_led, &mut self.delay, count, on_ms).await;
    }

    /// Fast pulse train on the indicator matching the outcome.
    async fn result(&mut self, ok: bool) {
        let count = self.config.result_pulses;
        let on_ms = self.config.pulse_ms;
        if ok {
            Self::pulse(&mut self.ok_led, &mut self.delay, count, on_ms).await;
        } else {
            Self::pulse(&mut self.fault_led, &mut self.delay, count, on_ms).await;
        }
    }

    async fn pulse(pin: &mut impl OutputPin, delay: &mut D, count: u8, on_ms: u32) {
        for _ in 0..count {
            let _ = pin.set_high();
            delay.delay_ms(on_ms).await;
            let _ = pin.set_low();
            delay.delay_ms(on_ms).await;
        }
    }
}
