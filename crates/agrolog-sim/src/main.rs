//! Desktop simulator for the agrolog monitoring agent.
//!
//! Runs the full sampling → clock → log pipeline against synthetic sensor
//! waveforms and a filesystem-backed log store, with a diagnostic pass
//! (including an injected sensor fault) between cycles. The log file is
//! replayed and parsed at the end so every core operation is exercised
//! without hardware.
//!
//! ```text
//! RUST_LOG=debug cargo run -p agrolog-sim
//! ```

use std::convert::Infallible;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use embassy_futures::block_on;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

use agrolog_core::agent::MonitorAgent;
use agrolog_core::clock::{ClockService, DateTime, Rtc};
use agrolog_core::config::AgentConfig;
use agrolog_core::diagnostics::{DIAGNOSTIC_REQUEST, DiagnosticController};
use agrolog_core::sampling::SampleAggregator;
use agrolog_core::sensors::{ADC_FULL_SCALE, AnalogInput, ClimateSample, ClimateSensor, SensorReader};
use agrolog_core::storage::{LogMedium, LogRecord, PersistentLog};

/// Number of aggregation cycles to run.
const CYCLES: u32 = 4;

/// Wall-clock nanoseconds per simulated millisecond, so a 5 s burst
/// finishes in a fraction of a second.
const TIME_SCALE: u32 = 10_000;

// ---------------------------------------------------------------------------
// Synthetic drivers
// ---------------------------------------------------------------------------

/// Climate sensor producing a slow sinusoidal day cycle.
struct SimClimate {
    step: f64,
}

impl ClimateSensor for SimClimate {
    type Error = Infallible;

    async fn measure(&mut self) -> Result<ClimateSample, Infallible> {
        self.step += 1.0;
        let t = self.step;
        Ok(ClimateSample {
            // 20–28 °C with slow drift
            temperature: (24.0 + 4.0 * (t / 40.0).sin()) as f32,
            // 35–55 % with a different period
            humidity: (45.0 + 10.0 * (t / 23.0).cos()) as f32,
        })
    }
}

/// Analog channel producing raw codes around a midpoint. Every
/// `zero_every`-th read returns a raw zero to show the zero-is-invalid
/// convention in the output.
struct SimAnalog {
    step: f64,
    midpoint: f64,
    swing: f64,
    zero_every: u64,
}

impl AnalogInput for SimAnalog {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Infallible> {
        self.step += 1.0;
        if self.zero_every > 0 && (self.step as u64).is_multiple_of(self.zero_every) {
            return Ok(0);
        }
        let fraction = self.midpoint + self.swing * (self.step / 31.0).sin();
        Ok((fraction.clamp(0.0, 1.0) * f64::from(ADC_FULL_SCALE)) as u16)
    }
}

/// Delay that sleeps scaled-down wall-clock time.
struct ScaledDelay;

impl DelayNs for ScaledDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns / TIME_SCALE)));
    }
}

/// RTC backed by the host clock.
struct SystemRtc;

impl Rtc for SystemRtc {
    type Error = Infallible;

    async fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Infallible> {
        info!("epoch request {} ignored, host clock is authoritative", datetime);
        Ok(())
    }

    async fn datetime(&mut self) -> Result<DateTime, Infallible> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Ok(datetime_from_unix(secs))
    }
}

/// Civil date from a Unix timestamp (days-to-date per Howard Hinnant's
/// algorithm).
fn datetime_from_unix(secs: u64) -> DateTime {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = if month <= 2 { year + 1 } else { year } as u16;

    DateTime {
        year,
        month,
        day,
        weekday: ((days + 4).rem_euclid(7)) as u8,
        hour: (rem / 3_600) as u8,
        minute: (rem % 3_600 / 60) as u8,
        second: (rem % 60) as u8,
    }
}

/// Log medium writing to a file under the working directory.
struct FileMedium {
    path: PathBuf,
}

impl LogMedium for FileMedium {
    type Error = std::io::Error;

    fn mount(&mut self) -> Result<(), std::io::Error> {
        let dir = self.path.parent().unwrap_or_else(|| ".".as_ref());
        std::fs::create_dir_all(dir)
    }

    fn exists(&mut self, _name: &str) -> Result<bool, std::io::Error> {
        Ok(self.path.exists())
    }

    fn append(&mut self, _name: &str, data: &[u8]) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(data)
    }
}

/// Indicator pin that logs its transitions instead of driving hardware.
struct LoggedPin {
    name: &'static str,
}

impl ErrorType for LoggedPin {
    type Error = Infallible;
}

impl OutputPin for LoggedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        info!("[{}] off", self.name);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        info!("[{}] ON", self.name);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AgentConfig::default();
    let store_path = PathBuf::from("sim-data/readings.csv");

    let mut reader = SensorReader::new(
        SimClimate { step: 0.0 },
        SimAnalog {
            step: 0.0,
            midpoint: 0.55,
            swing: 0.2,
            // A periodic raw zero demonstrates the zero-is-invalid quirk.
            zero_every: 7,
        },
        SimAnalog {
            step: 0.0,
            midpoint: 0.62,
            swing: 0.3,
            zero_every: 0,
        },
    );

    let mut agent = MonitorAgent::new(
        SampleAggregator::new(config.sampling, ScaledDelay),
        ClockService::new(SystemRtc),
        PersistentLog::new(FileMedium {
            path: store_path.clone(),
        }),
    );

    let mut diagnostics = DiagnosticController::new(
        LoggedPin { name: "ok-led" },
        LoggedPin { name: "fault-led" },
        ScaledDelay,
        config.diagnostic,
    );

    if let Err(e) = agent.start() {
        eprintln!("storage unavailable, aborting boot: {}", e);
        std::process::exit(1);
    }

    block_on(async {
        if let Err(e) = agent
            .clock_mut()
            .initialize(datetime_from_unix(1_747_245_000))
            .await
        {
            warn!("epoch setup failed: {}", e);
        }

        // Simulated button press: request a diagnostic pass after the
        // second cycle.
        for cycle in 1..=CYCLES {
            if DIAGNOSTIC_REQUEST.try_take().is_some() {
                let report = diagnostics.run(&mut reader).await;
                info!("diagnostic report: {:?}", report);
            }

            match agent.run_cycle(&mut reader).await {
                Ok(record) => info!("cycle {}/{} logged at {}", cycle, CYCLES, record.timestamp),
                Err(e) => warn!("cycle {}/{} dropped: {}", cycle, CYCLES, e),
            }

            if cycle == 2 {
                DIAGNOSTIC_REQUEST.signal(());
            }
        }
    });

    replay_store(&store_path);
}

/// Read the store back and parse every record, mirroring what an operator
/// would do with the card on a workstation.
fn replay_store(path: &PathBuf) {
    let Ok(contents) = std::fs::read_to_string(path) else {
        warn!("log store {} unreadable", path.display());
        return;
    };

    println!("--- {} ---", path.display());
    for (index, line) in contents.lines().enumerate() {
        if index == 0 {
            println!("{}", line);
            continue;
        }
        match LogRecord::parse_line(line) {
            Some(_) => println!("{}", line.trim_end()),
            None => warn!("unparseable record on line {}: {}", index + 1, line),
        }
    }
}
