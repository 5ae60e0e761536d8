#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Flex, Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};
use rtt_target::rprintln;

use agrolog_core::agent::MonitorAgent;
use agrolog_core::clock::{ClockService, DateTime};
use agrolog_core::config::AgentConfig;
use agrolog_core::diagnostics::{DIAGNOSTIC_REQUEST, DiagnosticController};
use agrolog_core::sampling::SampleAggregator;
use agrolog_core::sensors::SensorReader;
use agrolog_core::storage::{PersistentLog, SdCardMedium};
use agrolog_firmware::adc::{LightProbe, SoilProbe};
use agrolog_firmware::dht11::Dht11;
use agrolog_firmware::ds1307::Ds1307;
use agrolog_firmware::sd::BuildTimeSource;

/// Pause between aggregation cycles.
const CYCLE_PERIOD: Duration = Duration::from_secs(60);

/// Series origin written to a factory-fresh clock whose oscillator has
/// never been started.
const SERIES_EPOCH: DateTime = DateTime {
    year: 2025,
    month: 5,
    day: 14,
    weekday: 2,
    hour: 12,
    minute: 0,
    second: 0,
};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Latches a diagnostic request on every button press. The monitor loop
/// drains the signal between cycles, so holding or hammering the button
/// still yields at most one pass per cycle.
#[embassy_executor::task]
async fn watch_button(mut button: Input<'static>) {
    loop {
        button.wait_for_falling_edge().await;
        DIAGNOSTIC_REQUEST.signal(());
        info!("diagnostic requested");
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    rprintln!("Embassy initialized!");

    // DS1307 real-time clock on the I2C bus
    let i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .unwrap()
        .with_sda(peripherals.GPIO8)
        .with_scl(peripherals.GPIO9)
        .into_async();

    // SD card on SPI2
    let spi_bus = Spi::new(peripherals.SPI2, SpiConfig::default())
        .unwrap()
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO35)
        .with_miso(peripherals.GPIO37);
    let cs = Output::new(peripherals.GPIO34, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new(spi_bus, cs, Delay::new()).unwrap();
    let sd_card = SdCard::new(spi_device, Delay::new());

    // Climate sensor on its single-wire bus
    let dht = Dht11::new(Flex::new(peripherals.GPIO7), Delay::new());

    // Soil and light probes each own one ADC unit
    let mut adc1_config = AdcConfig::new();
    let soil_pin = adc1_config.enable_pin(peripherals.GPIO4, Attenuation::_11dB);
    let soil = SoilProbe::new(Adc::new(peripherals.ADC1, adc1_config), soil_pin);

    let mut adc2_config = AdcConfig::new();
    let light_pin = adc2_config.enable_pin(peripherals.GPIO11, Attenuation::_11dB);
    let light = LightProbe::new(Adc::new(peripherals.ADC2, adc2_config), light_pin);

    // Indicator LEDs and the diagnostic button
    let ok_led = Output::new(peripherals.GPIO1, Level::Low, OutputConfig::default());
    let fault_led = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let button = Input::new(
        peripherals.GPIO3,
        InputConfig::default().with_pull(Pull::Up),
    );

    let agent_config = AgentConfig::default();
    let mut reader = SensorReader::new(dht, soil, light);
    let mut diagnostics = DiagnosticController::new(
        ok_led,
        fault_led,
        embassy_time::Delay,
        agent_config.diagnostic,
    );
    let mut agent = MonitorAgent::new(
        SampleAggregator::new(agent_config.sampling, embassy_time::Delay),
        ClockService::new(Ds1307::new(i2c)),
        PersistentLog::new(SdCardMedium::new(sd_card, BuildTimeSource)),
    );

    if let Err(e) = agent.start() {
        // Without the card there is nothing to record to; park and wait
        // for a power cycle with the card inserted.
        error!("storage unavailable, halting: {}", e);
        loop {
            Timer::after(Duration::from_secs(3600)).await;
        }
    }

    // A clock that has never been started reports no valid time; seed it
    // with the series origin. Re-seeding a running clock would shift the
    // log's time base, so a valid clock is left alone.
    if !agent.clock_mut().now().await.is_valid() {
        if let Err(e) = agent.clock_mut().initialize(SERIES_EPOCH).await {
            warn!("clock epoch not set, records will carry the sentinel: {}", e);
        }
    }

    spawner.spawn(watch_button(button)).ok();

    loop {
        if DIAGNOSTIC_REQUEST.try_take().is_some() {
            let report = diagnostics.run(&mut reader).await;
            info!("diagnostic report: {:?}", report);
        }

        if let Err(e) = agent.run_cycle(&mut reader).await {
            error!("cycle dropped: {}", e);
        }

        Timer::after(CYCLE_PERIOD).await;
    }
}
