use adc_voltmeter::config::Settings;
use adc_voltmeter::gpio::adc::{AdcHardware, ChannelSampler};
use adc_voltmeter::monitor::VoltageMonitor;
use adc_voltmeter::reporting;
use adc_voltmeter::sensors::calibration::CalibrationProvider;
use anyhow::Result;
use std::time::Duration;

fn main() -> Result<()> {
    #[cfg(target_os = "espidf")]
    {
        // It is necessary to call this function once. Otherwise some patches to the runtime
        // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
        esp_idf_svc::sys::link_patches();
        // Bind the log crate to the ESP Logging facilities
        esp_idf_svc::log::EspLogger::initialize_default();
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    log::info!("Settings: {:?}", settings);

    let mut hardware = hardware();
    let profile = CalibrationProvider::new(&settings.adc).initialize(&mut hardware)?;
    let sampler = ChannelSampler::new(hardware, settings.adc.channel);
    log::info!("Sampling channel {}", sampler.channel());

    let mut monitor = VoltageMonitor::from_settings(sampler, profile, &settings)?;
    let mut sink = reporting::sink(settings.sink);
    let interval = settings.report_interval();
    loop {
        monitor.run_cycle(sink.as_mut());
        delay(interval);
    }
}

#[cfg(target_os = "espidf")]
fn load_settings() -> Result<Settings> {
    let settings = Settings::preset();
    settings.validate()?;
    Ok(settings)
}

/// `--serial` or `--dashboard` picks a preset, anything else is a JSON settings file.
#[cfg(not(target_os = "espidf"))]
fn load_settings() -> Result<Settings> {
    let settings = match std::env::args().nth(1).as_deref() {
        Some("--serial") => Settings::serial(),
        Some("--dashboard") => Settings::dashboard(),
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            log::info!("Loaded settings from {}", path);
            return Ok(Settings::from_json(&json)?);
        }
        None => Settings::preset(),
    };
    settings.validate()?;
    Ok(settings)
}

#[cfg(all(target_os = "espidf", not(feature = "simulate")))]
fn hardware() -> impl AdcHardware {
    adc_voltmeter::gpio::esp_adc::EspAdc::new()
}

#[cfg(any(not(target_os = "espidf"), feature = "simulate"))]
fn hardware() -> impl AdcHardware {
    log::warn!("Using simulated ADC");
    adc_voltmeter::mock_adc::MockAdc::default()
}

#[cfg(target_os = "espidf")]
fn delay(interval: Duration) {
    // bounded by MAX_REPORT_INTERVAL in Settings::validate
    let ms = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
    esp_idf_hal::delay::FreeRtos::delay_ms(ms);
}

#[cfg(not(target_os = "espidf"))]
fn delay(interval: Duration) {
    std::thread::sleep(interval);
}
