pub mod adc;
#[cfg(target_os = "espidf")]
pub mod esp_adc;
