pub mod adc;
pub mod calibration;
pub mod efuse;
pub mod error;
pub mod traits;
