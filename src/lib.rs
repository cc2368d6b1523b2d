pub mod config;
pub mod gpio;
pub mod mock_adc;
pub mod models;
pub mod monitor;
pub mod reporting;
pub mod sensors;
pub mod types;
