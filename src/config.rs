use crate::gpio::adc::{AdcUnit, Attenuation, Resolution};
use crate::models::aggregation::AggregationStrategy;
use crate::sensors::adc::PostScale;
use crate::types::Millivolts;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSampleCount,
    SampleCountTooLarge(u32),
    NoReadings,
    DuplicateName(String),
    InvalidPostScale(String),
    InvalidVref(Millivolts),
    InvalidChannel(u8),
    InvalidInterval,
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroSampleCount => write!(f, "Sample count must be at least 1"),
            ConfigError::SampleCountTooLarge(n) => write!(
                f,
                "Sample count {} exceeds the accumulator bound of {}",
                n,
                crate::models::aggregation::MAX_SAMPLE_COUNT
            ),
            ConfigError::NoReadings => write!(f, "At least one reading must be configured"),
            ConfigError::DuplicateName(name) => write!(f, "Reading {} is configured twice", name),
            ConfigError::InvalidPostScale(reason) => write!(f, "Invalid post scale: {}", reason),
            ConfigError::InvalidVref(vref) => write!(
                f,
                "Default vref {}mV outside {}..={}mV",
                vref,
                VREF_RANGE.start(),
                VREF_RANGE.end()
            ),
            ConfigError::InvalidChannel(channel) => {
                write!(f, "ADC channel {} does not exist", channel)
            }
            ConfigError::InvalidInterval => write!(
                f,
                "Report interval must be between 1 and {}ms",
                MAX_REPORT_INTERVAL.as_millis()
            ),
            ConfigError::Parse(reason) => write!(f, "Failed to parse settings: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_VREF: Millivolts = 1100;
pub const VREF_RANGE: RangeInclusive<Millivolts> = 1000..=1200;
// GPIO32 on ADC1
pub const ADC_CHANNEL: u8 = 4;
pub const MAX_ADC_CHANNEL: u8 = 9;

pub const VOLTAGE_DIVIDER_MULTIPLIER: f32 = 5.0 / 1000.0;
pub const DEVICE_SPECIFIC_ADJUSTMENT: f32 = 0.006;
pub const VOLTAGE_DECIMALS: u8 = 3;
pub const MAX_DECIMALS: u8 = 6;

pub const MEAN_SAMPLES: u32 = 90;
pub const MEDIAN_SAMPLES: u32 = 10;

pub const DASHBOARD_REPORT_INTERVAL: Duration = Duration::from_millis(1000);
pub const SERIAL_REPORT_INTERVAL: Duration = Duration::from_millis(2000);
// FreeRtos::delay_ms takes a u32
pub const MAX_REPORT_INTERVAL: Duration = Duration::from_millis(u32::MAX as u64);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub adc: AdcSettings,
    pub post_scale: PostScale,
    pub readings: Vec<ReadingSettings>,
    pub report_interval_ms: u64,
    #[serde(default)]
    pub sink: SinkKind,
}

/// Where reported voltages go.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// `name: value` lines on stdout
    #[default]
    Console,
    /// `log::info!` records
    Log,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct AdcSettings {
    pub unit: AdcUnit,
    pub channel: u8,
    pub resolution: Resolution,
    pub attenuation: Attenuation,
    pub default_vref: Millivolts,
    #[serde(default)]
    pub vref_gpio: Option<u8>,
}

impl Default for AdcSettings {
    fn default() -> Self {
        Self {
            unit: AdcUnit::Adc1,
            channel: ADC_CHANNEL,
            resolution: Resolution::Bits12,
            attenuation: Attenuation::Db11,
            default_vref: DEFAULT_VREF,
            // adc_vref_to_gpio does not work on our boards
            vref_gpio: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReadingSettings {
    pub name: String,
    pub strategy: StrategySettings,
}

impl ReadingSettings {
    fn new(name: &str, strategy: StrategySettings) -> Self {
        Self {
            name: name.to_string(),
            strategy,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySettings {
    Single,
    Mean { samples: u32 },
    Median { samples: u32 },
}

impl TryFrom<&StrategySettings> for AggregationStrategy {
    type Error = ConfigError;

    fn try_from(settings: &StrategySettings) -> Result<Self, Self::Error> {
        match settings {
            StrategySettings::Single => Ok(AggregationStrategy::Single),
            StrategySettings::Mean { samples } => AggregationStrategy::mean(*samples),
            StrategySettings::Median { samples } => AggregationStrategy::median(*samples),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::dashboard()
    }
}

impl Settings {
    /// Single, mean and median readings bound to the dashboard.
    pub fn dashboard() -> Self {
        Self {
            adc: AdcSettings::default(),
            post_scale: PostScale {
                divider_multiplier: VOLTAGE_DIVIDER_MULTIPLIER,
                device_adjustment: 0.0,
                decimals: VOLTAGE_DECIMALS,
            },
            readings: vec![
                ReadingSettings::new("Voltage", StrategySettings::Single),
                ReadingSettings::new(
                    "VoltageMultisampling",
                    StrategySettings::Mean {
                        samples: MEAN_SAMPLES,
                    },
                ),
                ReadingSettings::new(
                    "VoltageMultisamplingV2",
                    StrategySettings::Median {
                        samples: MEDIAN_SAMPLES,
                    },
                ),
            ],
            report_interval_ms: DASHBOARD_REPORT_INTERVAL.as_millis() as u64,
            sink: SinkKind::Log,
        }
    }

    /// One single shot reading printed on the serial console.
    pub fn serial() -> Self {
        Self {
            readings: vec![ReadingSettings::new("voltage", StrategySettings::Single)],
            report_interval_ms: SERIAL_REPORT_INTERVAL.as_millis() as u64,
            sink: SinkKind::Console,
            ..Self::dashboard()
        }
    }

    /// The preset built into the firmware, `serial` when that feature is enabled.
    pub fn preset() -> Self {
        if cfg!(feature = "serial") {
            Self::serial()
        } else {
            Self::dashboard()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Validated strategies in reporting order.
    pub fn strategies(&self) -> Result<Vec<(String, AggregationStrategy)>, ConfigError> {
        self.readings
            .iter()
            .map(|reading| {
                AggregationStrategy::try_from(&reading.strategy)
                    .map(|strategy| (reading.name.clone(), strategy))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readings.is_empty() {
            return Err(ConfigError::NoReadings);
        }
        let mut names = HashSet::new();
        for reading in &self.readings {
            if !names.insert(reading.name.as_str()) {
                return Err(ConfigError::DuplicateName(reading.name.clone()));
            }
        }
        self.strategies()?;

        let post_scale = &self.post_scale;
        if !post_scale.divider_multiplier.is_finite() || post_scale.divider_multiplier <= 0.0 {
            return Err(ConfigError::InvalidPostScale(format!(
                "divider multiplier {} must be positive",
                post_scale.divider_multiplier
            )));
        }
        if !(0.0..1.0).contains(&post_scale.device_adjustment) {
            return Err(ConfigError::InvalidPostScale(format!(
                "device adjustment {} must be in [0, 1)",
                post_scale.device_adjustment
            )));
        }
        if post_scale.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidPostScale(format!(
                "{} decimals exceeds {}",
                post_scale.decimals, MAX_DECIMALS
            )));
        }

        if !VREF_RANGE.contains(&self.adc.default_vref) {
            return Err(ConfigError::InvalidVref(self.adc.default_vref));
        }
        if self.adc.channel > MAX_ADC_CHANNEL {
            return Err(ConfigError::InvalidChannel(self.adc.channel));
        }
        if self.report_interval_ms == 0 || self.report_interval() > MAX_REPORT_INTERVAL {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(Settings::dashboard().validate(), Ok(()));
        assert_eq!(Settings::serial().validate(), Ok(()));
        assert_eq!(Settings::default(), Settings::dashboard());
    }

    #[test]
    fn test_dashboard_strategy_order() {
        let strategies = Settings::dashboard().strategies().unwrap();
        assert_eq!(
            strategies,
            vec![
                ("Voltage".to_string(), AggregationStrategy::Single),
                (
                    "VoltageMultisampling".to_string(),
                    AggregationStrategy::mean(90).unwrap()
                ),
                (
                    "VoltageMultisamplingV2".to_string(),
                    AggregationStrategy::median(10).unwrap()
                ),
            ]
        );
    }

    #[test]
    fn test_zero_samples_rejected() {
        let mut settings = Settings::dashboard();
        settings.readings[1].strategy = StrategySettings::Mean { samples: 0 };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroSampleCount));

        let mut settings = Settings::dashboard();
        settings.readings[2].strategy = StrategySettings::Median { samples: 0 };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroSampleCount));
    }

    #[test]
    fn test_duplicate_and_missing_readings() {
        let mut settings = Settings::dashboard();
        settings.readings[2].name = "Voltage".to_string();
        assert_eq!(
            settings.validate(),
            Err(ConfigError::DuplicateName("Voltage".to_string()))
        );

        settings.readings.clear();
        assert_eq!(settings.validate(), Err(ConfigError::NoReadings));
    }

    #[test]
    fn test_post_scale_bounds() {
        let mut settings = Settings::serial();
        settings.post_scale.device_adjustment = DEVICE_SPECIFIC_ADJUSTMENT;
        assert_eq!(settings.validate(), Ok(()));

        settings.post_scale.device_adjustment = 1.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidPostScale(_))
        ));

        let mut settings = Settings::serial();
        settings.post_scale.divider_multiplier = f32::NAN;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidPostScale(_))
        ));

        let mut settings = Settings::serial();
        settings.post_scale.decimals = 7;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidPostScale(_))
        ));
    }

    #[test]
    fn test_adc_bounds() {
        let mut settings = Settings::serial();
        settings.adc.default_vref = 900;
        assert_eq!(settings.validate(), Err(ConfigError::InvalidVref(900)));

        let mut settings = Settings::serial();
        settings.adc.channel = 10;
        assert_eq!(settings.validate(), Err(ConfigError::InvalidChannel(10)));

        let mut settings = Settings::serial();
        settings.report_interval_ms = 0;
        assert_eq!(settings.validate(), Err(ConfigError::InvalidInterval));
    }

    #[test]
    fn test_report_interval_fits_delay() {
        let mut settings = Settings::serial();
        settings.report_interval_ms = u32::MAX as u64;
        assert_eq!(settings.validate(), Ok(()));

        settings.report_interval_ms = u32::MAX as u64 + 1;
        assert_eq!(settings.validate(), Err(ConfigError::InvalidInterval));
    }

    #[test]
    fn test_preset_sinks() {
        assert_eq!(Settings::dashboard().sink, SinkKind::Log);
        assert_eq!(Settings::serial().sink, SinkKind::Console);
        assert_eq!(Settings::serial().readings.len(), 1);
        assert_eq!(
            Settings::serial().report_interval(),
            SERIAL_REPORT_INTERVAL
        );
        #[cfg(not(feature = "serial"))]
        assert_eq!(Settings::preset(), Settings::dashboard());
        #[cfg(feature = "serial")]
        assert_eq!(Settings::preset(), Settings::serial());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "adc": {
                "unit": "Adc1",
                "channel": 6,
                "resolution": "Bits12",
                "attenuation": "Db6",
                "default_vref": 1100
            },
            "post_scale": {
                "divider_multiplier": 0.005,
                "device_adjustment": 0.0,
                "decimals": 2
            },
            "readings": [
                { "name": "battery", "strategy": { "kind": "median", "samples": 21 } }
            ],
            "report_interval_ms": 500
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.adc.channel, 6);
        assert_eq!(settings.adc.vref_gpio, None);
        assert_eq!(settings.sink, SinkKind::Console);
        assert_eq!(settings.report_interval(), Duration::from_millis(500));
        assert_eq!(
            settings.strategies().unwrap(),
            vec![(
                "battery".to_string(),
                AggregationStrategy::median(21).unwrap()
            )]
        );
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            Settings::from_json("{"),
            Err(ConfigError::Parse(_))
        ));

        let mut settings = Settings::serial();
        settings.readings[0].strategy = StrategySettings::Mean { samples: 0 };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json(&json), Err(ConfigError::ZeroSampleCount));
    }
}
