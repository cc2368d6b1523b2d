use crate::config::{ConfigError, Settings};
use crate::models::aggregation::AggregationStrategy;
use crate::sensors::adc::VoltageConverter;
use crate::sensors::calibration::CalibrationProfile;
use crate::sensors::traits::{RawSampler, ReportingSink};
use crate::types::Voltage;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVoltage {
    name: String,
    strategy: AggregationStrategy,
    voltage: Voltage,
}

impl TrackedVoltage {
    pub fn new(name: &str, strategy: AggregationStrategy) -> Self {
        Self {
            name: name.to_string(),
            strategy,
            voltage: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    pub fn update(
        &mut self,
        sampler: &mut impl RawSampler,
        converter: &VoltageConverter,
        profile: &CalibrationProfile,
    ) {
        match self.strategy.aggregate(sampler, converter, profile) {
            Some(voltage) => self.voltage = voltage,
            None => match self.strategy {
                // sensor momentarily invalid
                AggregationStrategy::Single => self.voltage = 0.0,
                AggregationStrategy::Mean(_) | AggregationStrategy::Median(_) => {
                    log::warn!(
                        "{}: invalid {} reading, keeping {}",
                        self.name,
                        self.strategy,
                        self.voltage
                    );
                }
            },
        }
    }
}

pub struct VoltageMonitor<S: RawSampler> {
    sampler: S,
    profile: CalibrationProfile,
    converter: VoltageConverter,
    readings: Vec<TrackedVoltage>,
}

impl<S: RawSampler> VoltageMonitor<S> {
    pub fn new(
        sampler: S,
        profile: CalibrationProfile,
        converter: VoltageConverter,
        readings: Vec<TrackedVoltage>,
    ) -> Self {
        Self {
            sampler,
            profile,
            converter,
            readings,
        }
    }

    pub fn from_settings(
        sampler: S,
        profile: CalibrationProfile,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let readings = settings
            .strategies()?
            .into_iter()
            .map(|(name, strategy)| TrackedVoltage::new(&name, strategy))
            .collect();
        Ok(Self::new(
            sampler,
            profile,
            VoltageConverter::new(settings.post_scale),
            readings,
        ))
    }

    pub fn readings(&self) -> &[TrackedVoltage] {
        &self.readings
    }

    /// Updates every reading in order, then reports each one once.
    pub fn run_cycle(&mut self, sink: &mut dyn ReportingSink) {
        for reading in self.readings.iter_mut() {
            reading.update(&mut self.sampler, &self.converter, &self.profile);
        }
        for reading in &self.readings {
            sink.report(reading.name(), reading.voltage());
        }
    }
}
