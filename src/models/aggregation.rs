use crate::config::ConfigError;
use crate::sensors::adc::VoltageConverter;
use crate::sensors::calibration::CalibrationProfile;
use crate::sensors::traits::RawSampler;
use crate::types::{RawSample, Voltage, MAX_RAW_CODE};

/// Largest N whose sum of full scale codes still fits the u32 accumulator.
pub const MAX_SAMPLE_COUNT: u32 = u32::MAX / MAX_RAW_CODE as u32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SampleCount(u32);

impl SampleCount {
    pub fn new(samples: u32) -> Result<Self, ConfigError> {
        match samples {
            0 => Err(ConfigError::ZeroSampleCount),
            n if n > MAX_SAMPLE_COUNT => Err(ConfigError::SampleCountTooLarge(n)),
            n => Ok(Self(n)),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AggregationStrategy {
    Single,
    Mean(SampleCount),
    Median(SampleCount),
}

impl std::fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationStrategy::Single => write!(f, "single"),
            AggregationStrategy::Mean(n) => write!(f, "mean of {}", n.get()),
            AggregationStrategy::Median(n) => write!(f, "median of {}", n.get()),
        }
    }
}

impl AggregationStrategy {
    pub fn mean(samples: u32) -> Result<Self, ConfigError> {
        Ok(AggregationStrategy::Mean(SampleCount::new(samples)?))
    }

    pub fn median(samples: u32) -> Result<Self, ConfigError> {
        Ok(AggregationStrategy::Median(SampleCount::new(samples)?))
    }

    /// Reads the sampler and reduces the readings to one raw code.
    pub fn representative_code(&self, sampler: &mut impl RawSampler) -> RawSample {
        match self {
            AggregationStrategy::Single => sampler.sample_raw(),
            AggregationStrategy::Mean(samples) => {
                log::debug!("multisample start");
                let n = samples.get();
                let mut sum: u32 = 0;
                for _ in 0..n {
                    // clamped so n * MAX_RAW_CODE bounds the sum
                    sum += sampler.sample_raw().clamp(0, MAX_RAW_CODE) as u32;
                }
                log::debug!("multisample done");
                (sum / n) as RawSample
            }
            AggregationStrategy::Median(samples) => {
                log::debug!("multisample median start");
                let n = samples.get() as usize;
                let mut readings: Vec<RawSample> = (0..n).map(|_| sampler.sample_raw()).collect();
                readings.sort_unstable();
                log::debug!("multisample median done");
                // upper middle element for even n
                readings[n / 2]
            }
        }
    }

    /// `None` when the representative code is not a valid reading.
    pub fn aggregate(
        &self,
        sampler: &mut impl RawSampler,
        converter: &VoltageConverter,
        profile: &CalibrationProfile,
    ) -> Option<Voltage> {
        let code = self.representative_code(sampler);
        if code <= 0 {
            return None;
        }
        Some(converter.to_voltage(code, profile))
    }
}
