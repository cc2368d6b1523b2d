use crate::config::DEFAULT_VREF;
use crate::gpio::adc::{AdcHardware, AdcUnit, Attenuation, Resolution};
use crate::sensors::calibration::{characterize, CalibrationProfile, CalibrationSource};
use crate::sensors::efuse::EfuseValues;
use crate::sensors::error::Error;
use crate::types::{Millivolts, RawSample, MAX_RAW_CODE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

struct Channel {
    number: u8,
    response: CalibrationProfile,
}

/// Simulated ADC with a constant voltage on its input pin.
pub struct MockAdc {
    pin_millivolts: f32,
    efuse: EfuseValues,
    noise: Option<Normal<f32>>,
    dropout: f64,
    rng: StdRng,
    channel: Option<Channel>,
}

impl Default for MockAdc {
    fn default() -> Self {
        // a part burned with slightly off nominal fuses
        Self::new(740.0)
            .with_burned_fuses(AdcUnit::Adc1, 0b00010, 0b1000001, 0b000000011)
            .with_noise(12.0)
    }
}

impl MockAdc {
    pub fn new(pin_millivolts: f32) -> Self {
        Self {
            pin_millivolts,
            efuse: EfuseValues::default(),
            noise: None,
            dropout: 0.0,
            rng: StdRng::from_entropy(),
            channel: None,
        }
    }

    pub fn with_efuse(mut self, efuse: EfuseValues) -> Self {
        self.efuse = efuse;
        self
    }

    /// Decodes raw eFuse words as read from the calibration block.
    pub fn with_burned_fuses(
        self,
        unit: AdcUnit,
        vref_field: u32,
        low_field: u32,
        high_field: u32,
    ) -> Self {
        self.with_efuse(EfuseValues {
            two_point: Some(EfuseValues::decode_two_point(unit, low_field, high_field)),
            vref: Some(EfuseValues::decode_vref(vref_field)),
        })
    }

    /// Gaussian noise with the given standard deviation in 12-bit codes.
    pub fn with_noise(mut self, std_dev: f32) -> Self {
        self.noise = Normal::new(0.0, std_dev).ok();
        self
    }

    /// Probability of a conversion reading 0.
    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Smallest 12-bit code the response maps at or above the pin voltage.
    fn ideal_code(&self, response: &CalibrationProfile) -> f32 {
        let wide = CalibrationProfile {
            resolution: Resolution::Bits12,
            ..*response
        };
        let (mut low, mut high) = (0u32, MAX_RAW_CODE as u32);
        while low < high {
            let mid = (low + high) / 2;
            if (wide.raw_to_millivolts(mid) as f32) < self.pin_millivolts {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low as f32
    }
}

impl AdcHardware for MockAdc {
    fn configure(
        &mut self,
        unit: AdcUnit,
        channel: u8,
        resolution: Resolution,
        attenuation: Attenuation,
    ) -> Result<(), Error> {
        let response = characterize(&self.efuse, unit, attenuation, resolution, DEFAULT_VREF)?;
        log::info!(
            "Mock {} channel {} at {}mV",
            unit,
            channel,
            self.pin_millivolts
        );
        self.channel = Some(Channel {
            number: channel,
            response,
        });
        Ok(())
    }

    fn read_raw(&mut self, channel: u8) -> RawSample {
        let response = match &self.channel {
            Some(configured) if configured.number == channel => configured.response,
            _ => return -1,
        };
        if self.dropout > 0.0 && self.rng.gen_bool(self.dropout) {
            return 0;
        }
        let mut code = self.ideal_code(&response);
        if let Some(noise) = self.noise {
            code += noise.sample(&mut self.rng);
        }
        let code = code.round().clamp(0.0, 4095.0) as RawSample;
        (code >> (12 - response.resolution.bits())).min(response.resolution.max_code())
    }

    fn check_efuse(&self, source: CalibrationSource) -> bool {
        match source {
            CalibrationSource::TwoPoint => self.efuse.two_point.is_some(),
            CalibrationSource::EfuseVref => self.efuse.vref.is_some(),
            CalibrationSource::DefaultVref => true,
        }
    }

    fn characterize(
        &mut self,
        unit: AdcUnit,
        attenuation: Attenuation,
        resolution: Resolution,
        default_vref: Millivolts,
    ) -> Result<CalibrationProfile, Error> {
        characterize(&self.efuse, unit, attenuation, resolution, default_vref)
    }
}
