use crate::sensors::calibration::{CalibrationProfile, CalibrationSource};
use crate::sensors::error::Error;
use crate::sensors::traits::RawSampler;
use crate::types::{Millivolts, RawSample};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdcUnit {
    Adc1,
    Adc2,
}

impl std::fmt::Display for AdcUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdcUnit::Adc1 => write!(f, "ADC1"),
            AdcUnit::Adc2 => write!(f, "ADC2"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

impl Attenuation {
    /// Position in the per-attenuation calibration tables.
    pub fn index(&self) -> usize {
        match self {
            Attenuation::Db0 => 0,
            Attenuation::Db2_5 => 1,
            Attenuation::Db6 => 2,
            Attenuation::Db11 => 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    pub fn bits(&self) -> u32 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    pub fn max_code(&self) -> RawSample {
        (1 << self.bits()) - 1
    }
}

/// Driver for one ADC peripheral and its calibration eFuses.
pub trait AdcHardware {
    fn configure(
        &mut self,
        unit: AdcUnit,
        channel: u8,
        resolution: Resolution,
        attenuation: Attenuation,
    ) -> Result<(), Error>;

    /// One conversion. Drivers report failures as a non-positive code.
    fn read_raw(&mut self, channel: u8) -> RawSample;

    fn check_efuse(&self, source: CalibrationSource) -> bool;

    fn characterize(
        &mut self,
        unit: AdcUnit,
        attenuation: Attenuation,
        resolution: Resolution,
        default_vref: Millivolts,
    ) -> Result<CalibrationProfile, Error>;

    fn route_vref_to_gpio(&mut self, unit: AdcUnit, gpio: u8) -> Result<(), Error> {
        Err(Error::Unsupported(format!(
            "routing {} vref to gpio{}",
            unit, gpio
        )))
    }
}

pub struct ChannelSampler<H: AdcHardware> {
    hardware: H,
    channel: u8,
}

impl<H: AdcHardware> ChannelSampler<H> {
    pub fn new(hardware: H, channel: u8) -> Self {
        Self { hardware, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }
}

impl<H: AdcHardware> RawSampler for ChannelSampler<H> {
    fn sample_raw(&mut self) -> RawSample {
        self.hardware.read_raw(self.channel)
    }
}
