use crate::sensors::calibration::CalibrationProfile;
use crate::types::{RawSample, Voltage};
use serde::{Deserialize, Serialize};

/// Linear correction applied after calibration.
///
/// `divider_multiplier` compensates the external voltage divider and also
/// carries the millivolt to output unit conversion (5.0 / 1000 reports volts
/// behind a 1:5 divider). `device_adjustment` is a relative correction, the
/// converted value is reduced by that fraction before scaling.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct PostScale {
    pub divider_multiplier: f32,
    pub device_adjustment: f32,
    pub decimals: u8,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoltageConverter {
    post_scale: PostScale,
}

impl VoltageConverter {
    pub fn new(post_scale: PostScale) -> Self {
        Self { post_scale }
    }

    pub fn to_voltage(&self, code: RawSample, profile: &CalibrationProfile) -> Voltage {
        if code <= 0 {
            return 0.0;
        }
        let mut voltage = profile.raw_to_millivolts(code as u32) as f32;
        voltage -= self.post_scale.device_adjustment * voltage;
        voltage *= self.post_scale.divider_multiplier;
        round_to(voltage, self.post_scale.decimals).max(0.0)
    }
}

/// Rounds half away from zero at the given number of decimal places.
pub fn round_to(value: f32, decimals: u8) -> f32 {
    let scale = 10f32.powi(decimals as i32);
    (value * scale).round() / scale
}
