use crate::gpio::adc::AdcUnit;
use crate::types::Millivolts;

const VREF_OFFSET: i32 = 1100;
const VREF_STEP_SIZE: i32 = 7;
const VREF_FIELD_BITS: u32 = 5;

const TP_LOW1_OFFSET: i32 = 278;
const TP_LOW2_OFFSET: i32 = 421;
const TP_HIGH1_OFFSET: i32 = 3265;
const TP_HIGH2_OFFSET: i32 = 3406;
const TP_STEP_SIZE: i32 = 4;
const TP_LOW_FIELD_BITS: u32 = 7;
const TP_HIGH_FIELD_BITS: u32 = 9;

/// Raw ADC readings burned at the factory for the 150 mV and 850 mV test points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TwoPointFuse {
    pub low: u32,
    pub high: u32,
}

/// Calibration constants present in the eFuse bank. `None` means not burned.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EfuseValues {
    pub two_point: Option<TwoPointFuse>,
    pub vref: Option<Millivolts>,
}

impl EfuseValues {
    pub fn decode_vref(field: u32) -> Millivolts {
        (VREF_OFFSET + decode_sign_magnitude(field, VREF_FIELD_BITS) * VREF_STEP_SIZE) as Millivolts
    }

    pub fn decode_two_point(unit: AdcUnit, low_field: u32, high_field: u32) -> TwoPointFuse {
        let (low_offset, high_offset) = match unit {
            AdcUnit::Adc1 => (TP_LOW1_OFFSET, TP_HIGH1_OFFSET),
            AdcUnit::Adc2 => (TP_LOW2_OFFSET, TP_HIGH2_OFFSET),
        };
        let low = low_offset + decode_sign_magnitude(low_field, TP_LOW_FIELD_BITS) * TP_STEP_SIZE;
        let high =
            high_offset + decode_sign_magnitude(high_field, TP_HIGH_FIELD_BITS) * TP_STEP_SIZE;
        TwoPointFuse {
            low: low as u32,
            high: high as u32,
        }
    }
}

// Top bit of the field is the sign, the rest the magnitude.
fn decode_sign_magnitude(field: u32, bits: u32) -> i32 {
    let sign_bit = 1 << (bits - 1);
    let magnitude = (field & (sign_bit - 1)) as i32;
    if field & sign_bit != 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vref() {
        assert_eq!(EfuseValues::decode_vref(0), 1100);
        assert_eq!(EfuseValues::decode_vref(0b00011), 1121);
        assert_eq!(EfuseValues::decode_vref(0b10011), 1079);
        assert_eq!(EfuseValues::decode_vref(0b01111), 1205);
    }

    #[test]
    fn test_decode_two_point() {
        let tp = EfuseValues::decode_two_point(AdcUnit::Adc1, 0b0000010, 0b100000011);
        assert_eq!(tp, TwoPointFuse { low: 286, high: 3253 });

        let tp = EfuseValues::decode_two_point(AdcUnit::Adc2, 0, 0);
        assert_eq!(tp, TwoPointFuse { low: 421, high: 3406 });
    }

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(decode_sign_magnitude(0b10000, 5), 0);
    }
}
