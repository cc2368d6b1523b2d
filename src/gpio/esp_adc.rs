use crate::gpio::adc::{AdcHardware, AdcUnit, Attenuation, Resolution};
use crate::sensors::calibration::{CalibrationProfile, CalibrationSource, LutCurves};
use crate::sensors::error::Error;
use crate::types::{Millivolts, RawSample};
use esp_idf_sys::{self as sys, esp, EspError};

impl From<EspError> for Error {
    fn from(e: EspError) -> Self {
        Error::Hardware(format!("{:?}", e))
    }
}

fn unit_id(unit: AdcUnit) -> sys::adc_unit_t {
    match unit {
        AdcUnit::Adc1 => sys::adc_unit_t_ADC_UNIT_1,
        AdcUnit::Adc2 => sys::adc_unit_t_ADC_UNIT_2,
    }
}

fn atten_id(attenuation: Attenuation) -> sys::adc_atten_t {
    match attenuation {
        Attenuation::Db0 => sys::adc_atten_t_ADC_ATTEN_DB_0,
        Attenuation::Db2_5 => sys::adc_atten_t_ADC_ATTEN_DB_2_5,
        Attenuation::Db6 => sys::adc_atten_t_ADC_ATTEN_DB_6,
        Attenuation::Db11 => sys::adc_atten_t_ADC_ATTEN_DB_11,
    }
}

fn width_id(resolution: Resolution) -> sys::adc_bits_width_t {
    match resolution {
        Resolution::Bits9 => sys::adc_bits_width_t_ADC_WIDTH_BIT_9,
        Resolution::Bits10 => sys::adc_bits_width_t_ADC_WIDTH_BIT_10,
        Resolution::Bits11 => sys::adc_bits_width_t_ADC_WIDTH_BIT_11,
        Resolution::Bits12 => sys::adc_bits_width_t_ADC_WIDTH_BIT_12,
    }
}

/// ADC1 through the ESP-IDF legacy oneshot driver and `esp_adc_cal`.
#[derive(Default)]
pub struct EspAdc {}

impl EspAdc {
    pub fn new() -> Self {
        Self {}
    }
}

impl AdcHardware for EspAdc {
    fn configure(
        &mut self,
        unit: AdcUnit,
        channel: u8,
        resolution: Resolution,
        attenuation: Attenuation,
    ) -> Result<(), Error> {
        if unit != AdcUnit::Adc1 {
            return Err(Error::Unsupported(format!(
                "{} oneshot reads, only ADC1 is wired",
                unit
            )));
        }
        esp!(unsafe { sys::adc1_config_width(width_id(resolution)) })?;
        esp!(unsafe {
            sys::adc1_config_channel_atten(channel as sys::adc1_channel_t, atten_id(attenuation))
        })?;
        Ok(())
    }

    fn read_raw(&mut self, channel: u8) -> RawSample {
        unsafe { sys::adc1_get_raw(channel as sys::adc1_channel_t) as RawSample }
    }

    fn check_efuse(&self, source: CalibrationSource) -> bool {
        let value_type = match source {
            CalibrationSource::TwoPoint => sys::esp_adc_cal_value_t_ESP_ADC_CAL_VAL_EFUSE_TP,
            CalibrationSource::EfuseVref => sys::esp_adc_cal_value_t_ESP_ADC_CAL_VAL_EFUSE_VREF,
            CalibrationSource::DefaultVref => return true,
        };
        esp!(unsafe { sys::esp_adc_cal_check_efuse(value_type) }).is_ok()
    }

    fn characterize(
        &mut self,
        unit: AdcUnit,
        attenuation: Attenuation,
        resolution: Resolution,
        default_vref: Millivolts,
    ) -> Result<CalibrationProfile, Error> {
        let mut characteristics = sys::esp_adc_cal_characteristics_t::default();
        let value_type = unsafe {
            sys::esp_adc_cal_characterize(
                unit_id(unit),
                atten_id(attenuation),
                width_id(resolution),
                default_vref,
                &mut characteristics,
            )
        };
        let source = match value_type {
            sys::esp_adc_cal_value_t_ESP_ADC_CAL_VAL_EFUSE_TP => CalibrationSource::TwoPoint,
            sys::esp_adc_cal_value_t_ESP_ADC_CAL_VAL_EFUSE_VREF => CalibrationSource::EfuseVref,
            sys::esp_adc_cal_value_t_ESP_ADC_CAL_VAL_DEFAULT_VREF => CalibrationSource::DefaultVref,
            other => {
                return Err(Error::Characterization(format!(
                    "driver returned calibration type {}",
                    other
                )))
            }
        };
        Ok(CalibrationProfile {
            source,
            unit,
            attenuation,
            resolution,
            vref: characteristics.vref,
            coeff_a: characteristics.coeff_a,
            coeff_b: characteristics.coeff_b,
            // same tables the driver points low_curve/high_curve at
            curves: LutCurves::for_attenuation(unit, attenuation),
        })
    }

    fn route_vref_to_gpio(&mut self, unit: AdcUnit, gpio: u8) -> Result<(), Error> {
        esp!(unsafe { sys::adc_vref_to_gpio(unit_id(unit), gpio as sys::gpio_num_t) })?;
        Ok(())
    }
}
