use crate::config::AdcSettings;
use crate::gpio::adc::{AdcHardware, AdcUnit, Attenuation, Resolution};
use crate::sensors::efuse::{EfuseValues, TwoPointFuse};
use crate::sensors::error::Error;
use crate::types::Millivolts;

const LIN_COEFF_A_SCALE: u64 = 65536;
const LIN_COEFF_A_ROUND: u64 = LIN_COEFF_A_SCALE / 2;
const ADC_12_BIT_RES: u64 = 4096;
const TP_LOW_VOLTAGE: i64 = 150;
const TP_HIGH_VOLTAGE: i64 = 850;

const ADC1_TP_ATTEN_SCALE: [u32; 4] = [65504, 86975, 120389, 224310];
const ADC1_TP_ATTEN_OFFSET: [u32; 4] = [0, 1, 27, 54];
const ADC2_TP_ATTEN_SCALE: [u32; 4] = [65467, 86861, 120416, 224708];
const ADC2_TP_ATTEN_OFFSET: [u32; 4] = [0, 9, 26, 66];

const ADC1_VREF_ATTEN_SCALE: [u32; 4] = [57431, 76236, 105481, 196602];
const ADC1_VREF_ATTEN_OFFSET: [u32; 4] = [75, 78, 107, 142];
const ADC2_VREF_ATTEN_SCALE: [u32; 4] = [57236, 76258, 105524, 196592];
const ADC2_VREF_ATTEN_OFFSET: [u32; 4] = [63, 66, 89, 149];

// 11 dB lookup tables, indexed by (code - LUT_LOW_THRESH) / LUT_ADC_STEP_SIZE
pub const LUT_POINTS: usize = 20;
const LUT_VREF_LOW: i64 = 1000;
const LUT_VREF_HIGH: i64 = 1200;
const LUT_ADC_STEP_SIZE: u64 = 64;
const LUT_LOW_THRESH: u64 = 2880;
const LUT_HIGH_THRESH: u64 = LUT_LOW_THRESH + LUT_ADC_STEP_SIZE;

const LUT_ADC1_LOW: [u32; LUT_POINTS] = [
    2240, 2297, 2352, 2405, 2457, 2512, 2564, 2616, 2664, 2709, 2754, 2795, 2832, 2868, 2903, 2937,
    2969, 3000, 3030, 3060,
];
const LUT_ADC1_HIGH: [u32; LUT_POINTS] = [
    2667, 2706, 2745, 2780, 2813, 2844, 2873, 2901, 2928, 2956, 2982, 3006, 3032, 3059, 3084, 3110,
    3135, 3160, 3184, 3209,
];
const LUT_ADC2_LOW: [u32; LUT_POINTS] = [
    2238, 2293, 2347, 2399, 2451, 2505, 2556, 2608, 2655, 2700, 2746, 2786, 2823, 2859, 2894, 2928,
    2960, 2991, 3021, 3051,
];
const LUT_ADC2_HIGH: [u32; LUT_POINTS] = [
    2668, 2705, 2742, 2777, 2810, 2841, 2870, 2898, 2925, 2951, 2977, 3003, 3028, 3054, 3079, 3104,
    3128, 3152, 3176, 3201,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CalibrationSource {
    TwoPoint,
    EfuseVref,
    DefaultVref,
}

impl CalibrationSource {
    /// Two point beats eFuse Vref beats the default Vref.
    pub fn select(two_point_supported: bool, vref_supported: bool) -> Self {
        if two_point_supported {
            CalibrationSource::TwoPoint
        } else if vref_supported {
            CalibrationSource::EfuseVref
        } else {
            CalibrationSource::DefaultVref
        }
    }
}

impl std::fmt::Display for CalibrationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationSource::TwoPoint => write!(f, "Two Point Value"),
            CalibrationSource::EfuseVref => write!(f, "eFuse Vref"),
            CalibrationSource::DefaultVref => write!(f, "Default Vref"),
        }
    }
}

/// Millivolt curves measured at a Vref of 1000 mV (`low`) and 1200 mV (`high`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LutCurves {
    pub low: &'static [u32; LUT_POINTS],
    pub high: &'static [u32; LUT_POINTS],
}

impl LutCurves {
    /// Only 11 dB leaves the linear region at the top of the range.
    pub fn for_attenuation(unit: AdcUnit, attenuation: Attenuation) -> Option<Self> {
        if attenuation != Attenuation::Db11 {
            return None;
        }
        Some(match unit {
            AdcUnit::Adc1 => Self {
                low: &LUT_ADC1_LOW,
                high: &LUT_ADC1_HIGH,
            },
            AdcUnit::Adc2 => Self {
                low: &LUT_ADC2_LOW,
                high: &LUT_ADC2_HIGH,
            },
        })
    }

    /// Bilinear interpolation across code and Vref for a 12-bit code at or above the threshold.
    fn millivolts(&self, code: u64, vref: Millivolts) -> u64 {
        let i = ((code - LUT_LOW_THRESH) / LUT_ADC_STEP_SIZE) as usize;
        let lower = (i as u64 * LUT_ADC_STEP_SIZE + LUT_LOW_THRESH) as i64;
        let code = code as i64;
        let vref = vref as i64;

        let x2dist = LUT_VREF_HIGH - vref;
        let x1dist = vref - LUT_VREF_LOW;
        let y2dist = lower + LUT_ADC_STEP_SIZE as i64 - code;
        let y1dist = code - lower;

        let q11 = self.low[i] as i64;
        let q12 = self.low[i + 1] as i64;
        let q21 = self.high[i] as i64;
        let q22 = self.high[i + 1] as i64;

        let area = (LUT_VREF_HIGH - LUT_VREF_LOW) * LUT_ADC_STEP_SIZE as i64;
        let voltage = q11 * x2dist * y2dist
            + q21 * x1dist * y2dist
            + q12 * x2dist * y1dist
            + q22 * x1dist * y1dist;
        ((voltage + area / 2) / area).max(0) as u64
    }
}

/// ADC characteristic for a 12-bit code: linear `mV = coeff_a * code / 65536 + coeff_b`,
/// with an optional lookup table for the non-linear top of the 11 dB range.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CalibrationProfile {
    pub source: CalibrationSource,
    pub unit: AdcUnit,
    pub attenuation: Attenuation,
    pub resolution: Resolution,
    pub vref: Millivolts,
    pub coeff_a: u32,
    pub coeff_b: u32,
    pub curves: Option<LutCurves>,
}

impl CalibrationProfile {
    pub fn from_vref(
        source: CalibrationSource,
        unit: AdcUnit,
        attenuation: Attenuation,
        resolution: Resolution,
        vref: Millivolts,
    ) -> Self {
        let (scales, offsets) = match unit {
            AdcUnit::Adc1 => (ADC1_VREF_ATTEN_SCALE, ADC1_VREF_ATTEN_OFFSET),
            AdcUnit::Adc2 => (ADC2_VREF_ATTEN_SCALE, ADC2_VREF_ATTEN_OFFSET),
        };
        let index = attenuation.index();
        let coeff_a = (vref as u64 * scales[index] as u64) / ADC_12_BIT_RES;
        Self {
            source,
            unit,
            attenuation,
            resolution,
            vref,
            coeff_a: coeff_a as u32,
            coeff_b: offsets[index],
            curves: LutCurves::for_attenuation(unit, attenuation),
        }
    }

    pub fn two_point(
        unit: AdcUnit,
        attenuation: Attenuation,
        resolution: Resolution,
        fuse: TwoPointFuse,
        vref: Millivolts,
    ) -> Result<Self, Error> {
        if fuse.high <= fuse.low {
            return Err(Error::Characterization(format!(
                "two point eFuse readings are not increasing: low {} high {}",
                fuse.low, fuse.high
            )));
        }
        let (scales, offsets) = match unit {
            AdcUnit::Adc1 => (ADC1_TP_ATTEN_SCALE, ADC1_TP_ATTEN_OFFSET),
            AdcUnit::Adc2 => (ADC2_TP_ATTEN_SCALE, ADC2_TP_ATTEN_OFFSET),
        };
        let index = attenuation.index();
        let delta_x = (fuse.high - fuse.low) as i64;
        let delta_v = TP_HIGH_VOLTAGE - TP_LOW_VOLTAGE;
        let coeff_a = (delta_v * scales[index] as i64 + delta_x / 2) / delta_x;
        let coeff_b = TP_HIGH_VOLTAGE - (delta_v * fuse.high as i64 + delta_x / 2) / delta_x
            + offsets[index] as i64;
        Ok(Self {
            source: CalibrationSource::TwoPoint,
            unit,
            attenuation,
            resolution,
            vref,
            coeff_a: coeff_a as u32,
            coeff_b: coeff_b.max(0) as u32,
            curves: LutCurves::for_attenuation(unit, attenuation),
        })
    }

    pub fn raw_to_millivolts(&self, code: u32) -> Millivolts {
        let code = code.min(self.resolution.max_code() as u32);
        if code == 0 {
            return 0;
        }
        let code = ((code as u64) << (12 - self.resolution.bits())).min(ADC_12_BIT_RES - 1);
        let linear = self.linear_millivolts(code);
        let millivolts = match self.curves {
            Some(curves) if code >= LUT_LOW_THRESH => {
                let table = curves.millivolts(code, self.vref);
                if code <= LUT_HIGH_THRESH {
                    // blend from the linear characteristic into the table
                    blend(linear, table, code - LUT_LOW_THRESH)
                } else {
                    table
                }
            }
            _ => linear,
        };
        millivolts as Millivolts
    }

    fn linear_millivolts(&self, code: u64) -> u64 {
        (self.coeff_a as u64 * code + LIN_COEFF_A_ROUND) / LIN_COEFF_A_SCALE + self.coeff_b as u64
    }
}

fn blend(from: u64, to: u64, step: u64) -> u64 {
    let (from, to, step) = (from as i64, to as i64, step as i64);
    let span = LUT_ADC_STEP_SIZE as i64;
    ((from * span + (to - from) * step + span / 2) / span).max(0) as u64
}

/// Builds the profile from whatever the eFuse bank provides, in priority order.
pub fn characterize(
    efuse: &EfuseValues,
    unit: AdcUnit,
    attenuation: Attenuation,
    resolution: Resolution,
    default_vref: Millivolts,
) -> Result<CalibrationProfile, Error> {
    let vref = efuse.vref.unwrap_or(default_vref);
    if let Some(fuse) = efuse.two_point {
        return CalibrationProfile::two_point(unit, attenuation, resolution, fuse, vref);
    }
    let source = CalibrationSource::select(false, efuse.vref.is_some());
    Ok(CalibrationProfile::from_vref(
        source,
        unit,
        attenuation,
        resolution,
        vref,
    ))
}

pub struct CalibrationProvider<'a> {
    settings: &'a AdcSettings,
}

impl<'a> CalibrationProvider<'a> {
    pub fn new(settings: &'a AdcSettings) -> Self {
        Self { settings }
    }

    pub fn initialize<H: AdcHardware>(&self, hardware: &mut H) -> Result<CalibrationProfile, Error> {
        let two_point = hardware.check_efuse(CalibrationSource::TwoPoint);
        log::info!("eFuse Two Point: {}", supported(two_point));
        let vref = hardware.check_efuse(CalibrationSource::EfuseVref);
        log::info!("eFuse Vref: {}", supported(vref));

        let settings = self.settings;
        hardware.configure(
            settings.unit,
            settings.channel,
            settings.resolution,
            settings.attenuation,
        )?;

        let expected = CalibrationSource::select(two_point, vref);
        let profile = hardware.characterize(
            settings.unit,
            settings.attenuation,
            settings.resolution,
            settings.default_vref,
        )?;
        if profile.source != expected {
            log::warn!(
                "Driver characterized using {} although {} was expected",
                profile.source,
                expected
            );
        }
        log::info!("Characterized using {}", profile.source);
        log::info!("vRef: {}", profile.vref);

        if let Some(gpio) = settings.vref_gpio {
            match hardware.route_vref_to_gpio(settings.unit, gpio) {
                Ok(()) => log::info!("v_ref routed to GPIO{}", gpio),
                Err(e) => log::warn!("failed to route v_ref: {}", e),
            }
        }

        Ok(profile)
    }
}

fn supported(flag: bool) -> &'static str {
    if flag {
        "Supported"
    } else {
        "NOT supported"
    }
}
