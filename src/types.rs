pub type RawSample = i32;
pub type Millivolts = u32;
/// Converted reading, in whatever unit the post scale produces (volts for the presets).
pub type Voltage = f32;

/// Largest code of the widest (12-bit) ADC resolution.
pub const MAX_RAW_CODE: RawSample = 4095;
