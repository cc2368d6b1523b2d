use crate::types::{RawSample, Voltage};

pub trait RawSampler {
    fn sample_raw(&mut self) -> RawSample;
}

pub trait ReportingSink {
    fn report(&mut self, name: &str, value: Voltage);
}
