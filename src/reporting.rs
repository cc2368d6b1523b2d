use crate::config::SinkKind;
use crate::sensors::traits::ReportingSink;
use crate::types::Voltage;

/// Prints `name: value` lines on the serial console.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportingSink for ConsoleSink {
    fn report(&mut self, name: &str, value: Voltage) {
        println!("{}: {}", name, value);
    }
}

#[derive(Debug, Default)]
pub struct LogSink;

impl ReportingSink for LogSink {
    fn report(&mut self, name: &str, value: Voltage) {
        log::info!("{}: {}", name, value);
    }
}

pub fn sink(kind: SinkKind) -> Box<dyn ReportingSink> {
    match kind {
        SinkKind::Console => Box::new(ConsoleSink),
        SinkKind::Log => Box::new(LogSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{LevelFilter, Metadata, Record};
    use std::sync::Mutex;

    struct Capture {
        lines: Mutex<Vec<String>>,
    }

    impl log::Log for Capture {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if record.target().ends_with("::reporting") {
                self.lines.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture {
        lines: Mutex::new(Vec::new()),
    };

    #[test]
    fn test_log_sink_emits_info_records() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(LevelFilter::Info);

        let mut sink = sink(SinkKind::Log);
        sink.report("VoltageMultisampling", 3.705);
        sink.report("VoltageMultisamplingV2", 3.7);

        let lines = CAPTURE.lines.lock().unwrap();
        assert!(lines.contains(&"VoltageMultisampling: 3.705".to_string()));
        assert!(lines.contains(&"VoltageMultisamplingV2: 3.7".to_string()));
    }

    #[test]
    fn test_console_sink_accepts_reports() {
        let mut sink = sink(SinkKind::Console);
        sink.report("voltage", 3.705);
    }
}
