#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Characterization(String),
    Hardware(String),
    Unsupported(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Characterization(message) => {
                write!(f, "ADC characterization failed: {}", message)
            }
            Error::Hardware(message) => write!(f, "ADC hardware error: {}", message),
            Error::Unsupported(message) => write!(f, "Unsupported: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn description(&self) -> &str {
        match self {
            Error::Characterization(_) => "ADC characterization failed",
            Error::Hardware(_) => "ADC hardware error",
            Error::Unsupported(_) => "Unsupported",
        }
    }
}
