/// Error kinds surfaced by the analysis pipeline
///
/// The core stages (distance, genotypes, sorting, lineage) only ever produce
/// `Domain`, `Configuration` or `InputShape`. `Parse` and `Io` come from the
/// file boundary in `format_io`.
use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum MullerError {
    /// A distance was requested on inputs it is not defined for
    /// (mismatched lengths, zero variance, zero area).
    Domain(String),

    /// A threshold or option violates its precondition.
    Configuration(String),

    /// The trajectory table is empty or its rows do not share one axis.
    InputShape(String),

    /// A table could not be parsed.
    Parse(String),

    Io(io::Error),
}

impl fmt::Display for MullerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(msg) => write!(f, "Domain error: {msg}"),
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::InputShape(msg) => write!(f, "Input shape error: {msg}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl error::Error for MullerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MullerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for MullerError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io_err) = err.into_kind() {
                return Self::Io(io_err);
            }
            return Self::Parse("csv I/O failure".to_string());
        }
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MullerError>;

impl MullerError {
    pub(crate) fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn input_shape(msg: impl Into<String>) -> Self {
        Self::InputShape(msg.into())
    }
}
