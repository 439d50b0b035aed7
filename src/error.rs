//! Errors returned synchronously to callers. Nothing here is produced after
//! a transfer has started; those outcomes travel as `job::Status`.

use core::fmt;

use pixfmt::FourCc;

/// A job or format request the hardware can't carry out as described.
/// Returned before any register is touched.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Not in the capability table for the requested direction.
    UnsupportedFormat(FourCc),
    /// Zero, or too large for the size fields.
    Geometry { width: u32, height: u32 },
    /// Line offset too large for the offset field.
    LineOffset(u32),
    /// A plain copy can't change pixel format.
    FormatMismatch { input: FourCc, output: FourCc },
    /// Blend requested with no background buffer.
    MissingBackground,
    /// Output buffer can't hold the result.
    BufferTooSmall { needed: u32, len: u32 },
    /// A control value outside its legal range.
    OutOfRange(u32),
    /// Reconfiguration attempted while a job is in flight.
    Busy,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::UnsupportedFormat(cc) => {
                write!(f, "unsupported format {}", cc)
            }
            ConfigError::Geometry { width, height } => {
                write!(f, "unsupported geometry {}x{}", width, height)
            }
            ConfigError::LineOffset(o) => write!(f, "line offset {} too large", o),
            ConfigError::FormatMismatch { input, output } => {
                write!(f, "copy can't convert {} to {}", input, output)
            }
            ConfigError::MissingBackground => f.write_str("blend without background"),
            ConfigError::BufferTooSmall { needed, len } => {
                write!(f, "buffer holds {} bytes, need {}", len, needed)
            }
            ConfigError::OutOfRange(v) => write!(f, "value {} out of range", v),
            ConfigError::Busy => f.write_str("device busy"),
        }
    }
}

/// Why `run` refused a job.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunError {
    Config(ConfigError),
    /// A job is already in flight.
    Busy,
    /// The scheduler's readiness gate is closed.
    NotReady,
    /// The data path feeding the hardware refused the buffers.
    DataPath,
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "bad job: {}", e),
            RunError::Busy => f.write_str("job already running"),
            RunError::NotReady => f.write_str("job not ready"),
            RunError::DataPath => f.write_str("data path unavailable"),
        }
    }
}
