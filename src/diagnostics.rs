use crate::{Error, ErrorKind};
use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Human readable description of an error kind.
pub fn error_to_string(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NoDevice => "No device found",
        ErrorKind::InvalidReading => "Invalid reading",
        ErrorKind::InvalidArgument => "Invalid argument",
        ErrorKind::Line => "Line I/O error",
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(error_to_string(*self))
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::CrcMismatch(computed, received) => write!(
                f,
                "{} (crc {:02x}, expected {:02x})",
                self.kind(),
                received,
                computed
            ),
            Error::PortError(e) => write!(f, "{}: {:?}", self.kind(), e),
            _ => Display::fmt(&self.kind(), f),
        }
    }
}
