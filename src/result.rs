use core::fmt::Debug;

/// Error type
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: Sized + Debug> {
    /// No presence pulse after a reset
    NoDevice,
    /// Sample is a known-bad pattern or outside -55..=125 °C
    InvalidReading,
    /// Caller supplied an unusable destination
    InvalidArgument,
    /// Scratchpad CRC (computed, received), only with `Validation::Crc8`
    CrcMismatch(u8, u8),
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

/// Coarse classification of an [`Error`], independent of the pin error type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    NoDevice,
    InvalidReading,
    InvalidArgument,
    /// The line driver itself failed
    Line,
}

impl<E: Sized + Debug> Error<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoDevice => ErrorKind::NoDevice,
            Error::InvalidReading | Error::CrcMismatch(..) => ErrorKind::InvalidReading,
            Error::InvalidArgument => ErrorKind::InvalidArgument,
            Error::PortError(_) => ErrorKind::Line,
        }
    }
}
