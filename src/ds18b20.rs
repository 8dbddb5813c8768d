//! DS18B20 temperature reader for a line carrying exactly one sensor.
//!
//! Every transaction starts with a reset and addresses the sensor with
//! Skip ROM. The resolution is fixed at 12 bits, so a conversion always
//! takes 750 ms.

use byteorder::{ByteOrder, LittleEndian};

use crate::{compute_partial_crc8, Driver, Error, LineDriver, OpCode, TimingSource};
use core::fmt::Debug;

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Convert = 0x44,
    ReadScratchpad = 0xBE,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Conversion latency at 12-bit resolution
pub const CONVERSION_TIME_MS: u32 = 750;

pub const MIN_CELSIUS: f32 = -55.0;
pub const MAX_CELSIUS: f32 = 125.0;

/// How a scratchpad is judged before its temperature is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validation {
    /// Reject the sentinel samples and anything outside the sensor range
    #[default]
    Heuristic,
    /// As `Heuristic`, but the scratchpad CRC must match first
    Crc8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub validation: Validation,
    /// Delay between releasing the line and the presence probe in `initialize`
    pub settle_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validation: Validation::Heuristic,
            settle_ms: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Scratchpad {
    raw: [u8; Self::BYTES],
}

impl From<[u8; Scratchpad::BYTES]> for Scratchpad {
    fn from(raw: [u8; Scratchpad::BYTES]) -> Self {
        Scratchpad { raw }
    }
}

impl AsRef<[u8]> for Scratchpad {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    pub fn raw_sample(&self) -> RawSample {
        RawSample(LittleEndian::read_i16(&self.raw[0..2]))
    }

    /// CRC the sensor sent in the last byte
    pub fn crc(&self) -> u8 {
        self.raw[8]
    }

    pub fn compute_crc8(&self) -> u8 {
        compute_partial_crc8(0, &self.raw[..8])
    }

    pub fn ensure_correct_crc8<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = self.compute_crc8();
        if computed != self.crc() {
            Err(Error::CrcMismatch(computed, self.crc()))
        } else {
            Ok(())
        }
    }
}

/// Signed temperature sample in 1/16 °C
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample(pub i16);

impl RawSample {
    /// Power-on default (85 °C), idle-high misread, all-zero misread
    pub const SENTINELS: [u16; 3] = [0x0550, 0xFFFF, 0x0000];

    pub fn bits(&self) -> u16 {
        self.0 as u16
    }

    pub fn is_sentinel(&self) -> bool {
        Self::SENTINELS.contains(&self.bits())
    }

    pub fn celsius(&self) -> f32 {
        f32::from(self.0) / 16.0
    }
}

/// Validates a scratchpad and returns its temperature in °C.
pub fn decode<E: Debug>(scratchpad: &Scratchpad, validation: Validation) -> Result<f32, Error<E>> {
    if validation == Validation::Crc8 {
        scratchpad.ensure_correct_crc8()?;
    }
    let raw = scratchpad.raw_sample();
    if raw.is_sentinel() {
        debug!("sentinel sample {=u16:#x}", raw.bits());
        return Err(Error::InvalidReading);
    }
    let celsius = raw.celsius();
    if !(MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius) {
        debug!("sample {} out of range", raw.0);
        return Err(Error::InvalidReading);
    }
    Ok(celsius)
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// A conversion has been started; the scratchpad is valid once
/// [`PendingConversion::wait_ms`] has elapsed.
#[must_use]
#[derive(Debug)]
pub struct PendingConversion {
    wait_ms: u32,
}

impl PendingConversion {
    pub fn wait_ms(&self) -> u32 {
        self.wait_ms
    }
}

/// The sensor on one line. Operations take `&mut self`, so one handle runs
/// one transaction at a time.
pub struct Ds18b20<L: LineDriver> {
    driver: Driver<L>,
    config: Config,
}

impl<E: Debug, L: LineDriver<Error = E>> Ds18b20<L> {
    pub fn new(line: L) -> Self {
        Self::with_config(line, Config::default())
    }

    pub fn with_config(line: L, config: Config) -> Self {
        Ds18b20 {
            driver: Driver::new(line),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_inner(self) -> L {
        self.driver.into_inner()
    }

    /// Releases the line, lets it settle and probes for the sensor once.
    pub fn initialize(&mut self, timing: &mut impl TimingSource) -> Result<(), Error<E>> {
        self.driver.release()?;
        timing.delay_ms(self.config.settle_ms);
        let presence = self.driver.reset_presence(timing)?;
        trace!("presence on init: {}", presence);
        if presence {
            Ok(())
        } else {
            Err(Error::NoDevice)
        }
    }

    /// Starts a conversion. Nothing may use the bus until the returned
    /// wait has elapsed and [`Ds18b20::finish_reading`] is called.
    pub fn start_conversion(
        &mut self,
        timing: &mut impl TimingSource,
    ) -> Result<PendingConversion, Error<E>> {
        self.driver
            .reset_skip_write_only(timing, &[Command::Convert.op_code()])?;
        Ok(PendingConversion {
            wait_ms: CONVERSION_TIME_MS,
        })
    }

    /// Reads the scratchpad of a finished conversion and validates it.
    pub fn finish_reading(
        &mut self,
        timing: &mut impl TimingSource,
        _pending: PendingConversion,
    ) -> Result<f32, Error<E>> {
        let mut raw = [0u8; Scratchpad::BYTES];
        self.read_scratchpad(timing, &mut raw)?;
        let scratchpad = Scratchpad::from(raw);
        trace!("raw sample {}", scratchpad.raw_sample().0);
        decode(&scratchpad, self.config.validation)
    }

    /// Full acquisition, blocking through the conversion with `timing`.
    pub fn read_temperature(&mut self, timing: &mut impl TimingSource) -> Result<f32, Error<E>> {
        let pending = self.start_conversion(timing)?;
        timing.delay_ms(pending.wait_ms());
        self.finish_reading(timing, pending)
    }

    /// Full acquisition, awaiting the conversion on `delay` so other tasks run meanwhile.
    #[cfg(feature = "async")]
    pub async fn read_temperature_async(
        &mut self,
        timing: &mut impl TimingSource,
        delay: &mut impl embedded_hal_async::delay::DelayNs,
    ) -> Result<f32, Error<E>> {
        let pending = self.start_conversion(timing)?;
        delay.delay_ms(pending.wait_ms()).await;
        self.finish_reading(timing, pending)
    }

    /// Reads all nine scratchpad bytes into the front of `dst`.
    pub fn read_scratchpad(
        &mut self,
        timing: &mut impl TimingSource,
        dst: &mut [u8],
    ) -> Result<(), Error<E>> {
        let dst = dst
            .get_mut(..Scratchpad::BYTES)
            .ok_or(Error::InvalidArgument)?;
        self.driver
            .reset_skip_write_read(timing, &[Command::ReadScratchpad.op_code()], dst)
    }
}
