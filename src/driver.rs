use crate::{Command, Direction, Error, LineDriver, OpCode, TimingSource};
use core::fmt::Debug;

// Reset and presence detection, microseconds.
const RESET_LOW_US: u32 = 500;
const PRESENCE_WAIT_US: u32 = 70;
const PRESENCE_WINDOW_US: u32 = 240;

// Write slots, microseconds. Both add up to one 70 us slot.
const WRITE_1_LOW_US: u32 = 6;
const WRITE_1_HIGH_US: u32 = 64;
const WRITE_0_LOW_US: u32 = 60;
const WRITE_0_HIGH_US: u32 = 10;

// Read slot, microseconds.
const READ_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

pub const SLOT_DURATION_US: u32 = 70;

/// 1-Wire master for the one line it owns.
pub struct Driver<L: LineDriver> {
    line: L,
}

impl<E: Debug, L: LineDriver<Error = E>> Driver<L> {
    pub fn new(line: L) -> Self {
        Driver { line }
    }

    pub fn into_inner(self) -> L {
        self.line
    }

    pub fn reset_skip_write_only(
        &mut self,
        timing: &mut impl TimingSource,
        write: &[u8],
    ) -> Result<(), Error<E>> {
        self.reset(timing)?;
        self.skip(timing)?;
        self.write_bytes(timing, write)?;
        Ok(())
    }

    pub fn reset_skip_write_read(
        &mut self,
        timing: &mut impl TimingSource,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Error<E>> {
        self.reset(timing)?;
        self.skip(timing)?;
        self.write_bytes(timing, write)?;
        self.read_bytes(timing, read)?;
        Ok(())
    }

    pub fn skip(&mut self, timing: &mut impl TimingSource) -> Result<(), E> {
        self.write_command(timing, Command::SkipRom)
    }

    /// Performs a reset and listens for a presence pulse.
    /// Returns Err(NoDevice) if nothing pulled the line low.
    pub fn reset(&mut self, timing: &mut impl TimingSource) -> Result<(), Error<E>> {
        if self.reset_presence(timing)? {
            Ok(())
        } else {
            Err(Error::NoDevice)
        }
    }

    /// Sends the reset pulse, returns whether a device answered with a presence pulse
    pub fn reset_presence(&mut self, timing: &mut impl TimingSource) -> Result<bool, E> {
        timing.critical_section(|timing| -> Result<bool, E> {
            self.set_low()?;
            timing.delay_us(RESET_LOW_US);
            self.release()?;
            timing.delay_us(PRESENCE_WAIT_US);
            // the device holds the line low while present
            let presence = !self.is_high()?;
            timing.delay_us(PRESENCE_WINDOW_US);
            Ok(presence)
        })
    }

    pub fn read_bytes(&mut self, timing: &mut impl TimingSource, dst: &mut [u8]) -> Result<(), E> {
        for d in dst {
            *d = self.read_byte(timing)?;
        }
        Ok(())
    }

    pub fn read_byte(&mut self, timing: &mut impl TimingSource) -> Result<u8, E> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit(timing)? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    pub fn read_bit(&mut self, timing: &mut impl TimingSource) -> Result<bool, E> {
        timing.critical_section(|timing| -> Result<bool, E> {
            self.set_low()?;
            timing.delay_us(READ_LOW_US);
            self.release()?;
            timing.delay_us(READ_SAMPLE_US);
            let val = self.is_high()?;
            timing.delay_us(READ_RECOVERY_US);
            Ok(val)
        })
    }

    pub fn write_command(&mut self, timing: &mut impl TimingSource, cmd: impl OpCode) -> Result<(), E> {
        self.write_byte(timing, cmd.op_code())
    }

    pub fn write_bytes(&mut self, timing: &mut impl TimingSource, bytes: &[u8]) -> Result<(), E> {
        for b in bytes {
            self.write_byte(timing, *b)?;
        }
        Ok(())
    }

    pub fn write_byte(&mut self, timing: &mut impl TimingSource, byte: u8) -> Result<(), E> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(timing, (byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    pub fn write_bit(&mut self, timing: &mut impl TimingSource, high: bool) -> Result<(), E> {
        let (low_us, high_us) = if high {
            (WRITE_1_LOW_US, WRITE_1_HIGH_US)
        } else {
            (WRITE_0_LOW_US, WRITE_0_HIGH_US)
        };
        timing.critical_section(|timing| -> Result<(), E> {
            self.set_low()?;
            timing.delay_us(low_us);
            self.release()?;
            timing.delay_us(high_us);
            Ok(())
        })
    }

    /// Lets the pull-up take the line high
    #[inline(always)]
    pub fn release(&mut self) -> Result<(), E> {
        self.line.set_direction(Direction::InputPullUp)
    }

    #[inline(always)]
    pub(crate) fn set_low(&mut self) -> Result<(), E> {
        self.line.write_level(false)?;
        self.line.set_direction(Direction::Output)
    }

    #[inline(always)]
    pub(crate) fn is_high(&mut self) -> Result<bool, E> {
        self.line.read_level()
    }
}
