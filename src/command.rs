pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM commands. Only one device is ever attached, so every transaction
/// broadcasts with Skip ROM.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    SkipRom = 0xCC,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}
