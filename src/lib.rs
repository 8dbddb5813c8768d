#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

// must come first so the log macros are visible in the other modules
mod fmt;

mod command;
mod diagnostics;
mod driver;
#[cfg(feature = "ds18b20")]
pub mod ds18b20;
mod iowire;
mod result;
#[cfg(test)]
mod testing;
mod timing;

pub use command::{Command, OpCode};
pub use diagnostics::error_to_string;
pub use driver::{Driver, SLOT_DURATION_US};
pub use iowire::{Direction, LineDriver, OpenDrain, SplitLine};
pub use result::{Error, ErrorKind};
pub use timing::{Timing, TimingSource};

/// Maxim/Dallas CRC-8 (polynomial x^8 + x^5 + x^4 + 1), continued from `crc`
pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}
