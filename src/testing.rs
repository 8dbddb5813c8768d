//! Simulated single-sensor bus with a deterministic clock.
//!
//! The clock only advances on delay calls. Slots are decoded the way the
//! sensor does: by the width of each low pulse the master drives.

use crate::{compute_partial_crc8, Direction, LineDriver, TimingSource};
use core::convert::Infallible;
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

const RESET_MIN_US: u64 = 480;
const WRITE_0_MIN_US: u64 = 15;

struct Slot {
    low_us: u64,
    sampled: bool,
}

struct Bus {
    now_us: u64,
    in_section: bool,
    sections: usize,
    line_ops: usize,
    unmasked_line_ops: usize,
    delays_ms: Vec<u32>,

    direction: Direction,
    level: bool,
    low_since: u64,
    last_pulse_us: u64,
    slot: Option<Slot>,

    default_present: bool,
    presence: VecDeque<bool>,
    present: bool,
    awaiting_presence: bool,
    resets: usize,

    shift: u8,
    bit_count: u8,
    addressed: bool,
    written: Vec<u8>,
    read_slots: usize,
    tx: VecDeque<bool>,
    scratchpad: [u8; 9],
    conversions: usize,
}

impl Bus {
    fn driven_low(&self) -> bool {
        self.direction == Direction::Output && !self.level
    }

    fn line_op(&mut self, op: impl FnOnce(&mut Bus)) {
        self.line_ops += 1;
        if !self.in_section {
            self.unmasked_line_ops += 1;
        }
        let before = self.driven_low();
        op(self);
        match (before, self.driven_low()) {
            (false, true) => self.falling_edge(),
            (true, false) => self.rising_edge(),
            _ => {}
        }
    }

    fn falling_edge(&mut self) {
        self.finish_slot();
        self.awaiting_presence = false;
        self.low_since = self.now_us;
    }

    fn rising_edge(&mut self) {
        let low_us = self.now_us - self.low_since;
        self.last_pulse_us = low_us;
        if low_us >= RESET_MIN_US {
            self.reset();
        } else {
            self.slot = Some(Slot {
                low_us,
                sampled: false,
            });
        }
    }

    fn finish_slot(&mut self) {
        if let Some(slot) = self.slot.take() {
            if !slot.sampled {
                self.receive_bit(slot.low_us < WRITE_0_MIN_US);
            }
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.present = self.presence.pop_front().unwrap_or(self.default_present);
        self.awaiting_presence = true;
        self.slot = None;
        self.shift = 0;
        self.bit_count = 0;
        self.addressed = false;
        self.tx.clear();
    }

    fn receive_bit(&mut self, bit: bool) {
        if !self.present {
            return;
        }
        if bit {
            self.shift |= 1 << self.bit_count;
        }
        self.bit_count += 1;
        if self.bit_count < 8 {
            return;
        }
        let byte = self.shift;
        self.shift = 0;
        self.bit_count = 0;
        self.written.push(byte);

        if !self.addressed {
            self.addressed = byte == 0xCC;
            return;
        }
        match byte {
            0x44 => self.conversions += 1,
            0xBE => {
                for byte in self.scratchpad {
                    for i in 0..8 {
                        self.tx.push_back(byte & (1 << i) != 0);
                    }
                }
            }
            _ => {}
        }
    }

    fn sample(&mut self) -> bool {
        if self.driven_low() {
            return false;
        }
        if self.awaiting_presence {
            self.awaiting_presence = false;
            return !self.present;
        }
        match &mut self.slot {
            Some(slot) if !slot.sampled && slot.low_us < WRITE_0_MIN_US => {
                slot.sampled = true;
                self.read_slots += 1;
                self.tx.pop_front().unwrap_or(true)
            }
            _ => true,
        }
    }
}

/// Handle to the simulated bus; [`SimBus::line`] and [`SimBus::timing`] share it.
#[derive(Clone)]
pub struct SimBus(Rc<RefCell<Bus>>);

impl SimBus {
    pub fn new() -> Self {
        SimBus(Rc::new(RefCell::new(Bus {
            now_us: 0,
            in_section: false,
            sections: 0,
            line_ops: 0,
            unmasked_line_ops: 0,
            delays_ms: Vec::new(),
            direction: Direction::InputPullUp,
            level: true,
            low_since: 0,
            last_pulse_us: 0,
            slot: None,
            default_present: true,
            presence: VecDeque::new(),
            present: true,
            awaiting_presence: false,
            resets: 0,
            shift: 0,
            bit_count: 0,
            addressed: false,
            written: Vec::new(),
            read_slots: 0,
            tx: VecDeque::new(),
            scratchpad: scratchpad(0x91, 0x01),
            conversions: 0,
        })))
    }

    pub fn with_scratchpad(scratchpad: [u8; 9]) -> Self {
        let bus = Self::new();
        bus.0.borrow_mut().scratchpad = scratchpad;
        bus
    }

    pub fn line(&self) -> SimLine {
        SimLine(self.0.clone())
    }

    pub fn timing(&self) -> SimTiming {
        SimTiming(self.0.clone())
    }

    pub fn set_present(&self, present: bool) {
        self.0.borrow_mut().default_present = present;
    }

    /// Presence answers for the next resets, then the default applies
    pub fn script_presence(&self, answers: &[bool]) {
        self.0.borrow_mut().presence.extend(answers.iter().copied());
    }

    pub fn queue_bits(&self, bits: &[bool]) {
        self.0.borrow_mut().tx.extend(bits.iter().copied());
    }

    /// Decodes the write slot still open at the end of a sequence
    pub fn flush(&self) {
        self.0.borrow_mut().finish_slot();
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    pub fn last_pulse_us(&self) -> u64 {
        self.0.borrow().last_pulse_us
    }

    pub fn written_bytes(&self) -> Vec<u8> {
        self.0.borrow().written.clone()
    }

    pub fn read_slots(&self) -> usize {
        self.0.borrow().read_slots
    }

    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }

    pub fn conversions(&self) -> usize {
        self.0.borrow().conversions
    }

    pub fn sections(&self) -> usize {
        self.0.borrow().sections
    }

    pub fn line_ops(&self) -> usize {
        self.0.borrow().line_ops
    }

    pub fn unmasked_line_ops(&self) -> usize {
        self.0.borrow().unmasked_line_ops
    }

    pub fn delays_ms(&self) -> Vec<u32> {
        self.0.borrow().delays_ms.clone()
    }
}

pub struct SimLine(Rc<RefCell<Bus>>);

impl LineDriver for SimLine {
    type Error = Infallible;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.0.borrow_mut().line_op(|bus| bus.direction = direction);
        Ok(())
    }

    fn write_level(&mut self, high: bool) -> Result<(), Self::Error> {
        self.0.borrow_mut().line_op(|bus| bus.level = high);
        Ok(())
    }

    fn read_level(&mut self) -> Result<bool, Self::Error> {
        let mut bus = self.0.borrow_mut();
        bus.line_op(|_| {});
        Ok(bus.sample())
    }
}

pub struct SimTiming(Rc<RefCell<Bus>>);

impl TimingSource for SimTiming {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().now_us += u64::from(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut bus = self.0.borrow_mut();
        bus.now_us += u64::from(ms) * 1000;
        bus.delays_ms.push(ms);
    }

    fn critical_section<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        {
            let mut bus = self.0.borrow_mut();
            assert!(!bus.in_section, "critical sections must not nest");
            bus.in_section = true;
            bus.sections += 1;
        }
        let result = f(self);
        self.0.borrow_mut().in_section = false;
        result
    }
}

/// Scratchpad as the sensor reports it, with a valid CRC in byte 8
pub fn scratchpad(lsb: u8, msb: u8) -> [u8; 9] {
    let mut bytes = [lsb, msb, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00];
    bytes[8] = compute_partial_crc8(0, &bytes[..8]);
    bytes
}
