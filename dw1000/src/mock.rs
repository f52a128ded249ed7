//! Simulated DW1000 for host-side tests
//!
//! [`FakeDw1000`] is a cloneable handle to a register file that sits behind a
//! fake SPI bus. It decodes the same transaction headers the real chip does,
//! so the driver runs unmodified on top of it. Beyond plain storage it models
//! the few behaviours the driver relies on:
//!
//! - DEV_ID reports a configurable identifier
//! - CPLOCK comes up a configurable number of SYS_STATUS polls after reset
//! - TXSTRT captures the frame and raises TXFRS a configurable number of
//!   SYS_STATUS polls later
//! - SYS_STATUS bits are cleared by writing ones
//! - frozen registers silently ignore writes, like a chip that refuses a
//!   configuration
//!
//! Only available in tests and with the `mock` feature.

use std::{cell::RefCell, collections::BTreeMap, convert::Infallible, rc::Rc};

use embedded_hal::{
    blocking::{delay::DelayMs, spi},
    digital::v2::OutputPin,
};

const DEV_ID: u8 = 0x00;
const TX_FCTRL: u8 = 0x08;
const TX_BUFFER: u8 = 0x09;
const SYS_CTRL: u8 = 0x0D;
const SYS_STATUS: u8 = 0x0F;

const CPLOCK: u8 = 1 << 1;
const TX_EVENTS: u8 = 0xF0;
const TXSTRT: u8 = 1 << 1;

/// The identifier a genuine DW1000 reports
pub const DW1000_DEV_ID: u32 = 0xDECA0130;

/// Handle to a simulated DW1000
///
/// All clones share one device. The handle itself is the SPI bus.
#[derive(Clone, Debug)]
pub struct FakeDw1000(Rc<RefCell<Device>>);

#[derive(Debug)]
struct Device {
    registers: BTreeMap<(u8, u16), Vec<u8>>,
    frozen: Vec<(u8, u16)>,
    dev_id: u32,
    lock_after: Option<u32>,
    lock_pending: Option<u32>,
    tx_after: Option<u32>,
    tx_pending: Option<u32>,
    in_reset: bool,
    selected: bool,
    resets: usize,
    transactions: usize,
    status_polls: usize,
    frames: Vec<Vec<u8>>,
}

impl Device {
    fn power_on(&mut self) {
        self.registers.clear();
        self.registers
            .insert((DEV_ID, 0), self.dev_id.to_le_bytes().to_vec());
        self.registers.insert((SYS_STATUS, 0), vec![0; 5]);
        self.lock_pending = self.lock_after;
        self.tx_pending = None;
    }

    fn status_mut(&mut self) -> &mut Vec<u8> {
        self.registers
            .entry((SYS_STATUS, 0))
            .or_insert_with(|| vec![0; 5])
    }

    fn tick_status(&mut self) {
        self.status_polls += 1;

        match self.lock_pending {
            Some(0) => {
                self.status_mut()[0] |= CPLOCK;
                self.lock_pending = None;
            }
            Some(n) => self.lock_pending = Some(n - 1),
            None => (),
        }

        match self.tx_pending {
            Some(0) => {
                self.status_mut()[0] |= TX_EVENTS;
                self.tx_pending = None;
            }
            Some(n) => self.tx_pending = Some(n - 1),
            None => (),
        }
    }

    fn read(&mut self, key: (u8, u16), out: &mut [u8]) {
        if key == (SYS_STATUS, 0) {
            self.tick_status();
        }

        let stored = self.registers.get(&key).map(Vec::as_slice).unwrap_or(&[]);
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = stored.get(i).copied().unwrap_or(0);
        }
    }

    fn write(&mut self, key: (u8, u16), data: &[u8]) {
        if self.frozen.contains(&key) {
            return;
        }

        match key {
            (SYS_STATUS, 0) => {
                let status = self.status_mut();
                for (stored, clear) in status.iter_mut().zip(data) {
                    *stored &= !clear;
                }
            }
            (SYS_CTRL, 0) => {
                if data.first().map_or(false, |b| b & TXSTRT != 0) {
                    self.start_tx();
                }
                let mut value = data.to_vec();
                if let Some(first) = value.first_mut() {
                    // TXSTRT clears itself
                    *first &= !TXSTRT;
                }
                self.registers.insert(key, value);
            }
            _ => {
                let stored = self.registers.entry(key).or_insert_with(Vec::new);
                if stored.len() < data.len() {
                    stored.resize(data.len(), 0);
                }
                stored[..data.len()].copy_from_slice(data);
            }
        }
    }

    fn start_tx(&mut self) {
        let tflen = self
            .registers
            .get(&(TX_FCTRL, 0))
            .and_then(|r| r.first())
            .map_or(0, |b| (b & 0x7f) as usize);
        let len = tflen.saturating_sub(2);

        let buffer = self
            .registers
            .get(&(TX_BUFFER, 0))
            .cloned()
            .unwrap_or_default();
        let mut frame = vec![0; len];
        for (i, byte) in frame.iter_mut().enumerate() {
            *byte = buffer.get(i).copied().unwrap_or(0);
        }

        self.frames.push(frame);
        self.tx_pending = self.tx_after;
    }
}

/// Decodes a transaction header into register id, sub-index and header length
fn decode_header(buffer: &[u8]) -> (bool, (u8, u16), usize) {
    let write = buffer[0] & 0x80 != 0;
    let id = buffer[0] & 0x3f;

    if buffer[0] & 0x40 == 0 {
        return (write, (id, 0), 1);
    }

    let low = (buffer[1] & 0x7f) as u16;
    if buffer[1] & 0x80 == 0 {
        return (write, (id, low), 2);
    }

    let high = buffer[2] as u16;
    (write, (id, low | high << 7), 3)
}

impl FakeDw1000 {
    /// A powered-up DW1000 that locks its PLL on the first status poll and
    /// finishes every transmission on the first status poll after TXSTRT
    pub fn new() -> Self {
        let mut device = Device {
            registers: BTreeMap::new(),
            frozen: Vec::new(),
            dev_id: DW1000_DEV_ID,
            lock_after: Some(0),
            lock_pending: None,
            tx_after: Some(0),
            tx_pending: None,
            in_reset: false,
            selected: false,
            resets: 0,
            transactions: 0,
            status_polls: 0,
            frames: Vec::new(),
        };
        device.power_on();

        FakeDw1000(Rc::new(RefCell::new(device)))
    }

    /// Number of SYS_STATUS polls after reset before CPLOCK is reported
    ///
    /// `None` models a chip that never leaves its init state.
    pub fn lock_after(self, polls: Option<u32>) -> Self {
        {
            let mut device = self.0.borrow_mut();
            device.lock_after = polls;
            device.lock_pending = polls;
        }
        self
    }

    /// Number of SYS_STATUS polls after TXSTRT before TXFRS is reported
    ///
    /// `None` models a transmitter that never completes.
    pub fn tx_after(self, polls: Option<u32>) -> Self {
        self.0.borrow_mut().tx_after = polls;
        self
    }

    /// Makes DEV_ID report `dev_id`
    pub fn dev_id(self, dev_id: u32) -> Self {
        {
            let mut device = self.0.borrow_mut();
            device.dev_id = dev_id;
            device.registers.insert((DEV_ID, 0), dev_id.to_le_bytes().to_vec());
        }
        self
    }

    /// Makes the register at `id`/`sub_id` ignore all writes
    pub fn freeze(self, id: u8, sub_id: u16) -> Self {
        self.0.borrow_mut().frozen.push((id, sub_id));
        self
    }

    /// A chip select pin for this device
    pub fn chip_select(&self) -> FakePin {
        FakePin {
            device: self.clone(),
            line: Line::ChipSelect,
        }
    }

    /// The device's RSTn line
    pub fn reset_line(&self) -> FakePin {
        FakePin {
            device: self.clone(),
            line: Line::Reset,
        }
    }

    /// Current contents of a register, little-endian
    pub fn register(&self, id: u8, sub_id: u16) -> Vec<u8> {
        self.0
            .borrow()
            .registers
            .get(&(id, sub_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrites a register, bypassing the SPI bus
    pub fn set_register(&self, id: u8, sub_id: u16, value: &[u8]) {
        self.0
            .borrow_mut()
            .registers
            .insert((id, sub_id), value.to_vec());
    }

    /// Frames captured at TXSTRT, oldest first, without FCS
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().frames.clone()
    }

    /// How often the reset line was pulled low
    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }

    /// Number of SPI transactions seen so far
    pub fn transactions(&self) -> usize {
        self.0.borrow().transactions
    }

    /// Number of SYS_STATUS reads seen so far
    pub fn status_polls(&self) -> usize {
        self.0.borrow().status_polls
    }

    fn transact(&self, buffer: &mut [u8]) {
        let mut device = self.0.borrow_mut();
        assert!(device.selected, "SPI transaction without chip select");
        device.transactions += 1;

        if device.in_reset {
            for byte in buffer.iter_mut() {
                *byte = 0;
            }
            return;
        }

        let (write, key, header_len) = decode_header(buffer);
        let (_, payload) = buffer.split_at_mut(header_len);

        if write {
            device.write(key, payload);
        } else {
            device.read(key, payload);
        }
    }
}

impl Default for FakeDw1000 {
    fn default() -> Self {
        Self::new()
    }
}

impl spi::Transfer<u8> for FakeDw1000 {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Self::Error> {
        self.transact(words);
        Ok(words)
    }
}

impl spi::Write<u8> for FakeDw1000 {
    type Error = Infallible;

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut buffer = words.to_vec();
        self.transact(&mut buffer);
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Line {
    ChipSelect,
    Reset,
}

/// An output pin wired to a [`FakeDw1000`]
#[derive(Clone, Debug)]
pub struct FakePin {
    device: FakeDw1000,
    line: Line,
}

impl OutputPin for FakePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut device = self.device.0.borrow_mut();
        match self.line {
            Line::ChipSelect => device.selected = true,
            Line::Reset => {
                device.in_reset = true;
                device.resets += 1;
            }
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut device = self.device.0.borrow_mut();
        match self.line {
            Line::ChipSelect => device.selected = false,
            Line::Reset => {
                if device.in_reset {
                    device.in_reset = false;
                    device.power_on();
                }
            }
        }
        Ok(())
    }
}

/// A delay that only records how long it was asked to wait
#[derive(Clone, Debug, Default)]
pub struct FakeDelay {
    /// Every requested delay in milliseconds, in order
    pub calls: Vec<u32>,
}

impl FakeDelay {
    /// Sum of all requested delays in milliseconds
    pub fn total_ms(&self) -> u32 {
        self.calls.iter().sum()
    }
}

impl DelayMs<u8> for FakeDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.calls.push(ms as u32);
    }
}

impl DelayMs<u32> for FakeDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}
