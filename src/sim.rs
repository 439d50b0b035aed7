//! Host-side stand-ins for the hardware: an instrumented register file, a
//! platform with countable clock gating and a settable clock, and a JPEG data
//! path that moves nothing.
//!
//! Only built for tests and under the `std` feature.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::vec::Vec;

use crate::job::Buffer;
use crate::jpeg::{DataPath, DataPathError};
use crate::platform::Platform;
use crate::regs::RegisterBlock;

/// Register file backed by atomics.
///
/// Every `write` is counted and logged in order. Registers configured as
/// interrupt-clear registers don't store what's written to them; instead each
/// 1 bit clears the same bit in the paired status register, the way the
/// hardware's write-1-to-clear registers behave. Tests raise status bits with
/// `raise`, which is not counted as a write.
pub struct SimRegs {
    words: Vec<AtomicU32>,
    writes: AtomicUsize,
    log: Mutex<Vec<(usize, u32)>>,
    clears: Vec<(usize, usize)>,
}

impl SimRegs {
    /// Creates a zeroed register file covering `size` bytes.
    pub fn new(size: usize) -> Self {
        SimRegs {
            words: (0..(size + 3) / 4).map(|_| AtomicU32::new(0)).collect(),
            writes: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
            clears: Vec::new(),
        }
    }

    /// Makes writes to `clear` clear bits in `status`.
    pub fn with_clear(mut self, clear: usize, status: usize) -> Self {
        self.clears.push((clear, status));
        self
    }

    fn word(&self, offset: usize) -> &AtomicU32 {
        assert_eq!(offset % 4, 0, "unaligned register offset {:#x}", offset);
        &self.words[offset / 4]
    }

    /// Hardware-side update: ORs `bits` into the register at `offset`.
    pub fn raise(&self, offset: usize, bits: u32) {
        self.word(offset).fetch_or(bits, Ordering::SeqCst);
    }

    /// Hardware-side update: replaces the register at `offset`.
    pub fn poke(&self, offset: usize, value: u32) {
        self.word(offset).store(value, Ordering::SeqCst);
    }

    /// Reads without going through `RegisterBlock`.
    pub fn peek(&self, offset: usize) -> u32 {
        self.word(offset).load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every write so far, oldest first, as `(offset, value)`.
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.log.lock().unwrap().clone()
    }

    /// Offsets written, oldest first.
    pub fn write_offsets(&self) -> Vec<usize> {
        self.writes().into_iter().map(|(o, _)| o).collect()
    }

    /// Values written to `offset`, oldest first.
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|&(o, _)| o == offset)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
        self.writes.store(0, Ordering::SeqCst);
    }
}

impl RegisterBlock for SimRegs {
    fn read(&self, offset: usize) -> u32 {
        self.peek(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        // Log under the lock so the log order matches the order writes land.
        let mut log = self.log.lock().unwrap();
        log.push((offset, value));
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.clears.iter().find(|&&(c, _)| c == offset) {
            Some(&(_, status)) => {
                self.word(status).fetch_and(!value, Ordering::SeqCst);
            }
            None => self.word(offset).store(value, Ordering::SeqCst),
        }
    }
}

/// Platform double: counts clock gate transitions and exposes a settable
/// tick counter.
#[derive(Default)]
pub struct SimPlatform {
    enabled: AtomicBool,
    enables: AtomicUsize,
    disables: AtomicUsize,
    ticks: AtomicU32,
}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock_on(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enables(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disables(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }

    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Platform for SimPlatform {
    fn clock_enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        self.enables.fetch_add(1, Ordering::SeqCst);
    }

    fn clock_disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.disables.fetch_add(1, Ordering::SeqCst);
    }

    fn now(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }
}

/// Data path double. Reports whatever byte count the test sets with
/// `produce` when the job finishes.
#[derive(Default)]
pub struct SimDataPath {
    armed: AtomicBool,
    refuse: AtomicBool,
    produced: AtomicU32,
    arms: AtomicUsize,
    cancels: AtomicUsize,
}

impl SimDataPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `arm` calls fail.
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn produce(&self, bytes: u32) {
        self.produced.store(bytes, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn arms(&self) -> usize {
        self.arms.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl DataPath for SimDataPath {
    fn arm(&self, _src: &Buffer, _dst: &Buffer) -> Result<(), DataPathError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(DataPathError);
        }
        self.armed.store(true, Ordering::SeqCst);
        self.arms.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&self) -> u32 {
        self.armed.store(false, Ordering::SeqCst);
        self.produced.swap(0, Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_register_is_write_one_to_clear() {
        let regs = SimRegs::new(0x10).with_clear(0x8, 0x4);
        regs.raise(0x4, 0b1011);
        regs.write(0x8, 0b0011);
        assert_eq!(regs.peek(0x4), 0b1000);
        assert_eq!(regs.peek(0x8), 0);
        assert_eq!(regs.write_count(), 1);
        assert_eq!(regs.writes(), vec![(0x8, 0b0011)]);
    }

    #[test]
    fn raise_is_not_a_write() {
        let regs = SimRegs::new(0x10);
        regs.raise(0, 2);
        regs.poke(4, 7);
        assert_eq!(regs.write_count(), 0);
        assert_eq!(regs.read(0), 2);
        assert_eq!(regs.read(4), 7);
    }

    #[test]
    fn platform_counts_gating() {
        let p = SimPlatform::new();
        p.clock_enable();
        assert!(p.clock_on());
        p.clock_disable();
        p.advance(5);
        assert!(!p.clock_on());
        assert_eq!((p.enables(), p.disables(), p.now()), (1, 1, 5));
    }

    #[test]
    fn data_path_reports_once() {
        let d = SimDataPath::new();
        let b = Buffer::new(0, 16);
        d.arm(&b, &b).unwrap();
        d.produce(12);
        assert!(d.is_armed());
        assert_eq!(d.finish(), 12);
        assert_eq!(d.finish(), 0);
        d.refuse(true);
        assert_eq!(d.arm(&b, &b), Err(DataPathError));
        assert_eq!(d.arms(), 1);
    }
}
