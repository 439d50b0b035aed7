//! Register access layer.
//!
//! Everything above this module talks to hardware through `RegisterBlock`,
//! which is nothing more than "read a word at an offset" and "write a word at
//! an offset." Real hardware is reached through `Mmio`; tests use
//! `crate::sim::SimRegs`.
//!
//! Single-register accesses are atomic. Sequences of accesses (including the
//! read-modify-write helpers) are not; callers that need a consistent view of
//! several registers hold the device's IRQ lock.

/// A block of 32-bit registers addressed by byte offset.
pub trait RegisterBlock: Sync {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);

    fn set_bits(&self, offset: usize, mask: u32) {
        let v = self.read(offset);
        self.write(offset, v | mask)
    }

    fn clear_bits(&self, offset: usize, mask: u32) {
        let v = self.read(offset);
        self.write(offset, v & !mask)
    }

    /// Replaces the bits selected by `mask` with the corresponding bits of
    /// `value`. Bits of `value` outside `mask` are ignored.
    fn update_bits(&self, offset: usize, mask: u32, value: u32) {
        let v = self.read(offset);
        self.write(offset, (v & !mask) | (value & mask))
    }
}

impl<'a, R: RegisterBlock + ?Sized> RegisterBlock for &'a R {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }
    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}

/// Memory-mapped register block at a fixed physical address.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Wraps the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a mapped, word-aligned peripheral
    /// register block that nothing else in the program accesses except
    /// through this `Mmio`. Offsets handed to `read` and `write` must fall
    /// inside the block.
    pub const unsafe fn new(base: usize) -> Self {
        Mmio { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for Mmio {
    #[inline]
    fn read(&self, offset: usize) -> u32 {
        // Safety: guaranteed by the contract of Mmio::new.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    #[inline]
    fn write(&self, offset: usize, value: u32) {
        // Safety: guaranteed by the contract of Mmio::new.
        unsafe {
            core::ptr::write_volatile((self.base + offset) as *mut u32, value)
        }
    }
}

/// A bit field within a 32-bit register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub shift: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(shift: u8, width: u8) -> Self {
        Field { shift, width }
    }

    /// Largest value representable in the field.
    pub const fn max(self) -> u32 {
        if self.width >= 32 {
            !0
        } else {
            (1 << self.width) - 1
        }
    }

    /// Mask of the field's bits in register position.
    pub const fn mask(self) -> u32 {
        self.max() << self.shift
    }

    pub const fn fits(self, value: u32) -> bool {
        value <= self.max()
    }

    /// Places `value` in register position. Bits beyond the field width are
    /// discarded; callers validate with `fits` first.
    pub const fn encode(self, value: u32) -> u32 {
        (value & self.max()) << self.shift
    }

    pub const fn decode(self, reg: u32) -> u32 {
        (reg >> self.shift) & self.max()
    }
}
