//! The job model shared by both accelerators: buffers, surfaces, the slot
//! table that stands in for a "current job" pointer, and the completion
//! records handed from interrupt context to the scheduler.

use core::fmt;

use heapless::spsc;
use pixfmt::FourCc;

/// Bus address of a DMA-able buffer, as the accelerator sees it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BufAddr(pub u32);

bitflags::bitflags! {
    /// Per-buffer flags, using the bit positions of the buffer-queue layer we
    /// exchange buffers with.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct BufFlags: u32 {
        const ERROR = 1 << 6;
        const TIMECODE = 1 << 8;
        const TSTAMP_SRC_SOE = 1 << 16;
        /// Timestamp source field. Zero means end-of-frame.
        const TSTAMP_SRC_MASK = 0b111 << 16;
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

/// One buffer as handed to us by the scheduler. Single contiguous plane.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Buffer {
    pub addr: BufAddr,
    /// Capacity in bytes.
    pub len: u32,
    /// Bytes of valid data; set on output buffers when a job retires.
    pub bytes_used: u32,
    pub timestamp: u64,
    pub timecode: Timecode,
    pub flags: BufFlags,
}

impl Buffer {
    pub fn new(addr: u32, len: u32) -> Self {
        Buffer {
            addr: BufAddr(addr),
            len,
            ..Buffer::default()
        }
    }

    /// Copies capture metadata from the input buffer that produced this
    /// output: timestamp, timestamp source, and timecode.
    pub fn copy_metadata_from(&mut self, src: &Buffer) {
        self.timestamp = src.timestamp;
        self.timecode = src.timecode;
        self.flags.remove(BufFlags::TSTAMP_SRC_MASK | BufFlags::TIMECODE);
        self.flags
            .insert(src.flags & (BufFlags::TSTAMP_SRC_MASK | BufFlags::TIMECODE));
    }
}

/// A constant colour, one byte per channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Argb { a, r, g, b }
    }

    /// Colour register image: alpha in the top byte, then blue, green, red.
    pub const fn pack(self) -> u32 {
        (self.a as u32) << 24
            | (self.b as u32) << 16
            | (self.g as u32) << 8
            | self.r as u32
    }
}

/// How a layer's per-pixel alpha combines with its constant alpha.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AlphaMode {
    /// Use the pixel's own alpha.
    NoModif = 0,
    /// Replace it with the layer constant.
    Replace = 1,
    /// Multiply it by the layer constant.
    Combine = 2,
}

impl AlphaMode {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(AlphaMode::NoModif),
            1 => Some(AlphaMode::Replace),
            2 => Some(AlphaMode::Combine),
            _ => None,
        }
    }
}

/// Geometry and format of one image plane, plus the layer constants used
/// when it takes part in a transfer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// Pixels skipped at the end of each line.
    pub line_offset: u32,
    pub format: FourCc,
    pub color: Argb,
    pub alpha_mode: AlphaMode,
}

impl Surface {
    pub const fn new(width: u32, height: u32, format: FourCc) -> Self {
        Surface {
            width,
            height,
            line_offset: 0,
            format,
            color: Argb::new(0, 0, 0, 0),
            alpha_mode: AlphaMode::NoModif,
        }
    }
}

/// Names a job while it occupies a slot. The generation makes a handle to a
/// retired job distinguishable from a handle to whatever reuses its slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct JobHandle {
    index: u8,
    generation: u16,
}

impl JobHandle {
    pub fn index(self) -> usize {
        usize::from(self.index)
    }
}

struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

/// Fixed-capacity table of live jobs.
pub struct Slots<T, const N: usize> {
    slots: [Slot<T>; N],
}

impl<T, const N: usize> Slots<T, N> {
    pub fn new() -> Self {
        Slots {
            slots: [(); N].map(|_| Slot {
                generation: 0,
                value: None,
            }),
        }
    }

    /// Stores `value`, returning it back if the table is full.
    pub fn insert(&mut self, value: T) -> Result<JobHandle, T> {
        match self.slots.iter().position(|s| s.value.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                Ok(JobHandle {
                    index: index as u8,
                    generation: slot.generation,
                })
            }
            None => Err(value),
        }
    }

    fn slot(&self, handle: JobHandle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation && s.value.is_some())
    }

    pub fn is_live(&self, handle: JobHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn get(&self, handle: JobHandle) -> Option<&T> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    /// Takes the job out of its slot and retires the handle. Stale handles
    /// get `None`.
    pub fn remove(&mut self, handle: JobHandle) -> Option<T> {
        if !self.is_live(handle) {
            return None;
        }
        let slot = &mut self.slots[handle.index()];
        slot.generation = slot.generation.wrapping_add(1);
        slot.value.take()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, const N: usize> Default for Slots<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a transfer ended without completing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransferError {
    /// Interrupt with an all-zero status register.
    NoStatus,
    /// Bus error during the transfer.
    Bus,
    /// Hardware rejected the programmed configuration.
    Config,
    /// Error fetching the colour lookup table.
    ClutAccess,
    /// Status bits we have no interpretation for.
    Unrecognized(u32),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransferError::NoStatus => f.write_str("interrupt with empty status"),
            TransferError::Bus => f.write_str("bus error"),
            TransferError::Config => f.write_str("configuration error"),
            TransferError::ClutAccess => f.write_str("CLUT access error"),
            TransferError::Unrecognized(s) => {
                write!(f, "unrecognized status {:#x}", s)
            }
        }
    }
}

/// Final outcome of one job.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Done,
    Error(TransferError),
    /// The watchdog gave up on the job and aborted it.
    Timeout,
}

impl Status {
    pub fn is_done(self) -> bool {
        self == Status::Done
    }
}

/// What the interrupt side hands to the scheduler when a job retires.
#[derive(Debug)]
pub struct Completion<J> {
    pub handle: JobHandle,
    pub job: J,
    pub status: Status,
    /// Bytes written to the output buffer.
    pub payload: u32,
}

/// Capacity of the completion handoff. With one job in flight per device a
/// queue that holds two never fills.
pub const COMPLETION_DEPTH: usize = 4;

pub type CompletionQueue<J> = spsc::Queue<Completion<J>, COMPLETION_DEPTH>;
pub type CompletionProducer<'q, J> =
    spsc::Producer<'q, Completion<J>, COMPLETION_DEPTH>;
pub type CompletionConsumer<'q, J> =
    spsc::Consumer<'q, Completion<J>, COMPLETION_DEPTH>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_packing_puts_alpha_high_and_red_low() {
        assert_eq!(Argb::new(128, 0x11, 0x22, 0x33).pack(), 0x8033_2211);
        assert_eq!(Argb::new(0, 0xff, 0, 0).pack(), 0x0000_00ff);
    }

    #[test]
    fn metadata_propagation() {
        let mut src = Buffer::new(0x1000, 64);
        src.timestamp = 12345;
        src.timecode.frames = 7;
        src.flags = BufFlags::TSTAMP_SRC_SOE | BufFlags::TIMECODE;
        let mut dst = Buffer::new(0x2000, 64);
        dst.flags = BufFlags::ERROR;
        dst.copy_metadata_from(&src);
        assert_eq!(dst.timestamp, 12345);
        assert_eq!(dst.timecode.frames, 7);
        assert_eq!(
            dst.flags,
            BufFlags::ERROR | BufFlags::TSTAMP_SRC_SOE | BufFlags::TIMECODE
        );

        src.flags = BufFlags::empty();
        dst.copy_metadata_from(&src);
        assert_eq!(dst.flags, BufFlags::ERROR);
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut slots: Slots<u32, 1> = Slots::new();
        let a = slots.insert(1).unwrap();
        assert_eq!(slots.insert(2), Err(2));
        assert!(slots.is_live(a));
        assert_eq!(slots.remove(a), Some(1));
        assert!(!slots.is_live(a));
        assert_eq!(slots.remove(a), None);

        let b = slots.insert(3).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert_eq!(slots.get(a), None);
        assert_eq!(slots.get(b), Some(&3));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn alpha_mode_codes() {
        for m in [AlphaMode::NoModif, AlphaMode::Replace, AlphaMode::Combine] {
            assert_eq!(AlphaMode::from_code(m.code()), Some(m));
        }
        assert_eq!(AlphaMode::from_code(3), None);
    }
}
