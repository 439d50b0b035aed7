//! Chrom-Art register maps.
//!
//! Two revisions of the block exist with incompatible field widths in a few
//! places. Rather than pick one at compile time, the driver takes a `&Layout`
//! at attach and everything downstream reads offsets and field positions out
//! of it.

use crate::regs::Field;

/// Offsets and field positions of one Chrom-Art revision.
#[derive(Debug)]
pub struct Layout {
    pub name: &'static str,

    pub cr: usize,
    pub isr: usize,
    pub ifcr: usize,
    pub fgmar: usize,
    pub fgor: usize,
    pub bgmar: usize,
    pub bgor: usize,
    pub fgpfccr: usize,
    pub fgcolr: usize,
    pub bgpfccr: usize,
    pub bgcolr: usize,
    pub opfccr: usize,
    pub ocolr: usize,
    pub omar: usize,
    pub oor: usize,
    pub nlr: usize,

    /// Operating mode in CR.
    pub mode: Field,
    /// Line offset in FGOR/BGOR/OOR.
    pub line_offset: Field,
    /// Pixels per line in NLR.
    pub pixels_per_line: Field,
    /// Number of lines in NLR.
    pub lines: Field,
    /// Color mode in the PFC control registers.
    pub color_mode: Field,
    /// Alpha mode in FGPFCCR/BGPFCCR.
    pub alpha_mode: Field,
    /// Constant alpha in FGPFCCR/BGPFCCR.
    pub alpha: Field,

    /// Bits of ISR/IFCR that mean something.
    pub irq_flags: u32,
}

/// STM32F42x/F7 revision.
pub static CHROM_ART: Layout = F4_MAP;

/// STM32H7/MP1 revision: wider mode field and line offsets.
pub static CHROM_ART_V2: Layout = Layout {
    name: "chrom-art-v2",
    mode: Field::new(16, 3),
    line_offset: Field::new(0, 16),
    ..F4_MAP
};

const F4_MAP: Layout = Layout {
    name: "chrom-art",

    cr: 0x00,
    isr: 0x04,
    ifcr: 0x08,
    fgmar: 0x0c,
    fgor: 0x10,
    bgmar: 0x14,
    bgor: 0x18,
    fgpfccr: 0x1c,
    fgcolr: 0x20,
    bgpfccr: 0x24,
    bgcolr: 0x28,
    opfccr: 0x34,
    ocolr: 0x38,
    omar: 0x3c,
    oor: 0x40,
    nlr: 0x44,

    mode: Field::new(16, 2),
    line_offset: Field::new(0, 14),
    pixels_per_line: Field::new(16, 14),
    lines: Field::new(0, 16),
    color_mode: Field::new(0, 4),
    alpha_mode: Field::new(16, 2),
    alpha: Field::new(24, 8),

    irq_flags: 0x3f,
};

bitflags::bitflags! {
    /// DMA2D_CR control bits (the mode field is handled through `Layout`).
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Cr: u32 {
        const START = 1 << 0;
        const SUSP = 1 << 1;
        const ABORT = 1 << 2;
        const TEIE = 1 << 8;
        const TCIE = 1 << 9;
        const TWIE = 1 << 10;
        const CAEIE = 1 << 11;
        const CTCIE = 1 << 12;
        const CEIE = 1 << 13;
    }
}

impl Cr {
    /// Interrupts enabled for every job. Transfer watermark is left off; we
    /// never program a watermark line.
    pub const JOB_IRQS: Cr = Cr::TEIE
        .union(Cr::TCIE)
        .union(Cr::CAEIE)
        .union(Cr::CTCIE)
        .union(Cr::CEIE);
}

bitflags::bitflags! {
    /// DMA2D_ISR flags, and the matching DMA2D_IFCR clear bits.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Isr: u32 {
        /// Transfer error.
        const TE = 1 << 0;
        /// Transfer complete.
        const TC = 1 << 1;
        /// Transfer watermark.
        const TW = 1 << 2;
        /// CLUT access error.
        const CAE = 1 << 3;
        /// CLUT transfer complete.
        const CTC = 1 << 4;
        /// Configuration error.
        const CE = 1 << 5;
    }
}
