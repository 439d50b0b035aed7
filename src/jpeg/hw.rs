//! JPEG codec register map (STM32F7/H7).

use crate::regs::Field;

pub const CONFR0: usize = 0x00;
pub const CONFR1: usize = 0x04;
pub const CONFR2: usize = 0x08;
pub const CONFR3: usize = 0x0c;
/// Per-component configuration, CONFR4 through CONFR7.
pub const CONFRX: [usize; 4] = [0x10, 0x14, 0x18, 0x1c];
pub const CR: usize = 0x30;
pub const SR: usize = 0x34;
pub const CFR: usize = 0x38;
/// Quantization table memories, 64 bytes each.
pub const QMEM: [usize; 4] = [0x50, 0x90, 0xd0, 0x110];

/// Extent of the block we touch.
pub const SIZE: usize = 0x150;

/// CONFR0: start the codec.
pub const START: u32 = 1 << 0;

pub const YSIZE: Field = Field::new(16, 16);
/// Number of components in the scan, minus one.
pub const NS: Field = Field::new(6, 2);
pub const COLSPACE: Field = Field::new(4, 2);
/// Number of color components, minus one.
pub const NF: Field = Field::new(0, 2);
/// Number of MCUs, minus one.
pub const NMCU: Field = Field::new(0, 26);
pub const XSIZE: Field = Field::new(16, 16);

pub const HSF: Field = Field::new(12, 4);
pub const VSF: Field = Field::new(8, 4);
/// Data units per MCU for the component, minus one.
pub const NB: Field = Field::new(4, 4);
/// Quantization table selector.
pub const QT: Field = Field::new(2, 2);

bitflags::bitflags! {
    /// Flag bits of CONFR1.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Confr1: u32 {
        /// Header processing: generate when encoding, parse when decoding.
        const HDR = 1 << 8;
        const DE = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Flag bits of CONFR4..7: Huffman AC/DC table selection.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct ConfrX: u32 {
        const HA = 1 << 1;
        const HD = 1 << 0;
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Cr: u32 {
        const JCEN = 1 << 0;
        const IFTIE = 1 << 1;
        const IFNFIE = 1 << 2;
        const OFTIE = 1 << 3;
        const OFNEIE = 1 << 4;
        const EOCIE = 1 << 5;
        const HPDIE = 1 << 6;
        /// Input FIFO flush.
        const IFF = 1 << 13;
        /// Output FIFO flush.
        const OFF = 1 << 14;
    }
}

impl Cr {
    pub const ALL_IRQS: Cr = Cr::IFTIE
        .union(Cr::IFNFIE)
        .union(Cr::OFTIE)
        .union(Cr::OFNEIE)
        .union(Cr::EOCIE)
        .union(Cr::HPDIE);
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Sr: u32 {
        const IFTF = 1 << 1;
        const IFNFF = 1 << 2;
        const OFTF = 1 << 3;
        const OFNEF = 1 << 4;
        /// End of conversion.
        const EOCF = 1 << 5;
        /// Header parsing done.
        const HPDF = 1 << 6;
        /// Conversion ongoing.
        const COF = 1 << 7;
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Cfr: u32 {
        const CEOCF = 1 << 5;
        const CHPDF = 1 << 6;
    }
}

/// Color space codes for COLSPACE.
pub const COLSPACE_GRAY: u32 = 0;
pub const COLSPACE_YCBCR: u32 = 1;

/// Which silicon the codec sits in. The format table differs slightly.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Revision {
    F7,
    H7,
}

impl Revision {
    pub fn format_flag(self) -> u32 {
        match self {
            Revision::F7 => pixfmt::jpeg::REV_F7,
            Revision::H7 => pixfmt::jpeg::REV_H7,
        }
    }
}
