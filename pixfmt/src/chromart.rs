//! Formats understood by the Chrom-Art accelerator.
//!
//! The hardware identifies pixel encodings with a small color-mode code. The
//! output converter understands codes 0 through 4; the input layers
//! additionally accept the CLUT and alpha-only modes 5 through 10, none of which
//! are exposed here because they need a CLUT load we don't do.

use crate::FourCc;

/// Hardware color-mode codes, as written to the `CM` fields of `FGPFCCR`,
/// `BGPFCCR` and `OPFCCR`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColorMode {
    Argb8888 = 0x00,
    Rgb888 = 0x01,
    Rgb565 = 0x02,
    Argb1555 = 0x03,
    Argb4444 = 0x04,
    L8 = 0x05,
    Al44 = 0x06,
    Al88 = 0x07,
    L4 = 0x08,
    A8 = 0x09,
    A4 = 0x0a,
}

impl ColorMode {
    /// Highest code the output converter accepts.
    pub const MAX_OUTPUT: u32 = ColorMode::Argb4444 as u32;
    /// Highest code the input layers accept.
    pub const MAX_INPUT: u32 = ColorMode::A4 as u32;

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn usable_as_output(self) -> bool {
        self.code() <= Self::MAX_OUTPUT
    }

    pub fn usable_as_input(self) -> bool {
        self.code() <= Self::MAX_INPUT
    }
}

/// Which side of a transfer a format is requested for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Foreground or background layer being read.
    Input,
    /// Destination surface being written.
    Output,
}

/// One row of the capability table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Format {
    pub fourcc: FourCc,
    pub mode: ColorMode,
    /// Bits per pixel.
    pub depth: u32,
    pub planes: u32,
}

impl Format {
    pub fn supports(&self, dir: Direction) -> bool {
        match dir {
            Direction::Input => self.mode.usable_as_input(),
            Direction::Output => self.mode.usable_as_output(),
        }
    }
}

pub static FORMATS: [Format; 5] = [
    Format {
        fourcc: crate::ARGB32,
        mode: ColorMode::Argb8888,
        depth: 32,
        planes: 1,
    },
    Format {
        fourcc: crate::RGB24,
        mode: ColorMode::Rgb888,
        depth: 24,
        planes: 1,
    },
    Format {
        fourcc: crate::RGB565,
        mode: ColorMode::Rgb565,
        depth: 16,
        planes: 1,
    },
    Format {
        fourcc: crate::ARGB555,
        mode: ColorMode::Argb1555,
        depth: 16,
        planes: 1,
    },
    Format {
        fourcc: crate::ARGB444,
        mode: ColorMode::Argb4444,
        depth: 16,
        planes: 1,
    },
];

/// Looks up `fourcc` in the table. Returns `None` for anything the hardware
/// can't represent.
pub fn find(fourcc: FourCc) -> Option<&'static Format> {
    FORMATS.iter().find(|f| f.fourcc == fourcc)
}

/// Like `find`, but also requires the format be usable in direction `dir`.
pub fn find_for(fourcc: FourCc, dir: Direction) -> Option<&'static Format> {
    find(fourcc).filter(|f| f.supports(dir))
}

/// Returns the `index`th format in table order, for enumeration.
pub fn nth(index: usize) -> Option<&'static Format> {
    FORMATS.get(index)
}
