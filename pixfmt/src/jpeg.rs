//! Formats understood by the JPEG codec core.
//!
//! Unlike the Chrom-Art, a format here is only meaningful in combination with
//! a role: raw formats are what the encoder consumes and the decoder produces,
//! and the compressed format is the reverse.

use crate::FourCc;

/// Role flags. A format may appear in several roles.
pub const ENC_CAPTURE: u32 = 1 << 0;
pub const ENC_OUTPUT: u32 = 1 << 1;
pub const DEC_CAPTURE: u32 = 1 << 2;
pub const DEC_OUTPUT: u32 = 1 << 3;
/// Variant flags: which silicon revisions carry the format.
pub const REV_H7: u32 = 1 << 4;
pub const REV_F7: u32 = 1 << 5;

const RAW: u32 = ENC_OUTPUT | DEC_CAPTURE | REV_H7 | REV_F7;

/// Chroma subsampling of a raw format or a compressed stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Subsampling {
    S444,
    S422,
    S420,
    Gray,
}

impl Subsampling {
    /// MCU width and height in pixels.
    pub fn mcu(self) -> (u32, u32) {
        match self {
            Subsampling::S420 => (16, 16),
            Subsampling::S422 => (16, 8),
            Subsampling::S444 | Subsampling::Gray => (8, 8),
        }
    }

    /// Number of color components.
    pub fn components(self) -> u32 {
        match self {
            Subsampling::Gray => 1,
            _ => 3,
        }
    }
}

/// Which buffer queue a format request is for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Queue {
    /// Data flowing into the codec.
    Output,
    /// Data flowing out of the codec.
    Capture,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Format {
    pub name: &'static str,
    pub fourcc: FourCc,
    /// `None` for the compressed format.
    pub subsampling: Option<Subsampling>,
    /// Width alignment, as a power of two.
    pub h_align: u32,
    /// Height alignment, as a power of two.
    pub v_align: u32,
    pub depth: u32,
    pub planes: u32,
    pub flags: u32,
}

impl Format {
    pub fn is_compressed(&self) -> bool {
        self.subsampling.is_none()
    }
}

pub static FORMATS: [Format; 5] = [
    Format {
        name: "JPEG",
        fourcc: crate::JPEG,
        subsampling: None,
        h_align: 0,
        v_align: 0,
        depth: 0,
        planes: 1,
        flags: ENC_CAPTURE | DEC_OUTPUT | REV_H7 | REV_F7,
    },
    Format {
        name: "YUV420",
        fourcc: crate::YUV420,
        subsampling: Some(Subsampling::S420),
        h_align: 1,
        v_align: 1,
        depth: 12,
        planes: 3,
        flags: RAW,
    },
    Format {
        name: "YUV422",
        fourcc: crate::YUYV,
        subsampling: Some(Subsampling::S422),
        h_align: 2,
        v_align: 0,
        depth: 16,
        planes: 1,
        flags: RAW,
    },
    Format {
        name: "YUV444",
        fourcc: crate::YUV24,
        subsampling: Some(Subsampling::S444),
        h_align: 0,
        v_align: 0,
        depth: 24,
        planes: 1,
        flags: RAW,
    },
    Format {
        name: "Gray",
        fourcc: crate::GREY,
        subsampling: Some(Subsampling::Gray),
        h_align: 0,
        v_align: 0,
        depth: 8,
        planes: 1,
        flags: RAW,
    },
];

/// Role flag for a queue in encode or decode mode.
pub fn role(encode: bool, queue: Queue) -> u32 {
    match (encode, queue) {
        (true, Queue::Output) => ENC_OUTPUT,
        (true, Queue::Capture) => ENC_CAPTURE,
        (false, Queue::Output) => DEC_OUTPUT,
        (false, Queue::Capture) => DEC_CAPTURE,
    }
}

/// Finds `fourcc` if it's legal in role `role` on a revision carrying
/// `rev_flag`.
pub fn find(fourcc: FourCc, role: u32, rev_flag: u32) -> Option<&'static Format> {
    FORMATS
        .iter()
        .find(|f| f.fourcc == fourcc && f.flags & role != 0 && f.flags & rev_flag != 0)
}

/// Returns the `index`th format legal in `role`, counting only matching rows.
pub fn nth(index: usize, role: u32, rev_flag: u32) -> Option<&'static Format> {
    FORMATS
        .iter()
        .filter(|f| f.flags & role != 0 && f.flags & rev_flag != 0)
        .nth(index)
}

/// Finds the raw format carrying subsampling `s`.
pub fn raw_for(s: Subsampling) -> Option<&'static Format> {
    FORMATS.iter().find(|f| f.subsampling == Some(s))
}
