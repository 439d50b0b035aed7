//! Pixel format identifiers and the static capability tables for the
//! Chrom-Art (DMA2D) and JPEG accelerators.
//!
//! This crate is deliberately architecture-independent to allow for testing on
//! the host. Nothing in here is mutated at runtime.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod chromart;
pub mod jpeg;

use core::fmt;

/// A four-character code identifying a pixel format, packed little-endian the
/// way V4L2 packs them: the first character lands in the low byte.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

impl FourCc {
    pub const fn new(code: &[u8; 4]) -> Self {
        FourCc(
            code[0] as u32
                | (code[1] as u32) << 8
                | (code[2] as u32) << 16
                | (code[3] as u32) << 24,
        )
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let b = self.to_bytes();
        if b.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
            write!(
                f,
                "'{}{}{}{}'",
                b[0] as char, b[1] as char, b[2] as char, b[3] as char
            )
        } else {
            write!(f, "FourCc({:#010x})", self.0)
        }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// ARGB, 8 bits per channel, alpha in the top byte of a little-endian word.
pub const ARGB32: FourCc = FourCc::new(b"BA24");
/// Packed 24-bit RGB.
pub const RGB24: FourCc = FourCc::new(b"RGB3");
pub const RGB565: FourCc = FourCc::new(b"RGBP");
pub const ARGB555: FourCc = FourCc::new(b"AR15");
pub const ARGB444: FourCc = FourCc::new(b"AR12");

/// JFIF / baseline JPEG bitstream.
pub const JPEG: FourCc = FourCc::new(b"JPEG");
/// Three-plane 4:2:0 Y/Cb/Cr.
pub const YUV420: FourCc = FourCc::new(b"YU12");
/// Packed 4:2:2 Y0 Cb Y1 Cr.
pub const YUYV: FourCc = FourCc::new(b"YUYV");
/// Packed 4:4:4 Y Cb Cr.
pub const YUV24: FourCc = FourCc::new(b"YUV3");
pub const GREY: FourCc = FourCc::new(b"GREY");

/// Computes bytes per line for a packed format of `depth` bits per pixel.
pub fn bytes_per_line(width: u32, depth: u32) -> u32 {
    (width * depth) >> 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_packs_first_char_low() {
        assert_eq!(FourCc::new(b"RGBP").0, 0x5042_4752);
        assert_eq!(RGB565.to_bytes(), *b"RGBP");
    }

    #[test]
    fn fourcc_debug_is_readable() {
        assert_eq!(format!("{:?}", JPEG), "'JPEG'");
        assert_eq!(format!("{:?}", FourCc(0x0102_0304)), "FourCc(0x01020304)");
    }

    #[test]
    fn packed_line_lengths() {
        assert_eq!(bytes_per_line(240, 32), 960);
        assert_eq!(bytes_per_line(240, 24), 720);
        assert_eq!(bytes_per_line(240, 16), 480);
    }
}
