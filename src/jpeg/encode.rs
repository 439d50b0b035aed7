//! Codec configuration: the CONFR registers and quantization tables.

use pixfmt::jpeg::Subsampling;

use super::hw::{self, Confr1, ConfrX};
use crate::error::ConfigError;
use crate::regs::RegisterBlock;

pub const MIN_DIMENSION: u32 = 32;
pub const MAX_DIMENSION: u32 = 2592;

/// Quality used by a new encoder context.
pub const DEFAULT_QUALITY: u8 = 90;

/// Rejects geometry outside what the codec handles.
pub fn check_bounds(width: u32, height: u32) -> Result<(), ConfigError> {
    let range = MIN_DIMENSION..=MAX_DIMENSION;
    if range.contains(&width) && range.contains(&height) {
        Ok(())
    } else {
        Err(ConfigError::Geometry { width, height })
    }
}

/// MCUs needed to cover a `width` x `height` image.
pub fn mcu_count(width: u32, height: u32, s: Subsampling) -> u32 {
    let (mw, mh) = s.mcu();
    ((width + mw - 1) / mw) * ((height + mh - 1) / mh)
}

/// Bytes of marker segments around the entropy-coded data of a baseline
/// stream: SOI, one DQT and one DC/AC pair of DHT per table set, SOF0, SOS
/// and EOI. No encode into a smaller buffer can succeed.
pub fn stream_overhead(s: Subsampling) -> u32 {
    let nf = s.components();
    let sets = if nf == 1 { 1 } else { 2 };
    let dqt = 2 + 2 + 1 + 64;
    let dht = (2 + 2 + 1 + 16 + 12) + (2 + 2 + 1 + 16 + 162);
    let sof = 2 + 2 + 1 + 2 + 2 + 1 + 3 * nf;
    let sos = 2 + 2 + 1 + 2 * nf + 3;
    2 + sets * (dqt + dht) + sof + sos + 2
}

/// Baseline luminance table (ITU T.81 Annex K), natural order.
static LUMA_QUANT: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99, //
];

/// Baseline chrominance table, natural order.
static CHROMA_QUANT: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, //
    18, 21, 26, 66, 99, 99, 99, 99, //
    24, 26, 56, 99, 99, 99, 99, 99, //
    47, 66, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
    99, 99, 99, 99, 99, 99, 99, 99, //
];

/// Natural-order index of each zigzag position. QMEM is loaded in zigzag
/// order.
static ZIGZAG: [u8; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, 27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63, //
];

/// Scales a base table to `quality` (1..=100) the usual IJG way: 50 is the
/// base table, lower is coarser, 100 is all ones.
pub fn scale_quant(base: &[u8; 64], quality: u8) -> [u8; 64] {
    let q = u32::from(quality.max(1).min(100));
    let scale = if q < 50 { 5000 / q } else { 200 - 2 * q };
    let mut out = [0; 64];
    for (o, &b) in out.iter_mut().zip(base.iter()) {
        let v = (u32::from(b) * scale + 50) / 100;
        *o = v.max(1).min(255) as u8;
    }
    out
}

/// Everything the encoder registers need for one image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodePlan {
    pub confr1: u32,
    pub confr2: u32,
    pub confr3: u32,
    pub confrx: [u32; 4],
    /// Tables for QMEM0, QMEM1, ...; only the first `tables` are loaded.
    pub quant: [[u8; 64]; 2],
    pub tables: usize,
}

fn component(nb: u32, hsf: u32, vsf: u32, qt: u32, huff: ConfrX) -> u32 {
    hw::NB.encode(nb)
        | hw::HSF.encode(hsf)
        | hw::VSF.encode(vsf)
        | hw::QT.encode(qt)
        | huff.bits()
}

/// Computes the encoder configuration. No hardware access.
pub fn plan(
    width: u32,
    height: u32,
    s: Subsampling,
    quality: u8,
) -> Result<EncodePlan, ConfigError> {
    check_bounds(width, height)?;
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::OutOfRange(u32::from(quality)));
    }

    let nf = s.components() - 1;
    let colspace = if s == Subsampling::Gray {
        hw::COLSPACE_GRAY
    } else {
        hw::COLSPACE_YCBCR
    };
    let confr1 = hw::NF.encode(nf)
        | hw::COLSPACE.encode(colspace)
        | hw::NS.encode(nf)
        | hw::YSIZE.encode(height)
        | Confr1::HDR.bits();

    // Luma: blocks and sampling factors follow the MCU shape.
    let luma = match s {
        Subsampling::S420 => component(3, 2, 2, 0, ConfrX::empty()),
        Subsampling::S422 => component(1, 2, 1, 0, ConfrX::empty()),
        Subsampling::S444 | Subsampling::Gray => {
            component(0, 1, 1, 0, ConfrX::empty())
        }
    };
    let chroma = component(0, 1, 1, 1, ConfrX::HA | ConfrX::HD);
    let confrx = if s == Subsampling::Gray {
        [luma, 0, 0, 0]
    } else {
        [luma, chroma, chroma, 0]
    };

    Ok(EncodePlan {
        confr1,
        confr2: hw::NMCU.encode(mcu_count(width, height, s) - 1),
        confr3: hw::XSIZE.encode(width),
        confrx,
        quant: [
            scale_quant(&LUMA_QUANT, quality),
            scale_quant(&CHROMA_QUANT, quality),
        ],
        tables: if s == Subsampling::Gray { 1 } else { 2 },
    })
}

fn load_quant<R: RegisterBlock>(regs: &R, base: usize, table: &[u8; 64]) {
    for (word, zz) in ZIGZAG.chunks(4).enumerate() {
        let v = zz
            .iter()
            .enumerate()
            .fold(0, |v, (i, &n)| v | u32::from(table[usize::from(n)]) << (8 * i));
        regs.write(base + 4 * word, v);
    }
}

pub fn program<R: RegisterBlock>(plan: &EncodePlan, regs: &R) {
    regs.write(hw::CONFR1, plan.confr1);
    regs.write(hw::CONFR2, plan.confr2);
    regs.write(hw::CONFR3, plan.confr3);
    for (&off, &v) in hw::CONFRX.iter().zip(plan.confrx.iter()) {
        regs.write(off, v);
    }
    for (&off, table) in hw::QMEM.iter().zip(&plan.quant[..plan.tables]) {
        load_quant(regs, off, table);
    }
}

/// Decoding takes its configuration from the stream header, so there is only
/// the mode to set.
pub fn program_decode<R: RegisterBlock>(regs: &R) {
    regs.write(hw::CONFR1, (Confr1::DE | Confr1::HDR).bits());
}
