//! Just enough of a JPEG marker walker to learn an image's geometry before
//! the codec sees it.

use arrayvec::ArrayVec;
use core::fmt;
use pixfmt::jpeg::Subsampling;

const SOI: u8 = 0xd8;
const EOI: u8 = 0xd9;
const SOS: u8 = 0xda;
const TEM: u8 = 0x01;
/// Baseline and extended sequential frames, the two the codec decodes.
const SOF0: u8 = 0xc0;
const SOF1: u8 = 0xc1;
/// The only sample precision the codec handles.
const PRECISION: u8 = 8;

/// One entry of the frame header's component list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Component {
    pub id: u8,
    pub h: u8,
    pub v: u8,
    pub table: u8,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub components: ArrayVec<[Component; 4]>,
}

impl Header {
    /// Maps the sampling factors onto the layouts the codec understands.
    pub fn subsampling(&self) -> Result<Subsampling, HeaderError> {
        match &self.components[..] {
            [_] => Ok(Subsampling::Gray),
            [y, cb, cr] => {
                if (cb.h, cb.v) != (1, 1) || (cr.h, cr.v) != (1, 1) {
                    return Err(HeaderError::Sampling);
                }
                match (y.h, y.v) {
                    (1, 1) => Ok(Subsampling::S444),
                    (2, 1) => Ok(Subsampling::S422),
                    (2, 2) => Ok(Subsampling::S420),
                    _ => Err(HeaderError::Sampling),
                }
            }
            _ => Err(HeaderError::Sampling),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HeaderError {
    /// Data doesn't start with a start-of-image marker.
    NotJpeg,
    Truncated,
    /// Hit the scan or end of image without seeing a frame header.
    NoFrame,
    /// A frame the codec can't decode: progressive, lossless, arithmetic
    /// or not 8-bit. Carries the SOF marker.
    UnsupportedFrame(u8),
    BadComponents(u8),
    /// Height deferred to a DNL marker, or zero width.
    Geometry,
    Sampling,
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeaderError::NotJpeg => f.write_str("missing SOI marker"),
            HeaderError::Truncated => f.write_str("truncated header"),
            HeaderError::NoFrame => f.write_str("no frame header before scan"),
            HeaderError::UnsupportedFrame(m) => {
                write!(f, "unsupported frame type SOF{}", m & 0xf)
            }
            HeaderError::BadComponents(n) => write!(f, "{} components", n),
            HeaderError::Geometry => f.write_str("bad frame dimensions"),
            HeaderError::Sampling => f.write_str("unsupported sampling factors"),
        }
    }
}

fn be16(bytes: &[u8], at: usize) -> Result<u16, HeaderError> {
    match bytes.get(at..at + 2) {
        Some(b) => Ok(u16::from(b[0]) << 8 | u16::from(b[1])),
        None => Err(HeaderError::Truncated),
    }
}

fn parse_frame(seg: &[u8], marker: u8) -> Result<Header, HeaderError> {
    if seg.len() < 6 {
        return Err(HeaderError::Truncated);
    }
    if seg[0] != PRECISION {
        return Err(HeaderError::UnsupportedFrame(marker));
    }
    let height = be16(seg, 1)?;
    let width = be16(seg, 3)?;
    let count = seg[5];
    if height == 0 || width == 0 {
        return Err(HeaderError::Geometry);
    }
    if count == 0 || count > 4 {
        return Err(HeaderError::BadComponents(count));
    }
    let list = seg
        .get(6..6 + 3 * usize::from(count))
        .ok_or(HeaderError::Truncated)?;

    let mut components = ArrayVec::new();
    for c in list.chunks(3) {
        components.push(Component {
            id: c[0],
            h: c[1] >> 4,
            v: c[1] & 0xf,
            table: c[2],
        });
    }
    Ok(Header {
        width: u32::from(width),
        height: u32::from(height),
        components,
    })
}

/// Walks markers from SOI up to the first frame header and decodes it.
pub fn parse(data: &[u8]) -> Result<Header, HeaderError> {
    if data.get(..2) != Some(&[0xff, SOI][..]) {
        return Err(HeaderError::NotJpeg);
    }
    let mut pos = 2;
    loop {
        // Markers may be preceded by any number of 0xFF fill bytes.
        if data.get(pos) != Some(&0xff) {
            return Err(HeaderError::Truncated);
        }
        while data.get(pos) == Some(&0xff) {
            pos += 1;
        }
        let marker = *data.get(pos).ok_or(HeaderError::Truncated)?;
        pos += 1;

        match marker {
            TEM | 0xd0..=0xd7 => continue,
            EOI | SOS => return Err(HeaderError::NoFrame),
            _ => (),
        }

        let len = usize::from(be16(data, pos)?);
        if len < 2 {
            return Err(HeaderError::Truncated);
        }
        let seg = data.get(pos + 2..pos + len).ok_or(HeaderError::Truncated)?;

        match marker {
            SOF0 | SOF1 => return parse_frame(seg, marker),
            // DHT, JPG and DAC share the SOF range without being frames.
            0xc4 | 0xc8 | 0xcc => (),
            0xc2..=0xcf => return Err(HeaderError::UnsupportedFrame(marker)),
            _ => (),
        }
        pos += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, an APP0 segment, a DQT stub, then an 8-bit frame header with
    /// the given components, then SOS.
    fn image(sof: u8, w: u16, h: u16, comps: &[(u8, u8)]) -> Vec<u8> {
        image_with_precision(sof, 8, w, h, comps)
    }

    fn image_with_precision(
        sof: u8,
        precision: u8,
        w: u16,
        h: u16,
        comps: &[(u8, u8)],
    ) -> Vec<u8> {
        let mut v = vec![0xff, SOI];
        v.extend_from_slice(&[0xff, 0xe0, 0, 6, b'J', b'F', b'I', b'F']);
        v.extend_from_slice(&[0xff, 0xdb, 0, 3, 0]);
        v.extend_from_slice(&[0xff, 0xff, sof]);
        let len = 8 + 3 * comps.len() as u16;
        v.extend_from_slice(&len.to_be_bytes());
        v.push(precision);
        v.extend_from_slice(&h.to_be_bytes());
        v.extend_from_slice(&w.to_be_bytes());
        v.push(comps.len() as u8);
        for (i, &(hv, t)) in comps.iter().enumerate() {
            v.extend_from_slice(&[i as u8 + 1, hv, t]);
        }
        v.extend_from_slice(&[0xff, SOS, 0, 2]);
        v
    }

    #[test]
    fn baseline_420() {
        let data = image(0xc0, 640, 480, &[(0x22, 0), (0x11, 1), (0x11, 1)]);
        let h = parse(&data).unwrap();
        assert_eq!((h.width, h.height), (640, 480));
        assert_eq!(h.components.len(), 3);
        assert_eq!(h.components[0].h, 2);
        assert_eq!(h.subsampling(), Ok(Subsampling::S420));
    }

    #[test]
    fn sampling_variants() {
        let s = |y| {
            parse(&image(0xc0, 64, 64, &[(y, 0), (0x11, 1), (0x11, 1)]))
                .unwrap()
                .subsampling()
        };
        assert_eq!(s(0x11), Ok(Subsampling::S444));
        assert_eq!(s(0x21), Ok(Subsampling::S422));
        assert_eq!(s(0x12), Err(HeaderError::Sampling));

        let gray = parse(&image(0xc0, 64, 64, &[(0x11, 0)])).unwrap();
        assert_eq!(gray.subsampling(), Ok(Subsampling::Gray));
    }

    #[test]
    fn only_8_bit_sequential_frames_accepted() {
        let data = image(0xc2, 100, 50, &[(0x11, 0)]);
        assert_eq!(parse(&data), Err(HeaderError::UnsupportedFrame(0xc2)));

        let data = image_with_precision(0xc2, 12, 100, 50, &[(0x11, 0)]);
        assert_eq!(parse(&data), Err(HeaderError::UnsupportedFrame(0xc2)));
        let data = image_with_precision(0xc1, 12, 100, 50, &[(0x11, 0)]);
        assert_eq!(parse(&data), Err(HeaderError::UnsupportedFrame(0xc1)));
        let data = image_with_precision(0xc0, 12, 100, 50, &[(0x11, 0)]);
        assert_eq!(parse(&data), Err(HeaderError::UnsupportedFrame(0xc0)));

        let data = image(0xc1, 100, 50, &[(0x11, 0)]);
        assert_eq!(parse(&data).unwrap().width, 100);
    }

    #[test]
    fn rejects() {
        assert_eq!(parse(&[0x89, b'P']), Err(HeaderError::NotJpeg));
        assert_eq!(parse(&[0xff, SOI]), Err(HeaderError::Truncated));
        assert_eq!(
            parse(&[0xff, SOI, 0xff, SOS, 0, 2]),
            Err(HeaderError::NoFrame)
        );
        assert_eq!(
            parse(&image(0xc3, 64, 64, &[(0x11, 0)])),
            Err(HeaderError::UnsupportedFrame(0xc3))
        );
        assert_eq!(
            parse(&image(0xc0, 64, 0, &[(0x11, 0)])),
            Err(HeaderError::Geometry)
        );
        let mut short = image(0xc0, 64, 64, &[(0x22, 0), (0x11, 1), (0x11, 1)]);
        short.truncate(30);
        assert_eq!(parse(&short), Err(HeaderError::Truncated));
    }

    #[test]
    fn huffman_tables_are_not_frames() {
        let mut data = vec![0xff, SOI, 0xff, 0xc4, 0, 3, 0];
        data.extend_from_slice(&image(0xc0, 32, 32, &[(0x11, 0)])[2..]);
        assert_eq!(parse(&data).unwrap().width, 32);
    }
}
