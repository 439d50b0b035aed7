//! Per-stream codec state: queue formats, the quality control, and the
//! decoder's readiness gate.

use pixfmt::jpeg::{self as formats, Format, Queue, Subsampling};
use pixfmt::FourCc;

use super::encode::{self, MAX_DIMENSION, MIN_DIMENSION};
use super::header::{self, HeaderError};
use super::hw::Revision;
use super::{Job, JpegOp};
use crate::error::ConfigError;
use crate::job::Buffer;

/// Size assumed for a compressed buffer when the caller doesn't say.
pub const DEFAULT_COMPRESSED_SIZE: u32 = 4096;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Encode,
    Decode,
}

impl Mode {
    fn is_encode(self) -> bool {
        self == Mode::Encode
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FormatRequest {
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCc,
    /// Only meaningful for the compressed side; zero picks a default.
    pub size_image: u32,
}

/// Negotiated format of one queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct QueueData {
    pub format: &'static Format,
    pub width: u32,
    pub height: u32,
    pub size_image: u32,
}

/// Clamps `value` into `min..=max` and aligns it to `1 << align`, rounding to
/// nearest. If that lands below the request and there's room, it rounds up
/// instead.
pub fn bound_align(value: u32, min: u32, max: u32, align: u32) -> u32 {
    let mut v = value.max(min).min(max);
    if align > 0 {
        let step = 1 << align;
        v = (v + step / 2) & !(step - 1);
        if v < value && v + step <= max {
            v += step;
        }
    }
    v
}

/// Adjusts a request to what the codec supports in `mode` on `queue`.
pub fn try_format(
    mode: Mode,
    queue: Queue,
    req: &FormatRequest,
    rev: Revision,
) -> Result<QueueData, ConfigError> {
    let role = formats::role(mode.is_encode(), queue);
    let format = formats::find(req.fourcc, role, rev.format_flag())
        .ok_or(ConfigError::UnsupportedFormat(req.fourcc))?;

    if format.is_compressed() {
        let size_image = if req.size_image == 0 {
            DEFAULT_COMPRESSED_SIZE
        } else {
            req.size_image
        };
        return Ok(QueueData {
            format,
            width: req.width.max(MIN_DIMENSION).min(MAX_DIMENSION),
            height: req.height.max(MIN_DIMENSION).min(MAX_DIMENSION),
            size_image,
        });
    }

    let width =
        bound_align(req.width, MIN_DIMENSION, MAX_DIMENSION, format.h_align);
    let height =
        bound_align(req.height, MIN_DIMENSION, MAX_DIMENSION, format.v_align);
    Ok(QueueData {
        format,
        width,
        height,
        size_image: width * height * format.depth >> 3,
    })
}

/// Whether a new header changed anything.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SourceChange {
    Unchanged,
    /// Capture format updated to match.
    Applied,
    /// Capture is streaming; the update waits for it to stop.
    Deferred,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DecodeState {
    Running,
    ResolutionChange,
}

#[derive(Copy, Clone, Debug)]
pub struct Context {
    mode: Mode,
    rev: Revision,
    pub output: QueueData,
    pub capture: QueueData,
    pub quality: u8,
    /// Sampling of the last parsed source header.
    pub subsampling: Option<Subsampling>,
    hdr_parsed: bool,
    state: DecodeState,
}

impl Context {
    pub fn new(mode: Mode, rev: Revision, width: u32, height: u32) -> Self {
        let (out_cc, cap_cc) = match mode {
            Mode::Encode => (pixfmt::YUV420, pixfmt::JPEG),
            Mode::Decode => (pixfmt::JPEG, pixfmt::YUYV),
        };
        let data = |queue, fourcc| {
            let req = FormatRequest {
                width,
                height,
                fourcc,
                size_image: 0,
            };
            try_format(mode, queue, &req, rev)
                .expect("default format missing from table")
        };
        Context {
            mode,
            rev,
            output: data(Queue::Output, out_cc),
            capture: data(Queue::Capture, cap_cc),
            quality: encode::DEFAULT_QUALITY,
            subsampling: None,
            hdr_parsed: false,
            state: DecodeState::Running,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn revision(&self) -> Revision {
        self.rev
    }

    pub fn queue(&self, queue: Queue) -> &QueueData {
        match queue {
            Queue::Output => &self.output,
            Queue::Capture => &self.capture,
        }
    }

    pub fn apply_format(&mut self, queue: Queue, data: QueueData) {
        match queue {
            Queue::Output => self.output = data,
            Queue::Capture => self.capture = data,
        }
    }

    /// Compression quality, 1..=100.
    pub fn set_quality(&mut self, quality: u32) -> Result<(), ConfigError> {
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::OutOfRange(quality));
        }
        self.quality = quality as u8;
        Ok(())
    }

    /// Whether a job can be built now. The encoder always can; the decoder
    /// needs a parsed header and no pending resolution change.
    pub fn is_job_ready(&self) -> bool {
        match self.mode {
            Mode::Encode => true,
            Mode::Decode => {
                self.hdr_parsed && self.state != DecodeState::ResolutionChange
            }
        }
    }

    pub fn resolution_change_pending(&self) -> bool {
        self.state == DecodeState::ResolutionChange
    }

    /// Notes a newly queued source buffer. When decoding, its header is
    /// parsed and the capture side follows any change in geometry.
    pub fn queue_source(
        &mut self,
        data: &[u8],
        capture_streaming: bool,
    ) -> Result<SourceChange, HeaderError> {
        if self.mode.is_encode() {
            return Ok(SourceChange::Unchanged);
        }
        let parsed = header::parse(data)
            .and_then(|h| h.subsampling().map(|s| (h.width, h.height, s)));
        let (width, height, subsampling) = match parsed {
            Ok(p) => p,
            Err(e) => {
                self.hdr_parsed = false;
                return Err(e);
            }
        };
        self.hdr_parsed = true;
        self.subsampling = Some(subsampling);

        if (width, height) == (self.output.width, self.output.height) {
            return Ok(SourceChange::Unchanged);
        }
        self.output.width = width;
        self.output.height = height;
        if capture_streaming {
            self.state = DecodeState::ResolutionChange;
            Ok(SourceChange::Deferred)
        } else {
            self.follow_source();
            Ok(SourceChange::Applied)
        }
    }

    /// Capture streaming stopped: apply any deferred resolution change.
    pub fn capture_stream_off(&mut self) {
        if self.state == DecodeState::ResolutionChange {
            self.follow_source();
            self.state = DecodeState::Running;
        }
    }

    fn follow_source(&mut self) {
        let f = self.capture.format;
        let width =
            bound_align(self.output.width, MIN_DIMENSION, MAX_DIMENSION, f.h_align);
        let height =
            bound_align(self.output.height, MIN_DIMENSION, MAX_DIMENSION, f.v_align);
        self.capture.width = width;
        self.capture.height = height;
        self.capture.size_image = width * height * f.depth >> 3;
    }

    /// Stamps a job out of the negotiated state.
    pub fn job(&self, src: Buffer, dst: Buffer) -> Job {
        match self.mode {
            Mode::Encode => Job {
                op: JpegOp::Encode {
                    quality: self.quality,
                },
                width: self.output.width,
                height: self.output.height,
                subsampling: self
                    .output
                    .format
                    .subsampling
                    .unwrap_or(Subsampling::S420),
                src,
                dst,
            },
            Mode::Decode => Job {
                op: JpegOp::Decode,
                width: self.output.width,
                height: self.output.height,
                subsampling: self
                    .subsampling
                    .or(self.capture.format.subsampling)
                    .unwrap_or(Subsampling::S420),
                src,
                dst,
            },
        }
    }
}
