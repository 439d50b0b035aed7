//! Negotiated per-stream state: formats on each queue and the layer
//! constants. Jobs are stamped out of this by `Context::job`.

use pixfmt::chromart::{self, Direction, Format};
use pixfmt::FourCc;

use super::encode::Op;
use super::layout::Layout;
use super::Job;
use crate::error::ConfigError;
use crate::job::{AlphaMode, Argb, Buffer, Surface};

/// The two buffer queues of a mem2mem stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Queue {
    /// Source images, read by the foreground layer.
    Output,
    /// Destination images.
    Capture,
}

impl Queue {
    fn direction(self) -> Direction {
        match self {
            Queue::Output => Direction::Input,
            Queue::Capture => Direction::Output,
        }
    }
}

/// What a caller asks for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FormatRequest {
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCc,
}

/// What the hardware will actually do with a `FormatRequest`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Adjusted {
    pub width: u32,
    pub height: u32,
    pub format: &'static Format,
    pub bytes_per_line: u32,
    pub size_image: u32,
}

/// Geometry and format of one queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: &'static Format,
    pub line_offset: u32,
    pub size: u32,
}

impl Frame {
    fn new(width: u32, height: u32, format: &'static Format) -> Self {
        Frame {
            width,
            height,
            format,
            line_offset: 0,
            size: pixfmt::bytes_per_line(width, format.depth) * height,
        }
    }

    fn surface(&self, color: Argb, alpha_mode: AlphaMode) -> Surface {
        Surface {
            width: self.width,
            height: self.height,
            line_offset: self.line_offset,
            format: self.format.fourcc,
            color,
            alpha_mode,
        }
    }
}

/// Clamps a request to what `layout` can express.
///
/// Unknown formats are an error; out-of-range sizes are pulled into range, so
/// a caller can probe with e.g. `u32::MAX` to learn the limits.
pub fn try_format(
    req: &FormatRequest,
    queue: Queue,
    layout: &Layout,
) -> Result<Adjusted, ConfigError> {
    let format = chromart::find_for(req.fourcc, queue.direction())
        .ok_or(ConfigError::UnsupportedFormat(req.fourcc))?;
    let width = req.width.max(1).min(layout.pixels_per_line.max());
    let height = req.height.max(1).min(layout.lines.max());
    let bytes_per_line = pixfmt::bytes_per_line(width, format.depth);
    Ok(Adjusted {
        width,
        height,
        format,
        bytes_per_line,
        size_image: bytes_per_line * height,
    })
}

/// Runtime controls.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Control {
    /// Constant alpha applied to the foreground layer, 0..=255.
    AlphaComponent(u32),
    /// Operation used for subsequent jobs.
    Op(Op),
    /// Color written by `Op::Fill`.
    FillColor(Argb),
    /// Background layer constant color and alpha.
    BackgroundColor(Argb),
    BackgroundAlphaMode(AlphaMode),
    ForegroundAlphaMode(AlphaMode),
}

/// One stream's negotiated state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
    pub input: Frame,
    pub output: Frame,
    pub op: Op,
    pub fg_color: Argb,
    pub fg_alpha_mode: AlphaMode,
    pub bg_color: Argb,
    pub bg_alpha_mode: AlphaMode,
    pub fill_color: Argb,
}

const OPAQUE_BLACK: Argb = Argb::new(0xff, 0, 0, 0);

impl Context {
    /// Both queues start out `width` x `height` ARGB8888, converting.
    pub fn new(width: u32, height: u32) -> Self {
        let argb = &chromart::FORMATS[0];
        let frame = Frame::new(width, height, argb);
        Context {
            input: frame,
            output: frame,
            op: Op::Convert,
            fg_color: OPAQUE_BLACK,
            fg_alpha_mode: AlphaMode::Replace,
            bg_color: OPAQUE_BLACK,
            bg_alpha_mode: AlphaMode::NoModif,
            fill_color: OPAQUE_BLACK,
        }
    }

    pub fn frame(&self, queue: Queue) -> &Frame {
        match queue {
            Queue::Output => &self.input,
            Queue::Capture => &self.output,
        }
    }

    /// Applies an already-adjusted format to `queue`. Offsets, alpha modes and
    /// the operation go back to their defaults.
    pub fn apply_format(&mut self, queue: Queue, adj: &Adjusted) {
        let frame = match queue {
            Queue::Output => &mut self.input,
            Queue::Capture => &mut self.output,
        };
        *frame = Frame::new(adj.width, adj.height, adj.format);
        frame.size = adj.size_image;
        self.fg_alpha_mode = AlphaMode::Replace;
        self.bg_alpha_mode = AlphaMode::NoModif;
        self.op = Op::Convert;
    }

    pub fn apply_control(&mut self, control: Control) -> Result<(), ConfigError> {
        match control {
            Control::AlphaComponent(a) => {
                if a > 0xff {
                    return Err(ConfigError::OutOfRange(a));
                }
                self.fg_color.a = a as u8;
            }
            Control::Op(op) => self.op = op,
            Control::FillColor(c) => self.fill_color = c,
            Control::BackgroundColor(c) => self.bg_color = c,
            Control::BackgroundAlphaMode(m) => self.bg_alpha_mode = m,
            Control::ForegroundAlphaMode(m) => self.fg_alpha_mode = m,
        }
        Ok(())
    }

    /// Builds a job over the given buffers from the current state. The
    /// background layer, when used, shares the input geometry and format.
    pub fn job(&self, src: Buffer, bg: Option<Buffer>, dst: Buffer) -> Job {
        Job {
            op: self.op,
            fg: self.input.surface(self.fg_color, self.fg_alpha_mode),
            bg: self.input.surface(self.bg_color, self.bg_alpha_mode),
            out: self.output.surface(self.fill_color, AlphaMode::NoModif),
            src,
            bg_src: bg,
            dst,
        }
    }
}
