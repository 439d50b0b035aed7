//! Translation of a job into Chrom-Art register values.
//!
//! This happens in two steps. `plan` does all of the checking and computes
//! every register image without touching hardware, so a bad job is rejected
//! with no side effects. `program` then writes the images out in the order
//! the hardware needs, and can't fail.
//!
//! The input side differs per operation. Each operation gets its own
//! programming function, looked up in `INPUTS` by `Op`.

use pixfmt::chromart::{self, Direction};

use super::layout::{Cr, Layout};
use super::Job;
use crate::error::ConfigError;
use crate::job::{Buffer, Surface};
use crate::regs::RegisterBlock;

/// Operation kinds, numbered as the CR mode field numbers them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Op {
    /// Memory to memory, same format.
    Copy = 0,
    /// Memory to memory with pixel format conversion.
    Convert = 1,
    /// Foreground over background.
    Blend = 2,
    /// Fill the output with the output color.
    Fill = 3,
}

impl Op {
    pub fn mode(self) -> u32 {
        self as u32
    }
}

/// Register images for one input layer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LayerImage {
    pub mar: u32,
    pub or: u32,
    pub pfccr: u32,
    pub colr: u32,
}

/// Every register value one transfer needs, computed up front.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Plan {
    pub op: Op,
    pub cr: u32,
    pub opfccr: u32,
    pub omar: u32,
    pub ocolr: u32,
    pub oor: u32,
    pub nlr: u32,
    pub fg: LayerImage,
    pub bg: LayerImage,
    /// Bytes the transfer leaves in the output buffer.
    pub payload: u32,
}

fn check_geometry(s: &Surface, layout: &Layout) -> Result<(), ConfigError> {
    let ok = s.width != 0
        && s.height != 0
        && layout.pixels_per_line.fits(s.width)
        && layout.lines.fits(s.height);
    if !ok {
        return Err(ConfigError::Geometry {
            width: s.width,
            height: s.height,
        });
    }
    if !layout.line_offset.fits(s.line_offset) {
        return Err(ConfigError::LineOffset(s.line_offset));
    }
    Ok(())
}

/// Bytes a `width` by `height` pixel region spans at `depth` bits per pixel.
fn span(width: u32, depth: u32, height: u32) -> u64 {
    u64::from(pixfmt::bytes_per_line(width, depth)) * u64::from(height)
}

fn check_capacity(needed: u64, buf: &Buffer) -> Result<u32, ConfigError> {
    if needed > u64::from(buf.len) {
        return Err(ConfigError::BufferTooSmall {
            needed: needed.min(u64::from(u32::MAX)) as u32,
            len: buf.len,
        });
    }
    Ok(needed as u32)
}

/// Checks an input layer against the region the transfer reads from it and
/// computes its register image. The engine reads `out.width` by
/// `out.height` pixels from every input, so each input surface and its
/// buffer must cover that much.
fn input_image(
    s: &Surface,
    buf: &Buffer,
    out: &Surface,
    layout: &Layout,
) -> Result<LayerImage, ConfigError> {
    let fmt = chromart::find_for(s.format, Direction::Input)
        .ok_or(ConfigError::UnsupportedFormat(s.format))?;
    if s.width < out.width || s.height < out.height {
        return Err(ConfigError::Geometry {
            width: s.width,
            height: s.height,
        });
    }
    if !layout.line_offset.fits(s.line_offset) {
        return Err(ConfigError::LineOffset(s.line_offset));
    }
    let needed = span(out.width + s.line_offset, fmt.depth, out.height);
    check_capacity(needed, buf)?;
    Ok(LayerImage {
        mar: buf.addr.0,
        or: layout.line_offset.encode(s.line_offset),
        pfccr: layout.color_mode.encode(fmt.mode.code())
            | layout.alpha_mode.encode(s.alpha_mode.code())
            | layout.alpha.encode(u32::from(s.color.a)),
        colr: s.color.pack(),
    })
}

/// Validates `job` against `layout` and the format table and computes its
/// register images. Touches no hardware.
pub fn plan(job: &Job, layout: &Layout) -> Result<Plan, ConfigError> {
    let out = &job.out;
    let out_fmt = chromart::find_for(out.format, Direction::Output)
        .ok_or(ConfigError::UnsupportedFormat(out.format))?;
    check_geometry(out, layout)?;
    let payload = check_capacity(
        span(out.width + out.line_offset, out_fmt.depth, out.height),
        &job.dst,
    )?;

    let mut fg = LayerImage::default();
    let mut bg = LayerImage::default();
    match job.op {
        Op::Copy => {
            if job.fg.format != out.format {
                return Err(ConfigError::FormatMismatch {
                    input: job.fg.format,
                    output: out.format,
                });
            }
            fg = input_image(&job.fg, &job.src, out, layout)?;
        }
        Op::Convert => {
            fg = input_image(&job.fg, &job.src, out, layout)?;
        }
        Op::Blend => {
            let bg_src =
                job.bg_src.as_ref().ok_or(ConfigError::MissingBackground)?;
            fg = input_image(&job.fg, &job.src, out, layout)?;
            bg = input_image(&job.bg, bg_src, out, layout)?;
        }
        Op::Fill => (),
    }

    Ok(Plan {
        op: job.op,
        cr: layout.mode.encode(job.op.mode()) | Cr::JOB_IRQS.bits(),
        opfccr: layout.color_mode.encode(out_fmt.mode.code()),
        omar: job.dst.addr.0,
        ocolr: out.color.pack(),
        oor: layout.line_offset.encode(out.line_offset),
        nlr: layout.pixels_per_line.encode(out.width)
            | layout.lines.encode(out.height),
        fg,
        bg,
        payload,
    })
}

type ProgramInputs = fn(&Plan, &Layout, &dyn RegisterBlock);

/// Input-side programming, indexed by `Op`.
static INPUTS: [ProgramInputs; 4] = [
    program_fg,    // Copy
    program_fg,    // Convert
    program_blend, // Blend
    program_none,  // Fill
];

fn program_layer(
    img: &LayerImage,
    mar: usize,
    or: usize,
    pfccr: usize,
    colr: usize,
    layout: &Layout,
    regs: &dyn RegisterBlock,
) {
    regs.write(mar, img.mar);
    regs.update_bits(or, layout.line_offset.mask(), img.or);
    regs.update_bits(
        pfccr,
        layout.color_mode.mask() | layout.alpha_mode.mask() | layout.alpha.mask(),
        img.pfccr,
    );
    regs.write(colr, img.colr);
}

fn program_fg(plan: &Plan, layout: &Layout, regs: &dyn RegisterBlock) {
    program_layer(
        &plan.fg,
        layout.fgmar,
        layout.fgor,
        layout.fgpfccr,
        layout.fgcolr,
        layout,
        regs,
    );
}

fn program_blend(plan: &Plan, layout: &Layout, regs: &dyn RegisterBlock) {
    program_fg(plan, layout, regs);
    program_layer(
        &plan.bg,
        layout.bgmar,
        layout.bgor,
        layout.bgpfccr,
        layout.bgcolr,
        layout,
        regs,
    );
}

fn program_none(_: &Plan, _: &Layout, _: &dyn RegisterBlock) {}

/// Writes `plan` to the hardware: control (mode and interrupt enables)
/// first, then the output side, then whichever inputs the operation uses.
/// Does not start the transfer.
pub fn program<R: RegisterBlock>(plan: &Plan, layout: &Layout, regs: &R) {
    let irq_enables = Cr::JOB_IRQS.bits();
    regs.update_bits(layout.cr, layout.mode.mask() | irq_enables, plan.cr);

    regs.update_bits(layout.opfccr, layout.color_mode.mask(), plan.opfccr);
    regs.write(layout.omar, plan.omar);
    regs.write(layout.ocolr, plan.ocolr);
    regs.update_bits(layout.oor, layout.line_offset.mask(), plan.oor);
    regs.write(layout.nlr, plan.nlr);

    INPUTS[plan.op as usize](plan, layout, regs);
}
