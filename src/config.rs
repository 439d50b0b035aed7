//! Attach-time configuration.

use smart_default::SmartDefault;

/// Knobs shared by both accelerators. The register map is chosen separately
/// by handing the driver a `&'static` layout.
#[derive(Copy, Clone, Debug, SmartDefault)]
pub struct Config {
    /// How long, in `Platform::now` ticks, a job may run before `expire`
    /// gives up on it.
    #[default = 100]
    pub timeout_ticks: u32,
    /// Geometry a new context starts with.
    #[default = 240]
    pub frame_width: u32,
    #[default = 320]
    pub frame_height: u32,
    /// Encoder quality a new JPEG context starts with, 1..=100.
    #[default = 90]
    pub jpeg_quality: u8,
}
