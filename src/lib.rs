//! Driver cores for the STM32 memory-to-memory accelerators: the Chrom-Art
//! 2D blitter (`dma2d`) and the JPEG codec (`jpeg`).
//!
//! Each driver validates a job, programs the hardware, and retires the job
//! from its interrupt handler onto a lock-free completion queue. Buffer
//! management lives on the other side of `sched::Scheduler`.
//!
//! Registers are reached through `regs::RegisterBlock`, and clocks and time
//! through `platform::Platform`, so the same code runs against the real
//! hardware or the simulator in `sim`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod dma2d;
pub mod error;
pub mod job;
pub mod jpeg;
pub mod platform;
pub mod regs;
pub mod sched;
pub mod tracker;
pub mod util;

#[cfg(any(test, feature = "std"))]
pub mod sim;

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub mod target;
    }
}

pub use pixfmt;
