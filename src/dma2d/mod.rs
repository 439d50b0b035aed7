//! Driver core for the Chrom-Art (DMA2D) accelerator.
//!
//! # Job lifecycle
//!
//! A job goes `Idle -> Running -> Idle`. `run` validates it (failing with no
//! register access if it's bad), then under the IRQ lock ungates the clock,
//! programs the block and sets START. The transfer ends in one of two ways:
//!
//! - The hardware interrupts and `handle_interrupt` classifies the status
//!   register. Transfer complete retires the job as `Done`; anything else,
//!   including an all-zero status, retires it as an error. Nothing is ever
//!   restarted.
//! - `expire` notices the job has outlived `Config::timeout_ticks`, aborts the
//!   transfer and retires it as `Timeout`.
//!
//! Either way the job leaves through the completion queue, and the device is
//! free for the next one.
//!
//! # Locking
//!
//! The negotiated stream state sits behind a `spin::Mutex` and is only used
//! by the control path. Hardware state (what's running, the slot table, the
//! completion producer) sits behind a `SpinLock` that thread code takes with
//! interrupts masked and the ISR takes with `try_lock`. When both are held,
//! the control mutex is taken first.

pub mod context;
pub mod encode;
pub mod layout;

use log::{debug, warn};

use self::context::{Adjusted, Context, Control, FormatRequest, Queue};
use self::encode::{Op, Plan};
use self::layout::{Cr, Isr, Layout};
use crate::config::Config;
use crate::error::{ConfigError, RunError};
use crate::job::{
    Buffer, CompletionProducer, JobHandle, Status, Surface,
    TransferError,
};
use crate::platform::Platform;
use crate::regs::RegisterBlock;
use crate::sched::Engine;
pub use crate::tracker::{IrqOutcome, State, Stats};
use crate::tracker::{Tracker, Transfer};
use crate::util::spin_lock::SpinLock;

/// One blit: the operation, its surfaces and the buffers behind them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    pub op: Op,
    pub fg: Surface,
    /// Only read for `Op::Blend`.
    pub bg: Surface,
    pub out: Surface,
    /// Foreground pixels.
    pub src: Buffer,
    /// Background pixels, required for `Op::Blend`.
    pub bg_src: Option<Buffer>,
    pub dst: Buffer,
}

impl Transfer for Job {
    fn src(&self) -> &Buffer {
        &self.src
    }

    fn dst_mut(&mut self) -> &mut Buffer {
        &mut self.dst
    }
}

/// A Chrom-Art instance.
pub struct Dma2d<'q, R, P> {
    regs: R,
    platform: P,
    layout: &'static Layout,
    config: Config,
    ctx: spin::Mutex<Context>,
    hw: SpinLock<Tracker<'q, Job>>,
}

fn classify(isr: u32) -> Status {
    let flags = Isr::from_bits_truncate(isr);
    if flags.contains(Isr::TE) {
        Status::Error(TransferError::Bus)
    } else if flags.contains(Isr::CE) {
        Status::Error(TransferError::Config)
    } else if flags.contains(Isr::CAE) {
        Status::Error(TransferError::ClutAccess)
    } else if flags.contains(Isr::TC) {
        Status::Done
    } else if isr == 0 {
        Status::Error(TransferError::NoStatus)
    } else {
        Status::Error(TransferError::Unrecognized(isr))
    }
}

impl<'q, R: RegisterBlock, P: Platform> Dma2d<'q, R, P> {
    /// Attaches to a Chrom-Art block. Completions will be posted to
    /// `completions`. No registers are touched until the first job.
    pub fn new(
        regs: R,
        platform: P,
        layout: &'static Layout,
        config: Config,
        completions: CompletionProducer<'q, Job>,
    ) -> Self {
        Dma2d {
            regs,
            platform,
            layout,
            config,
            ctx: spin::Mutex::new(Context::new(
                config.frame_width,
                config.frame_height,
            )),
            hw: SpinLock::new(Tracker::new(completions)),
        }
    }

    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Validates `job` and starts it.
    ///
    /// A job that fails validation is rejected with no register access. If a
    /// job is already running, this one is refused with `RunError::Busy` and
    /// the running job is left alone.
    pub fn run(&self, job: Job) -> Result<JobHandle, RunError> {
        let plan = encode::plan(&job, self.layout)?;

        let mut hw = self.hw.lock_irq();
        let handle = hw.begin(job, self.platform.now(), plan.payload)?;
        self.start(&plan);
        debug!("dma2d: started {:?} as {:?}", plan.op, handle);
        Ok(handle)
    }

    /// Clock on, program, go. Caller holds the IRQ lock.
    fn start(&self, plan: &Plan) {
        self.platform.clock_enable();
        encode::program(plan, self.layout, &self.regs);
        self.regs.set_bits(self.layout.cr, Cr::START.bits());
    }

    /// Consumes one hardware interrupt. Never blocks.
    pub fn handle_interrupt(&self) -> IrqOutcome {
        let mut hw = match self.hw.try_lock() {
            Ok(hw) => hw,
            Err(_) => return IrqOutcome::Contended,
        };

        // Read the status exactly once; everything below works from `isr`.
        let isr = self.regs.read(self.layout.isr);
        let seen = isr & self.layout.irq_flags;
        if seen != 0 {
            self.regs.write(self.layout.ifcr, seen);
        }

        let running = match hw.take() {
            Some(r) => r,
            None => {
                warn!("dma2d: interrupt with no job running, isr={:#x}", isr);
                return IrqOutcome::Spurious;
            }
        };
        self.platform.clock_disable();

        let status = classify(seen);
        if let Status::Error(e) = status {
            warn!("dma2d: {:?} failed: {}", running.handle, e);
        }
        hw.retire(running, status, running.payload)
    }

    /// Aborts the running job if it has been in flight for longer than the
    /// configured timeout as of `now`. Returns the handle of the aborted job.
    pub fn expire(&self, now: u32) -> Option<JobHandle> {
        let mut hw = self.hw.lock_irq();
        let running = hw.take_overdue(now, self.config.timeout_ticks)?;

        self.regs.set_bits(self.layout.cr, Cr::ABORT.bits());
        // Anything the aborted transfer left pending would otherwise arrive
        // later and be mistaken for the next job's interrupt.
        let pending = self.regs.read(self.layout.isr) & self.layout.irq_flags;
        if pending != 0 {
            self.regs.write(self.layout.ifcr, pending);
        }
        self.platform.clock_disable();

        warn!("dma2d: {:?} timed out", running.handle);
        hw.retire(running, Status::Timeout, 0);
        Some(running.handle)
    }

    pub fn state(&self) -> State {
        self.hw.lock_irq().state()
    }

    pub fn current(&self) -> Option<JobHandle> {
        self.hw.lock_irq().current()
    }

    pub fn stats(&self) -> Stats {
        self.hw.lock_irq().stats()
    }

    /// Adjusts `req` to what this block can do without changing anything.
    pub fn try_format(
        &self,
        queue: Queue,
        req: &FormatRequest,
    ) -> Result<Adjusted, ConfigError> {
        context::try_format(req, queue, self.layout)
    }

    /// Negotiates the format of `queue`. Refused while a job is in flight.
    pub fn set_format(
        &self,
        queue: Queue,
        req: &FormatRequest,
    ) -> Result<Adjusted, ConfigError> {
        let adj = context::try_format(req, queue, self.layout)?;
        let mut ctx = self.ctx.lock();
        if self.state() == State::Running {
            warn!("dma2d: {:?} format change while busy", queue);
            return Err(ConfigError::Busy);
        }
        ctx.apply_format(queue, &adj);
        Ok(adj)
    }

    pub fn set_control(&self, control: Control) -> Result<(), ConfigError> {
        self.ctx.lock().apply_control(control)
    }

    /// Snapshot of the negotiated stream state.
    pub fn context(&self) -> Context {
        self.ctx.lock().clone()
    }

    /// Builds a job from the negotiated state over the given buffers.
    pub fn job(&self, src: Buffer, bg: Option<Buffer>, dst: Buffer) -> Job {
        self.ctx.lock().job(src, bg, dst)
    }
}

impl<'q, R: RegisterBlock, P: Platform> Engine for Dma2d<'q, R, P> {
    type Job = Job;

    fn run(&self, job: Job) -> Result<JobHandle, RunError> {
        Dma2d::run(self, job)
    }
}
