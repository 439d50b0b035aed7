//! The boundary with the buffer-queue scheduler.
//!
//! The scheduler owns the buffer queues. It decides when a job can run, hands
//! us buffers to build it from, and takes completions back. Completions
//! arrive from interrupt context through an SPSC queue; `drain` is the
//! thread-side end that delivers them, and is where any blocking work (waking
//! waiters and so on) belongs.

use crate::error::RunError;
use crate::job::{Buffer, Completion, CompletionConsumer, JobHandle};

/// Something that runs jobs of type `Job`.
pub trait Engine {
    type Job;

    fn run(&self, job: Self::Job) -> Result<JobHandle, RunError>;
}

/// What the driver core needs from the scheduler.
pub trait Scheduler<J> {
    /// Whether a job may be built now. For the JPEG decoder this also covers
    /// header parsing.
    fn is_job_ready(&self) -> bool;

    /// The next source buffer, left queued until its job retires.
    fn next_input_buffer(&mut self) -> Option<Buffer>;

    /// The next destination buffer, left queued until its job retires.
    fn next_output_buffer(&mut self) -> Option<Buffer>;

    /// Takes back a finished job and releases its buffers.
    fn retire(&mut self, completion: Completion<J>);
}

/// Delivers every queued completion to `scheduler`. Returns how many there
/// were.
pub fn drain<J, S: Scheduler<J>>(
    completions: &mut CompletionConsumer<'_, J>,
    scheduler: &mut S,
) -> usize {
    let mut n = 0;
    while let Some(c) = completions.dequeue() {
        scheduler.retire(c);
        n += 1;
    }
    n
}

/// Builds a job from the scheduler's next buffers and starts it, if the
/// scheduler says one is ready.
pub fn try_run<E: Engine, S: Scheduler<E::Job>>(
    engine: &E,
    scheduler: &mut S,
    build: impl FnOnce(Buffer, Buffer) -> E::Job,
) -> Result<JobHandle, RunError> {
    if !scheduler.is_job_ready() {
        return Err(RunError::NotReady);
    }
    let src = scheduler.next_input_buffer().ok_or(RunError::NotReady)?;
    let dst = scheduler.next_output_buffer().ok_or(RunError::NotReady)?;
    engine.run(build(src, dst))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dma2d::layout::{Isr, CHROM_ART};
    use crate::dma2d::{Dma2d, Job};
    use crate::job::{CompletionQueue, Status};
    use crate::sim::{SimPlatform, SimRegs};
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Two FIFOs and a record of what retired.
    pub struct Fifo<J> {
        pub inputs: VecDeque<Buffer>,
        pub outputs: VecDeque<Buffer>,
        pub retired: Vec<Completion<J>>,
        pub gate_open: bool,
    }

    impl<J> Fifo<J> {
        pub fn new() -> Self {
            Fifo {
                inputs: VecDeque::new(),
                outputs: VecDeque::new(),
                retired: Vec::new(),
                gate_open: true,
            }
        }
    }

    impl<J> Scheduler<J> for Fifo<J> {
        fn is_job_ready(&self) -> bool {
            self.gate_open && !self.inputs.is_empty() && !self.outputs.is_empty()
        }

        fn next_input_buffer(&mut self) -> Option<Buffer> {
            self.inputs.front().copied()
        }

        fn next_output_buffer(&mut self) -> Option<Buffer> {
            self.outputs.front().copied()
        }

        fn retire(&mut self, completion: Completion<J>) {
            self.inputs.pop_front();
            self.outputs.pop_front();
            self.retired.push(completion);
        }
    }

    #[test]
    fn run_retire_cycle() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let regs = SimRegs::new(0x50).with_clear(CHROM_ART.ifcr, CHROM_ART.isr);
        let plat = SimPlatform::new();
        let dev = Dma2d::new(&regs, &plat, &CHROM_ART, Config::default(), p);
        let ctx = dev.context();

        let mut fifo: Fifo<Job> = Fifo::new();
        fifo.gate_open = false;
        assert_eq!(
            try_run(&dev, &mut fifo, |s, d| dev.job(s, None, d)),
            Err(RunError::NotReady)
        );

        fifo.gate_open = true;
        for i in 0..2 {
            fifo.inputs.push_back(Buffer::new(0x1000_0000 + i, ctx.input.size));
            fifo.outputs.push_back(Buffer::new(0x2000_0000 + i, ctx.output.size));
        }

        for i in 0..2 {
            let h = try_run(&dev, &mut fifo, |s, d| dev.job(s, None, d)).unwrap();
            regs.raise(CHROM_ART.isr, Isr::TC.bits());
            dev.handle_interrupt();
            assert_eq!(drain(&mut c, &mut fifo), 1);
            let last = fifo.retired.last().unwrap();
            assert_eq!(last.handle, h);
            assert_eq!(last.status, Status::Done);
            assert_eq!(last.job.src.addr.0, 0x1000_0000 + i);
        }
        assert!(!fifo.is_job_ready());
        assert_eq!(drain(&mut c, &mut fifo), 0);
    }
}
