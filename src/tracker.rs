//! Bookkeeping for the one job an accelerator may have in flight.
//!
//! `Tracker` lives inside a device's IRQ lock. It owns the slot table, knows
//! which job (if any) is running, and turns a finished job into a
//! `Completion` on the handoff queue. It never touches registers.
//!
//! Only `Idle` and `Running` are visible from outside. A job is programmed
//! and armed entirely within the locked `run`, so nobody can observe it
//! half-armed, and how it ended is reported as a `Status`.

use log::error;

use crate::error::RunError;
use crate::job::{
    BufFlags, Buffer, Completion, CompletionProducer, JobHandle, Slots, Status,
};

/// Implemented by job types so retirement can fix up their buffers.
pub trait Transfer {
    fn src(&self) -> &Buffer;
    fn dst_mut(&mut self) -> &mut Buffer;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    Idle,
    Running,
}

/// Event counters, for diagnostics.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub started: u32,
    pub completed: u32,
    pub errors: u32,
    pub timeouts: u32,
    pub spurious: u32,
    /// Completions lost to a full handoff queue.
    pub dropped: u32,
}

/// Result of one call to a device's interrupt handler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IrqOutcome {
    /// The running job was retired.
    Retired(JobHandle, Status),
    /// Progress on the running job that doesn't end it (the JPEG decoder's
    /// header-parsed event).
    Progress(JobHandle),
    /// No job was running. Status bits were cleared; no job was touched.
    Spurious,
    /// The IRQ lock was held by the code we preempted. Nothing was read or
    /// written. Can't happen on target, where thread code masks interrupts
    /// while holding the lock.
    Contended,
}

/// Only one job runs at a time, and `retire` frees its slot before posting
/// the completion, so one slot is enough. Handles stay distinct across jobs
/// through the slot's generation.
pub const JOB_SLOTS: usize = 1;

#[derive(Copy, Clone, Debug)]
pub struct Running {
    pub handle: JobHandle,
    pub started_at: u32,
    /// Bytes the job is expected to produce, if known up front.
    pub payload: u32,
}

pub struct Tracker<'q, J> {
    running: Option<Running>,
    slots: Slots<J, JOB_SLOTS>,
    completions: CompletionProducer<'q, J>,
    stats: Stats,
}

impl<'q, J: Transfer> Tracker<'q, J> {
    pub fn new(completions: CompletionProducer<'q, J>) -> Self {
        Tracker {
            running: None,
            slots: Slots::new(),
            completions,
            stats: Stats::default(),
        }
    }

    pub fn state(&self) -> State {
        if self.running.is_some() {
            State::Running
        } else {
            State::Idle
        }
    }

    pub fn current(&self) -> Option<JobHandle> {
        self.running.map(|r| r.handle)
    }

    pub fn get(&self, handle: JobHandle) -> Option<&J> {
        self.slots.get(handle)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Marks `job` as running from `now`. Refuses if something already is.
    pub fn begin(
        &mut self,
        job: J,
        now: u32,
        payload: u32,
    ) -> Result<JobHandle, RunError> {
        if self.running.is_some() {
            return Err(RunError::Busy);
        }
        let handle = self.slots.insert(job).map_err(|_| RunError::Busy)?;
        self.running = Some(Running {
            handle,
            started_at: now,
            payload,
        });
        self.stats.started += 1;
        Ok(handle)
    }

    /// Forgets a job that never got started. No completion is posted; the
    /// caller still owns the failure.
    pub fn abandon(&mut self, handle: JobHandle) -> Option<J> {
        if self.current() == Some(handle) {
            self.running = None;
            self.stats.started -= 1;
        }
        self.slots.remove(handle)
    }

    /// Claims the running job for retirement. `None` means the caller is
    /// looking at a spurious event, which is counted.
    pub fn take(&mut self) -> Option<Running> {
        let r = self.running.take();
        if r.is_none() {
            self.stats.spurious += 1;
        }
        r
    }

    /// Like `take`, but only if the running job started more than `timeout`
    /// ticks before `now`.
    pub fn take_overdue(&mut self, now: u32, timeout: u32) -> Option<Running> {
        match self.running {
            Some(r) if now.wrapping_sub(r.started_at) > timeout => {
                self.running.take()
            }
            _ => None,
        }
    }

    /// Finishes a job claimed with `take`: propagates capture metadata from
    /// source to destination, records the payload (zero unless `Done`) and
    /// posts the completion.
    pub fn retire(
        &mut self,
        running: Running,
        status: Status,
        payload: u32,
    ) -> IrqOutcome {
        let handle = running.handle;
        let mut job = self
            .slots
            .remove(handle)
            .expect("running job missing from slot table");

        let payload = if status.is_done() { payload } else { 0 };
        let src = *job.src();
        let dst = job.dst_mut();
        dst.copy_metadata_from(&src);
        dst.bytes_used = payload;
        match status {
            Status::Done => self.stats.completed += 1,
            Status::Error(_) => self.stats.errors += 1,
            Status::Timeout => self.stats.timeouts += 1,
        }
        if !status.is_done() {
            dst.flags.insert(BufFlags::ERROR);
        }

        let completion = Completion {
            handle,
            job,
            status,
            payload,
        };
        if self.completions.enqueue(completion).is_err() {
            self.stats.dropped += 1;
            error!("completion queue full, dropped {:?}", handle);
        }
        IrqOutcome::Retired(handle, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{CompletionQueue, TransferError};

    #[derive(Debug)]
    struct Pair(Buffer, Buffer);

    impl Transfer for Pair {
        fn src(&self) -> &Buffer {
            &self.0
        }
        fn dst_mut(&mut self) -> &mut Buffer {
            &mut self.1
        }
    }

    fn pair() -> Pair {
        let mut src = Buffer::new(0x100, 16);
        src.timestamp = 9;
        Pair(src, Buffer::new(0x200, 16))
    }

    #[test]
    fn one_at_a_time() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let mut t = Tracker::new(p);

        let h = t.begin(pair(), 0, 0).unwrap();
        assert_eq!(t.begin(pair(), 0, 0).unwrap_err(), RunError::Busy);
        assert_eq!(t.state(), State::Running);

        let r = t.take().unwrap();
        assert_eq!(t.retire(r, Status::Done, 12), IrqOutcome::Retired(h, Status::Done));
        assert_eq!(t.state(), State::Idle);
        assert!(t.take().is_none());
        assert_eq!(t.stats().spurious, 1);

        let done = c.dequeue().unwrap();
        assert_eq!(done.payload, 12);
        assert_eq!(done.job.1.bytes_used, 12);
        assert_eq!(done.job.1.timestamp, 9);
    }

    #[test]
    fn slot_is_free_before_completion_is_consumed() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let mut t = Tracker::new(p);

        let first = t.begin(pair(), 0, 0).unwrap();
        let r = t.take().unwrap();
        t.retire(r, Status::Done, 4);

        // The scheduler hasn't drained the queue yet.
        let second = t.begin(pair(), 1, 0).unwrap();
        assert_ne!(first, second);
        assert_eq!(t.current(), Some(second));
        assert_eq!(c.dequeue().unwrap().handle, first);
    }

    #[test]
    fn failed_jobs_carry_no_payload() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let mut t = Tracker::new(p);

        t.begin(pair(), 0, 0).unwrap();
        let r = t.take().unwrap();
        t.retire(r, Status::Error(TransferError::Bus), 12);
        let done = c.dequeue().unwrap();
        assert_eq!(done.payload, 0);
        assert!(done.job.1.flags.contains(BufFlags::ERROR));
        assert_eq!(t.stats().errors, 1);
    }

    #[test]
    fn abandon_leaves_no_trace() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let mut t = Tracker::new(p);

        let h = t.begin(pair(), 0, 0).unwrap();
        assert!(t.abandon(h).is_some());
        assert_eq!(t.state(), State::Idle);
        assert_eq!(t.stats(), Stats::default());
        assert!(c.dequeue().is_none());
    }

    #[test]
    fn overdue_uses_wrapping_time() {
        let mut q = CompletionQueue::new();
        let (p, _c) = q.split();
        let mut t = Tracker::new(p);

        t.begin(pair(), u32::MAX - 5, 0).unwrap();
        assert!(t.take_overdue(4, 10).is_none());
        assert!(t.take_overdue(5, 10).is_some());
        assert_eq!(t.state(), State::Idle);
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let mut q = CompletionQueue::new();
        let (p, _c) = q.split();
        let mut t = Tracker::new(p);

        for _ in 0..crate::job::COMPLETION_DEPTH {
            t.begin(pair(), 0, 0).unwrap();
            let r = t.take().unwrap();
            t.retire(r, Status::Done, 1);
        }
        assert_eq!(t.stats().dropped, 1);
        assert_eq!(t.stats().completed as usize, crate::job::COMPLETION_DEPTH);
    }
}
