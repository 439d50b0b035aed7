//! Driver core for the JPEG codec.
//!
//! The codec is fed and drained through its FIFOs by a `DataPath` (on real
//! parts, a pair of DMA streams). This module owns the codec registers; the
//! data path owns the memory side.
//!
//! A job starts the same way every time: codec off, interrupts masked, both
//! FIFOs flushed, stale flags cleared, configuration written, interrupts
//! unmasked, codec on, data path armed, START. If arming fails, the codec is
//! put back the way it was found.
//!
//! When decoding, the codec interrupts once after parsing the stream header.
//! That doesn't end the job; the geometry it found is recorded and the job
//! keeps running. End of conversion retires the job as `Done` with whatever
//! the data path delivered. Any other status retires it as an error.

pub mod context;
pub mod encode;
pub mod header;
pub mod hw;

use log::{debug, warn};
use pixfmt::jpeg::{Queue, Subsampling};
use scopeguard::ScopeGuard;

use self::context::{Context, FormatRequest, QueueData, SourceChange};
use self::header::HeaderError;
use self::hw::{Cfr, Cr, Revision, Sr};
use crate::config::Config;
use crate::error::{ConfigError, RunError};
use crate::job::{Buffer, CompletionProducer, JobHandle, Status, TransferError};
use crate::platform::Platform;
use crate::regs::RegisterBlock;
use crate::sched::Engine;
pub use crate::tracker::{IrqOutcome, State, Stats};
use crate::tracker::{Tracker, Transfer};
use crate::util::spin_lock::SpinLock;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JpegOp {
    Encode { quality: u8 },
    Decode,
}

/// One image through the codec.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    pub op: JpegOp,
    /// Raw image size: the input when encoding, the stream header's when
    /// decoding.
    pub width: u32,
    pub height: u32,
    pub subsampling: Subsampling,
    pub src: Buffer,
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

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DataPathError;

/// Moves bytes between memory and the codec FIFOs.
pub trait DataPath: Sync {
    /// Prepares to feed `src` in and collect into `dst`.
    fn arm(&self, src: &Buffer, dst: &Buffer) -> Result<(), DataPathError>;
    /// Stops after end of conversion. Returns bytes written to the
    /// destination.
    fn finish(&self) -> u32;
    /// Stops without a result.
    fn cancel(&self);
}

impl<D: DataPath> DataPath for &D {
    fn arm(&self, src: &Buffer, dst: &Buffer) -> Result<(), DataPathError> {
        (**self).arm(src, dst)
    }

    fn finish(&self) -> u32 {
        (**self).finish()
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

/// Geometry the codec reported after parsing a stream header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecodedHeader {
    pub width: u32,
    pub height: u32,
    /// `None` if the component layout isn't one we produce formats for.
    pub subsampling: Option<Subsampling>,
}

fn decoded_header<R: RegisterBlock>(regs: &R) -> DecodedHeader {
    let confr1 = regs.read(hw::CONFR1);
    let luma = regs.read(hw::CONFRX[0]);
    let subsampling = match hw::NF.decode(confr1) + 1 {
        1 => Some(Subsampling::Gray),
        3 => match (hw::HSF.decode(luma), hw::VSF.decode(luma)) {
            (1, 1) => Some(Subsampling::S444),
            (2, 1) => Some(Subsampling::S422),
            (2, 2) => Some(Subsampling::S420),
            _ => None,
        },
        _ => None,
    };
    DecodedHeader {
        width: hw::XSIZE.decode(regs.read(hw::CONFR3)),
        height: hw::YSIZE.decode(confr1),
        subsampling,
    }
}

struct HwState<'q> {
    tracker: Tracker<'q, Job>,
    header: Option<DecodedHeader>,
}

/// A JPEG codec instance, fixed in one mode for its lifetime.
pub struct Jpeg<'q, R, P, D> {
    regs: R,
    platform: P,
    data: D,
    config: Config,
    ctx: spin::Mutex<Context>,
    hw: SpinLock<HwState<'q>>,
}

/// Bytes a decode into `s` at `width` x `height` will write.
fn raw_size(width: u32, height: u32, s: Subsampling) -> u32 {
    let depth = pixfmt::jpeg::raw_for(s).map(|f| f.depth).unwrap_or(24);
    (u64::from(width) * u64::from(height) * u64::from(depth) >> 3) as u32
}

fn check_capacity(buf: &Buffer, needed: u32) -> Result<(), ConfigError> {
    if buf.len < needed {
        return Err(ConfigError::BufferTooSmall {
            needed,
            len: buf.len,
        });
    }
    Ok(())
}

const FLAGS: u32 = Cfr::CEOCF.bits() | Cfr::CHPDF.bits();

impl<'q, R: RegisterBlock, P: Platform, D: DataPath> Jpeg<'q, R, P, D> {
    pub fn new(
        regs: R,
        platform: P,
        data: D,
        rev: Revision,
        mode: context::Mode,
        config: Config,
        completions: CompletionProducer<'q, Job>,
    ) -> Self {
        let mut ctx =
            Context::new(mode, rev, config.frame_width, config.frame_height);
        if ctx.set_quality(u32::from(config.jpeg_quality)).is_err() {
            warn!("jpeg: ignoring quality {}", config.jpeg_quality);
        }
        Jpeg {
            regs,
            platform,
            data,
            config,
            ctx: spin::Mutex::new(ctx),
            hw: SpinLock::new(HwState {
                tracker: Tracker::new(completions),
                header: None,
            }),
        }
    }

    /// Validates `job` and starts it. Refused with `RunError::Busy` if a job
    /// is in flight.
    pub fn run(&self, job: Job) -> Result<JobHandle, RunError> {
        let plan = match job.op {
            JpegOp::Encode { quality } => {
                let plan = encode::plan(
                    job.width,
                    job.height,
                    job.subsampling,
                    quality,
                )?;
                check_capacity(
                    &job.src,
                    raw_size(job.width, job.height, job.subsampling),
                )?;
                check_capacity(
                    &job.dst,
                    encode::stream_overhead(job.subsampling),
                )?;
                Some(plan)
            }
            JpegOp::Decode => {
                encode::check_bounds(job.width, job.height)?;
                check_capacity(&job.src, 1)?;
                check_capacity(
                    &job.dst,
                    raw_size(job.width, job.height, job.subsampling),
                )?;
                None
            }
        };
        let (src, dst) = (job.src, job.dst);
        let op = job.op;

        let mut st = self.hw.lock_irq();
        let handle = st.tracker.begin(job, self.platform.now(), 0)?;
        st.header = None;

        self.platform.clock_enable();
        let rollback = scopeguard::guard((), |_| {
            self.regs
                .clear_bits(hw::CR, (Cr::JCEN | Cr::ALL_IRQS).bits());
            self.platform.clock_disable();
        });

        self.regs.clear_bits(hw::CR, Cr::JCEN.bits());
        self.regs.clear_bits(hw::CR, Cr::ALL_IRQS.bits());
        self.regs.set_bits(hw::CR, (Cr::IFF | Cr::OFF).bits());
        self.regs.write(hw::CFR, FLAGS);
        let irqs = match &plan {
            Some(plan) => {
                encode::program(plan, &self.regs);
                Cr::EOCIE
            }
            None => {
                encode::program_decode(&self.regs);
                Cr::EOCIE | Cr::HPDIE
            }
        };
        self.regs.set_bits(hw::CR, irqs.bits());
        self.regs.set_bits(hw::CR, Cr::JCEN.bits());

        if self.data.arm(&src, &dst).is_err() {
            st.tracker.abandon(handle);
            warn!("jpeg: data path refused {:?}", handle);
            return Err(RunError::DataPath);
        }
        self.regs.write(hw::CONFR0, hw::START);
        ScopeGuard::into_inner(rollback);

        debug!("jpeg: started {:?} as {:?}", op, handle);
        Ok(handle)
    }

    /// Codec off, interrupts masked, flags cleared, clock off.
    fn stop(&self) {
        self.regs
            .clear_bits(hw::CR, (Cr::JCEN | Cr::ALL_IRQS).bits());
        self.regs.write(hw::CFR, FLAGS);
        self.platform.clock_disable();
    }

    /// Consumes one codec interrupt. Never blocks.
    pub fn handle_interrupt(&self) -> IrqOutcome {
        let mut st = match self.hw.try_lock() {
            Ok(st) => st,
            Err(_) => return IrqOutcome::Contended,
        };

        let sr = Sr::from_bits_truncate(self.regs.read(hw::SR));

        let handle = match st.tracker.current() {
            Some(h) => h,
            None => {
                let pending = sr & (Sr::EOCF | Sr::HPDF);
                if !pending.is_empty() {
                    self.regs.write(hw::CFR, pending.bits());
                }
                st.tracker.take();
                warn!("jpeg: interrupt with no job running, sr={:?}", sr);
                return IrqOutcome::Spurious;
            }
        };

        let decoding = st
            .tracker
            .get(handle)
            .map_or(false, |j| j.op == JpegOp::Decode);
        if sr.contains(Sr::HPDF) {
            if decoding {
                let found = decoded_header(&self.regs);
                debug!("jpeg: {:?} header {:?}", handle, found);
                st.header = Some(found);
            }
            self.regs.write(hw::CFR, Cfr::CHPDF.bits());
            if !sr.contains(Sr::EOCF) {
                return IrqOutcome::Progress(handle);
            }
        }

        let running = match st.tracker.take() {
            Some(r) => r,
            None => return IrqOutcome::Spurious,
        };
        let (status, payload) = if sr.contains(Sr::EOCF) {
            (Status::Done, self.data.finish())
        } else {
            self.data.cancel();
            let e = if sr.is_empty() {
                TransferError::NoStatus
            } else {
                TransferError::Unrecognized(sr.bits())
            };
            warn!("jpeg: {:?} failed: {}", handle, e);
            (Status::Error(e), 0)
        };
        self.stop();
        st.tracker.retire(running, status, payload)
    }

    /// Aborts the running job if it has been in flight for longer than the
    /// configured timeout as of `now`.
    pub fn expire(&self, now: u32) -> Option<JobHandle> {
        let mut st = self.hw.lock_irq();
        let running = st
            .tracker
            .take_overdue(now, self.config.timeout_ticks)?;
        self.data.cancel();
        self.stop();
        warn!("jpeg: {:?} timed out", running.handle);
        st.tracker.retire(running, Status::Timeout, 0);
        Some(running.handle)
    }

    pub fn state(&self) -> State {
        self.hw.lock_irq().tracker.state()
    }

    pub fn current(&self) -> Option<JobHandle> {
        self.hw.lock_irq().tracker.current()
    }

    pub fn stats(&self) -> Stats {
        self.hw.lock_irq().tracker.stats()
    }

    /// What the codec found in the running (or last) decode's header.
    pub fn decoded_header(&self) -> Option<DecodedHeader> {
        self.hw.lock_irq().header
    }

    pub fn try_format(
        &self,
        queue: Queue,
        req: &FormatRequest,
    ) -> Result<QueueData, ConfigError> {
        let ctx = self.ctx.lock();
        context::try_format(ctx.mode(), queue, req, ctx.revision())
    }

    /// Negotiates the format of `queue`. Refused while a job is in flight.
    pub fn set_format(
        &self,
        queue: Queue,
        req: &FormatRequest,
    ) -> Result<QueueData, ConfigError> {
        let mut ctx = self.ctx.lock();
        let data = context::try_format(ctx.mode(), queue, req, ctx.revision())?;
        if self.state() == State::Running {
            warn!("jpeg: {:?} format change while busy", queue);
            return Err(ConfigError::Busy);
        }
        ctx.apply_format(queue, data);
        Ok(data)
    }

    pub fn set_quality(&self, quality: u32) -> Result<(), ConfigError> {
        self.ctx.lock().set_quality(quality)
    }

    /// Tells the decoder about a newly queued source buffer holding `data`.
    pub fn queue_source(
        &self,
        data: &[u8],
        capture_streaming: bool,
    ) -> Result<SourceChange, HeaderError> {
        let r = self.ctx.lock().queue_source(data, capture_streaming);
        if let Err(e) = r {
            warn!("jpeg: bad source header: {}", e);
        }
        r
    }

    pub fn capture_stream_off(&self) {
        self.ctx.lock().capture_stream_off()
    }

    pub fn is_job_ready(&self) -> bool {
        self.ctx.lock().is_job_ready()
    }

    pub fn context(&self) -> Context {
        *self.ctx.lock()
    }

    pub fn job(&self, src: Buffer, dst: Buffer) -> Job {
        self.ctx.lock().job(src, dst)
    }
}

impl<'q, R: RegisterBlock, P: Platform, D: DataPath> Engine
    for Jpeg<'q, R, P, D>
{
    type Job = Job;

    fn run(&self, job: Job) -> Result<JobHandle, RunError> {
        Jpeg::run(self, job)
    }
}

#[cfg(test)]
mod tests {
    use super::context::Mode;
    use super::*;
    use crate::job::{BufFlags, CompletionQueue};
    use crate::sched::tests::Fifo;
    use crate::sched::{drain, try_run};
    use crate::sim::{SimDataPath, SimPlatform, SimRegs};

    fn sim_regs() -> SimRegs {
        SimRegs::new(hw::SIZE).with_clear(hw::CFR, hw::SR)
    }

    fn encode_job() -> Job {
        Job {
            op: JpegOp::Encode { quality: 75 },
            width: 64,
            height: 48,
            subsampling: Subsampling::S420,
            src: Buffer::new(0xc000_0000, 64 * 48 * 3 / 2),
            dst: Buffer::new(0xc001_0000, 8192),
        }
    }

    fn decode_job() -> Job {
        Job {
            op: JpegOp::Decode,
            width: 640,
            height: 480,
            subsampling: Subsampling::S422,
            src: Buffer::new(0xc000_0000, 65536),
            dst: Buffer::new(0xc010_0000, 640 * 480 * 2),
        }
    }

    /// Control bits, less the FIFO flush bits: those self-clear on
    /// hardware but stick in the sim.
    fn cr(regs: &SimRegs) -> Cr {
        Cr::from_bits_truncate(regs.peek(hw::CR)) - (Cr::IFF | Cr::OFF)
    }

    #[test]
    fn encode_scenario() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::F7,
            Mode::Encode,
            Config::default(),
            p,
        );

        let mut job = encode_job();
        job.src.timestamp = 7;
        let h = dev.run(job).unwrap();
        assert_eq!(dev.state(), State::Running);
        assert!(plat.clock_on());
        assert!(data.is_armed());
        assert_eq!(cr(&regs), Cr::JCEN | Cr::EOCIE);
        assert!(regs
            .writes_to(hw::CR)
            .iter()
            .any(|&v| v & (Cr::IFF | Cr::OFF).bits() != 0));
        assert_eq!(hw::XSIZE.decode(regs.peek(hw::CONFR3)), 64);
        assert_eq!(hw::NMCU.decode(regs.peek(hw::CONFR2)), 4 * 3 - 1);
        // START is the last thing written.
        assert_eq!(regs.writes().last(), Some(&(hw::CONFR0, hw::START)));

        data.produce(1234);
        regs.raise(hw::SR, Sr::EOCF.bits());
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Retired(h, Status::Done));
        assert_eq!(dev.state(), State::Idle);
        assert!(!plat.clock_on());
        assert!(!data.is_armed());
        assert_eq!(cr(&regs), Cr::empty());
        assert_eq!(regs.peek(hw::SR), 0);

        let done = c.dequeue().unwrap();
        assert_eq!(done.payload, 1234);
        assert_eq!(done.job.dst.bytes_used, 1234);
        assert_eq!(done.job.dst.timestamp, 7);
    }

    #[test]
    fn decode_reports_header_then_finishes() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::H7,
            Mode::Decode,
            Config::default(),
            p,
        );

        let h = dev.run(decode_job()).unwrap();
        assert_eq!(cr(&regs), Cr::JCEN | Cr::EOCIE | Cr::HPDIE);
        assert_eq!(regs.peek(hw::CONFR1), 0x108);

        // The codec fills in what it parsed.
        regs.poke(
            hw::CONFR1,
            0x108 | hw::NF.encode(2) | hw::YSIZE.encode(480),
        );
        regs.poke(hw::CONFR3, hw::XSIZE.encode(640));
        regs.poke(hw::CONFRX[0], hw::HSF.encode(2) | hw::VSF.encode(1));
        regs.raise(hw::SR, (Sr::HPDF | Sr::COF).bits());
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Progress(h));
        assert_eq!(dev.state(), State::Running);
        assert_eq!(regs.peek(hw::SR), Sr::COF.bits());
        assert_eq!(
            dev.decoded_header(),
            Some(DecodedHeader {
                width: 640,
                height: 480,
                subsampling: Some(Subsampling::S422),
            })
        );
        assert!(c.dequeue().is_none());

        data.produce(640 * 480 * 2);
        regs.raise(hw::SR, Sr::EOCF.bits());
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Retired(h, Status::Done));
        assert_eq!(c.dequeue().unwrap().payload, 640 * 480 * 2);
        assert_eq!(dev.stats().completed, 1);
    }

    #[test]
    fn invalid_jobs_touch_nothing() {
        let mut q = CompletionQueue::new();
        let (p, _c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::F7,
            Mode::Encode,
            Config::default(),
            p,
        );

        let mut job = encode_job();
        job.op = JpegOp::Encode { quality: 0 };
        assert_eq!(
            dev.run(job),
            Err(RunError::Config(ConfigError::OutOfRange(0)))
        );
        let mut job = encode_job();
        job.width = 16;
        assert_eq!(
            dev.run(job),
            Err(RunError::Config(ConfigError::Geometry {
                width: 16,
                height: 48
            }))
        );
        let mut job = decode_job();
        job.dst.len = 100;
        assert_eq!(
            dev.run(job),
            Err(RunError::Config(ConfigError::BufferTooSmall {
                needed: 640 * 480 * 2,
                len: 100
            }))
        );
        let mut job = decode_job();
        job.src.len = 0;
        assert_eq!(
            dev.run(job),
            Err(RunError::Config(ConfigError::BufferTooSmall {
                needed: 1,
                len: 0
            }))
        );

        let mut job = encode_job();
        job.width = 2592;
        job.height = 2592;
        job.subsampling = Subsampling::S444;
        job.src.len = 1;
        assert_eq!(
            dev.run(job),
            Err(RunError::Config(ConfigError::BufferTooSmall {
                needed: 2592 * 2592 * 3,
                len: 1
            }))
        );
        let mut job = encode_job();
        job.src.len -= 1;
        assert!(matches!(
            dev.run(job),
            Err(RunError::Config(ConfigError::BufferTooSmall { .. }))
        ));
        for &len in &[0, 1, encode::stream_overhead(Subsampling::S420) - 1] {
            let mut job = encode_job();
            job.dst.len = len;
            assert_eq!(
                dev.run(job),
                Err(RunError::Config(ConfigError::BufferTooSmall {
                    needed: encode::stream_overhead(Subsampling::S420),
                    len
                }))
            );
        }
        assert_eq!(regs.write_count(), 0);
        assert_eq!(plat.enables(), 0);
        assert_eq!(data.arms(), 0);
        assert_eq!(dev.stats().started, 0);
    }

    #[test]
    fn refused_data_path_rolls_back() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::F7,
            Mode::Encode,
            Config::default(),
            p,
        );

        data.refuse(true);
        assert_eq!(dev.run(encode_job()), Err(RunError::DataPath));
        assert_eq!(dev.state(), State::Idle);
        assert_eq!(cr(&regs), Cr::empty());
        assert!(!plat.clock_on());
        assert!(regs.writes_to(hw::CONFR0).is_empty());
        assert_eq!(dev.stats().started, 0);
        assert!(c.dequeue().is_none());

        data.refuse(false);
        assert!(dev.run(encode_job()).is_ok());
    }

    #[test]
    fn empty_status_retires_with_error() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::F7,
            Mode::Encode,
            Config::default(),
            p,
        );

        let h = dev.run(encode_job()).unwrap();
        data.produce(99);
        let expect = Status::Error(TransferError::NoStatus);
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Retired(h, expect));
        assert_eq!(data.cancels(), 1);
        assert!(!plat.clock_on());

        let done = c.dequeue().unwrap();
        assert_eq!(done.payload, 0);
        assert!(done.job.dst.flags.contains(BufFlags::ERROR));
        assert_eq!(dev.stats().errors, 1);
    }

    #[test]
    fn spurious_and_busy() {
        let mut q = CompletionQueue::new();
        let (p, _c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::F7,
            Mode::Encode,
            Config::default(),
            p,
        );

        regs.raise(hw::SR, (Sr::EOCF | Sr::OFNEF).bits());
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Spurious);
        assert_eq!(regs.peek(hw::SR), Sr::OFNEF.bits());
        assert_eq!(dev.stats().spurious, 1);

        let h = dev.run(encode_job()).unwrap();
        let writes = regs.write_count();
        assert_eq!(dev.run(encode_job()), Err(RunError::Busy));
        assert_eq!(regs.write_count(), writes);
        assert_eq!(dev.current(), Some(h));
        assert_eq!(
            dev.set_format(
                Queue::Output,
                &FormatRequest {
                    width: 64,
                    height: 64,
                    fourcc: pixfmt::GREY,
                    size_image: 0,
                }
            ),
            Err(ConfigError::Busy)
        );
    }

    #[test]
    fn watchdog_cancels_and_late_irq_is_spurious() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let config = Config {
            timeout_ticks: 10,
            ..Config::default()
        };
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::H7,
            Mode::Decode,
            config,
            p,
        );

        let h = dev.run(decode_job()).unwrap();
        assert_eq!(dev.expire(10), None);
        assert_eq!(dev.expire(11), Some(h));
        assert_eq!(dev.state(), State::Idle);
        assert_eq!(data.cancels(), 1);
        assert_eq!(cr(&regs), Cr::empty());
        assert_eq!(c.dequeue().unwrap().status, Status::Timeout);

        regs.raise(hw::SR, Sr::EOCF.bits());
        assert_eq!(dev.handle_interrupt(), IrqOutcome::Spurious);
        assert_eq!(dev.stats().timeouts, 1);
    }

    #[test]
    fn decoder_gate_drives_scheduler() {
        let mut q = CompletionQueue::new();
        let (p, mut c) = q.split();
        let (regs, plat, data) =
            (sim_regs(), SimPlatform::new(), SimDataPath::new());
        let dev = Jpeg::new(
            &regs,
            &plat,
            &data,
            Revision::H7,
            Mode::Decode,
            Config::default(),
            p,
        );

        let mut fifo: Fifo<Job> = Fifo::new();
        fifo.inputs.push_back(Buffer::new(0x1000_0000, 65536));
        fifo.outputs.push_back(Buffer::new(0x2000_0000, 64 * 32 * 2));

        fifo.gate_open = dev.is_job_ready();
        assert_eq!(
            try_run(&dev, &mut fifo, |s, d| dev.job(s, d)),
            Err(RunError::NotReady)
        );

        // 64x32 4:2:2 baseline header.
        let hdr = [
            0xff, 0xd8, 0xff, 0xc0, 0, 17, 8, 0, 32, 0, 64, 3, 1, 0x21, 0, 2,
            0x11, 1, 3, 0x11, 1,
        ];
        assert_eq!(dev.queue_source(&hdr, false), Ok(SourceChange::Applied));
        assert_eq!(dev.context().capture.size_image, 64 * 32 * 2);
        fifo.gate_open = dev.is_job_ready();

        let h = try_run(&dev, &mut fifo, |s, d| dev.job(s, d)).unwrap();
        regs.raise(hw::SR, Sr::EOCF.bits());
        dev.handle_interrupt();
        assert_eq!(drain(&mut c, &mut fifo), 1);
        assert_eq!(fifo.retired[0].handle, h);
        assert_eq!(fifo.retired[0].job.subsampling, Subsampling::S422);
    }
}
