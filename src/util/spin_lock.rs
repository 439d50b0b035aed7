//! Bare metal spinlocks using atomic memory operations.
//!
//! Two ways in:
//!
//! - `try_lock` never waits. This is the only form interrupt handlers should
//!   use; if it fails from an ISR, the code that was preempted holds the lock
//!   and spinning would deadlock.
//! - `lock_irq` masks interrupts (on target) before spinning, so that the
//!   holder cannot be preempted by an ISR wanting the same lock. This is the
//!   form thread code uses for anything it shares with an ISR.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

use super::irq::IrqMask;

/// Protects a `T` using a spinlock to ensure that it can't be accessed
/// concurrently or reentrantly.
///
/// `SpinLock` is a lot like `Mutex` from the standard library, but in a greatly
/// simplified form intended for bare metal use. In particular, `SpinLock`
/// cannot block threads in the traditional polite manner; instead, all locking
/// is best-effort and may fail. (If you really need to get a lock: spin.)
#[derive(Debug)]
pub struct SpinLock<T: ?Sized> {
    locked: AtomicBool,
    contents: UnsafeCell<T>,
}

unsafe impl<T: Send + ?Sized> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(contents: T) -> Self {
        SpinLock {
            locked: AtomicBool::new(false),
            contents: UnsafeCell::new(contents),
        }
    }

    pub fn into_inner(self) -> T {
        self.contents.into_inner()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpinLockError {
    Contended,
}

impl<T: ?Sized + Send> SpinLock<T> {
    pub fn try_lock(&self) -> Result<SpinLockGuard<T>, SpinLockError> {
        if self.locked.swap(true, Ordering::Acquire) {
            Err(SpinLockError::Contended)
        } else {
            // We observed the false->true transition, so nobody else can be
            // holding a reference into the cell.
            Ok(SpinLockGuard {
                locked: LockBorrow(&self.locked),
                // Safety: we've locked, so we can generate an exclusive
                // reference.
                contents: unsafe { &mut *self.contents.get() },
            })
        }
    }

    pub fn lock(&self) -> SpinLockGuard<T> {
        loop {
            match self.try_lock() {
                Ok(guard) => return guard,
                Err(_) => core::hint::spin_loop(),
            }
        }
    }

    /// Masks interrupts and then locks, spinning if necessary. Interrupts are
    /// restored to their previous state after the lock is released.
    ///
    /// Keep the critical section short: nothing that can block belongs under
    /// this guard.
    pub fn lock_irq(&self) -> IrqGuard<T> {
        let mask = IrqMask::acquire();
        IrqGuard {
            guard: self.lock(),
            _mask: mask,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

#[must_use = "if dropped, the spinlock will immediately unlock"]
#[derive(Debug)]
pub struct SpinLockGuard<'a, T: ?Sized> {
    locked: LockBorrow<'a>,
    contents: &'a mut T,
}

/// A reference to the `SpinLock` lock flag that releases it when dropped.
#[derive(Debug)]
struct LockBorrow<'a>(&'a AtomicBool);

impl<'a, T: ?Sized> core::ops::Deref for SpinLockGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.contents
    }
}

impl<'a, T: ?Sized> core::ops::DerefMut for SpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.contents
    }
}

impl<'a> Drop for LockBorrow<'a> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Guard returned by `lock_irq`.
///
/// Field order matters: the lock is released before interrupts are unmasked.
#[must_use = "if dropped, the spinlock will immediately unlock"]
pub struct IrqGuard<'a, T: ?Sized> {
    guard: SpinLockGuard<'a, T>,
    _mask: IrqMask,
}

impl<'a, T: ?Sized> core::ops::Deref for IrqGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<'a, T: ?Sized> core::ops::DerefMut for IrqGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
