//! Interrupt masking for critical sections shared with ISRs.
//!
//! On target this is PRIMASK. On the host there are no interrupts to mask, and
//! the simulator calls "ISRs" from ordinary threads, so `IrqMask` is a no-op and
//! mutual exclusion comes entirely from the spinlock.

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        /// Token for an interrupts-masked region. Restores the prior PRIMASK
        /// state when dropped.
        pub struct IrqMask {
            was_active: bool,
        }

        impl IrqMask {
            pub fn acquire() -> Self {
                let was_active = cortex_m::register::primask::read().is_active();
                cortex_m::interrupt::disable();
                IrqMask { was_active }
            }
        }

        impl Drop for IrqMask {
            fn drop(&mut self) {
                if self.was_active {
                    // Safety: we're restoring the state that we found; this
                    // cannot break a critical section further up the stack,
                    // because in that case interrupts would have been masked
                    // when we got here.
                    unsafe { cortex_m::interrupt::enable() }
                }
            }
        }
    } else {
        pub struct IrqMask(());

        impl IrqMask {
            pub fn acquire() -> Self {
                IrqMask(())
            }
        }
    }
}
