//! What the drivers need from the rest of the system besides registers.

/// Clock gating and a monotonic tick source for one accelerator instance.
///
/// Implementations must be callable from interrupt context: no blocking.
pub trait Platform: Sync {
    /// Ungates the peripheral clock. Calls nest the way the hardware gate
    /// does, which is to say they don't: enable/disable are not counted.
    fn clock_enable(&self);
    fn clock_disable(&self);

    /// Current time in ticks. Wraps; compare with `wrapping_sub`.
    fn now(&self) -> u32;
}

impl<'a, P: Platform + ?Sized> Platform for &'a P {
    fn clock_enable(&self) {
        (**self).clock_enable()
    }
    fn clock_disable(&self) {
        (**self).clock_disable()
    }
    fn now(&self) -> u32 {
        (**self).now()
    }
}
