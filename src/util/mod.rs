//! Utility code; candidates for factoring out.

cfg_if::cfg_if! {
    if #[cfg(target_os = "none")] {
        pub mod armv7m;
    }
}

pub mod irq;
pub mod spin_lock;
