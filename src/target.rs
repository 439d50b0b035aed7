//! Glue for running the Chrom-Art driver on an STM32F429.
//!
//! The JPEG codec only exists on F7 and H7 parts, which have their own
//! clock trees; boards with one provide their own `Platform` and `DataPath`.

use core::sync::atomic::{AtomicU32, Ordering};

use stm32f4::stm32f429 as device;

use crate::platform::Platform;
use crate::regs::Mmio;
use crate::util::armv7m;

/// DMA2D register block on F42x/F43x.
pub const DMA2D_BASE: usize = 0x4002_b000;

static TICKS: AtomicU32 = AtomicU32::new(0);

/// Advances the watchdog clock. Call from a periodic interrupt, e.g. SysTick.
pub fn tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Clock gate for the DMA2D, plus the `tick` counter.
pub struct Chromart;

impl Platform for Chromart {
    fn clock_enable(&self) {
        // Safety: RCC is shared, but AHB1ENR is only ever modified with
        // interrupts masked, and this bit belongs to us.
        let rcc = unsafe { &*device::RCC::ptr() };
        rcc.ahb1enr.modify(|_, w| w.dma2den().enabled());
        // Writes to the block must not overtake the gate.
        cortex_m::asm::dsb();
    }

    fn clock_disable(&self) {
        let rcc = unsafe { &*device::RCC::ptr() };
        rcc.ahb1enr.modify(|_, w| w.dma2den().disabled());
    }

    fn now(&self) -> u32 {
        TICKS.load(Ordering::Relaxed)
    }
}

/// The DMA2D registers.
pub fn dma2d_regs() -> Mmio {
    // Safety: this is the block's documented address on this part.
    unsafe { Mmio::new(DMA2D_BASE) }
}

/// Lets DMA2D interrupts through, discarding any left over from before.
pub fn enable_dma2d_irq(nvic: &mut cortex_m::peripheral::NVIC) {
    armv7m::unmask_fresh(nvic, device::Interrupt::DMA2D);
}

pub fn disable_dma2d_irq(nvic: &mut cortex_m::peripheral::NVIC) {
    armv7m::mask(nvic, device::Interrupt::DMA2D);
}
