//! NVIC line control with the barriers `cortex_m` leaves out.
//!
//! `NVIC::enable`/`disable` only post the write; without a DMB/ISB pair the
//! interrupt can still be taken (or not yet be taken) after they return. The
//! functions here finish the job, following ARM's *Cortex-M Programming Guide
//! to Memory Barrier Instructions*.

use cortex_m::interrupt::Nr;
use cortex_m::peripheral::NVIC;

fn barrier() {
    cortex_m::asm::dmb();
    cortex_m::asm::isb();
}

/// Unmasks `line`, dropping anything it left pending while masked. Once this
/// returns, a new event on the line will be taken.
pub fn unmask_fresh(nvic: &mut NVIC, line: impl Nr + Copy) {
    NVIC::unpend(line);
    nvic.enable(line);
    barrier();
}

/// Masks `line`. Starting with the next instruction, its handler can't
/// preempt the caller.
pub fn mask(nvic: &mut NVIC, line: impl Nr) {
    nvic.disable(line);
    barrier();
}
