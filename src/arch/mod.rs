//! Architecture layer.
//!
//! The scheduler itself is plain data-structure code; everything that
//! touches registers lives here behind a small set of operations: pend a
//! context switch, park the core, relocate and patch the vector table,
//! and start the first thread. The Cortex-M port supplies the real
//! machinery; other targets get inert stubs so the portable kernel
//! builds and runs anywhere.

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod arm_m;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub(crate) use arm_m::{
    init_vectors, install_isr, set_trap_priorities, setup_systick, start_first_thread,
    trigger_context_switch, wait_for_interrupt,
};

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
mod hosted;
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub(crate) use hosted::{init_vectors, install_isr, trigger_context_switch, wait_for_interrupt};

use crate::config::STACK_WORDS;

/// Words in a full saved context: the hardware exception frame (R0-R3,
/// R12, LR, PC, xPSR) plus the software-saved R4-R11.
pub(crate) const FRAME_WORDS: usize = 16;

/// xPSR for a fresh thread: Thumb state, everything else clear.
const PSR_THUMB: u32 = 1 << 24;

/// Fill for registers whose initial value is irrelevant.
const STACK_SEED: u32 = 0xDEAD_BEEF;

/// Write an initial context frame at the top of `stack` and return the
/// address the saved stack pointer must hold.
///
/// Frame, top of stack downward: xPSR (Thumb bit), PC = `entry`, LR = the
/// thread-exit trap, then R12, R3-R0, R11-R4 seeded with filler. Popping
/// this frame on exception return drops the thread into `entry`.
pub(crate) fn seed_stack(stack: &mut [u32; STACK_WORDS], entry: fn()) -> usize {
    stack[STACK_WORDS - 1] = PSR_THUMB;
    stack[STACK_WORDS - 2] = entry as usize as u32;
    stack[STACK_WORDS - 3] = crate::kernel::thread_exit as usize as u32;
    for word in &mut stack[STACK_WORDS - FRAME_WORDS..STACK_WORDS - 3] {
        *word = STACK_SEED;
    }
    &stack[STACK_WORDS - FRAME_WORDS] as *const u32 as usize
}
