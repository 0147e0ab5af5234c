//! Interrupt-disable critical sections.
//!
//! Every kernel-internal mutation happens between [`enter`] and [`leave`].
//! The pair nests: `enter` captures whether interrupts were enabled and
//! `leave` restores exactly that state, so an inner section never
//! re-enables interrupts out from under an outer one. Sections must stay
//! short; the kernel never holds one across a context switch.

/// Disable interrupts and return the previous enable state.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline]
pub fn enter() -> u32 {
    let primask = cortex_m::register::primask::read();
    cortex_m::interrupt::disable();
    primask.is_active() as u32
}

/// Restore the interrupt state captured by the matching [`enter`].
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline]
pub fn leave(mask: u32) {
    if mask != 0 {
        unsafe { cortex_m::interrupt::enable() }
    }
}

// Off-target there are no interrupts to mask; a flag keeps the
// enter/leave contract observable so the portable code paths compile
// and run unchanged.
#[cfg(not(all(target_arch = "arm", target_os = "none")))]
static MASKED: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[inline]
pub fn enter() -> u32 {
    !MASKED.swap(true, core::sync::atomic::Ordering::Acquire) as u32
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[inline]
pub fn leave(mask: u32) {
    if mask != 0 {
        MASKED.store(false, core::sync::atomic::Ordering::Release);
    }
}

/// Run `f` inside a critical section.
#[inline]
pub fn with<R>(f: impl FnOnce() -> R) -> R {
    let mask = enter();
    let r = f();
    leave(mask);
    r
}
