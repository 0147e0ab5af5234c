//! Inert stubs for builds without the Cortex-M trap machinery. The
//! portable tables behave identically; a context-switch request simply
//! has no one to switch.

pub(crate) fn trigger_context_switch() {}

pub(crate) fn wait_for_interrupt() {
    core::hint::spin_loop();
}

pub(crate) fn init_vectors() {}

pub(crate) fn install_isr(_irq: u8, _isr: extern "C" fn(), _priority: u8) {}
