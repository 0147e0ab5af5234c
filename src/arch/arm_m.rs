//! Cortex-M port: SysTick, the PendSV context-switch trap, vector-table
//! relocation, and NVIC plumbing.
//!
//! The `SysTick` and `PendSV` symbols defined here land in the vector
//! table through the runtime crate's default handlers; `init_vectors`
//! then copies that table to RAM so aperiodic handlers can be patched in
//! at runtime.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{NVIC, SCB};

use crate::config::{NUM_IRQS, NVIC_PRIO_BITS, TICK_HZ};
use crate::kernel::KERNEL;

/// Pend the context-switch trap. It runs at the lowest priority, so the
/// actual switch happens once no other handler is active.
#[inline]
pub(crate) fn trigger_context_switch() {
    SCB::set_pendsv();
}

#[inline]
pub(crate) fn wait_for_interrupt() {
    cortex_m::asm::wfi();
}

const VECTOR_WORDS: usize = 16 + NUM_IRQS as usize;

// VTOR requires alignment to the next power of two above the table size.
#[repr(align(512))]
struct VectorTable([u32; VECTOR_WORDS]);

static mut RAM_VECTORS: VectorTable = VectorTable([0; VECTOR_WORDS]);

/// Copy the active vector table into RAM and retarget VTOR at it, so
/// `install_isr` can patch individual entries.
pub(crate) fn init_vectors() {
    unsafe {
        let scb = &*SCB::PTR;
        let src = scb.vtor.read() as *const u32;
        let dst = core::ptr::addr_of_mut!(RAM_VECTORS.0) as *mut u32;
        core::ptr::copy_nonoverlapping(src, dst, VECTOR_WORDS);
        scb.vtor.write(dst as u32);
    }
}

#[derive(Clone, Copy)]
struct Irq(u8);

unsafe impl cortex_m::interrupt::InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0 as u16
    }
}

const NVIC_IPR_BASE: *mut u8 = 0xE000_E400 as *mut u8;

/// Patch the RAM vector entry for `irq`, set its NVIC priority, and
/// enable the line. Callers have already validated both arguments.
pub(crate) fn install_isr(irq: u8, isr: extern "C" fn(), priority: u8) {
    unsafe {
        (*core::ptr::addr_of_mut!(RAM_VECTORS.0))[16 + irq as usize] = isr as usize as u32;
        // Hardware implements the top NVIC_PRIO_BITS of each priority byte.
        let raw = ((priority as u32) << (8 - NVIC_PRIO_BITS)) as u8;
        core::ptr::write_volatile(NVIC_IPR_BASE.add(irq as usize), raw);
        NVIC::unmask(Irq(irq));
    }
}

/// Configure the tick timer from the core clock.
pub(crate) fn setup_systick(core_clock_hz: u32) {
    let mut syst = unsafe { cortex_m::Peripherals::steal() }.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(core_clock_hz / TICK_HZ - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;

/// SysTick to the highest configurable priority, PendSV to the lowest:
/// the tick preempts everything, the switch trap preempts nothing.
pub(crate) fn set_trap_priorities() {
    unsafe {
        // SHPR3: SysTick priority in [31:24], PendSV in [23:16].
        let v = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, (v & 0x0000_FFFF) | 0x00FF_0000);
    }
}

/// Start the first thread from its seeded frame: restore R4-R11, point
/// PSP at the hardware frame, switch thread mode onto PSP, then pop the
/// frame by hand and jump to the entry point.
pub(crate) unsafe fn start_first_thread(sp: usize) -> ! {
    core::arch::asm!(
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",
        "movs r0, #2",
        "msr control, r0",
        "isb",
        "pop {{r0-r3, r12, lr}}",
        "pop {{r4, r5}}", // PC and xPSR; the processor state is rebuilt on entry
        "cpsie i",
        "bx r4",
        in("r0") sp,
        options(noreturn),
    );
}

// The switch trap: stack R4-R11 under the hardware frame on the
// outgoing process stack, let the scheduler swap stack pointers, then
// unstack for the incoming thread. Exception return through 0xFFFFFFFD
// resumes the incoming thread from its hardware frame.
core::arch::global_asm!(
    ".syntax unified",
    ".thumb_func",
    ".global PendSV",
    "PendSV:",
    "cpsid i",
    "mrs r0, psp",
    "stmdb r0!, {{r4-r11}}",
    "bl pendsv_switch",
    "ldmia r0!, {{r4-r11}}",
    "msr psp, r0",
    "mvn lr, #2", // EXC_RETURN 0xFFFFFFFD: thread mode, process stack
    "cpsie i",
    "bx lr",
);

/// Called from the PendSV stub with the outgoing PSP; returns the PSP to
/// resume. Skips the switch if the kernel lock is somehow held.
#[no_mangle]
extern "C" fn pendsv_switch(psp: u32) -> u32 {
    match KERNEL.try_lock() {
        Some(mut k) => k.switch_context(psp as usize) as u32,
        None => psp,
    }
}

/// The tick: advance time and collect due periodic callbacks under the
/// kernel lock, run the callbacks outside it (they may signal semaphores
/// or write queues), wake sleepers, then pend the switch trap.
#[allow(non_snake_case)]
#[no_mangle]
extern "C" fn SysTick() {
    let due = match KERNEL.try_lock() {
        Some(mut k) => k.tick_advance(),
        None => heapless::Vec::new(),
    };
    for handler in due {
        handler();
    }
    if let Some(mut k) = KERNEL.try_lock() {
        k.tick_wake();
    }
    trigger_context_switch();
}
