//! A small preemptive RTOS kernel for single-core ARM Cortex-M
//! microcontrollers.
//!
//! Threads live in a fixed table and are scheduled by fixed priority
//! with round-robin inside a priority band, driven by a 1 kHz SysTick
//! and a PendSV trap that performs the actual register swap. On top of
//! the scheduler sit counting semaphores with FIFO unblocking, periodic
//! callbacks fired from the tick, aperiodic ISRs patched into a
//! RAM-resident vector table, and fixed-capacity word queues for
//! inter-thread data.
//!
//! Nothing is ever allocated: every table is sized at compile time (see
//! [`config`]) and the kernel's only failure modes are the [`Error`]
//! codes.
//!
//! ```ignore
//! #![no_std]
//! #![no_main]
//!
//! use cortex_m_rt::entry;
//!
//! fn producer() {
//!     loop {
//!         let sample = read_sensor();
//!         let _ = rondo::queue::write(0, sample);
//!         rondo::sleep(10);
//!     }
//! }
//!
//! fn consumer() {
//!     loop {
//!         let sample = rondo::queue::read(0);
//!         display(sample);
//!     }
//! }
//!
//! #[entry]
//! fn main() -> ! {
//!     rondo::init();
//!     rondo::queue::init(0);
//!     rondo::add_thread(producer, 50, "producer").unwrap();
//!     rondo::add_thread(consumer, 100, "consumer").unwrap();
//!     let err = rondo::launch(48_000_000);
//!     panic!("launch failed: {}", err);
//! }
//! ```
//!
//! The scheduler, tables, semaphores, and queues are portable code; only
//! the context-switch and interrupt plumbing is Cortex-M specific. Off
//! target, the same state machine is available as the [`Kernel`] type.

#![cfg_attr(not(test), no_std)]

mod arch;
pub mod config;
pub mod critical;
mod error;
mod kernel;
mod periodic;
pub mod queue;
pub mod sem;
mod tcb;
mod thread;

pub use error::Error;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use kernel::launch;
pub use kernel::{
    add_aperiodic, add_periodic, add_thread, current_id, init, kill_self, kill_thread, sleep,
    system_time, thread_count, yield_now, Kernel,
};
pub use sem::Semaphore;
pub use tcb::{Name, ThreadId};
