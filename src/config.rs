//! Compile-time sizing and rate constants.
//!
//! Every table in the kernel is a fixed array sized here; nothing is
//! allocated at runtime. Changing a constant changes the memory footprint
//! of the `Kernel` state object and nothing else.

/// Capacity of the thread table. One slot is taken by the idle thread
/// that [`launch`](crate::launch) creates.
pub const MAX_THREADS: usize = 23;

/// Words per thread stack. Stacks grow downward; the initial context
/// occupies the top 16 words.
pub const STACK_WORDS: usize = 512;

/// Capacity of the periodic-event table.
pub const MAX_PERIODIC: usize = 6;

/// Number of inter-thread word queues.
pub const MAX_QUEUES: usize = 4;

/// Words per queue ring buffer.
pub const QUEUE_CAP: usize = 16;

/// Capacity of the semaphore pool. The first `2 * MAX_QUEUES` slots are
/// reserved as the queues' mutex/count pairs; the rest are handed out by
/// [`sem::create`](crate::sem::create).
pub const MAX_SEMAPHORES: usize = 32;

/// Pool slots reserved for queue semaphores.
pub(crate) const QUEUE_SEM_SLOTS: usize = 2 * MAX_QUEUES;

/// Maximum stored length of a thread name; longer names are truncated.
pub const MAX_NAME_LEN: usize = 16;

/// Priority of the kernel-created idle thread. Numerically larger is less
/// urgent; nothing else should use this level.
pub const IDLE_PRIORITY: u8 = 255;

/// Lowest NVIC priority value an aperiodic ISR may request. Levels 0..=5
/// are reserved for the kernel's own traps.
pub const APERIODIC_MIN_PRIORITY: u8 = 6;

/// Number of installable hardware interrupt lines.
pub const NUM_IRQS: u8 = 64;

/// Priority bits the NVIC implements on the supported parts; priority
/// values occupy the top bits of each priority byte.
pub const NVIC_PRIO_BITS: u32 = 3;

/// System tick rate. The tick is the unit of `SystemTime`, sleep
/// durations, and periodic-event periods.
pub const TICK_HZ: u32 = 1_000;

/// Longest accepted sleep. Half the tick-counter range, so that the
/// wrap-aware wake comparison stays unambiguous.
pub const MAX_SLEEP_TICKS: u32 = u32::MAX / 2;
