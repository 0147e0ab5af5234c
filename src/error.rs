/// Kernel error codes.
///
/// Every fallible operation returns `Result<_, Error>`; the kernel never
/// allocates, so these are the only failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thread table is full.
    ThreadLimitReached,
    /// The periodic-event table is full.
    PeriodicLimitReached,
    /// The semaphore pool is exhausted.
    SemaphoreLimitReached,
    /// `launch` was called with an empty thread table.
    NoThreadsScheduled,
    /// The alive ring does not match the set of alive slots.
    InconsistentAlive,
    /// No alive thread carries the requested id.
    NoSuchThread,
    /// Killing the target would leave the table empty.
    CannotKillLast,
    /// Aperiodic irq number outside the installable range.
    IrqOutOfRange,
    /// Aperiodic priority inside the kernel-reserved band.
    HwiPriorityInvalid,
    /// Write to a full queue; the word was dropped and counted.
    QueueFull,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::ThreadLimitReached => write!(f, "thread table full"),
            Error::PeriodicLimitReached => write!(f, "periodic table full"),
            Error::SemaphoreLimitReached => write!(f, "semaphore pool exhausted"),
            Error::NoThreadsScheduled => write!(f, "no threads scheduled"),
            Error::InconsistentAlive => write!(f, "alive ring inconsistent"),
            Error::NoSuchThread => write!(f, "no such thread"),
            Error::CannotKillLast => write!(f, "cannot kill last thread"),
            Error::IrqOutOfRange => write!(f, "irq out of range"),
            Error::HwiPriorityInvalid => write!(f, "aperiodic priority reserved"),
            Error::QueueFull => write!(f, "queue full"),
        }
    }
}
