// Periodic events: firing cadence, registration-relative start, the
// equal-period stagger, and table capacity.

use std::sync::atomic::{AtomicU32, Ordering};

use rondo::{Error, Kernel};

#[test]
fn harmonic_periods_fire_on_their_own_cadence() {
    static FIRES_7: AtomicU32 = AtomicU32::new(0);
    static FIRES_14: AtomicU32 = AtomicU32::new(0);
    fn every_7() {
        FIRES_7.fetch_add(1, Ordering::Relaxed);
    }
    fn every_14() {
        FIRES_14.fetch_add(1, Ordering::Relaxed);
    }

    let mut k = Kernel::new();
    k.add_periodic(every_7, 7).unwrap();
    k.add_periodic(every_14, 14).unwrap();

    let mut collisions = 0;
    for _ in 0..140 {
        let a = FIRES_7.load(Ordering::Relaxed);
        let b = FIRES_14.load(Ordering::Relaxed);
        k.tick();
        if FIRES_7.load(Ordering::Relaxed) > a && FIRES_14.load(Ordering::Relaxed) > b {
            collisions += 1;
        }
    }
    assert_eq!(FIRES_7.load(Ordering::Relaxed), 20);
    assert_eq!(FIRES_14.load(Ordering::Relaxed), 10);
    assert!(collisions <= 10);
}

#[test]
fn equal_periods_are_staggered() {
    static FIRST: AtomicU32 = AtomicU32::new(0);
    static SECOND: AtomicU32 = AtomicU32::new(0);
    fn first() {
        FIRST.fetch_add(1, Ordering::Relaxed);
    }
    fn second() {
        SECOND.fetch_add(1, Ordering::Relaxed);
    }

    let mut k = Kernel::new();
    k.add_periodic(first, 10).unwrap();
    k.add_periodic(second, 10).unwrap();

    // The second entry is phase shifted by its slot index, so the two
    // stay off each other's ticks until the shifted cadences realign.
    for _ in 0..100 {
        let a = FIRST.load(Ordering::Relaxed);
        let b = SECOND.load(Ordering::Relaxed);
        k.tick();
        assert!(
            !(FIRST.load(Ordering::Relaxed) > a && SECOND.load(Ordering::Relaxed) > b),
            "both fired on tick {}",
            k.system_time()
        );
    }
    assert_eq!(FIRST.load(Ordering::Relaxed), 10);
    assert!(SECOND.load(Ordering::Relaxed) >= 8);
}

#[test]
fn first_fire_is_one_period_after_registration() {
    static FIRES: AtomicU32 = AtomicU32::new(0);
    fn bump() {
        FIRES.fetch_add(1, Ordering::Relaxed);
    }

    let mut k = Kernel::new();
    for _ in 0..5 {
        k.tick();
    }
    k.add_periodic(bump, 7).unwrap();

    for _ in 0..6 {
        k.tick();
    }
    assert_eq!(FIRES.load(Ordering::Relaxed), 0);
    k.tick(); // tick 12 = 5 + 7
    assert_eq!(FIRES.load(Ordering::Relaxed), 1);
}

#[test]
fn periodic_table_is_bounded() {
    fn h() {}

    let mut k = Kernel::new();
    for _ in 0..rondo::config::MAX_PERIODIC {
        k.add_periodic(h, 11).unwrap();
    }
    assert_eq!(k.add_periodic(h, 11), Err(Error::PeriodicLimitReached));
}
