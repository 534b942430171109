use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Mutex,
    time::{Duration, Instant},
};

// Expired slots are only swept once the map grows past this bound so that
// ordinary traffic never pays for the sweep.
const EVICTION_THRESHOLD: usize = 10_000;

/// Fixed-window request limiter keyed by client address.
///
/// Best effort by design: counters live in process memory and do not survive
/// restarts. The purpose is coarse abuse damping (order flooding, order
/// number enumeration), not hard quota enforcement.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

struct Slot {
    count: usize,
    window_end: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether the request identified by `key` may proceed. Check and
    /// increment happen under one lock so concurrent arrivals cannot
    /// under-count.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut slots = self.slots.lock().unwrap();
        if slots.len() >= EVICTION_THRESHOLD {
            slots.retain(|_, slot| slot.window_end > now);
        }
        match slots.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if now >= slot.window_end {
                    *slot = Slot {
                        count: 1,
                        window_end: now + self.window,
                    };
                    true
                } else if slot.count < self.max_requests {
                    slot.count += 1;
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Slot {
                    count: 1,
                    window_end: now + self.window,
                });
                true
            }
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn denies_above_ceiling_within_window() {
        let limiter = RateLimiter::new(5, WINDOW);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.allow_at("1.2.3.4", now));
        }
        assert!(!limiter.allow_at("1.2.3.4", now));
        // Denials do not increment; the slot stays at the ceiling.
        assert!(!limiter.allow_at("1.2.3.4", now));
    }

    #[test]
    fn window_elapse_resets_the_count() {
        let limiter = RateLimiter::new(5, WINDOW);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.allow_at("1.2.3.4", now));
        }
        assert!(!limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("1.2.3.4", now + WINDOW));
        assert!(limiter.allow_at("1.2.3.4", now + WINDOW));
    }

    #[test]
    fn clients_are_limited_independently() {
        let limiter = RateLimiter::new(1, WINDOW);
        let now = Instant::now();
        assert!(limiter.allow_at("1.2.3.4", now));
        assert!(!limiter.allow_at("1.2.3.4", now));
        assert!(limiter.allow_at("5.6.7.8", now));
        assert!(limiter.allow_at("unknown", now));
    }

    #[test]
    fn expired_slots_are_evicted_once_the_map_grows() {
        let limiter = RateLimiter::new(1, WINDOW);
        let now = Instant::now();
        for i in 0..EVICTION_THRESHOLD {
            assert!(limiter.allow_at(&format!("client-{}", i), now));
        }
        assert_eq!(limiter.tracked_clients(), EVICTION_THRESHOLD);
        // All previous windows have elapsed, so the next request sweeps them.
        assert!(limiter.allow_at("fresh", now + WINDOW));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
