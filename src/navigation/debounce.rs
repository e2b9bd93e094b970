use std::time::{Duration, Instant};

/// Time of the last accepted controller action.
///
/// A held button is sampled on every tick; the clock turns that into one action
/// per `interval`. With a zero interval every tick may produce an action.
#[derive(Debug, Clone)]
pub struct DebounceClock {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl DebounceClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_accepted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn accept(&mut self, now: Instant) {
        self.last_accepted = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_SECOND: Duration = Duration::from_millis(500);

    #[test]
    fn first_action_is_always_accepted() {
        let clock = DebounceClock::new(HALF_SECOND);
        assert!(clock.is_ready(Instant::now()));
    }

    #[test]
    fn actions_inside_the_window_are_rejected() {
        let start = Instant::now();
        let mut clock = DebounceClock::new(HALF_SECOND);
        clock.accept(start);

        assert!(!clock.is_ready(start + Duration::from_millis(100)));
        assert!(!clock.is_ready(start + Duration::from_millis(499)));
        assert!(clock.is_ready(start + HALF_SECOND));
    }

    #[test]
    fn zero_interval_accepts_every_tick() {
        let start = Instant::now();
        let mut clock = DebounceClock::new(Duration::ZERO);
        clock.accept(start);
        assert!(clock.is_ready(start));
    }
}
