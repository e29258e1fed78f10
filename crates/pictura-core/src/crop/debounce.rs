use std::time::{Duration, Instant};

/// Single-flight scheduled task.
///
/// At most one deadline is pending. Scheduling again replaces it, cancelling
/// clears it, and [`fire`](Self::fire) consumes it once due. The owner drives
/// time by passing `now`, so event loops can sleep until
/// [`deadline`](Self::deadline) and tests stay deterministic.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)schedule the task `delay` after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending deadline if it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reschedule_replaces_pending_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.schedule(t0);
        d.schedule(t0 + Duration::from_millis(60));

        assert!(!d.fire(t0 + Duration::from_millis(120)));
        assert!(d.fire(t0 + Duration::from_millis(160)));
        assert!(!d.fire(t0 + Duration::from_millis(500)));
    }

    #[test]
    fn cancel_drops_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.schedule(t0);
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.fire(t0 + Duration::from_secs(1)));
    }
}
