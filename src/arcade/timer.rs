//! Hysteresis timer: an accumulator that is either stopped or counting up from zero.

/// `None` means "not running". A running timer only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer(Option<f32>);

impl Timer {
    pub const STOPPED: Timer = Timer(None);

    /// (Re)start at zero.
    pub fn start(&mut self) {
        self.0 = Some(0.0);
    }

    pub fn stop(&mut self) {
        self.0 = None;
    }

    pub fn is_running(&self) -> bool {
        self.0.is_some()
    }

    pub fn elapsed(&self) -> Option<f32> {
        self.0
    }

    /// Advance a running timer. Stopped timers stay stopped.
    pub fn tick(&mut self, dt: f32) {
        if let Some(t) = self.0.as_mut() {
            *t += dt.max(0.0);
        }
    }

    /// Start if stopped, otherwise advance. Returns the elapsed time afterwards.
    pub fn start_or_tick(&mut self, dt: f32) -> f32 {
        match self.0 {
            None => {
                self.start();
                0.0
            }
            Some(_) => {
                self.tick(dt);
                self.0.unwrap_or(0.0)
            }
        }
    }

    /// True once a running timer has reached `threshold`.
    pub fn reached(&self, threshold: f32) -> bool {
        self.0.is_some_and(|t| t >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_does_not_advance() {
        let mut t = Timer::default();
        t.tick(1.0);
        assert_eq!(t.elapsed(), None);
        assert!(!t.reached(0.0));
    }

    #[test]
    fn start_or_tick_starts_at_zero_then_accumulates() {
        let mut t = Timer::STOPPED;
        assert_eq!(t.start_or_tick(0.5), 0.0);
        assert_eq!(t.start_or_tick(0.5), 0.5);
        assert_eq!(t.start_or_tick(0.25), 0.75);
        assert!(t.reached(0.75));
        t.stop();
        assert!(!t.is_running());
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut t = Timer::STOPPED;
        t.start();
        t.tick(-1.0);
        assert_eq!(t.elapsed(), Some(0.0));
    }
}
