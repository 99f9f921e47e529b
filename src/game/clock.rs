use std::time::Duration;

/// Timer that stays active for a fixed duration after being started.
/// Advanced explicitly with [`Cooldown::tick`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Cooldown {
    duration: Duration,
    remaining: Duration,
}

impl Cooldown {

    pub fn new(duration: Duration) -> Self {
        Self { duration, remaining: Duration::ZERO }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Restarts the timer, even if it is already running.
    pub fn start(&mut self) {
        self.remaining = self.duration;
    }

    pub fn is_active(&self) -> bool {
        !self.remaining.is_zero()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Advances the timer.
    /// Returns true on the tick that finishes it.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.remaining.is_zero() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(delta);
        self.remaining.is_zero()
    }
}


#[cfg(test)]
mod test {
    use std::time::Duration;
    use crate::game::Cooldown;

    #[test]
    fn finishes_once() {
        let mut cooldown = Cooldown::from_millis(100);
        assert!(!cooldown.is_active());
        assert!(!cooldown.tick(Duration::from_millis(50)));

        cooldown.start();
        assert!(cooldown.is_active());
        assert!(!cooldown.tick(Duration::from_millis(60)));
        assert!(cooldown.tick(Duration::from_millis(60)));
        assert!(!cooldown.is_active());
        assert!(!cooldown.tick(Duration::from_millis(60)));
    }

    #[test]
    fn zero_duration_never_activates() {
        let mut cooldown = Cooldown::new(Duration::ZERO);
        cooldown.start();
        assert!(!cooldown.is_active());
    }
}
