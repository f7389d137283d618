use std::time::Duration;

use tokio::time::Instant;

/// The sampling period of every attachment.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use creo_stats::monitor::Resolution;
/// assert_eq!(Resolution::from_secs(0).period(), Duration::from_secs(10));
/// assert_eq!(Resolution::from_secs(2).period(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution(Duration);

impl Resolution {
    pub const DEFAULT_SECS: u64 = 10;

    /// The longest accepted period, one day.
    pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

    /// Creates a resolution of `secs` seconds; `0` selects the default.
    pub fn from_secs(secs: u64) -> Self {
        Self::from_period(Duration::from_secs(secs))
    }

    /// Creates a resolution from an arbitrary period. A zero period selects the default,
    /// longer periods than [`Resolution::MAX_PERIOD`] are capped.
    pub fn from_period(period: Duration) -> Self {
        if period.is_zero() {
            Self::default()
        } else {
            Self(period.min(Self::MAX_PERIOD))
        }
    }

    pub fn period(&self) -> Duration {
        self.0
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self(Duration::from_secs(Self::DEFAULT_SECS))
    }
}

/// A non-blocking periodic gate.
///
/// The first tick becomes pending one period after creation. [`Ticker::check`] consumes
/// a pending tick; ticks missed in between collapse into one.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(resolution: Resolution) -> Self {
        let period = resolution.period();
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Returns `true` if a tick fired since the last accepted check.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if now < self.next {
            return false;
        }

        // keep the tick grid: next tick is the first grid point after `now`
        let late = (now - self.next).as_nanos() % self.period.as_nanos();
        self.next = now + self.period - Duration::from_nanos(late as u64);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_defaults() {
        assert_eq!(Resolution::default().period(), Duration::from_secs(10));
        assert_eq!(Resolution::from_period(Duration::ZERO), Resolution::default());
        assert_eq!(
            Resolution::from_period(Duration::from_millis(250)).period(),
            Duration::from_millis(250)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_resolution_is_capped() {
        let resolution = Resolution::from_secs(u64::MAX);
        assert_eq!(resolution.period(), Resolution::MAX_PERIOD);

        let mut ticker = Ticker::new(resolution);
        assert!(!ticker.check());
        tokio::time::advance(Resolution::MAX_PERIOD).await;
        assert!(ticker.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut ticker = Ticker::new(Resolution::from_secs(10));
        assert!(!ticker.check());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!ticker.check());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(ticker.check());
        assert!(!ticker.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_collapse() {
        let mut ticker = Ticker::new(Resolution::from_secs(1));

        tokio::time::advance(Duration::from_millis(3500)).await;
        assert!(ticker.check());
        assert!(!ticker.check());

        // next grid point is at 4s
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(!ticker.check());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(ticker.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_pass_per_period() {
        let mut ticker = Ticker::new(Resolution::from_secs(1));
        let mut passed = 0;
        // 100 checks over 10 seconds
        for _ in 0..100 {
            tokio::time::advance(Duration::from_millis(100)).await;
            if ticker.check() {
                passed += 1;
            }
        }
        assert_eq!(passed, 10);
    }
}
