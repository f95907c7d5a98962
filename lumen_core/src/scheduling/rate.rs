use crate::error::{LumenError, LumenResult};
use std::time::{Duration, Instant};

/// Fixed-period sleep schedule.
///
/// Deadlines advance by one period per [`wait`](RateTimer::wait). When a
/// cycle overruns its deadline the schedule restarts from the current time
/// instead of bursting to catch up.
#[derive(Debug)]
pub struct RateTimer {
    period: Duration,
    next: Instant,
    overruns: u64,
}

impl RateTimer {
    pub fn new(rate_hz: f64) -> LumenResult<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(LumenError::InvalidParameter(format!(
                "rate must be a positive frequency, got {} Hz",
                rate_hz
            )));
        }
        let period = Duration::try_from_secs_f64(1.0 / rate_hz).map_err(|e| {
            LumenError::InvalidParameter(format!("rate of {} Hz has no usable period: {}", rate_hz, e))
        })?;
        Ok(Self::from_period(period))
    }

    pub fn from_period(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now(),
            overruns: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of cycles that missed their deadline so far
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Restart the schedule from now
    pub fn reset(&mut self) {
        self.next = Instant::now();
    }

    /// Sleep until the next deadline. Returns `true` if the deadline had
    /// already passed (the schedule was reset instead of sleeping).
    pub fn wait(&mut self) -> bool {
        self.next += self.period;
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            false
        } else {
            self.next = now;
            self.overruns += 1;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_rate() {
        assert!(RateTimer::new(0.0).is_err());
        assert!(RateTimer::new(-5.0).is_err());
        assert!(RateTimer::new(f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_rate_with_unrepresentable_period() {
        assert!(matches!(
            RateTimer::new(1e-20),
            Err(LumenError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_period_from_rate() {
        let timer = RateTimer::new(100.0).unwrap();
        assert_eq!(timer.period(), Duration::from_millis(10));
    }

    #[test]
    fn test_wait_sleeps_roughly_one_period() {
        let mut timer = RateTimer::new(200.0).unwrap();
        let start = Instant::now();
        for _ in 0..4 {
            timer.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_overrun_resets_schedule() {
        let mut timer = RateTimer::from_period(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(50));

        // Only the first wait overruns; the schedule restarts instead of
        // trying to make up the missed periods.
        assert!(timer.wait());
        assert_eq!(timer.overruns(), 1);
        assert!(!timer.wait());
        assert_eq!(timer.overruns(), 1);
    }
}
