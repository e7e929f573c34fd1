use serde::Deserialize;
use std::time::Duration;

/// Shape of the penalty once the failure threshold is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffGrowth {
    /// `interval + step * failures`
    Linear,
    /// `interval * 2^(failures - penalty_after + 1)`
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Normal poll interval, also the lower bound of every delay
    pub interval: Duration,
    /// Consecutive failures tolerated before the delay grows
    pub penalty_after: u32,
    pub step: Duration,
    pub max_delay: Duration,
    pub growth: BackoffGrowth,
}

impl BackoffPolicy {
    /// Delay before the next cycle after `failures` consecutive failed cycles.
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures < self.penalty_after {
            return self.interval;
        }

        let grown = match self.growth {
            BackoffGrowth::Linear => self.interval.saturating_add(self.step.saturating_mul(failures)),
            BackoffGrowth::Exponential => {
                let doublings = (failures - self.penalty_after + 1).min(31);
                self.interval.saturating_mul(1u32 << doublings)
            }
        };

        grown.min(self.max_delay).max(self.interval)
    }
}

/// Tracks consecutive cycle failures and turns them into a sleep duration.
#[derive(Debug, Clone)]
pub struct BackoffController {
    policy: BackoffPolicy,
    failures: u32,
}

impl BackoffController {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, failures: 0 }
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn next_delay(&self) -> Duration {
        self.policy.delay_for(self.failures)
    }

    /// True when the next delay is longer than the normal interval
    pub fn is_penalized(&self) -> bool {
        self.next_delay() > self.policy.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(growth: BackoffGrowth) -> BackoffPolicy {
        BackoffPolicy {
            interval: Duration::from_secs(120),
            penalty_after: 3,
            step: Duration::from_secs(120),
            max_delay: Duration::from_secs(720),
            growth,
        }
    }

    #[test]
    fn below_threshold_polls_at_normal_speed() {
        let p = policy(BackoffGrowth::Linear);
        for failures in 0..3 {
            assert_eq!(p.delay_for(failures), Duration::from_secs(120));
        }
    }

    #[test]
    fn linear_growth_is_capped() {
        let p = policy(BackoffGrowth::Linear);
        assert_eq!(p.delay_for(3), Duration::from_secs(480));
        assert_eq!(p.delay_for(4), Duration::from_secs(600));
        assert_eq!(p.delay_for(5), Duration::from_secs(720));
        assert_eq!(p.delay_for(50), Duration::from_secs(720));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(720));
    }

    #[test]
    fn exponential_growth_is_capped() {
        let p = policy(BackoffGrowth::Exponential);
        assert_eq!(p.delay_for(3), Duration::from_secs(240));
        assert_eq!(p.delay_for(4), Duration::from_secs(480));
        assert_eq!(p.delay_for(5), Duration::from_secs(720));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(720));
    }

    #[test]
    fn delays_never_decrease_and_never_drop_below_interval() {
        for growth in [BackoffGrowth::Linear, BackoffGrowth::Exponential] {
            let p = policy(growth);
            let mut last = Duration::ZERO;
            for failures in 0..40 {
                let delay = p.delay_for(failures);
                assert!(delay >= last);
                assert!(delay >= p.interval);
                assert!(delay <= p.max_delay);
                last = delay;
            }
        }
    }

    #[test]
    fn max_below_interval_still_returns_interval() {
        let p = BackoffPolicy {
            max_delay: Duration::from_secs(10),
            ..policy(BackoffGrowth::Linear)
        };
        assert_eq!(p.delay_for(10), Duration::from_secs(120));
    }

    #[test]
    fn success_resets_to_normal_interval() {
        let mut controller = BackoffController::new(policy(BackoffGrowth::Linear));
        for _ in 0..4 {
            controller.record_failure();
        }
        assert!(controller.is_penalized());

        controller.record_success();
        assert_eq!(controller.failures(), 0);
        assert_eq!(controller.next_delay(), Duration::from_secs(120));
    }
}
