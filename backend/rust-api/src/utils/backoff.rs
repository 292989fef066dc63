use std::time::Duration;

/// Fixed waits between repeated attempts against the same target.
///
/// Entry `i` is the wait before attempt `i` (zero-based); entry 0 is never
/// slept because the first attempt runs immediately. The schedule length is
/// the attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_millis(&[0, 600, 1500])
    }
}

impl BackoffSchedule {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(millis: &[u64]) -> Self {
        Self::new(millis.iter().copied().map(Duration::from_millis).collect())
    }

    /// Attempt budget per target, never below one.
    pub fn max_attempts(&self) -> usize {
        self.delays.len().max(1)
    }

    /// Wait before the given zero-based attempt, or `None` once the budget is spent.
    pub fn delay_before(&self, attempt: usize) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        self.delays.get(attempt).copied()
    }

    /// Upper bound on time spent sleeping for one target.
    pub fn total_wait(&self) -> Duration {
        self.delays.iter().skip(1).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_allows_three_attempts() {
        let schedule = BackoffSchedule::default();
        assert_eq!(schedule.max_attempts(), 3);
        assert_eq!(schedule.delay_before(0), Some(Duration::ZERO));
        assert_eq!(schedule.delay_before(1), Some(Duration::from_millis(600)));
        assert_eq!(schedule.delay_before(2), Some(Duration::from_millis(1500)));
        assert_eq!(schedule.delay_before(3), None);
        assert_eq!(schedule.total_wait(), Duration::from_millis(2100));
    }

    #[test]
    fn empty_schedule_still_allows_one_attempt() {
        let schedule = BackoffSchedule::new(vec![]);
        assert_eq!(schedule.max_attempts(), 1);
        assert_eq!(schedule.delay_before(0), Some(Duration::ZERO));
        assert_eq!(schedule.delay_before(1), None);
    }
}
