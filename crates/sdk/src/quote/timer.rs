use std::{future, time::Duration};

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Recurring countdown timer with explicit start, stop and reset.
///
/// While stopped, [`ExpiryTimer::tick`] never resolves, so the timer can sit
/// in a `select!` loop unconditionally. Dropping the timer cancels it.
#[derive(Debug)]
pub struct ExpiryTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl ExpiryTimer {
    pub fn new(period: Duration) -> Self { Self { period, interval: None } }

    pub fn is_running(&self) -> bool { self.interval.is_some() }

    /// Starts ticking one period from now. No-op if already running.
    pub fn start(&mut self) {
        if self.interval.is_none() {
            self.reset();
        }
    }

    pub fn stop(&mut self) { self.interval = None; }

    /// Restarts the cadence one period from now.
    pub fn reset(&mut self) {
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Waits for the next tick. Pending forever while stopped.
    ///
    /// Cancellation safe.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let mut timer = ExpiryTimer::new(Duration::from_secs(1));
        let start = Instant::now();
        timer.start();

        assert_eq!(timer.tick().await - start, Duration::from_secs(1));
        assert_eq!(timer.tick().await - start, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_timer_is_pending() {
        let mut timer = ExpiryTimer::new(Duration::from_secs(1));
        assert!(!timer.is_running());

        let res = time::timeout(Duration::from_secs(5), timer.tick()).await;
        assert!(res.is_err());

        timer.start();
        timer.stop();
        let res = time::timeout(Duration::from_secs(5), timer.tick()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_cadence() {
        let mut timer = ExpiryTimer::new(Duration::from_secs(1));
        timer.start();
        time::advance(Duration::from_millis(700)).await;

        timer.reset();
        let reset_at = Instant::now();
        assert_eq!(timer.tick().await - reset_at, Duration::from_secs(1));
    }
}
