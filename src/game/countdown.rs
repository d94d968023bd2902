use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30 * 60);

/// Game clock. Runs on tokio time so tests can pause it.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    deadline: Instant,
}

impl Countdown {
    pub fn start(limit: Duration) -> Self {
        Self {
            deadline: Instant::now() + limit,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Resolves when the clock runs out.
    pub fn expiry(&self) -> Sleep {
        sleep_until(self.deadline)
    }

    pub fn clock(&self) -> String {
        format_clock(self.remaining().as_secs())
    }
}

/// `MM:SS`, minutes not wrapped at the hour.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(30 * 60), "30:00");
        assert_eq!(format_clock(125 * 60 + 7), "125:07");
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_and_expires() {
        let countdown = Countdown::start(Duration::from_secs(90));
        assert_eq!(countdown.clock(), "01:30");
        assert!(!countdown.expired());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(countdown.clock(), "00:29");

        countdown.expiry().await;
        assert!(countdown.expired());
        assert_eq!(countdown.remaining(), Duration::ZERO);
    }
}
