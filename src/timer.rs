/**
 * The countdown used by timed quizzes.
 *
 * `Countdown` only knows about ticks. `ClockDriver` turns wall-clock time into ticks so
 * the command-line interface can poll the countdown. Input is read until the driver's
 * deadline, so the countdown expires even while the user is at the prompt.
 */
use std::time;


/// What a single tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running(u64),
    /// The countdown reached zero on this tick. Reported exactly once.
    Expired,
    /// The countdown had already expired or was cancelled.
    Idle,
}


#[derive(Debug)]
pub struct Countdown {
    remaining: u64,
    active: bool,
}


impl Countdown {
    pub fn new(seconds: u64) -> Self {
        Countdown { remaining: seconds, active: true }
    }

    pub fn tick(&mut self) -> Tick {
        if !self.active {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// Stop the countdown. Later ticks do nothing.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining())
    }
}


/// Format a number of seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}


/// Drives a `Countdown` from a monotonic clock, one tick per elapsed second.
pub struct ClockDriver {
    countdown: Countdown,
    started: time::Instant,
    ticks_applied: u64,
}


impl ClockDriver {
    pub fn start(seconds: u64) -> Self {
        ClockDriver {
            countdown: Countdown::new(seconds),
            started: time::Instant::now(),
            ticks_applied: 0,
        }
    }

    /// Apply every tick that has elapsed since the last poll. Return `true` if the
    /// countdown expired during this poll.
    pub fn poll(&mut self) -> bool {
        if !self.countdown.is_active() {
            return false;
        }
        let elapsed = self.started.elapsed().as_secs();
        self.advance_to(elapsed)
    }

    fn advance_to(&mut self, elapsed: u64) -> bool {
        let mut expired = false;
        while self.ticks_applied < elapsed {
            self.ticks_applied += 1;
            if self.countdown.tick() == Tick::Expired {
                expired = true;
            }
        }
        expired
    }

    /// When the countdown will expire, or `None` once it has expired or been cancelled.
    pub fn deadline(&self) -> Option<time::Instant> {
        if !self.countdown.is_active() {
            return None;
        }
        let total = self.ticks_applied + self.countdown.remaining();
        Some(self.started + time::Duration::from_secs(total))
    }

    pub fn cancel(&mut self) {
        self.countdown.cancel();
    }

    pub fn display(&self) -> String {
        self.countdown.display()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_exactly_once() {
        let mut countdown = Countdown::new(5);
        let mut expirations = 0;
        for _ in 0..5 {
            if countdown.tick() == Tick::Expired {
                expirations += 1;
            }
            assert!(!countdown.display().starts_with('-'));
        }
        assert_eq!(expirations, 1);
        assert_eq!(countdown.display(), "00:00");

        // A stray tick after expiry must not fire again or go negative.
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.display(), "00:00");
    }

    #[test]
    fn countdown_reports_remaining_time() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), Tick::Running(2));
        assert_eq!(countdown.tick(), Tick::Running(1));
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(!countdown.is_active());
    }

    #[test]
    fn cancelled_countdown_never_expires() {
        let mut countdown = Countdown::new(2);
        countdown.tick();
        countdown.cancel();
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining(), 1);
    }

    #[test]
    fn zero_second_countdown_expires_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.display(), "00:00");
    }

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(3600), "60:00");
        assert_eq!(format_clock(605), "10:05");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(Countdown::new(61).display(), "01:01");
    }

    #[test]
    fn driver_catches_up_on_missed_ticks() {
        let mut driver = ClockDriver::start(5);
        assert!(!driver.advance_to(2));
        assert_eq!(driver.display(), "00:03");
        assert!(driver.advance_to(9));
        assert_eq!(driver.display(), "00:00");
        assert!(!driver.advance_to(12));
    }

    #[test]
    fn driver_deadline_is_fixed_until_expiry() {
        let mut driver = ClockDriver::start(5);
        let deadline = driver.deadline().unwrap();
        assert_eq!(deadline, driver.started + time::Duration::from_secs(5));

        driver.advance_to(2);
        assert_eq!(driver.deadline(), Some(deadline));

        driver.advance_to(5);
        assert_eq!(driver.deadline(), None);

        let mut driver = ClockDriver::start(5);
        driver.cancel();
        assert_eq!(driver.deadline(), None);
    }

    #[test]
    fn cancelled_driver_does_not_expire() {
        let mut driver = ClockDriver::start(1);
        driver.cancel();
        assert!(!driver.advance_to(5));
    }
}
