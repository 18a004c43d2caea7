//! Conversion of real frame time into whole simulation ticks.

use std::time::Duration;

/// Real time represented by one tick when nothing else is configured: one
/// fifteenth of a second, rounded down.
pub const DEFAULT_TICK_DURATION: Duration = Duration::from_nanos(66_666_666);

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// Game clock counting whole minutes, one per tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clock {
    tick_duration: Duration,
    accumulated: Duration,
    minutes: u64,
}

impl Clock {
    /// Creates a clock at minute zero.
    #[must_use]
    pub const fn new(tick_duration: Duration) -> Self {
        Self {
            tick_duration,
            accumulated: Duration::ZERO,
            minutes: 0,
        }
    }

    /// Adds real time and returns how many whole ticks it produced.
    ///
    /// Any remainder smaller than a tick is kept for the next call.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.tick_duration.is_zero() {
            return 0;
        }

        self.accumulated = self.accumulated.saturating_add(dt);
        let whole = self.accumulated.as_nanos() / self.tick_duration.as_nanos();
        let ticks = u32::try_from(whole).unwrap_or(u32::MAX);
        self.accumulated -= self.tick_duration * ticks;
        self.minutes = self.minutes.saturating_add(u64::from(ticks));
        ticks
    }

    /// Real time converted into one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Changes the real time converted into one tick, keeping the remainder.
    pub fn set_tick_duration(&mut self, tick_duration: Duration) {
        self.tick_duration = tick_duration;
    }

    /// Real time accumulated towards the next tick.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Total elapsed game time in minutes.
    #[must_use]
    pub const fn minutes(&self) -> u64 {
        self.minutes
    }

    pub(crate) fn set_minutes(&mut self, minutes: u64) {
        self.minutes = minutes;
        self.accumulated = Duration::ZERO;
    }

    /// Minute within the current hour, `0..60`.
    #[must_use]
    pub const fn minute_of_hour(&self) -> u64 {
        self.minutes % MINUTES_PER_HOUR
    }

    /// Tens digit of the minute within the hour, `0..6`.
    #[must_use]
    pub const fn ten_minutes(&self) -> u64 {
        (self.minutes / 10) % 6
    }

    /// Hour within the current day, `0..24`.
    #[must_use]
    pub const fn hour(&self) -> u64 {
        (self.minutes / MINUTES_PER_HOUR) % 24
    }

    /// Whole days elapsed.
    #[must_use]
    pub const fn day(&self) -> u64 {
        self.minutes / MINUTES_PER_DAY
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_carries_into_the_next_frame() {
        let mut clock = Clock::new(Duration::from_millis(100));
        assert_eq!(clock.advance(Duration::from_millis(250)), 2);
        assert_eq!(clock.accumulated(), Duration::from_millis(50));
        assert_eq!(clock.advance(Duration::from_millis(40)), 0);
        assert_eq!(clock.advance(Duration::from_millis(10)), 1);
        assert_eq!(clock.accumulated(), Duration::ZERO);
        assert_eq!(clock.minutes(), 3);
    }

    #[test]
    fn default_rate_is_fifteen_ticks_per_second() {
        let mut clock = Clock::default();
        assert_eq!(clock.advance(Duration::from_secs(1)), 15);
        assert_eq!(clock.advance(Duration::from_secs(1)), 15);
        assert_eq!(clock.advance(Duration::from_millis(100)), 1);
        assert_eq!(clock.minutes(), 31);
    }

    #[test]
    fn zero_tick_duration_never_ticks() {
        let mut clock = Clock::new(Duration::ZERO);
        assert_eq!(clock.advance(Duration::from_secs(5)), 0);
        assert_eq!(clock.minutes(), 0);
    }

    #[test]
    fn calendar_fields_derive_from_minutes() {
        let mut clock = Clock::default();
        clock.set_minutes(MINUTES_PER_DAY * 2 + 13 * 60 + 47);
        assert_eq!(clock.day(), 2);
        assert_eq!(clock.hour(), 13);
        assert_eq!(clock.minute_of_hour(), 47);
        assert_eq!(clock.ten_minutes(), 4);
    }
}
