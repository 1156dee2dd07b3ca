//! World clock for the Castaway simulation.
//!
//! One tick is one simulated hour. The elapsed-hour counter is the only
//! stored value; day, hour, season and the display label are all derived
//! from it with checked arithmetic.

use castaway_types::Season;

/// Hours in a simulated day.
const HOURS_PER_DAY: u64 = 24;

/// Days in a simulated year. Seasons are four 91-day quarters.
const DAYS_PER_YEAR: u64 = 364;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Hour counter would overflow.
    #[error("hour counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Simulated time, in elapsed hours since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldClock {
    hours: u64,
}

impl WorldClock {
    /// A clock at the start of day 1.
    pub const fn new() -> Self {
        Self { hours: 0 }
    }

    /// A clock at an explicit hour (tests and restoration).
    pub const fn at(hours: u64) -> Self {
        Self { hours }
    }

    /// Advance by one hour. Returns the new hour count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.hours = self.hours.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.hours)
    }

    /// Elapsed hours, which is also the tick number.
    pub const fn tick(&self) -> u64 {
        self.hours
    }

    /// One-based day number.
    pub fn day(&self) -> u64 {
        self.hours
            .checked_div(HOURS_PER_DAY)
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Hour of the day, 0 to 23.
    pub fn hour_of_day(&self) -> u64 {
        self.hours.checked_rem(HOURS_PER_DAY).unwrap_or(0)
    }

    /// Zero-based day of the year, 0 to 363.
    pub fn day_of_year(&self) -> u64 {
        self.hours
            .checked_div(HOURS_PER_DAY)
            .and_then(|d| d.checked_rem(DAYS_PER_YEAR))
            .unwrap_or(0)
    }

    /// The current season.
    pub fn season(&self) -> Season {
        Season::from_day_of_year(self.day_of_year())
    }

    /// Display label, e.g. "Day 3, 07:00".
    pub fn label(&self) -> String {
        format!("Day {}, {:02}:00", self.day(), self.hour_of_day())
    }

    /// Whether the current hour starts a new day (never at hour 0).
    pub fn is_new_day(&self) -> bool {
        self.every(HOURS_PER_DAY)
    }

    /// Whether `period` hours have just elapsed: the counter is positive
    /// and divisible by `period`. A zero period never fires.
    pub fn every(&self, period: u64) -> bool {
        self.hours > 0 && self.hours.checked_rem(period) == Some(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_day_one_at_midnight() {
        let clock = WorldClock::new();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.label(), "Day 1, 00:00");
        assert_eq!(clock.season(), Season::Spring);
        assert!(!clock.is_new_day());
    }

    #[test]
    fn advance_moves_one_hour() {
        let mut clock = WorldClock::new();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.label(), "Day 1, 01:00");
    }

    #[test]
    fn day_boundaries() {
        assert!(WorldClock::at(24).is_new_day());
        assert!(WorldClock::at(48).is_new_day());
        assert!(!WorldClock::at(25).is_new_day());
        assert_eq!(WorldClock::at(24).label(), "Day 2, 00:00");
        assert_eq!(WorldClock::at(55).label(), "Day 3, 07:00");
    }

    #[test]
    fn seasons_follow_day_of_year() {
        assert_eq!(WorldClock::at(90 * 24).season(), Season::Spring);
        assert_eq!(WorldClock::at(91 * 24).season(), Season::Summer);
        assert_eq!(WorldClock::at(182 * 24).season(), Season::Autumn);
        assert_eq!(WorldClock::at(273 * 24).season(), Season::Winter);
        // The year wraps after 364 days.
        assert_eq!(WorldClock::at(364 * 24).season(), Season::Spring);
    }

    #[test]
    fn periodic_events() {
        assert!(WorldClock::at(2400).every(2400));
        assert!(!WorldClock::at(2401).every(2400));
        assert!(!WorldClock::at(0).every(2400));
        assert!(!WorldClock::at(10).every(0));
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = WorldClock::at(u64::MAX);
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }
}
