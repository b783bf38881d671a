//! Time intervals as reported by management agents.
//!
//! Agents report uptime and other intervals in hundredths of a second.

use core::fmt;
use core::time::Duration;

/// Time interval in hundredths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TimeTicks(pub u32);

impl TimeTicks {
    /// Create from raw hundredths of a second.
    pub const fn from_ticks(ticks: u32) -> Self {
        Self(ticks)
    }

    /// Get the raw value in hundredths of a second.
    pub const fn ticks(&self) -> u32 {
        self.0
    }

    /// Get the value in whole seconds (truncated).
    pub const fn as_secs(&self) -> u64 {
        self.0 as u64 / 100
    }

    /// Convert to a standard Duration.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0 as u64 * 10)
    }

    /// Render as a human readable uptime.
    ///
    /// ```rust
    /// use snmpwatch_types::TimeTicks;
    ///
    /// let uptime = TimeTicks::from_ticks(9_006_100);
    /// assert_eq!(uptime.uptime().to_string(), "1 days, 1 hours, 1 minutes and 1 seconds");
    /// ```
    pub fn uptime(&self) -> Uptime {
        let total = self.as_secs();
        Uptime {
            days: total / (24 * 3600),
            hours: (total % (24 * 3600)) / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

impl From<TimeTicks> for Duration {
    fn from(t: TimeTicks) -> Self {
        t.to_duration()
    }
}

/// An uptime split into calendar-ish components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days, {} hours, {} minutes and {} seconds",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let t = TimeTicks::from_ticks(12_345);
        assert_eq!(t.as_secs(), 123);
        assert_eq!(t.to_duration(), Duration::from_millis(123_450));
    }

    #[test]
    fn uptime_components() {
        let up = TimeTicks::from_ticks(59 * 100).uptime();
        assert_eq!(
            up,
            Uptime {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 59
            }
        );

        let up = TimeTicks::from_ticks((2 * 86_400 + 3 * 3600 + 4 * 60 + 5) * 100).uptime();
        assert_eq!((up.days, up.hours, up.minutes, up.seconds), (2, 3, 4, 5));
    }
}
