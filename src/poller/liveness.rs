//! Agent liveness monitoring.
//!
//! The agent's uptime is seen every cycle but only evaluated every
//! `check_every` cycles, so a single timed-out query does not flip the alarm.

use snmpwatch_types::TimeTicks;
use tracing::{info, warn};

/// Default number of cycles between uptime checks.
pub const DEFAULT_CHECK_EVERY: u32 = 6;

/// Default uptime below which the agent is considered freshly restarted.
pub const DEFAULT_UPTIME_FLOOR: TimeTicks = TimeTicks(60);

/// Cross-cycle liveness counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LivenessState {
    pub cycles_since_check: u32,
    pub alarm_active: bool,
}

/// Raises an alarm when the agent restarts or stops answering.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    check_every: u32,
    uptime_floor: TimeTicks,
    state: LivenessState,
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_EVERY, DEFAULT_UPTIME_FLOOR)
    }
}

impl LivenessMonitor {
    /// Create a monitor evaluating every `check_every` cycles (at least one).
    pub fn new(check_every: u32, uptime_floor: TimeTicks) -> Self {
        Self {
            check_every: check_every.max(1),
            uptime_floor,
            state: LivenessState::default(),
        }
    }

    /// Observe this cycle's uptime reading, `None` if the query failed.
    ///
    /// Returns whether the alarm is active after this cycle.
    pub fn observe(&mut self, uptime: Option<TimeTicks>) -> bool {
        self.state.cycles_since_check += 1;
        if self.state.cycles_since_check < self.check_every {
            return self.state.alarm_active;
        }
        self.state.cycles_since_check = 0;

        let alarm = match uptime {
            None => true,
            Some(ticks) => ticks < self.uptime_floor,
        };

        if alarm && !self.state.alarm_active {
            match uptime {
                Some(ticks) => warn!(uptime = %ticks.uptime(), "agent restarted recently"),
                None => warn!("agent uptime unavailable"),
            }
        } else if !alarm && self.state.alarm_active {
            info!("agent liveness restored");
        }

        self.state.alarm_active = alarm;
        alarm
    }

    /// Whether the alarm is currently active.
    pub fn alarm_active(&self) -> bool {
        self.state.alarm_active
    }

    /// Current counters.
    pub fn state(&self) -> LivenessState {
        self.state
    }
}
