//! Interpretation of firmware-reported mission execution events.
//!
//! The flight controller runs the mission; this module only turns its state and
//! waypoint events into operator-facing reports.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Ready,
    Uploading,
    Preparing,
    EnteringRoute,
    Executing,
    Interrupted,
    Recovering,
    Finished,
    ReturningToStart,
    Disconnected,
    NotSupported,
}

/// Coarse progress bucket shown alongside the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Starting,
    Flying,
    Paused,
    Done,
    Fault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub state: ExecutionState,
    pub phase: Phase,
    pub message: &'static str,
}

impl ExecutionState {
    pub fn report(self) -> StatusReport {
        let (phase, message) = match self {
            ExecutionState::Ready => (Phase::Idle, "Mission ready"),
            ExecutionState::Uploading => (Phase::Starting, "Uploading mission"),
            ExecutionState::Preparing => (Phase::Starting, "Preparing mission"),
            ExecutionState::EnteringRoute => (Phase::Starting, "Flying to first waypoint"),
            ExecutionState::Executing => (Phase::Flying, "Executing mission"),
            ExecutionState::Interrupted => (Phase::Paused, "Mission interrupted"),
            ExecutionState::Recovering => (Phase::Paused, "Resuming mission"),
            ExecutionState::Finished => (Phase::Done, "Mission finished"),
            ExecutionState::ReturningToStart => (Phase::Done, "Returning to start point"),
            ExecutionState::Disconnected => (Phase::Fault, "Aircraft disconnected"),
            ExecutionState::NotSupported => (Phase::Fault, "Mission not supported by aircraft"),
        };
        StatusReport {
            state: self,
            phase,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaypointProgress {
    pub index: usize,
    pub total: usize,
    /// Percent of waypoints reached, 0..=100
    pub percent: u8,
}

/// Tracks inbound events for one mission run.
#[derive(Debug, Clone)]
pub struct ExecutionMonitor {
    total_waypoints: usize,
    last_state: Option<ExecutionState>,
    last_waypoint: Option<usize>,
}

impl ExecutionMonitor {
    pub fn new(total_waypoints: usize) -> Self {
        Self {
            total_waypoints,
            last_state: None,
            last_waypoint: None,
        }
    }

    /// Every state event produces a report.
    pub fn on_state(&mut self, state: ExecutionState) -> StatusReport {
        if self.last_state != Some(state) {
            tracing::debug!(?state, "mission execution state changed");
        }
        self.last_state = Some(state);
        state.report()
    }

    /// Reports only when the current waypoint index differs from the last one seen.
    pub fn on_waypoint(&mut self, index: usize) -> Option<WaypointProgress> {
        if self.last_waypoint == Some(index) {
            return None;
        }
        self.last_waypoint = Some(index);

        let percent = if self.total_waypoints == 0 {
            0
        } else {
            let reached = (index + 1).min(self.total_waypoints);
            (reached * 100 / self.total_waypoints) as u8
        };

        Some(WaypointProgress {
            index,
            total: self.total_waypoints,
            percent,
        })
    }

    pub fn last_state(&self) -> Option<ExecutionState> {
        self.last_state
    }
}
