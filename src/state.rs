use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::grid::Position;

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Planning,
    Moving,
    ObstacleDetected,
    GoalReached,
    NoPath,
}

impl RunStatus {
    /// A run that reaches one of these statuses is over
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::GoalReached | RunStatus::NoPath)
    }

    /// Human-readable message for the status line
    pub fn message(self) -> &'static str {
        match self {
            RunStatus::Idle => "Click on cells to place obstacles, then press Space to start",
            RunStatus::Running => "Robot is pathfinding...",
            RunStatus::Planning => "Planning path...",
            RunStatus::Moving => "Moving robot...",
            RunStatus::ObstacleDetected => "Obstacle detected! Replanning...",
            RunStatus::GoalReached => "Goal reached!",
            RunStatus::NoPath => "No path found to goal!",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Idle => "IDLE",
            RunStatus::Running => "RUNNING",
            RunStatus::Planning => "PLANNING",
            RunStatus::Moving => "MOVING",
            RunStatus::ObstacleDetected => "OBSTACLE_DETECTED",
            RunStatus::GoalReached => "GOAL_REACHED",
            RunStatus::NoPath => "NO_PATH",
        };
        f.write_str(name)
    }
}

/// Everything an observer may see about a run, copied at emission time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub is_running: bool,
    /// The current plan only, not the route travelled so far
    pub current_path: Vec<Position>,
    pub visited_cells: BTreeSet<Position>,
    pub known_obstacles: BTreeSet<Position>,
    pub status: RunStatus,
}

impl RunSnapshot {
    /// Cleared snapshot reported while no run is active
    pub fn idle() -> Self {
        RunSnapshot::default()
    }
}
