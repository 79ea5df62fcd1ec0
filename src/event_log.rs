use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::engine::RunObserver;
use crate::grid::Position;
use crate::state::{RunSnapshot, RunStatus};

/// Something the engine published
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged(RunSnapshot),
    RobotMoved(Position),
}

/// Event with timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Milliseconds since the log was created
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

/// Observer that records every event the engine publishes
#[derive(Debug)]
pub struct EventLog {
    start_time: Instant,
    events: Vec<LoggedEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        EventLog {
            start_time: Instant::now(),
            events: Vec::new(),
        }
    }

    /// Log an event with current timestamp
    pub fn log(&mut self, event: EngineEvent) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.events.push(LoggedEvent { timestamp_ms, event });
    }

    pub fn events(&self) -> &[LoggedEvent] {
        &self.events
    }

    /// All snapshots in emission order
    pub fn snapshots(&self) -> Vec<&RunSnapshot> {
        self.events
            .iter()
            .filter_map(|logged| match &logged.event {
                EngineEvent::StateChanged(snapshot) => Some(snapshot),
                EngineEvent::RobotMoved(_) => None,
            })
            .collect()
    }

    /// Every committed robot move in order
    pub fn moves(&self) -> Vec<Position> {
        self.events
            .iter()
            .filter_map(|logged| match logged.event {
                EngineEvent::RobotMoved(pos) => Some(pos),
                EngineEvent::StateChanged(_) => None,
            })
            .collect()
    }

    /// Status of the most recent snapshot, `IDLE` if nothing was logged
    pub fn last_status(&self) -> RunStatus {
        self.snapshots()
            .last()
            .map(|snapshot| snapshot.status)
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// One JSON object per line
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for logged in &self.events {
            out.push_str(&serde_json::to_string(logged)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Print log to console
    pub fn print(&self) {
        println!("\n=== Event Log ({} events) ===", self.events.len());
        for (i, logged) in self.events.iter().enumerate() {
            match &logged.event {
                EngineEvent::StateChanged(snapshot) => println!(
                    "[{:6}ms] #{:3} STATE {:<17} path={} visited={} known={}",
                    logged.timestamp_ms,
                    i + 1,
                    snapshot.status.to_string(),
                    snapshot.current_path.len(),
                    snapshot.visited_cells.len(),
                    snapshot.known_obstacles.len()
                ),
                EngineEvent::RobotMoved(pos) => {
                    println!("[{:6}ms] #{:3} MOVE  {}", logged.timestamp_ms, i + 1, pos)
                }
            }
        }
        println!("=== End of Log ===\n");
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let snapshots = self.snapshots();
        let obstacle_count = snapshots
            .iter()
            .filter(|s| s.status == RunStatus::ObstacleDetected)
            .count();
        // A plan is published when the path changes while status is PLANNING
        let mut plans: usize = 0;
        let mut last_path: &[Position] = &[];
        for snapshot in &snapshots {
            if snapshot.status == RunStatus::Planning
                && !snapshot.current_path.is_empty()
                && snapshot.current_path.as_slice() != last_path
            {
                plans += 1;
            }
            last_path = snapshot.current_path.as_slice();
        }

        let duration = self.events.last().map(|e| e.timestamp_ms).unwrap_or(0);

        format!(
            "Duration: {}ms\n\
             Total Events: {} ({} snapshots, {} moves)\n\
             Plans: {} ({} replans after {} obstacle detections)\n\
             Final Status: {}",
            duration,
            self.events.len(),
            snapshots.len(),
            self.moves().len(),
            plans,
            plans.saturating_sub(1),
            obstacle_count,
            self.last_status()
        )
    }
}

impl RunObserver for EventLog {
    fn on_state_change(&mut self, snapshot: &RunSnapshot) {
        self.log(EngineEvent::StateChanged(snapshot.clone()));
    }

    fn on_robot_move(&mut self, position: Position) {
        self.log(EngineEvent::RobotMoved(position));
    }
}
