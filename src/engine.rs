//! Incremental replanning engine.
//!
//! The robot plans with BFS against the obstacles it knows about, then walks
//! the plan one cell at a time. A ground-truth obstacle is only discovered
//! when the robot tries to step onto it; the discovery ends the current plan
//! and the next cycle replans from where the robot stands.
//!
//! The engine is an explicit state machine: [`ReplanningEngine::advance`] does
//! the work up to the next checkpoint and tells the caller how long to pause
//! there. A frame loop or an async task supplies the clock.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::grid::{GridWorld, Position};
use crate::pathfinding::{find_path, format_path};
use crate::state::{RunSnapshot, RunStatus};

/// Receives everything the engine publishes
pub trait RunObserver {
    /// Called after every status or data change, in emission order
    fn on_state_change(&mut self, snapshot: &RunSnapshot);

    /// Called once per committed step with the robot's new cell
    fn on_robot_move(&mut self, position: Position);
}

impl<T: RunObserver + ?Sized> RunObserver for &mut T {
    fn on_state_change(&mut self, snapshot: &RunSnapshot) {
        (**self).on_state_change(snapshot);
    }

    fn on_robot_move(&mut self, position: Position) {
        (**self).on_robot_move(position);
    }
}

impl<T: RunObserver + ?Sized> RunObserver for Box<T> {
    fn on_state_change(&mut self, snapshot: &RunSnapshot) {
        (**self).on_state_change(snapshot);
    }

    fn on_robot_move(&mut self, position: Position) {
        (**self).on_robot_move(position);
    }
}

/// Checkpoints where a run suspends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Start of a planning cycle
    Planning,
    /// A new plan has been published
    PlanCommitted,
    /// The robot moved one cell
    Step,
    /// An unknown obstacle was hit
    Obstacle,
}

/// Pause lengths for each checkpoint. Zero is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub planning: Duration,
    pub step: Duration,
    pub obstacle: Duration,
}

impl Timing {
    pub const fn zero() -> Self {
        Timing {
            planning: Duration::ZERO,
            step: Duration::ZERO,
            obstacle: Duration::ZERO,
        }
    }

    pub fn duration(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Planning | Pause::PlanCommitted => self.planning,
            Pause::Step => self.step,
            Pause::Obstacle => self.obstacle,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            planning: Duration::from_millis(250),
            step: Duration::from_millis(500),
            obstacle: Duration::from_millis(500),
        }
    }
}

/// Generation number of a run, used to tell a live run from a cancelled one
pub type RunId = u64;

/// Result of one [`ReplanningEngine::advance`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Suspend at this checkpoint, then advance again
    Pause(Pause),
    /// The run reached `GOAL_REACHED` or `NO_PATH`
    Finished(RunOutcome),
    /// The run was reset, superseded, or already finished
    Cancelled,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Cells physically occupied, in order, starting with the start cell
    pub traversed: Vec<Position>,
    pub planning_cycles: usize,
}

impl RunOutcome {
    pub fn reached_goal(&self) -> bool {
        self.status == RunStatus::GoalReached
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Planning,
    Search,
    Executing { next: usize },
}

#[derive(Debug)]
struct ActiveRun {
    id: RunId,
    world: GridWorld,
    robot: Position,
    traversed: Vec<Position>,
    phase: Phase,
    planning_cycles: usize,
}

/// Plans, walks and replans a single robot. At most one run is active.
pub struct ReplanningEngine<O> {
    timing: Timing,
    observer: O,
    snapshot: RunSnapshot,
    active: Option<ActiveRun>,
    next_run_id: RunId,
}

impl<O: RunObserver> ReplanningEngine<O> {
    pub fn new(timing: Timing, observer: O) -> Self {
        ReplanningEngine {
            timing,
            observer,
            snapshot: RunSnapshot::idle(),
            active: None,
            next_run_id: 1,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Latest published state
    pub fn snapshot(&self) -> &RunSnapshot {
        &self.snapshot
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active.as_ref().map(|run| run.id)
    }

    /// Where the robot currently stands, if a run is active
    pub fn robot_position(&self) -> Option<Position> {
        self.active.as_ref().map(|run| run.robot)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Begin a run against `world`. The world is copied, so later edits to
    /// the caller's copy never reach this run.
    pub fn start(&mut self, world: GridWorld) -> Result<RunId, EngineError> {
        if let Some(active) = &self.active {
            warn!(run = active.id, "start ignored: a run is already active");
            return Err(EngineError::AlreadyRunning);
        }

        let id = self.next_run_id;
        self.next_run_id += 1;

        info!(
            run = id,
            size = world.size(),
            start = %world.start(),
            goal = %world.goal(),
            obstacles = world.obstacles().len(),
            "run started"
        );

        let start = world.start();
        self.active = Some(ActiveRun {
            id,
            world,
            robot: start,
            traversed: vec![start],
            phase: Phase::Planning,
            planning_cycles: 0,
        });

        self.snapshot = RunSnapshot {
            is_running: true,
            status: RunStatus::Running,
            ..RunSnapshot::idle()
        };
        self.observer.on_state_change(&self.snapshot);

        Ok(id)
    }

    /// Do the work up to the next checkpoint of run `run`
    pub fn advance(&mut self, run: RunId) -> Advance {
        let Some(active) = self.active.as_mut() else {
            return Advance::Cancelled;
        };
        if active.id != run {
            return Advance::Cancelled;
        }

        match active.phase {
            Phase::Planning => {
                active.planning_cycles += 1;
                active.phase = Phase::Search;
                debug!(run, cycle = active.planning_cycles, from = %active.robot, "planning");

                self.snapshot.status = RunStatus::Planning;
                self.observer.on_state_change(&self.snapshot);
                Advance::Pause(Pause::Planning)
            }
            Phase::Search => {
                match find_path(&active.world, active.robot, &self.snapshot.known_obstacles) {
                    Some(path) => {
                        debug!(run, path = %format_path(&path), "plan committed");
                        active.phase = Phase::Executing { next: 1 };

                        // The robot occupies the head of every plan, the start cell included
                        self.snapshot.visited_cells.insert(active.robot);
                        self.snapshot.current_path = path;
                        self.observer.on_state_change(&self.snapshot);
                        Advance::Pause(Pause::PlanCommitted)
                    }
                    None => {
                        self.snapshot.status = RunStatus::NoPath;
                        self.finish()
                    }
                }
            }
            Phase::Executing { next } => {
                let Some(&target) = self.snapshot.current_path.get(next) else {
                    // Plan exhausted short of the goal
                    active.phase = Phase::Planning;
                    return self.advance(run);
                };

                // Discovery happens by attempted entry only
                if active.world.is_obstacle(target) {
                    active.phase = Phase::Planning;
                    info!(run, obstacle = %target, from = %active.robot, "obstacle detected");

                    self.snapshot.known_obstacles.insert(target);
                    self.snapshot.status = RunStatus::ObstacleDetected;
                    self.observer.on_state_change(&self.snapshot);
                    return Advance::Pause(Pause::Obstacle);
                }

                active.robot = target;
                active.traversed.push(target);
                active.phase = Phase::Executing { next: next + 1 };
                let reached_goal = target == active.world.goal();

                self.snapshot.visited_cells.insert(target);
                self.snapshot.status = RunStatus::Moving;
                self.observer.on_robot_move(target);
                self.observer.on_state_change(&self.snapshot);

                if reached_goal {
                    self.snapshot.status = RunStatus::GoalReached;
                    return self.finish();
                }
                Advance::Pause(Pause::Step)
            }
        }
    }

    /// Drive a run to its end without pausing
    pub fn run_to_completion(&mut self, world: GridWorld) -> Result<RunOutcome, EngineError> {
        let run = self.start(world)?;
        loop {
            match self.advance(run) {
                Advance::Pause(_) => continue,
                Advance::Finished(outcome) => return Ok(outcome),
                Advance::Cancelled => return Ok(self.cancelled_outcome()),
            }
        }
    }

    /// Cancel any active run and publish the cleared state. Idempotent.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            info!(run = active.id, cycles = active.planning_cycles, "run cancelled");
        }
        self.snapshot = RunSnapshot::idle();
        self.observer.on_state_change(&self.snapshot);
    }

    /// Outcome reported for a run that was cancelled before it finished
    pub fn cancelled_outcome(&self) -> RunOutcome {
        RunOutcome {
            status: RunStatus::Idle,
            traversed: Vec::new(),
            planning_cycles: 0,
        }
    }

    fn finish(&mut self) -> Advance {
        let Some(active) = self.active.take() else {
            return Advance::Cancelled;
        };
        self.snapshot.is_running = false;

        info!(
            run = active.id,
            status = %self.snapshot.status,
            steps = active.traversed.len() - 1,
            cycles = active.planning_cycles,
            known_obstacles = self.snapshot.known_obstacles.len(),
            "run finished"
        );
        self.observer.on_state_change(&self.snapshot);

        Advance::Finished(RunOutcome {
            status: self.snapshot.status,
            traversed: active.traversed,
            planning_cycles: active.planning_cycles,
        })
    }
}
