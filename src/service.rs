//! Async driver for [`ReplanningEngine`].
//!
//! One task drives a run; any clone of the service may reset it. The engine
//! lock is released before every pause, so a reset lands at the next
//! checkpoint.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::engine::{Advance, ReplanningEngine, RunObserver, RunOutcome};
use crate::error::EngineError;
use crate::event_log::EngineEvent;
use crate::grid::{GridWorld, Position};
use crate::state::RunSnapshot;

/// Forwards engine events into an unbounded channel. Events sent after the
/// receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        ChannelObserver { tx }
    }

    /// Observer plus the receiving half
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelObserver { tx }, rx)
    }
}

impl RunObserver for ChannelObserver {
    fn on_state_change(&mut self, snapshot: &RunSnapshot) {
        let _ = self.tx.send(EngineEvent::StateChanged(snapshot.clone()));
    }

    fn on_robot_move(&mut self, position: Position) {
        let _ = self.tx.send(EngineEvent::RobotMoved(position));
    }
}

/// Shared handle to an engine driven on the tokio clock
pub struct PathfindingService<O> {
    engine: Arc<Mutex<ReplanningEngine<O>>>,
}

impl<O> Clone for PathfindingService<O> {
    fn clone(&self) -> Self {
        PathfindingService {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<O: RunObserver + Send + 'static> PathfindingService<O> {
    pub fn new(engine: ReplanningEngine<O>) -> Self {
        PathfindingService {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run against `world` until the goal is reached, no path remains, or the
    /// run is reset. A reset run resolves to an outcome with status `IDLE`.
    pub async fn run(&self, world: GridWorld) -> Result<RunOutcome, EngineError> {
        let (run, timing) = {
            let mut engine = self.engine.lock().await;
            (engine.start(world)?, engine.timing())
        };

        loop {
            let step = self.engine.lock().await.advance(run);
            match step {
                Advance::Pause(pause) => {
                    let delay = timing.duration(pause);
                    debug!(run, ?pause, ?delay, "checkpoint");
                    if delay.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                }
                Advance::Finished(outcome) => return Ok(outcome),
                Advance::Cancelled => {
                    debug!(run, "driver stopping: run cancelled");
                    return Ok(self.engine.lock().await.cancelled_outcome());
                }
            }
        }
    }

    /// Cancel the active run, if any, and publish the cleared state
    pub async fn reset(&self) {
        self.engine.lock().await.reset();
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.engine.lock().await.snapshot().clone()
    }

    pub async fn is_running(&self) -> bool {
        self.engine.lock().await.is_running()
    }

    /// Run `f` with the engine's observer
    pub async fn with_observer<R>(&self, f: impl FnOnce(&O) -> R) -> R {
        let engine = self.engine.lock().await;
        f(engine.observer())
    }
}
