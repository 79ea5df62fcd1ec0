pub mod config;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod grid;
pub mod logging;
pub mod pathfinding;
pub mod service;
pub mod state;

pub use engine::{Advance, Pause, ReplanningEngine, RunId, RunObserver, RunOutcome, Timing};
pub use error::{ConfigError, EngineError};
pub use event_log::{EngineEvent, EventLog};
pub use grid::{GridWorld, Position};
pub use pathfinding::find_path;
pub use service::{ChannelObserver, PathfindingService};
pub use state::{RunSnapshot, RunStatus};
