use thiserror::Error;

use crate::grid::Position;

/// Problems with the world setup, detected before a run starts
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("grid size must be at least 1")]
    EmptyGrid,

    #[error("position {position} is outside a {size}x{size} grid")]
    OutOfBounds { position: Position, size: i32 },

    #[error("start and goal must be different cells")]
    StartIsGoal,

    #[error("obstacle at {0} would cover the start or goal")]
    ObstacleOnEndpoint(Position),

    #[error("layout line {line}: {reason}")]
    Layout { line: usize, reason: String },

    #[error("invalid position key: {0:?}")]
    InvalidPosition(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Misuse of the engine's run lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("a run is already active")]
    AlreadyRunning,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
