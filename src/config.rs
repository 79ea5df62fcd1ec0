use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::engine::Timing;
use crate::error::{ConfigError, ConfigResult};
use crate::grid::{GridWorld, Position};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_size")]
    pub size: i32,
    #[serde(default = "default_start")]
    pub start: [i32; 2],
    #[serde(default = "default_goal")]
    pub goal: [i32; 2],
    /// Optional text layout with the initial obstacles. Its S and G cells
    /// replace `start` and `goal`.
    #[serde(default)]
    pub layout_path: String,
}

#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_planning_ms")]
    pub planning_ms: u64,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default = "default_obstacle_ms")]
    pub obstacle_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Print the full event log when the visualizer closes
    #[serde(default = "default_print_event_log")]
    pub print_event_log: bool,
}

// Default values
fn default_size() -> i32 { 5 }
fn default_start() -> [i32; 2] { [0, 0] }
fn default_goal() -> [i32; 2] { [4, 4] }
fn default_planning_ms() -> u64 { 250 }
fn default_step_ms() -> u64 { 500 }
fn default_obstacle_ms() -> u64 { 500 }
fn default_window_title() -> String { "Replan Grid - Unknown Obstacle Pathfinding".to_string() }
fn default_cell_size() -> f32 { 70.0 }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_print_event_log() -> bool { true }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            start: default_start(),
            goal: default_goal(),
            layout_path: String::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            planning_ms: default_planning_ms(),
            step_ms: default_step_ms(),
            obstacle_ms: default_obstacle_ms(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            cell_size: default_cell_size(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            print_event_log: default_print_event_log(),
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            planning: Duration::from_millis(self.planning_ms),
            step: Duration::from_millis(self.step_ms),
            obstacle: Duration::from_millis(self.obstacle_ms),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match fs::read_to_string("config.toml") {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("loaded configuration from config.toml");
                    config
                }
                Err(e) => {
                    warn!("failed to parse config.toml: {}; using default configuration", e);
                    Config::default()
                }
            },
            Err(_) => {
                info!("no config.toml found, using default configuration");
                Config::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn timing(&self) -> Timing {
        self.timing.to_timing()
    }

    /// Build and validate the world this configuration describes.
    /// Reads `grid.layout_path` when it is set.
    pub fn build_world(&self) -> ConfigResult<GridWorld> {
        if self.grid.layout_path.is_empty() {
            let [start_row, start_col] = self.grid.start;
            let [goal_row, goal_col] = self.grid.goal;
            GridWorld::open(
                self.grid.size,
                Position::new(start_row, start_col),
                Position::new(goal_row, goal_col),
            )
        } else {
            load_layout(&self.grid.layout_path)
        }
    }
}

/// Read and parse a text layout file
pub fn load_layout(path: impl AsRef<Path>) -> ConfigResult<GridWorld> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    GridWorld::parse_layout(&text)
}
