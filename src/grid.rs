use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// A cell on the grid, addressed by (row, col)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Position shifted by (d_row, d_col)
    pub fn offset(&self, d_row: i32, d_col: i32) -> Self {
        Position::new(self.row + d_row, self.col + d_col)
    }

    /// Hop count between two cells when moving only along rows and columns
    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

/// Canonical key form: "row,col"
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPosition(s.to_string());
        let (row, col) = s.split_once(',').ok_or_else(invalid)?;
        let row = row.trim().parse().map_err(|_| invalid())?;
        let col = col.trim().parse().map_err(|_| invalid())?;
        Ok(Position::new(row, col))
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Position::new(row, col)
    }
}

// Layout characters
pub const START_CHAR: char = 'S';
pub const GOAL_CHAR: char = 'G';
pub const OBSTACLE_CHAR: char = '#';
pub const FREE_CHAR: char = '.';

/// Square grid with fixed start and goal and the ground-truth obstacle set.
///
/// The obstacle set is only ever revealed to the planner one cell at a time,
/// through [`GridWorld::is_obstacle`] queries made by the engine when the
/// robot tries to enter a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    size: i32,
    start: Position,
    goal: Position,
    obstacles: BTreeSet<Position>,
}

impl GridWorld {
    /// Build a validated world
    pub fn new<I>(size: i32, start: Position, goal: Position, obstacles: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        if size < 1 {
            return Err(ConfigError::EmptyGrid);
        }

        let mut world = GridWorld {
            size,
            start,
            goal,
            obstacles: BTreeSet::new(),
        };

        world.check_in_bounds(start)?;
        world.check_in_bounds(goal)?;
        if start == goal {
            return Err(ConfigError::StartIsGoal);
        }

        for pos in obstacles {
            world.check_in_bounds(pos)?;
            if world.is_endpoint(pos) {
                return Err(ConfigError::ObstacleOnEndpoint(pos));
            }
            world.obstacles.insert(pos);
        }

        Ok(world)
    }

    /// Empty world with no obstacles
    pub fn open(size: i32, start: Position, goal: Position) -> ConfigResult<Self> {
        Self::new(size, start, goal, std::iter::empty())
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn obstacles(&self) -> &BTreeSet<Position> {
        &self.obstacles
    }

    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.size && pos.col >= 0 && pos.col < self.size
    }

    /// Ground truth: is there an obstacle at `pos`
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles.contains(&pos)
    }

    pub fn is_endpoint(&self, pos: Position) -> bool {
        pos == self.start || pos == self.goal
    }

    /// Flip a cell between free and obstacle. Returns true if it is now an obstacle.
    pub fn toggle_obstacle(&mut self, pos: Position) -> ConfigResult<bool> {
        self.check_in_bounds(pos)?;
        if self.is_endpoint(pos) {
            return Err(ConfigError::ObstacleOnEndpoint(pos));
        }

        let now_blocked = if self.obstacles.remove(&pos) {
            false
        } else {
            self.obstacles.insert(pos);
            true
        };
        Ok(now_blocked)
    }

    /// Remove every obstacle
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    fn check_in_bounds(&self, pos: Position) -> ConfigResult<()> {
        if self.is_in_bounds(pos) {
            Ok(())
        } else {
            Err(ConfigError::OutOfBounds {
                position: pos,
                size: self.size,
            })
        }
    }

    /// Parse a text layout
    /// Format:
    /// - S: start cell
    /// - G: goal cell
    /// - #: obstacle
    /// - .: free cell
    ///
    /// Blank lines are skipped. The remaining rows must form an N x N square.
    pub fn parse_layout(text: &str) -> ConfigResult<Self> {
        let rows: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let Some(&(first_line, _)) = rows.first() else {
            return Err(ConfigError::Layout {
                line: 1,
                reason: "layout has no rows".to_string(),
            });
        };

        let size = rows.len() as i32;
        let mut start = None;
        let mut goal = None;
        let mut obstacles = Vec::new();

        for (row, (line_no, line)) in rows.iter().enumerate() {
            let width = line.chars().count() as i32;
            if width != size {
                return Err(ConfigError::Layout {
                    line: *line_no,
                    reason: format!("expected {} cells, found {}", size, width),
                });
            }

            for (col, ch) in line.chars().enumerate() {
                let pos = Position::new(row as i32, col as i32);
                match ch {
                    START_CHAR => {
                        if start.replace(pos).is_some() {
                            return Err(ConfigError::Layout {
                                line: *line_no,
                                reason: "more than one start cell".to_string(),
                            });
                        }
                    }
                    GOAL_CHAR => {
                        if goal.replace(pos).is_some() {
                            return Err(ConfigError::Layout {
                                line: *line_no,
                                reason: "more than one goal cell".to_string(),
                            });
                        }
                    }
                    OBSTACLE_CHAR => obstacles.push(pos),
                    FREE_CHAR => {}
                    other => {
                        return Err(ConfigError::Layout {
                            line: *line_no,
                            reason: format!("unexpected character {:?}", other),
                        });
                    }
                }
            }
        }

        let missing = |what: &str| ConfigError::Layout {
            line: first_line,
            reason: format!("layout has no {} cell", what),
        };
        let start = start.ok_or_else(|| missing("start"))?;
        let goal = goal.ok_or_else(|| missing("goal"))?;

        GridWorld::new(size, start, goal, obstacles)
    }

    /// Render the world in the layout format accepted by [`GridWorld::parse_layout`]
    pub fn to_layout(&self) -> String {
        let mut result = String::new();

        for row in 0..self.size {
            for col in 0..self.size {
                let pos = Position::new(row, col);
                let symbol = if pos == self.start {
                    START_CHAR
                } else if pos == self.goal {
                    GOAL_CHAR
                } else if self.is_obstacle(pos) {
                    OBSTACLE_CHAR
                } else {
                    FREE_CHAR
                };
                result.push(symbol);
            }
            result.push('\n');
        }

        result
    }
}
