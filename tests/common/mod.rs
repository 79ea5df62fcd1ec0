#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replan_grid::{EventLog, GridWorld, Position, ReplanningEngine, RunOutcome, Timing};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// 5x5 board from (0,0) to (4,4) with the given obstacles
pub fn board(obstacles: &[(i32, i32)]) -> GridWorld {
    GridWorld::new(
        5,
        Position::new(0, 0),
        Position::new(4, 4),
        obstacles.iter().map(|&p| Position::from(p)),
    )
    .expect("valid board")
}

pub fn positions(cells: &[(i32, i32)]) -> Vec<Position> {
    cells.iter().map(|&p| Position::from(p)).collect()
}

/// Run `world` to completion with zero pauses, returning the outcome and
/// everything the engine published
pub fn run_logged(world: GridWorld) -> (RunOutcome, EventLog) {
    let mut engine = ReplanningEngine::new(Timing::zero(), EventLog::new());
    let outcome = engine.run_to_completion(world).expect("engine idle");
    (outcome, engine.into_observer())
}

/// Hop distance from `from` to `to` avoiding `blocked`, found by relaxing
/// every edge until nothing changes. Independent of the BFS under test.
pub fn relaxed_distance(
    size: i32,
    from: Position,
    to: Position,
    blocked: &BTreeSet<Position>,
) -> Option<usize> {
    let mut dist: HashMap<Position, usize> = HashMap::new();
    dist.insert(from, 0);

    loop {
        let mut changed = false;
        for row in 0..size {
            for col in 0..size {
                let cell = Position::new(row, col);
                let Some(&d) = dist.get(&cell) else {
                    continue;
                };
                for (d_row, d_col) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                    let next = cell.offset(d_row, d_col);
                    if next.row < 0 || next.row >= size || next.col < 0 || next.col >= size {
                        continue;
                    }
                    if blocked.contains(&next) {
                        continue;
                    }
                    if dist.get(&next).map_or(true, |&old| d + 1 < old) {
                        dist.insert(next, d + 1);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    dist.get(&to).copied()
}

/// Seeded random board: size 5..=8, start top-left, goal bottom-right,
/// each other cell blocked with probability `density`
pub fn random_world(seed: u64, density: f64) -> GridWorld {
    let mut rng = StdRng::seed_from_u64(seed);
    let size = rng.gen_range(5..=8);
    let start = Position::new(0, 0);
    let goal = Position::new(size - 1, size - 1);

    let mut obstacles = Vec::new();
    for row in 0..size {
        for col in 0..size {
            let pos = Position::new(row, col);
            if pos != start && pos != goal && rng.gen_bool(density) {
                obstacles.push(pos);
            }
        }
    }

    GridWorld::new(size, start, goal, obstacles).expect("generated board is valid")
}

/// Layout files under `dir`, sorted by name
pub fn layout_files(dir: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("txt"))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

pub fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|n| n.to_str()).unwrap_or("unknown")
}
