use crate::grid::{GridWorld, Position};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::trace;

/// Neighbour expansion order as (d_row, d_col): right, down, left, up.
///
/// Among several shortest paths the first one discovered in this order wins,
/// which keeps plans reproducible for a given set of known obstacles.
pub const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// In-bounds 4-neighbours of `pos` in [`DIRECTIONS`] order
pub fn neighbors(world: &GridWorld, pos: Position) -> impl Iterator<Item = Position> + '_ {
    DIRECTIONS
        .into_iter()
        .map(move |(d_row, d_col)| pos.offset(d_row, d_col))
        .filter(move |next| world.is_in_bounds(*next))
}

/// Breadth-first search from `from` to the world's goal.
///
/// Only `known` obstacles block; ground-truth obstacles that have not been
/// discovered yet are treated as free. The returned path includes both
/// endpoints. `None` if the goal cannot be reached with current knowledge.
pub fn find_path(
    world: &GridWorld,
    from: Position,
    known: &BTreeSet<Position>,
) -> Option<Vec<Position>> {
    let goal = world.goal();

    let mut queue = VecDeque::from([from]);
    let mut visited: HashSet<Position> = HashSet::from([from]);
    let mut parent: HashMap<Position, Position> = HashMap::new();
    let mut expanded = 0usize;
    let mut found = false;

    while let Some(current) = queue.pop_front() {
        expanded += 1;

        if current == goal {
            found = true;
            break;
        }

        for next in neighbors(world, current) {
            if known.contains(&next) || !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            queue.push_back(next);
        }
    }

    if !found {
        trace!(%from, %goal, expanded, "goal unreachable with known obstacles");
        return None;
    }

    // Walk parents back from the goal, then reverse
    let mut path = vec![goal];
    let mut current = goal;
    while current != from {
        current = *parent.get(&current)?;
        path.push(current);
    }
    path.reverse();

    trace!(%from, %goal, expanded, hops = path.len() - 1, "path found");
    Some(path)
}

/// Format path for display
pub fn format_path(path: &[Position]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|pos| format!("({},{})", pos.row, pos.col))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_5x5(obstacles: &[(i32, i32)]) -> GridWorld {
        GridWorld::new(
            5,
            Position::new(0, 0),
            Position::new(4, 4),
            obstacles.iter().map(|&p| Position::from(p)),
        )
        .unwrap()
    }

    fn positions(cells: &[(i32, i32)]) -> Vec<Position> {
        cells.iter().map(|&p| Position::from(p)).collect()
    }

    #[test]
    fn test_open_grid_prefers_right_then_down() {
        let world = world_5x5(&[]);
        let path = find_path(&world, world.start(), &BTreeSet::new()).unwrap();

        assert_eq!(
            path,
            positions(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 4), (2, 4), (3, 4), (4, 4)])
        );
    }

    #[test]
    fn test_ignores_undiscovered_obstacles() {
        // Ground truth blocks (0,1) but nothing is known yet
        let world = world_5x5(&[(0, 1)]);
        let path = find_path(&world, world.start(), &BTreeSet::new()).unwrap();

        assert_eq!(path[1], Position::new(0, 1));
    }

    #[test]
    fn test_routes_around_known_obstacle() {
        let world = world_5x5(&[(0, 1)]);
        let known = BTreeSet::from([Position::new(0, 1)]);
        let path = find_path(&world, world.start(), &known).unwrap();

        assert_eq!(
            path,
            positions(&[(0, 0), (1, 0), (1, 1), (1, 2), (1, 3), (1, 4), (2, 4), (3, 4), (4, 4)])
        );
        assert!(path.iter().all(|p| !known.contains(p)));
    }

    #[test]
    fn test_no_path_through_known_wall() {
        let world = world_5x5(&[]);
        let known: BTreeSet<Position> = (0..5).map(|col| Position::new(2, col)).collect();

        assert!(find_path(&world, world.start(), &known).is_none());
    }

    #[test]
    fn test_from_goal_is_single_cell() {
        let world = world_5x5(&[]);
        let path = find_path(&world, world.goal(), &BTreeSet::new()).unwrap();

        assert_eq!(path, vec![world.goal()]);
    }

    #[test]
    fn test_neighbors_stay_in_bounds() {
        let world = world_5x5(&[]);
        let corner: Vec<_> = neighbors(&world, Position::new(0, 0)).collect();
        assert_eq!(corner, positions(&[(0, 1), (1, 0)]));

        let middle: Vec<_> = neighbors(&world, Position::new(2, 2)).collect();
        assert_eq!(middle, positions(&[(2, 3), (3, 2), (2, 1), (1, 2)]));
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path(&[]), "No path");
        assert_eq!(format_path(&positions(&[(0, 0), (0, 1)])), "(0,0) -> (0,1)");
    }
}
