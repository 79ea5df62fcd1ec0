mod common;

use common::{file_stem, layout_files, relaxed_distance, run_logged};
use replan_grid::config::load_layout;
use replan_grid::RunStatus;

/// Every layout in test_data/layouts runs to the status its name promises:
/// `goal_*` must reach the goal, `nopath_*` must end in NO_PATH
#[test]
fn layout_fixtures() {
    let files = layout_files("./test_data/layouts");
    assert!(!files.is_empty(), "no layout fixtures found");

    for path in &files {
        let name = file_stem(path);
        let world = match load_layout(path) {
            Ok(world) => world,
            Err(e) => panic!("Layout '{}' failed to parse: {}", name, e),
        };

        let expected = if name.starts_with("goal_") {
            RunStatus::GoalReached
        } else if name.starts_with("nopath_") {
            RunStatus::NoPath
        } else {
            panic!("Layout '{}' has no expected-outcome prefix", name);
        };

        let (outcome, log) = run_logged(world.clone());
        assert_eq!(outcome.status, expected, "Layout '{}'", name);
        assert_eq!(log.last_status(), expected, "Layout '{}'", name);
        assert!(outcome.planning_cycles <= world.obstacles().len() + 1, "Layout '{}'", name);

        // Travelling blind can never beat the shortest route under full knowledge
        if expected == RunStatus::GoalReached {
            let optimal = relaxed_distance(world.size(), world.start(), world.goal(), world.obstacles())
                .expect("goal reachable");
            assert!(outcome.traversed.len() - 1 >= optimal, "Layout '{}'", name);
        }
    }
}

#[test]
fn maze_fixture_replans_several_times() {
    let world = load_layout("./test_data/layouts/goal_maze.txt").unwrap();
    let (outcome, log) = run_logged(world);

    assert!(outcome.reached_goal());
    assert_eq!(outcome.planning_cycles, 7);
    assert_eq!(outcome.traversed.len(), 13);
    assert_eq!(
        log.snapshots()
            .iter()
            .filter(|s| s.status == RunStatus::ObstacleDetected)
            .count(),
        6
    );
}
