mod common;

use common::{board, positions, run_logged};
use replan_grid::config::Config;
use replan_grid::{ConfigError, GridWorld, Position, RunStatus};
use std::collections::BTreeSet;

fn statuses(log: &replan_grid::EventLog) -> Vec<RunStatus> {
    log.snapshots().iter().map(|s| s.status).collect()
}

#[test]
fn open_board_reaches_goal_in_one_plan() {
    let (outcome, log) = run_logged(board(&[]));

    assert_eq!(outcome.status, RunStatus::GoalReached);
    assert_eq!(outcome.traversed.len(), 9);
    assert_eq!(outcome.planning_cycles, 1);
    assert_eq!(
        outcome.traversed,
        positions(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 4), (2, 4), (3, 4), (4, 4)])
    );

    let mut expected = vec![RunStatus::Running, RunStatus::Planning, RunStatus::Planning];
    expected.extend([RunStatus::Moving; 8]);
    expected.push(RunStatus::GoalReached);
    assert_eq!(statuses(&log), expected);
    assert!(!statuses(&log).contains(&RunStatus::ObstacleDetected));
    assert_eq!(log.moves(), outcome.traversed[1..].to_vec());

    let last = log.snapshots().last().copied().unwrap().clone();
    assert_eq!(last.visited_cells.len(), 9);
    assert!(last.visited_cells.contains(&Position::new(0, 0)));
}

#[test]
fn obstacle_on_first_step_is_found_by_attempted_entry() {
    let (outcome, log) = run_logged(board(&[(0, 1)]));
    let snapshots = log.snapshots();

    // First plan still goes straight through the unknown obstacle
    assert_eq!(snapshots[2].status, RunStatus::Planning);
    assert_eq!(snapshots[2].current_path[1], Position::new(0, 1));
    assert!(snapshots[2].known_obstacles.is_empty());

    // Discovery happens before any move; only the start cell is occupied
    assert_eq!(snapshots[3].status, RunStatus::ObstacleDetected);
    assert_eq!(snapshots[3].known_obstacles, BTreeSet::from([Position::new(0, 1)]));
    assert_eq!(snapshots[3].visited_cells, BTreeSet::from([Position::new(0, 0)]));

    // Replanned around it from the unchanged start cell
    assert_eq!(
        snapshots[5].current_path,
        positions(&[(0, 0), (1, 0), (1, 1), (1, 2), (1, 3), (1, 4), (2, 4), (3, 4), (4, 4)])
    );

    assert_eq!(outcome.status, RunStatus::GoalReached);
    assert_eq!(outcome.planning_cycles, 2);
    assert_eq!(outcome.traversed, snapshots[5].current_path);

    let last = snapshots.last().unwrap();
    assert_eq!(last.status, RunStatus::GoalReached);
    assert!(!last.is_running);
    assert_eq!(last.known_obstacles.len(), 1);
}

#[test]
fn full_wall_ends_in_no_path() {
    let wall: Vec<(i32, i32)> = (0..5).map(|col| (2, col)).collect();
    let (outcome, log) = run_logged(board(&wall));

    assert_eq!(outcome.status, RunStatus::NoPath);
    // One cycle per wall cell discovered plus the final failed plan
    assert_eq!(outcome.planning_cycles, 6);
    assert_eq!(
        outcome.traversed,
        positions(&[
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (1, 4),
            (1, 3),
            (1, 2),
            (1, 1),
            (1, 0),
        ])
    );

    let last = log.snapshots().last().copied().unwrap().clone();
    assert_eq!(last.status, RunStatus::NoPath);
    assert!(!last.is_running);
    assert_eq!(last.known_obstacles, board(&wall).obstacles().clone());
    assert_eq!(
        statuses(&log)
            .iter()
            .filter(|s| **s == RunStatus::ObstacleDetected)
            .count(),
        5
    );
}

#[test]
fn obstacle_on_goal_is_rejected_before_start() {
    let err = GridWorld::new(5, Position::new(0, 0), Position::new(4, 4), [Position::new(4, 4)])
        .unwrap_err();
    assert!(matches!(err, ConfigError::ObstacleOnEndpoint(p) if p == Position::new(4, 4)));

    let mut world = board(&[]);
    assert!(world.toggle_obstacle(Position::new(4, 4)).is_err());
    assert!(world.toggle_obstacle(Position::new(0, 0)).is_err());
    assert!(world.obstacles().is_empty());

    assert!(matches!(
        GridWorld::parse_layout("S....\n.....\n.....\n.....\n....#\n"),
        Err(ConfigError::Layout { .. })
    ));
}

#[test]
fn boxed_in_goal_is_discovered_next_to_it() {
    // Both approaches to the goal are blocked, which the robot only learns on arrival
    let (outcome, log) = run_logged(board(&[(3, 4), (4, 3)]));

    assert_eq!(outcome.status, RunStatus::NoPath);
    assert_eq!(log.last_status(), RunStatus::NoPath);
    assert_eq!(outcome.planning_cycles, 3);
    assert_eq!(
        outcome.traversed,
        positions(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 4), (2, 4), (2, 3), (3, 3)])
    );
}

#[test]
fn config_defaults_drive_a_full_run() {
    let config = Config::from_toml_str("[timing]\nplanning_ms = 0\nstep_ms = 0\nobstacle_ms = 0\n").unwrap();
    let world = config.build_world().unwrap();
    let (outcome, _) = run_logged(world);

    assert!(outcome.reached_goal());
}
