use arboard::Clipboard;
use macroquad::prelude::*;
use replan_grid::config::Config;
use replan_grid::error::ConfigResult;
use replan_grid::{logging, Advance, EventLog, GridWorld, Position, ReplanningEngine, RunId, RunStatus};
use std::sync::OnceLock;
use tracing::{info, warn};

// Cell colours
const EMPTY_COLOR: Color = Color::new(0.22, 0.25, 0.32, 1.0);
const START_COLOR: Color = Color::new(0.09, 0.64, 0.29, 1.0);
const GOAL_COLOR: Color = Color::new(0.86, 0.15, 0.15, 1.0);
const OBSTACLE_COLOR: Color = Color::new(0.06, 0.09, 0.16, 1.0);
const KNOWN_OUTLINE: Color = Color::new(0.98, 0.45, 0.09, 1.0);
const PATH_COLOR: Color = Color::new(0.23, 0.51, 0.96, 1.0);
const VISITED_COLOR: Color = Color::new(0.66, 0.33, 0.97, 0.4);
const ROBOT_COLOR: Color = Color::new(0.98, 0.80, 0.08, 1.0);

const GRID_ORIGIN: (f32, f32) = (20.0, 20.0);
const PANEL_WIDTH: f32 = 420.0;

/// Visualization state
struct VisState {
    world: GridWorld,
    engine: ReplanningEngine<EventLog>,
    run: Option<RunId>,
    /// Seconds of frame time left before the next checkpoint
    wait: f32,
    robot: Position,
    cell_size: f32,
    background: Color,
}

impl VisState {
    fn new(config: &Config, world: GridWorld) -> Self {
        let robot = world.start();
        VisState {
            world,
            engine: ReplanningEngine::new(config.timing(), EventLog::new()),
            run: None,
            wait: 0.0,
            robot,
            cell_size: config.visual.cell_size,
            background: Color::from_rgba(
                config.visual.background_r,
                config.visual.background_g,
                config.visual.background_b,
                255,
            ),
        }
    }

    fn cell_at(&self, mouse_x: f32, mouse_y: f32) -> Option<Position> {
        let col = ((mouse_x - GRID_ORIGIN.0) / self.cell_size).floor() as i32;
        let row = ((mouse_y - GRID_ORIGIN.1) / self.cell_size).floor() as i32;
        let pos = Position::new(row, col);
        self.world.is_in_bounds(pos).then_some(pos)
    }

    fn handle_click(&mut self, mouse_x: f32, mouse_y: f32) {
        let Some(pos) = self.cell_at(mouse_x, mouse_y) else {
            return;
        };

        // Ground truth is frozen while a run is active
        if self.engine.is_running() {
            warn!(cell = %pos, "obstacle edit ignored while a run is active");
            return;
        }

        match self.world.toggle_obstacle(pos) {
            Ok(blocked) => info!(cell = %pos, blocked, "obstacle toggled"),
            Err(e) => warn!("obstacle edit rejected: {}", e),
        }
    }

    fn clear_obstacles(&mut self) {
        if self.engine.is_running() {
            warn!("clear ignored while a run is active");
            return;
        }
        self.world.clear_obstacles();
        info!("obstacles cleared");
    }

    fn start_run(&mut self) {
        if self.engine.is_running() {
            warn!("start ignored: a run is already active");
            return;
        }
        self.engine.observer_mut().clear();
        match self.engine.start(self.world.clone()) {
            Ok(run) => {
                self.run = Some(run);
                self.wait = 0.0;
                self.robot = self.world.start();
            }
            Err(e) => warn!("start rejected: {}", e),
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.run = None;
        self.wait = 0.0;
        self.robot = self.world.start();
    }

    /// Drive the engine from the frame clock
    fn update(&mut self, dt: f32) {
        self.wait -= dt;
        while let Some(run) = self.run {
            if self.wait > 0.0 {
                break;
            }
            match self.engine.advance(run) {
                Advance::Pause(pause) => {
                    self.wait += self.engine.timing().duration(pause).as_secs_f32();
                }
                Advance::Finished(outcome) => {
                    info!(status = %outcome.status, steps = outcome.traversed.len() - 1, "run over");
                    if let Some(&last) = outcome.traversed.last() {
                        self.robot = last;
                    }
                    self.run = None;
                }
                Advance::Cancelled => self.run = None,
            }
            if let Some(pos) = self.engine.robot_position() {
                self.robot = pos;
            }
        }
        if self.run.is_none() {
            self.wait = 0.0;
        }
    }

    fn copy_to_clipboard(&self) {
        let layout = self.world.to_layout();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&layout) {
                    warn!("failed to copy to clipboard: {}", e);
                } else {
                    info!("grid layout copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => warn!("failed to access clipboard: {}", e),
        }
    }

    fn draw(&self) {
        clear_background(self.background);

        let snapshot = self.engine.snapshot();
        let size = self.cell_size;

        for row in 0..self.world.size() {
            for col in 0..self.world.size() {
                let pos = Position::new(row, col);
                let px = GRID_ORIGIN.0 + col as f32 * size;
                let py = GRID_ORIGIN.1 + row as f32 * size;

                let color = if pos == self.world.start() {
                    START_COLOR
                } else if pos == self.world.goal() {
                    GOAL_COLOR
                } else if self.world.is_obstacle(pos) {
                    OBSTACLE_COLOR
                } else if snapshot.current_path.contains(&pos) {
                    PATH_COLOR
                } else {
                    EMPTY_COLOR
                };
                draw_rectangle(px, py, size - 2.0, size - 2.0, color);

                if snapshot.visited_cells.contains(&pos) {
                    draw_rectangle(px, py, size - 2.0, size - 2.0, VISITED_COLOR);
                }
                if snapshot.known_obstacles.contains(&pos) {
                    draw_rectangle_lines(px + 2.0, py + 2.0, size - 6.0, size - 6.0, 3.0, KNOWN_OUTLINE);
                }
            }
        }

        let robot_x = GRID_ORIGIN.0 + (self.robot.col as f32 + 0.5) * size - 1.0;
        let robot_y = GRID_ORIGIN.1 + (self.robot.row as f32 + 0.5) * size - 1.0;
        draw_circle(robot_x, robot_y, size * 0.28, ROBOT_COLOR);

        let panel_x = GRID_ORIGIN.0 * 2.0 + self.world.size() as f32 * size;
        let lines = [
            format!("Status: {}", snapshot.status),
            snapshot.status.message().to_string(),
            format!("Robot: {}", self.robot),
            format!("Plan length: {}", snapshot.current_path.len()),
            format!("Visited: {}", snapshot.visited_cells.len()),
            format!("Known obstacles: {}", snapshot.known_obstacles.len()),
            String::new(),
            "Legend: green start, red goal, dark obstacle,".to_string(),
            "blue plan, purple visited, orange ring known".to_string(),
            String::new(),
            "Left click: toggle obstacle (when idle)".to_string(),
            "Space: start   R: reset   X: clear obstacles".to_string(),
            "C: copy layout to clipboard   Esc: quit".to_string(),
        ];
        for (i, line) in lines.iter().enumerate() {
            let color = if i == 0 { status_color(snapshot.status) } else { WHITE };
            draw_text(line, panel_x, GRID_ORIGIN.1 + 20.0 + i as f32 * 24.0, 22.0, color);
        }
    }
}

fn status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::GoalReached => START_COLOR,
        RunStatus::NoPath => GOAL_COLOR,
        RunStatus::ObstacleDetected => KNOWN_OUTLINE,
        _ => WHITE,
    }
}

/// Config and world, loaded once before the window opens and shared with `main`
struct Setup {
    config: Config,
    world: ConfigResult<GridWorld>,
}

static SETUP: OnceLock<Setup> = OnceLock::new();

fn setup() -> &'static Setup {
    SETUP.get_or_init(|| {
        logging::init();
        let config = Config::load();
        let world = config.build_world();
        Setup { config, world }
    })
}

fn window_conf() -> Conf {
    let Setup { config, world } = setup();
    let size = world.as_ref().map(|w| w.size()).unwrap_or(config.grid.size);
    let grid_px = GRID_ORIGIN.0 * 2.0 + size.max(1) as f32 * config.visual.cell_size;
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (grid_px + PANEL_WIDTH) as i32,
        window_height: grid_px.max(360.0) as i32,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let Setup { config, world } = setup();
    let world = match world {
        Ok(world) => world.clone(),
        Err(e) => {
            tracing::error!("invalid grid configuration: {}", e);
            return;
        }
    };

    let mut state = VisState::new(config, world);

    loop {
        if is_mouse_button_pressed(MouseButton::Left) {
            let (mouse_x, mouse_y) = mouse_position();
            state.handle_click(mouse_x, mouse_y);
        }

        if is_key_pressed(KeyCode::Space) {
            state.start_run();
        }

        if is_key_pressed(KeyCode::R) {
            state.reset();
        }

        if is_key_pressed(KeyCode::X) {
            state.clear_obstacles();
        }

        // Copy grid to clipboard on C key
        if is_key_pressed(KeyCode::C) {
            state.copy_to_clipboard();
        }

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.update(get_frame_time());
        state.draw();

        next_frame().await
    }

    let log = state.engine.observer();
    if config.logging.print_event_log {
        log.print();
    }
    println!("{}", log.summary());
}
