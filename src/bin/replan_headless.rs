//! Run one layout through the replanning engine without a window.
//!
//! Usage: replan_headless [layout-file]
//!
//! Without a layout file the grid comes from config.toml (or the defaults).
//! Every engine event is printed to stdout as one JSON object per line and a
//! summary goes to stderr.

use replan_grid::config::{load_layout, Config};
use replan_grid::pathfinding::format_path;
use replan_grid::{logging, ChannelObserver, EventLog, PathfindingService, ReplanningEngine};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(reached_goal) => {
            if reached_goal {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let config = Config::load();
    let world = match std::env::args().nth(1) {
        Some(path) => load_layout(&path)?,
        None => config.build_world()?,
    };

    info!("running layout:\n{}", world.to_layout());

    let (observer, mut rx) = ChannelObserver::channel();
    let service = PathfindingService::new(ReplanningEngine::new(config.timing(), observer));

    // Print events as they arrive; the channel closes when the service is dropped
    let printer = tokio::spawn(async move {
        let mut log = EventLog::new();
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("failed to encode event: {}", e),
            }
            log.log(event);
        }
        log
    });

    let outcome = service.run(world).await?;
    drop(service);

    let log = printer.await?;
    eprintln!("{}", log.summary());
    eprintln!("Traversed: {}", format_path(&outcome.traversed));

    Ok(outcome.reached_goal())
}
