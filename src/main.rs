mod cascade;
mod config;
mod error;
mod grid;
mod interactive;
mod occlusion;
mod proxy;
mod render;
mod window;

#[cfg(test)]
mod tests;

// Re-export public API
pub use cascade::{CascadeMode, CascadeParams, CascadeReport, LayerMask, LineOfSight, VisitOutcome};
pub use config::FogConfig;
pub use error::{FogError, FogResult};
pub use grid::{CellState, Direction, LogicalCell, LogicalGrid};
pub use interactive::{InteractiveViewer, ViewerConfig};
pub use occlusion::{Obstacle, ObstacleField};
pub use proxy::{AnimationParams, Proxy};
pub use render::{fog_to_string, save_ppm};
pub use window::{ViewerSource, WindowManager};

use glam::Vec3;

fn main() {
    let _ = env_logger::try_init();

    // Check for command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = match config_from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            return;
        }
    };

    if args.iter().any(|a| a == "--interactive") {
        run_interactive(config);
    } else if args.iter().any(|a| a == "--benchmark") {
        run_benchmark(&config);
    } else if let Some(path) = flag_value(&args, "--snapshot") {
        if let Err(e) = run_snapshot(&config, path) {
            eprintln!("Snapshot failed: {}", e);
        }
    } else {
        println!("Fog Cascade");
        println!("Run with --interactive for minifb viewer");
        println!("Run with --benchmark to test performance");
        println!("Run with --snapshot <file.ppm> to render the configured scene");
        println!("Add --config <file.toml> to any mode to load settings");
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn config_from_args(args: &[String]) -> FogResult<FogConfig> {
    match flag_value(args, "--config") {
        Some(path) => FogConfig::load(path),
        None => Ok(FogConfig::default()),
    }
}

fn map_center(config: &FogConfig) -> Vec3 {
    Vec3::new((config.map_width / 2) as f32, 0.0, (config.map_height / 2) as f32)
}

/// Walk the viewer one cell per step around a square, returning the time per step in ms.
fn walk_square(fog: &mut WindowManager, start: Vec3, side: usize, los: &ObstacleField) -> f64 {
    use std::time::Instant;

    let legs = [Vec3::X, Vec3::Z, -Vec3::X, -Vec3::Z];
    let mut pos = start;
    let start_time = Instant::now();
    for leg in legs {
        for _ in 0..side {
            pos += leg;
            fog.on_viewer_moved(pos.x, pos.z, los);
            fog.animate(1.0 / 60.0);
        }
    }
    start_time.elapsed().as_secs_f64() * 1000.0 / (legs.len() * side) as f64
}

fn run_benchmark(base: &FogConfig) {
    use rayon::prelude::*;
    use std::time::Instant;

    println!("=== Cascade Benchmark ===\n");

    let sizes = [(100, 100), (200, 200), (400, 400)];
    let side = 16;
    let los = base.obstacle_field();

    for (width, height) in sizes {
        let config = FogConfig {
            map_width: width,
            map_height: height,
            ..base.clone()
        };
        println!("Grid size: {}x{}", width, height);
        println!("-----------------------");

        let start = Instant::now();
        let mut fog = match WindowManager::new(&config, map_center(&config), &los) {
            Ok(fog) => fog,
            Err(e) => {
                println!("  Skipped: {}", e);
                println!();
                continue;
            }
        };
        let setup_ms = start.elapsed().as_secs_f64() * 1000.0;
        let visited = fog.last_report().map_or(0, |r| r.visits.len());

        let step_ms = walk_square(&mut fog, map_center(&config), side, &los);

        println!("  Setup + initial pass: {:.3} ms ({} cells visited)", setup_ms, visited);
        println!("  Re-center + incremental pass: {:.3} ms/step", step_ms);
        println!();
    }

    // Independent fog instances, one per viewer
    println!("=== 4 Independent Viewers ===\n");
    let config = base.clone();
    let center = map_center(&config);
    let starts = [
        center,
        center + Vec3::new(-20.0, 0.0, 0.0),
        center + Vec3::new(0.0, 0.0, -20.0),
        center + Vec3::new(-20.0, 0.0, -20.0),
    ];

    let start = Instant::now();
    let sequential: Vec<f64> = starts
        .iter()
        .filter_map(|&s| WindowManager::new(&config, s, &los).ok().map(|mut fog| walk_square(&mut fog, s, side, &los)))
        .collect();
    let elapsed_sequential = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let parallel: Vec<f64> = starts
        .par_iter()
        .filter_map(|&s| WindowManager::new(&config, s, &los).ok().map(|mut fog| walk_square(&mut fog, s, side, &los)))
        .collect();
    let elapsed_parallel = start.elapsed().as_secs_f64() * 1000.0;

    println!("  Sequential: {:.3} ms total ({} viewers)", elapsed_sequential, sequential.len());
    println!("  Parallel:   {:.3} ms total ({} viewers)", elapsed_parallel, parallel.len());
    if elapsed_parallel > 0.0 {
        println!("  Speedup: {:.2}x", elapsed_sequential / elapsed_parallel);
    }
}

fn run_snapshot(config: &FogConfig, path: &str) -> Result<(), String> {
    let obstacles = config.obstacle_field();
    let mut fog = WindowManager::new(config, map_center(config), &obstacles).map_err(|e| e.to_string())?;

    // Two seconds of frames is enough for every animation to settle.
    for _ in 0..120 {
        fog.animate(1.0 / 60.0);
    }

    println!("{}", fog_to_string(&fog, Some(&obstacles)));
    save_ppm(&fog, Some(&obstacles), config.max_size, path, 8).map_err(|e| e.to_string())
}

fn run_interactive(fog: FogConfig) {
    let config = ViewerConfig {
        fog,
        ..ViewerConfig::default()
    };

    match InteractiveViewer::new(config) {
        Ok(mut viewer) => {
            if let Err(e) = viewer.run() {
                eprintln!("Error: {}", e);
            }
        }
        Err(e) => {
            eprintln!("Failed to create viewer: {}", e);
        }
    }
}
