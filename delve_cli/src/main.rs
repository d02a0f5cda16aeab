// Command-line driver for the dungeon generator.
//
// Generates one level from a seed (and optionally a JSON config), prints the
// ASCII map and a short summary, and optionally answers a single path query
// with the route overlaid on the map. `--json` dumps the room graph and raw
// grids instead, for external renderers.
//
// Usage:
//   delve [--seed N] [--config path.json] [--from x,y --to x,y] [--flat] [--json]
//
// Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use delve_dungeon::{CellKind, DungeonConfig, Level, PathMode, RoomGraph, Vec2, generate};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Everything an external renderer needs, in the raw integer grid encoding.
#[derive(Serialize)]
struct LevelDump<'a> {
    seed: u64,
    config: &'a DungeonConfig,
    graph: &'a RoomGraph,
    width: i32,
    height: i32,
    occupancy: Vec<i32>,
    room_index: Vec<i32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let seed: u64 = parse_flag(args, "--seed").unwrap_or(0);
    let config = match flag_value(args, "--config") {
        Some(path) => load_config(path)?,
        None => DungeonConfig::default(),
    };
    let mode = if has_flag(args, "--flat") {
        PathMode::Flat
    } else {
        PathMode::Grouped
    };
    let query = match (flag_value(args, "--from"), flag_value(args, "--to")) {
        (Some(from), Some(to)) => Some((parse_point(from)?, parse_point(to)?)),
        (None, None) => None,
        _ => return Err("--from and --to must be given together".to_string()),
    };

    let level = generate(&config, seed).map_err(|e| e.to_string())?;

    if has_flag(args, "--json") {
        let dump = LevelDump {
            seed,
            config: &level.config,
            graph: &level.graph,
            width: level.grid.width(),
            height: level.grid.height(),
            occupancy: level.grid.occupancy_raw(),
            room_index: level.grid.room_index_raw(),
        };
        let json = serde_json::to_string_pretty(&dump).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    let path = query.map(|(from, to)| {
        let path = level.find_path(from, to, mode);
        info!(?mode, %from, %to, points = path.len(), "path query");
        path
    });

    print_level(&level, path.as_deref());
    Ok(())
}

fn print_level(level: &Level, path: Option<&[Vec2]>) {
    let mut marks = Vec::new();
    if let Some(path) = path {
        marks.extend(path.iter().map(|p| {
            let (x, y) = p.cell();
            (x, y, '*')
        }));
        if let (Some(first), Some(last)) = (path.first(), path.last()) {
            let (sx, sy) = first.cell();
            let (ex, ey) = last.cell();
            marks.push((sx, sy, 'S'));
            marks.push((ex, ey, 'E'));
        }
    }

    print!("{}", level.grid.render(&marks));
    println!();
    println!("Seed:   {}", level.seed);
    println!("Bounds: {}", level.config.bounds);
    println!(
        "Rooms:  {}  Doors: {}",
        level.graph.room_count(),
        level.graph.door_count()
    );
    println!(
        "Cells:  {} floor, {} wall, {} undefined",
        level.grid.count(CellKind::Floor),
        level.grid.count(CellKind::Wall),
        level.grid.count(CellKind::Undefined)
    );
    if let Some(path) = path {
        if path.is_empty() {
            println!("Path:   none");
        } else {
            let length: f64 = path.windows(2).map(|w| w[0].distance(w[1])).sum();
            println!("Path:   {} points, length {:.2}", path.len(), length);
        }
    }
}

fn load_config(path: &str) -> Result<DungeonConfig, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read config {path}: {e}"))?;
    DungeonConfig::from_json(&text).map_err(|e| format!("cannot parse config {path}: {e}"))
}

/// Parse "x,y" into a world position.
fn parse_point(text: &str) -> Result<Vec2, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {text:?}"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("bad x in {text:?}"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("bad y in {text:?}"))?;
    Ok(Vec2::new(x, y))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|v| v.parse().ok())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
