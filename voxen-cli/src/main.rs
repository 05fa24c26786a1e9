//! `voxen`: a thin, headless demonstration binary over `voxen-core` (spec
//! §6 "CLI surface"). It owns nothing the core itself must not own — no
//! global state, no windowing — it only parses arguments, builds a flat
//! synthetic world, and drives the tick/drain loop a fixed number of times
//! so the three worker subsystems can be exercised end to end.

use anyhow::Context;
use std::sync::Arc;
use structopt::StructOpt;
use voxen_core::math::Point3;
use voxen_core::prelude::*;
use voxen_core::world::registry::BlockRegistry;

/// Matches the teacher's `RunOptions` convention: one flat struct derived
/// via `structopt`, plumbed straight into construction.
#[derive(Debug, StructOpt)]
#[structopt(name = "voxen", about = "Headless demo driver for the voxen-core world/lighting/mesh/path engine")]
struct Options {
    /// World width in blocks (must be a positive multiple of 16).
    #[structopt(long, default_value = "64")]
    width: i32,

    /// World height in blocks (1..=128).
    #[structopt(long, default_value = "32")]
    height: i32,

    /// World depth in blocks (must be a positive multiple of 16).
    #[structopt(long, default_value = "64")]
    depth: i32,

    /// Accepted for interface parity with the external windowed client;
    /// this binary never opens a window.
    #[structopt(long)]
    fullscreen: bool,

    /// Number of ticks to run the headless demo loop for.
    #[structopt(long, default_value = "20")]
    ticks: u32,

    /// Path to a JSON block-registry manifest. Falls back to the built-in
    /// stub table when omitted.
    #[structopt(long)]
    registry: Option<std::path::PathBuf>,
}

fn run(options: Options) -> Result<()> {
    if options.fullscreen {
        log::warn!("--fullscreen has no effect: voxen-cli is a headless demo binary");
    }

    let registry = Arc::new(match &options.registry {
        Some(path) => BlockRegistry::load(path)
            .with_context(|| format!("failed to load block registry from {}", path.display()))?,
        None => BlockRegistry::stub(),
    });

    let mut game = Game::new(options.width, options.height, options.depth, registry.clone())
        .context("failed to construct game with the given dimensions")?;

    log::info!(
        "built a {}x{}x{} world with {} registered block kinds",
        options.width,
        options.height,
        options.depth,
        registry.len()
    );

    let stone = registry.try_get_id("stone").unwrap_or(voxen_core::world::registry::AIR);
    for x in 0..options.width {
        for z in 0..options.depth {
            game.world_mut().set_tile(x, 0, z, stone, 0);
        }
    }
    game.initialize_lighting();

    let camera = Point3::new(options.width as f32 / 2.0, options.height as f32 / 2.0, options.depth as f32 / 2.0);
    let mut uploaded = 0usize;

    for tick in 0..options.ticks {
        game.process_lighting(10_000);
        game.submit_mesh_jobs(camera);
        let completed = game.drain_mesh_completions();
        uploaded += completed.len();

        if tick == 0 {
            log::debug!(target: "voxen_cli", "tick 0 submitted the initial mesh load");
        }
    }

    log::info!("ran {} ticks, uploaded {} chunk meshes", options.ticks, uploaded);
    Ok(())
}

fn main() {
    env_logger::init();
    let options = Options::from_args();
    if let Err(error) = run(options) {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}
