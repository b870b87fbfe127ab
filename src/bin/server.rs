//! gantry-server binary
//!
//! Starts the animation engine against an in-memory block grid, spawns a
//! demo scene (door, portcullis, windmill), toggles it once and runs the
//! tick loop until SIGINT.
//!
//! ## Configuration (env / CLI, plus optional TOML via `config` crate)
//!
//! | Key                      | Default | Description                         |
//! |--------------------------|---------|-------------------------------------|
//! | `GANTRY_TICK_RATE_HZ`    | `20`    | Scheduler tick rate                 |
//! | `GANTRY_CONFIG`          | *(none)*| Path to a TOML engine config file   |
//!
//! TOML keys (all optional): `server_tick_seconds`, `snap_on_abort`,
//! `ticks_per_quarter_revolution`.

use anyhow::{Context, Result};
use clap::Parser;
use gantry::{
    AnimationCause, AnimationEngine, AnimationRequest, BlockPos, Cuboid, DriverConfig,
    EngineConfig, FixedGameTime, GridSurface, MovementDirection, NotificationSink, Structure,
    StructureId, StructureStore, StructureType, TickDriver, ToggleEnd, ToggleStart,
};
use parking_lot::Mutex;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "gantry-server", about = "Gantry animation engine", version)]
struct Args {
    /// Scheduler tick rate (Hz)
    #[arg(long, env = "GANTRY_TICK_RATE_HZ", default_value_t = 20.0)]
    tick_rate_hz: f64,

    /// Optional TOML engine config file
    #[arg(long, env = "GANTRY_CONFIG")]
    config: Option<String>,
}

// ---------------------------------------------------------------------------
// Log sink
// ---------------------------------------------------------------------------

struct LogSink;

impl NotificationSink for LogSink {
    fn on_toggle_start(&self, event: &ToggleStart) {
        log::info!(
            "sink: structure {} started ({} ticks expected)",
            event.structure_id,
            event.expected_ticks
        );
    }

    fn on_toggle_end(&self, event: &ToggleEnd) {
        log::info!(
            "sink: structure {} ended (success={})",
            event.structure_id,
            event.success
        );
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gantry=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let engine_config = load_engine_config(args.config.as_deref())?;

    log::info!(
        "Starting gantry-server (tick_rate={}Hz, tick_seconds={}, snap_on_abort={})",
        args.tick_rate_hz,
        engine_config.server_tick_seconds,
        engine_config.snap_on_abort,
    );

    // Build world + demo scene
    let surface = Arc::new(GridSurface::new());
    let store = Arc::new(StructureStore::new());
    let time = Arc::new(FixedGameTime::new(6, 30));
    let demo_ids = build_demo_scene(&surface, &store);

    let registry = Arc::new(gantry::ActivityRegistry::new());
    let mut engine = AnimationEngine::new(
        engine_config,
        registry,
        store,
        surface,
        time,
    );
    engine.add_sink(Arc::new(LogSink));

    // Toggle the demo structures once so there is something to watch.
    for id in demo_ids {
        match engine.request_toggle(id, AnimationRequest::toggle(AnimationCause::Server)) {
            Ok(_) => log::info!("demo toggle accepted for structure {}", id),
            Err(rej) => log::warn!("demo toggle rejected: {}", rej),
        }
    }

    let engine = Arc::new(Mutex::new(engine));

    // Run until shutdown
    TickDriver::new(
        DriverConfig {
            tick_rate_hz: args.tick_rate_hz,
        },
        engine,
    )
    .run()
    .await
}

// ---------------------------------------------------------------------------
// Config & scene helpers
// ---------------------------------------------------------------------------

fn load_engine_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()
        .with_context(|| format!("failed to load config file '{path}'"))?;
    let defaults = EngineConfig::default();
    Ok(EngineConfig {
        server_tick_seconds: settings
            .get_float("server_tick_seconds")
            .unwrap_or(defaults.server_tick_seconds),
        snap_on_abort: settings
            .get_bool("snap_on_abort")
            .unwrap_or(defaults.snap_on_abort),
        ticks_per_quarter_revolution: settings
            .get_int("ticks_per_quarter_revolution")
            .map(|t| t.max(1) as u32)
            .unwrap_or(defaults.ticks_per_quarter_revolution),
    })
}

fn build_demo_scene(surface: &GridSurface, store: &StructureStore) -> Vec<StructureId> {
    // A hinged door: 1 wide, 4 tall, 4 deep, pivot on its corner.
    let door_box = Cuboid::new(BlockPos::new(10, 64, 10), BlockPos::new(10, 67, 13));
    surface.fill(door_box);
    let mut door = Structure::new(
        StructureId(1),
        "demo-door",
        StructureType::BigDoor,
        door_box,
        BlockPos::new(10, 64, 10),
    );
    door.movement_direction = MovementDirection::Clockwise;
    store.insert(door);

    // A portcullis: 4 wide, 4 tall, raised by 4 blocks.
    let gate_box = Cuboid::new(BlockPos::new(0, 64, 0), BlockPos::new(3, 67, 0));
    surface.fill(gate_box);
    let mut gate = Structure::new(
        StructureId(2),
        "demo-portcullis",
        StructureType::Portcullis,
        gate_box,
        BlockPos::new(1, 64, 0),
    );
    gate.blocks_to_move = 4;
    store.insert(gate);

    // A windmill: flat 5x5 blade plane, spins until cancelled.
    let blades_box = Cuboid::new(BlockPos::new(20, 70, 18), BlockPos::new(20, 74, 22));
    surface.fill(blades_box);
    let mut blades = Structure::new(
        StructureId(3),
        "demo-windmill",
        StructureType::Windmill,
        blades_box,
        BlockPos::new(20, 72, 20),
    );
    blades.movement_direction = MovementDirection::Clockwise;
    store.insert(blades);

    vec![StructureId(1), StructureId(2), StructureId(3)]
}
