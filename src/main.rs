use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use arcade_physics_server::config::ServerConfig;
use arcade_physics_server::net::start_websocket_server;
use arcade_physics_server::physics::PhysicsWorld;
use arcade_physics_server::state::SharedGameState;

/// Arcade vehicle physics server
#[derive(Parser, Debug)]
#[command(name = "arcade-physics-server")]
#[command(author, version, about = "Authoritative arcade vehicle physics over WebSocket", long_about = None)]
struct Cli {
    /// TOML config file (defaults to the arcade preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config
    #[arg(short, long)]
    bind: Option<String>,

    /// Send the force/raycast debug overlay with every snapshot
    #[arg(long)]
    debug_overlay: bool,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Starting arcade physics server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::load(cli.config.as_deref()).context("loading server config")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    config.debug_overlay |= cli.debug_overlay;

    let dt = config.tick_dt();
    let bind = config.bind.clone();
    info!("⏱️ Ticking at {} Hz (dt = {:.4} s)", config.tick_hz, dt);

    let state = Arc::new(Mutex::new(SharedGameState::new(config)));
    let physics = Arc::new(Mutex::new(PhysicsWorld::new()));

    // Start WebSocket server
    let server = tokio::spawn(start_websocket_server(
        bind,
        Arc::clone(&state),
        Arc::clone(&physics),
    ));

    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if server.is_finished() {
            // bind failures surface here
            return match server.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("websocket server stopped"),
                Err(e) => Err(e).context("websocket server task panicked"),
            };
        }

        let mut phys = physics.lock().await;
        let mut game = state.lock().await;

        game.apply_inputs();

        phys.reset_forces();
        phys.update_queries();
        game.tick_vehicles(&mut phys, dt);
        phys.step(dt);

        game.update_feedback(dt);
        if let Err(e) = game.broadcast_snapshot(&phys.bodies) {
            error!("❌ Snapshot encoding failed: {}", e);
        }
    }
}
