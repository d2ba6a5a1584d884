//! # Recipe API Server
//!
//! Serves the read-only recipe API and keeps a "daily recipe" rotating on a
//! cron schedule.
//!
//! ## Functionality:
//! - **HTTP API**: health, paginated listing, search, lookup by id and the
//!   current daily recipe (see `recipe_logic::routes`).
//! - **Daily Rotation**: a `tokio-cron-scheduler` job that moves the daily flag
//!   to a uniformly random recipe, midnight UTC unless configured otherwise.
//! - **Persistence**: PostgreSQL through a `deadpool-postgres` pool. The schema
//!   is created on startup when missing.
//! - **Configuration**: defaults, then `server_recipes.conf` (JSON), then
//!   environment variables and command line flags.
//! - **Logging**: `tracing` to the console and to a daily rolling JSON file.
//! - **Graceful Shutdown**: `tokio-graceful` drains in-flight requests on
//!   signal, then the scheduler is stopped.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use static_init::dynamic;
use tokio::net::TcpListener;
use tokio_graceful::{Shutdown, ShutdownGuard};
use tracing::{error, info, warn};

use lib_common::connections::Database;
use lib_common::loggers::{LogOptions, setup_logging};
use recipes_server::recipe_logic::config::{Settings, load_config};
use recipes_server::recipe_logic::daily_job::DailyRecipeJob;
use recipes_server::recipe_logic::postgres::PgRecipeStore;
use recipes_server::recipe_logic::rotator::DailyRecipeRotator;
use recipes_server::recipe_logic::routes;
use recipes_server::recipe_logic::state::AppState;
use recipes_server::recipe_logic::store::RecipeStore;

// load .env files before anything else
#[dynamic]
static DOTENV_INIT: () = {
    let dotenv_os: &str = if cfg!(target_os = "windows") {
        ".env.windows"
    } else {
        ".env.linux"
    };

    dotenvy::dotenv().ok();
    dotenvy::from_filename(dotenv_os).ok();
};

#[tokio::main]
async fn main() -> Result<()> {
    // Access DOTENV_INIT to ensure it's initialized before clap reads the env
    let _ = &*DOTENV_INIT;

    let settings = load_config().context("Failed to load configuration")?;

    let _log_guard = setup_logging(&LogOptions {
        log_dir: settings.log_dir.clone(),
        file_prefix: "server_recipes".to_string(),
        level: settings.log_level.clone(),
    })
    .context("Failed to initialize logging")?;

    info!("Starting server_recipes");
    info!("{}", settings);

    let db = Database::connect(&settings.database_url, &settings.pool)
        .context("Failed to create database pool")?;
    let pg_store = PgRecipeStore::new(db);
    pg_store
        .ensure_schema()
        .await
        .context("Failed to prepare database schema")?;
    let store: Arc<dyn RecipeStore> = Arc::new(pg_store);

    let rotator = Arc::new(DailyRecipeRotator::new(
        Arc::clone(&store),
        settings.rotation_mode,
    ));
    info!(mode = %rotator.mode(), "Daily recipe rotator ready");
    if settings.rotate_on_startup {
        rotator.tick().await;
    }

    let mut daily_job = DailyRecipeJob::start(
        Arc::clone(&rotator),
        &settings.daily_cron,
        settings.daily_timezone,
    )
    .await
    .context("Failed to start the daily recipe job")?;
    match daily_job.next_tick().await {
        Ok(Some(next)) => info!("Next daily recipe rotation at {}", next),
        Ok(None) => warn!("Daily recipe job has no upcoming run"),
        Err(e) => warn!("Could not determine next daily recipe rotation: {}", e),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    let shutdown: Shutdown = Shutdown::default();
    let state = AppState::new(store);
    shutdown.spawn_task_fn(move |guard| serve(guard, listener, state, settings));

    match shutdown.shutdown_with_limit(Duration::from_secs(10)).await {
        Ok(elapsed) => {
            info!(
                "shutdown: gracefully {}s after shutdown signal received",
                elapsed.as_secs_f64()
            );
        }
        Err(e) => {
            warn!("shutdown: forcefully due to timeout: {}", e);
        }
    }

    if let Err(e) = daily_job.shutdown().await {
        error!("Failed to stop the daily recipe job: {}", e);
    }

    info!("Bye!");
    Ok(())
}

async fn serve(guard: ShutdownGuard, listener: TcpListener, state: AppState, settings: Settings) {
    let app = routes::app(state, &settings.allowed_origins);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            guard.cancelled().await;
            info!("Signal received: initiate graceful shutdown");
        })
        .await;
    if let Err(e) = result {
        error!("HTTP server error: {}", e);
    }
}
