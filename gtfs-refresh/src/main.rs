use std::error::Error;
use std::net::SocketAddr;

use gtfs_refresh::config::{OptionsFile, TripConfig};
use gtfs_refresh::driver::{Driver, DriverConfig};
use gtfs_refresh::realtime::{FeedClientConfig, HttpFeedClient};
use gtfs_refresh::refresh::{RefreshController, SystemClock};
use gtfs_refresh::schedule::{JsonScheduleProvider, TimetableCalculator};
use gtfs_refresh::web::{AppState, create_router};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Options file read on every cycle.
const DEFAULT_OPTIONS_PATH: &str = "gtfs_options.json";

/// Address the read-only HTTP surface binds to.
const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "gtfs-refresh exited");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let trip = TripConfig::from_env()?;
    let options_path =
        std::env::var("GTFS_OPTIONS").unwrap_or_else(|_| DEFAULT_OPTIONS_PATH.to_string());
    let addr: SocketAddr = std::env::var("GTFS_LISTEN")
        .unwrap_or_else(|_| DEFAULT_LISTEN.to_string())
        .parse()?;

    let options = OptionsFile::new(options_path);
    info!(
        trip = %trip.name,
        origin = %trip.origin,
        destination = %trip.destination,
        options = %options.path().display(),
        "configured trip"
    );

    let feed = HttpFeedClient::new(FeedClientConfig::default())?;
    let controller = RefreshController::new(
        trip,
        JsonScheduleProvider::default(),
        TimetableCalculator,
        feed,
        SystemClock,
    );
    let driver = Driver::new(controller, options, DriverConfig::default());

    let app = create_router(AppState::new(driver.latest()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");

    let server = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };

    tokio::select! {
        result = server => result?,
        _ = driver.run(shutdown_signal()) => {}
    }

    info!("shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
