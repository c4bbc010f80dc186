//! Main application entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_data::{DashboardConfig, SqliteBoatService};
use fleet_views::{Dashboard, DashboardContext};
use tracing::{info, warn, Level};

mod collaborators;
mod create_sample_db;

use collaborators::{FixedPosition, TracingNavigator, TracingNotifier};

const DEFAULT_CONFIG_PATH: &str = "fleet.json";

/// Create the sample database if it is missing and seeding is enabled
fn prepare_database(config: &DashboardConfig) -> Result<()> {
    let path = &config.database_path;
    if path.exists() || !config.seed_sample_data {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    info!("Seeding sample database at {:?}", path);
    create_sample_db::create_sample_database(path)
        .with_context(|| format!("Failed to seed {:?}", path))
}

fn report(dashboard: &Dashboard) {
    let results = dashboard.results();
    match results.result().error {
        Some(error) => warn!(%error, "Boat search failed"),
        None => info!(
            filter = ?results.filter().map(|f| f.boat_type_id),
            boats = results.boats().len(),
            "Search results"
        ),
    }
    info!(
        markers = dashboard.proximity().markers().len(),
        position = ?dashboard.proximity().state(),
        "Boats near me"
    );
}

async fn run(config: DashboardConfig) -> Result<()> {
    let service = Arc::new(SqliteBoatService::open(
        &config.database_path,
        config.nearby_limit,
    )?);
    let context = DashboardContext::new(
        service.clone(),
        service,
        Arc::new(FixedPosition::new(config.home_position)),
        Arc::new(TracingNotifier),
        Arc::new(TracingNavigator),
    );

    let dashboard = Dashboard::new(context);
    dashboard.start(&config.initial_boat_type_id).await;
    dashboard.settled().await;

    if let Some(error) = dashboard.filter().error() {
        warn!(%error, "Boat types unavailable");
    }
    report(&dashboard);

    // Select the first row, as a click on its tile would
    if let Some(first) = dashboard.results().boats().first().cloned() {
        dashboard.results().select_boat(first.id);
        dashboard.bus().flush().await;
        dashboard.detail().record_settled().await;
        dashboard.reviews().settled().await;
        info!(
            boat = ?dashboard.detail().boat_name(),
            reviews = dashboard.reviews().reviews().len(),
            "Detail tabs bound"
        );
    }

    if let Some(options) = dashboard.filter().options() {
        for option in options.iter().skip(1) {
            dashboard.filter().select(option.value.clone());
            dashboard.settled().await;
            info!(boat_type = %option.label, "Filter applied");
            report(&dashboard);
        }
    }

    dashboard.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = DashboardConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    // Initialize tracing
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting fleet dashboard");
    prepare_database(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}
