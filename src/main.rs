use std::sync::Arc;
use tourney_server::automation::AutomationScheduler;
use tourney_server::clock::SystemClock;
use tourney_server::config::Config;
use tourney_server::db;
use tourney_server::lookup::NullResultSource;
use tourney_server::notify::LogNotifier;
use tourney_server::results::{DeadlineProcessor, ResultService};
use tourney_server::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load config
    let config = Config::from_env();
    tracing::info!("Starting tournament server");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    db::run_migrations(&pool).await?;

    let store = Arc::new(SqliteStore::new(Arc::new(pool)));
    let clock = Arc::new(SystemClock);
    let notifier = Arc::new(LogNotifier);

    let results = Arc::new(ResultService::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let deadlines = Arc::new(DeadlineProcessor::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
        results.clone(),
    ));

    // Plug a real platform client in here to enable auto-detection.
    let source = Arc::new(NullResultSource);

    let scheduler = Arc::new(AutomationScheduler::new(
        store,
        notifier,
        clock,
        results,
        deadlines,
        source,
        config.automation_interval_secs,
    ));
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    handle.stop().await;

    Ok(())
}
