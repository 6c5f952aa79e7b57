use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use filmvault::{init_pool_with, run_migrations, Config, Filters, Models};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: DATABASE_URL (default: sqlite://filmvault.db)");
            eprintln!("Optional: DB_MAX_CONNECTIONS (default: 10)");
            eprintln!("Optional: DB_QUERY_TIMEOUT_SECS (default: 3)");
            std::process::exit(1);
        }
    };

    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Query timeout: {:?}", config.query_timeout);

    // Connect to database
    let pool = match init_pool_with(&config.database_url, config.max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection error: {}", e);
            std::process::exit(1);
        }
    };

    // Create schema
    if let Err(e) = run_migrations(&pool).await {
        eprintln!("Migration error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database migrations completed");

    let models = Models::new(pool.clone(), config.query_timeout);

    match models.movies.list("", &[], &Filters::default()).await {
        Ok(movies) => tracing::info!("Movies on first page: {}", movies.len()),
        Err(e) => tracing::error!("Failed to list movies: {}", e),
    }

    pool.close().await;
    tracing::info!("Database closed");
}
