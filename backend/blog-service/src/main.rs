use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::config::StoreBackend;
use blog_service::db::{ContentStore, MemoryContentStore, PgContentStore};
use blog_service::middleware::{IdentityMiddleware, MetricsMiddleware};
use blog_service::{handlers, AppState, Config};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ContentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory content store; data is lost on restart");
            Ok(Arc::new(MemoryContentStore::new()))
        }
        StoreBackend::Postgres => {
            let db_config = db_pool::DbConfig::from_env("blog-service")
                .map_err(anyhow::Error::msg)
                .context("database configuration")?;
            db_config.log_config();

            let pool = db_pool::create_pool(db_config)
                .await
                .context("failed to connect to PostgreSQL")?;
            let store = PgContentStore::new(pool);

            if config.store.run_migrations {
                store.migrate().await.context("failed to run migrations")?;
                tracing::info!("database migrations applied");
            }
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;
    let state = AppState::new(store, &config);
    let tokens = state.tokens.clone();
    let state = web::Data::new(state);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(
        address = %bind_address,
        cache_ttl_secs = config.feed.global_cache_ttl_secs,
        "HTTP server listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(IdentityMiddleware::new(tokens.clone()))
            .wrap(MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    tracing::info!("blog-service shut down");
    Ok(())
}
