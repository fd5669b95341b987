use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmgate::config::AppConfig;
use farmgate::services::AuditLogger;
use farmgate::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "farmgate=info,tower_http=info,sqlx=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().await?;
    sqlx::migrate!("./migrations").run(&config.database_pool).await?;

    let audit = AuditLogger::spawn(config.database_pool.clone());
    let addr = config.server_address();
    let app = create_app(AppState { config, audit });

    tracing::info!("Starting farmgate server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
