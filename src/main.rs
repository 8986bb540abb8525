use todos::config::Config;
use todos::domain::{auth::Authenticator, repository::TodoRepository};
use todos::http::{routes, routing, state::AppState};
use todos::infrastructure::{sqlite, sqlite_auth::SqliteAuthenticator, sqlite_repo::SqliteTodoRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    // Ensure SQLite file can be created/opened when using a file-backed URL
    sqlite::prepare_sqlite_file(&config.database_url)?;
    let pool = sqlite::connect(&config.database_url).await?;
    let repo = SqliteTodoRepository::new(pool.clone());
    repo.init().await?;
    let auth = SqliteAuthenticator::new(pool).with_ttl(chrono::Duration::hours(config.session_ttl_hours));
    auth.init().await?;

    let router = routing::app(routes::router(AppState::new(auth, repo)));

    tracing::info!(addr = %config.addr, database = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
