use tracing_subscriber::EnvFilter;

use cardlink::{app, bootstrap, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cardlink=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    bootstrap(&config).await?;

    let addr = config.bind_addr()?;
    let state = AppState::new(config);
    let loaded = state.store.load().await;
    tracing::info!(
        "Loaded {} link previews from {}",
        loaded,
        state.store.path().display()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}
