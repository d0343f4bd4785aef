use skyvestments_server::{
    api::app_router,
    build_state,
    config::Config,
    init_tracing,
    scheduler::{start_catalog_refresh_scheduler, start_price_refresh_scheduler},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);
    let state = build_state(&config).await?;

    start_price_refresh_scheduler(state.clone(), config.price_refresh_interval);
    start_catalog_refresh_scheduler(state.clone(), config.catalog_refresh_interval);

    let prices = state.prices.clone();
    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    prices.flush().await;
    tracing::info!("Price cache flushed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
