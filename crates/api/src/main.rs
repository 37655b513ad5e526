use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vendora_observability::init();

    let config = vendora_api::config::ApiConfig::from_env();
    let addr = config.addr();
    let app = vendora_api::app::build_app(&config).await;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
