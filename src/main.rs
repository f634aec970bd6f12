// src/main.rs

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use studyroom::{
    background::expiry_sweep,
    config::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let sweep_interval = config.sweep_interval;

    // Se a configuração falhar, a aplicação não deve iniciar
    let app_state = AppState::new(config).await?;

    let cancel = CancellationToken::new();
    let sweeper = tokio::spawn(expiry_sweep::run(
        app_state.seat_service.clone(),
        sweep_interval,
        cancel.clone(),
    ));

    tracing::info!("🚀 Serviço de varredura rodando. Ctrl-C para sair.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Sinal de parada recebido, encerrando...");

    cancel.cancel();
    sweeper.await?;
    app_state.db_pool.close().await;

    tracing::info!("✅ Encerrado");
    Ok(())
}
