// src/background/expiry_sweep.rs

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::services::seat_service::SeatService;

/// Intervalo padrão entre varreduras: 24 horas.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Loop da varredura de matrículas expiradas.
///
/// O primeiro tick do `interval` dispara na hora, então a varredura roda
/// ao iniciar e depois a cada `every`. Para quando `cancel` é acionado.
pub async fn run(service: SeatService, every: Duration, cancel: CancellationToken) {
    if every.is_zero() {
        tracing::error!("Intervalo de varredura zero; a varredura não vai rodar");
        return;
    }

    tracing::info!(interval_secs = every.as_secs(), "🚀 Varredura de expiração iniciada");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Varredura de expiração encerrando");
                break;
            }
            _ = interval.tick() => {
                // Uma falha de leitura só pula este ciclo
                if let Err(e) = service.sweep(Utc::now()).await {
                    tracing::error!(error = %e, code = e.code(), "Varredura de expiração falhou");
                }
            }
        }
    }
}
