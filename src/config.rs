// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    background::expiry_sweep::DEFAULT_SWEEP_INTERVAL,
    db::{AdminRepository, FileOverrideStore, StudentRepository},
    services::{AdminService, HallLocks, SeatService, StudentService},
};

// Configuração lida do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub sweep_interval: Duration,
    pub override_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave-valor.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let db_max_connections: u32 = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?;
        anyhow::ensure!(db_max_connections > 0, "DB_MAX_CONNECTIONS deve ser maior que zero");

        // `tokio::time::interval` entra em pânico com período zero
        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL.as_secs())?;
        anyhow::ensure!(sweep_secs > 0, "SWEEP_INTERVAL_SECS deve ser maior que zero");

        Ok(Self {
            database_url,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            sweep_interval: Duration::from_secs(sweep_secs),
            override_dir: lookup("SEAT_OVERRIDE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/overrides")),
        })
    }
}

// Variável ausente usa o padrão; presente mas inválida é erro
fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        None => Ok(default),
    }
}

// O estado compartilhado: pool e serviços já montados
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub admin_service: AdminService,
    pub seat_service: SeatService,
    pub student_service: StudentService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let overrides = FileOverrideStore::open(&config.override_dir)
            .await
            .with_context(|| format!("Falha ao abrir {}", config.override_dir.display()))?;

        // --- Monta o gráfico de dependências ---
        let registry = Arc::new(StudentRepository::new(db_pool.clone()));
        let admin_service = AdminService::new(Arc::new(AdminRepository::new(db_pool.clone())));
        let admin = Arc::new(admin_service.clone());
        let hall_locks = HallLocks::default();

        let seat_service = SeatService::new(registry.clone(), Arc::new(overrides), admin.clone(), hall_locks.clone());
        let student_service = StudentService::new(registry, admin, hall_locks);

        Ok(Self {
            db_pool,
            config,
            admin_service,
            seat_service,
            student_service,
        })
    }
}
