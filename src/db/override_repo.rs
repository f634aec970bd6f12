// src/db/override_repo.rs

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{hall::Hall, seat::HallOverrides},
};

/// Armazenamento chave-valor dos overrides, um valor por salão.
///
/// Sem transações: cada `put` troca o estado inteiro do salão de uma vez.
/// Assume um único escritor administrativo.
#[async_trait]
pub trait SeatOverrideStore: Send + Sync {
    async fn get(&self, hall: Hall) -> Result<HallOverrides, AppError>;

    async fn put(&self, hall: Hall, state: &HallOverrides) -> Result<(), AppError>;
}

// Um arquivo JSON por salão dentro de um diretório local
#[derive(Debug, Clone)]
pub struct FileOverrideStore {
    dir: PathBuf,
}

impl FileOverrideStore {
    /// Garante que o diretório existe.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, hall: Hall) -> PathBuf {
        self.dir.join(format!("overrides_{hall}.json"))
    }
}

#[async_trait]
impl SeatOverrideStore for FileOverrideStore {
    async fn get(&self, hall: Hall) -> Result<HallOverrides, AppError> {
        let path = self.path_for(hall);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            // Salão nunca configurado
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HallOverrides::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, hall: Hall, state: &HallOverrides) -> Result<(), AppError> {
        let path = self.path_for(hall);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(state)?;

        // Escreve ao lado e renomeia: quem lê nunca vê um arquivo pela metade
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(%hall, path = %path.display(), "Overrides gravados");
        Ok(())
    }
}
