// src/services/admin_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify};

use crate::{common::error::AppError, db::AdminStore, models::admin::AdminCredential};

const MIN_PASSWORD_LEN: usize = 8;

/// Confere a senha de administrador antes de qualquer mutação restrita.
///
/// `Ok(false)` e qualquer `Err` são tratados igualmente por quem chama:
/// a operação é negada e nada é gravado.
#[async_trait]
pub trait AdminVerifier: Send + Sync {
    async fn verify(&self, password: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn AdminStore>,
    hash_cost: u32,
}

impl AdminService {
    pub fn new(store: Arc<dyn AdminStore>) -> Self {
        Self::with_cost(store, bcrypt::DEFAULT_COST)
    }

    // Custo menor só faz sentido em testes
    pub fn with_cost(store: Arc<dyn AdminStore>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    pub async fn password_is_set(&self) -> Result<bool, AppError> {
        Ok(self.store.find().await?.is_some())
    }

    pub async fn set_password(&self, new_password: &str) -> Result<AdminCredential, AppError> {
        check_password_policy(new_password)?;

        // Hashing é pesado: roda fora do executor
        let password_clone = new_password.to_owned();
        let cost = self.hash_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let admin = self.store.save_password_hash(&hashed_password).await?;
        tracing::info!("🔑 Senha de administrador atualizada");
        Ok(admin)
    }
}

#[async_trait]
impl AdminVerifier for AdminService {
    async fn verify(&self, password: &str) -> Result<bool, AppError> {
        let admin = self.store.find().await?.ok_or(AppError::AdminPasswordNotSet)?;

        let password_clone = password.to_owned();
        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &admin.password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação: {}", e))??;

        Ok(is_valid)
    }
}

/// Qualquer resultado diferente de `Ok(true)` vira `AdminDenied`.
pub(crate) async fn require_admin(admin: &dyn AdminVerifier, password: &str) -> Result<(), AppError> {
    match admin.verify(password).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!("Senha de administrador incorreta");
            Err(AppError::AdminDenied)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Verificação de administrador falhou");
            Err(AppError::AdminDenied)
        }
    }
}

/// Mínimo de 8 caracteres, com letras e dígitos.
pub fn check_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::WeakPassword("a senha precisa de pelo menos 8 caracteres"));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(AppError::WeakPassword("a senha precisa conter letras"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::WeakPassword("a senha precisa conter dígitos"));
    }
    Ok(())
}
