// src/db/admin_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, models::admin::AdminCredential};

// Só existe uma credencial de administrador: a linha de id 1
const ADMIN_ROW_ID: i32 = 1;

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find(&self) -> Result<Option<AdminCredential>, AppError>;

    async fn save_password_hash(&self, password_hash: &str) -> Result<AdminCredential, AppError>;
}

// O repositório da credencial de administrador, tabela 'admin_credentials'
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for AdminRepository {
    async fn find(&self) -> Result<Option<AdminCredential>, AppError> {
        let maybe_admin = sqlx::query_as::<_, AdminCredential>(
            "SELECT id, password_hash, updated_at FROM admin_credentials WHERE id = $1",
        )
        .bind(ADMIN_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_admin)
    }

    // UPSERT (Insert or Update)
    async fn save_password_hash(&self, password_hash: &str) -> Result<AdminCredential, AppError> {
        let admin = sqlx::query_as::<_, AdminCredential>(
            r#"
            INSERT INTO admin_credentials (id, password_hash, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                updated_at = NOW()
            RETURNING id, password_hash, updated_at
            "#,
        )
        .bind(ADMIN_ROW_ID)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(admin)
    }
}
