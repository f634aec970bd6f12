// src/models/admin.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Credencial única do administrador do salão de estudos
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredential {
    pub id: i32,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub updated_at: DateTime<Utc>,
}
