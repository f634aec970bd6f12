// src/common/error.rs

use thiserror::Error;

use crate::models::hall::Hall;

// Erros do motor de assentos. São puros: não dependem de banco nem de I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatError {
    #[error("O assento {seat} do {hall} já está ocupado por outra matrícula")]
    SeatConflict { hall: Hall, seat: i32 },

    #[error("O assento {seat} não está disponível para remoção")]
    NotAvailable { seat: i32 },

    #[error("O assento {seat} já está disponível")]
    AlreadyAvailable { seat: i32 },

    #[error("Número de assento inválido: '{0}'")]
    InvalidSeat(String),
}

impl SeatError {
    pub fn code(&self) -> &'static str {
        match self {
            SeatError::SeatConflict { .. } => "SEAT_CONFLICT",
            SeatError::NotAvailable { .. } => "NOT_AVAILABLE",
            SeatError::AlreadyAvailable { .. } => "ALREADY_AVAILABLE",
            SeatError::InvalidSeat(_) => "INVALID_SEAT",
        }
    }
}

// Nosso tipo de erro da camada de serviços, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Seat(#[from] SeatError),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Verificação de administrador falhou")]
    AdminDenied,

    #[error("Nenhuma senha de administrador definida")]
    AdminPasswordNotSet,

    #[error("Senha fraca: {0}")]
    WeakPassword(&'static str),

    #[error("Aluno não encontrado")]
    StudentNotFound,

    #[error("Aluno precisa estar removido antes da exclusão definitiva")]
    StudentNotDeleted,

    // Falha do registro de alunos (Postgres). Propagada, nunca repetida.
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de I/O no armazenamento de overrides: {0}")]
    OverrideStoreIo(#[from] std::io::Error),

    #[error("Arquivo de overrides corrompido: {0}")]
    OverrideStoreFormat(#[from] serde_json::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Código estável do tipo de erro, para quem consome o serviço.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Seat(e) => e.code(),
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AdminDenied => "ADMIN_DENIED",
            AppError::AdminPasswordNotSet => "ADMIN_PASSWORD_NOT_SET",
            AppError::WeakPassword(_) => "WEAK_PASSWORD",
            AppError::StudentNotFound => "STUDENT_NOT_FOUND",
            AppError::StudentNotDeleted => "STUDENT_NOT_DELETED",
            AppError::DatabaseError(_) => "REGISTRY_UNAVAILABLE",
            AppError::OverrideStoreIo(_) | AppError::OverrideStoreFormat(_) => "OVERRIDE_STORE_UNAVAILABLE",
            AppError::BcryptError(_) | AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_errors_keep_their_code_through_app_error() {
        let err: AppError = SeatError::SeatConflict { hall: Hall::Hall1, seat: 10 }.into();
        assert_eq!(err.code(), "SEAT_CONFLICT");
        assert_eq!(err.to_string(), "O assento 10 do hall1 já está ocupado por outra matrícula");

        let err: AppError = SeatError::InvalidSeat("abc".into()).into();
        assert_eq!(err.code(), "INVALID_SEAT");
    }

    #[test]
    fn database_failures_surface_as_registry_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "REGISTRY_UNAVAILABLE");
        assert_eq!(AppError::AdminDenied.code(), "ADMIN_DENIED");
    }
}
