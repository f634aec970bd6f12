// src/models/student.rs

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::hall::Hall;

// Representa uma matrícula vinda do registro de alunos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,

    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Option<String>,

    pub hall: Hall,
    pub seat_number: i32,

    // Dados de cobrança. Não interferem no ciclo de vida do assento.
    pub seat_type: Option<String>,
    pub payment_method: Option<String>,
    pub remaining_fees: bool,
    pub fees_amount: Option<Decimal>,

    pub registration_date: DateTime<Utc>,

    // Soft delete
    pub deleted: bool,
}

impl Student {
    /// Busca textual no mesmo formato da listagem de alunos:
    /// nome, sobrenome, telefone, e-mail ou número do assento.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&needle)
            || self.surname.to_lowercase().contains(&needle)
            || self.phone.contains(&needle)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
            || self.seat_number.to_string().contains(&needle)
    }

    pub fn registered_in(&self, month: u32, year: Option<i32>) -> bool {
        self.registration_date.month() == month
            && year.is_none_or(|y| self.registration_date.year() == y)
    }
}

/// Datas de matrícula chegam como data de calendário; guardamos meia-noite UTC.
pub fn registration_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// Dados para uma nova matrícula
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,

    #[validate(length(min = 1, message = "required"))]
    pub surname: String,

    #[validate(length(min = 1, message = "required"))]
    pub phone: String,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub hall: Hall,
    pub seat_number: i32,

    pub seat_type: Option<String>,
    pub payment_method: Option<String>,

    #[serde(default)]
    pub remaining_fees: bool,
    pub fees_amount: Option<Decimal>,

    pub registration_date: NaiveDate,
}

// Atualização parcial: `None` mantém o valor atual
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentChanges {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub surname: Option<String>,

    #[validate(length(min = 1, message = "required"))]
    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub hall: Option<Hall>,
    pub seat_number: Option<i32>,

    pub seat_type: Option<String>,
    pub payment_method: Option<String>,
    pub remaining_fees: Option<bool>,
    pub fees_amount: Option<Decimal>,

    pub registration_date: Option<NaiveDate>,
}

impl StudentChanges {
    pub fn touches_seat(&self) -> bool {
        self.hall.is_some() || self.seat_number.is_some()
    }

    /// Aplica as mudanças sobre uma cópia do registro.
    pub fn apply_to(&self, student: &Student) -> Student {
        let mut updated = student.clone();

        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            updated.surname = surname.clone();
        }
        if let Some(phone) = &self.phone {
            updated.phone = phone.clone();
        }
        if let Some(email) = &self.email {
            updated.email = Some(email.clone());
        }
        if let Some(hall) = self.hall {
            updated.hall = hall;
        }
        if let Some(seat) = self.seat_number {
            updated.seat_number = seat;
        }
        if let Some(seat_type) = &self.seat_type {
            updated.seat_type = Some(seat_type.clone());
        }
        if let Some(method) = &self.payment_method {
            updated.payment_method = Some(method.clone());
        }
        if let Some(remaining) = self.remaining_fees {
            updated.remaining_fees = remaining;
        }
        if let Some(amount) = self.fees_amount {
            updated.fees_amount = Some(amount);
        }
        if let Some(date) = self.registration_date {
            updated.registration_date = registration_instant(date);
        }

        updated
    }
}

// --- VISÕES ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    Active,
    PendingRemoval,
    Expired,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    #[serde(flatten)]
    pub student: Student,
    pub status: StudentStatus,
    pub age_days: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRemoval {
    #[serde(flatten)]
    pub student: Student,
    pub age_days: i64,
    // Dias até a varredura automática (60 - idade)
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    pub hall: Option<Hall>,
    pub search: Option<String>,
    pub month: Option<u32>,
    pub seat_type: Option<String>,
    // Por padrão a listagem esconde matrículas removidas
    #[serde(default)]
    pub include_deleted: bool,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        self.hall.is_none_or(|h| student.hall == h)
            && (self.include_deleted || !student.deleted)
            && self.search.as_deref().is_none_or(|q| student.matches_search(q))
            && self.month.is_none_or(|m| student.registered_in(m, None))
            && self.seat_type.as_deref().is_none_or(|t| {
                student
                    .seat_type
                    .as_deref()
                    .is_some_and(|st| st.eq_ignore_ascii_case(t))
            })
    }
}
