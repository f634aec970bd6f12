// src/models/seat.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::hall::Hall;

// --- ENUMS ---

/// Estado derivado de um assento num instante. Nunca é persistido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Sold,
    PendingRemoval,
    Expired,
    RemovedTemporary,
    RemovedPermanent,
    Available,
}

impl SeatState {
    /// Assento ocupado por uma matrícula que ainda bloqueia reatribuição.
    pub fn is_held(&self) -> bool {
        matches!(self, SeatState::Sold | SeatState::PendingRemoval)
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, SeatState::RemovedTemporary | SeatState::RemovedPermanent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    Temporary,
    Permanent,
}

// --- OVERRIDES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatOverride {
    pub seat_number: i32,
    pub removal_date: DateTime<Utc>,
}

/// Estado administrativo completo de um salão, gravado sempre por inteiro.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallOverrides {
    #[serde(default)]
    pub temporary: Vec<SeatOverride>,
    #[serde(default)]
    pub permanent: Vec<SeatOverride>,
    // Total configurado manualmente (nunca diminui sozinho)
    #[serde(default)]
    pub total_seats: Option<i32>,
}

impl HallOverrides {
    pub fn kind_of(&self, seat_number: i32) -> Option<OverrideKind> {
        if self.permanent.iter().any(|o| o.seat_number == seat_number) {
            Some(OverrideKind::Permanent)
        } else if self.temporary.iter().any(|o| o.seat_number == seat_number) {
            Some(OverrideKind::Temporary)
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self, seat_number: i32) {
        self.temporary.retain(|o| o.seat_number != seat_number);
        self.permanent.retain(|o| o.seat_number != seat_number);
    }

    /// Todas as entradas, das duas listas, com o seu tipo.
    pub fn entries(&self) -> impl Iterator<Item = (OverrideKind, &SeatOverride)> {
        self.temporary
            .iter()
            .map(|o| (OverrideKind::Temporary, o))
            .chain(self.permanent.iter().map(|o| (OverrideKind::Permanent, o)))
    }
}

// --- RESULTADOS DO MOTOR ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMap {
    pub hall: Hall,
    pub total_seats: i32,
    pub seats: BTreeMap<i32, SeatState>,
}

impl SeatMap {
    pub fn state_of(&self, seat_number: i32) -> Option<SeatState> {
        self.seats.get(&seat_number).copied()
    }

    /// Assentos num determinado estado, em ordem crescente.
    pub fn seats_in(&self, state: SeatState) -> Vec<i32> {
        self.seats
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(seat, _)| *seat)
            .collect()
    }

    pub fn summary(&self) -> SeatSummary {
        let mut summary = SeatSummary::default();
        for state in self.seats.values() {
            match state {
                SeatState::Sold => summary.sold += 1,
                SeatState::PendingRemoval => summary.pending_removal += 1,
                SeatState::Expired => summary.expired += 1,
                SeatState::RemovedTemporary => summary.removed_temporary += 1,
                SeatState::RemovedPermanent => summary.removed_permanent += 1,
                SeatState::Available => summary.available += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    pub sold: usize,
    pub pending_removal: usize,
    pub expired: usize,
    pub removed_temporary: usize,
    pub removed_permanent: usize,
    pub available: usize,
}

/// O que o registro deve gravar, de uma vez, para reativar uma matrícula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    pub student_id: Uuid,
    pub final_seat: i32,
    pub registration_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideRestore {
    // A entrada foi removida das listas
    Cleared,
    // O assento estava além do total: o salão cresceu até ele
    Extended { total_seats: i32 },
}

// Parâmetros do relatório mensal
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct ReportQuery {
    #[validate(range(min = 1, max = 12, message = "month_out_of_range"))]
    pub month: u32,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub hall: Hall,
    pub month: u32,
    pub year: Option<i32>,
    pub total_seats: i32,
    pub sold_seats: Vec<i32>,
    pub removed_seats: Vec<i32>,
    pub available_seats: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub candidates: usize,
    pub deleted: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}
