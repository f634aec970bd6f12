// src/services/seat_lifecycle.rs

//! Motor do ciclo de vida dos assentos.
//!
//! Tudo aqui é puro: recebe registros já buscados, os overrides do salão e o
//! instante de avaliação (`now`), e devolve estados derivados ou planos de
//! mudança. Quem grava é a camada de serviço.
//!
//! Ciclo de uma matrícula, pela idade em dias arredondados:
//!
//! | idade        | estado           |
//! |--------------|------------------|
//! | `0..=30`     | `Sold`           |
//! | `31..=60`    | `PendingRemoval` |
//! | `> 60`       | `Expired`        |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{
    common::error::SeatError,
    models::{
        hall::Hall,
        seat::{
            HallOverrides, MonthlyReport, OverrideKind, OverrideRestore, RestorePlan, SeatMap,
            SeatOverride, SeatState,
        },
        student::{PendingRemoval, Student, StudentStatus},
    },
};

/// Tamanho mínimo de qualquer salão.
pub const MIN_TOTAL_SEATS: i32 = 50;

/// Maior número de assento aceito. O total de um salão nunca passa disso.
pub const MAX_TOTAL_SEATS: i32 = 1000;

/// Último dia (inclusive) em que a matrícula está ativa.
pub const ACTIVE_DAYS: i64 = 30;

/// Último dia (inclusive) antes da matrícula expirar.
pub const REMOVAL_DAYS: i64 = 60;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// =========================================================================
//  IDADE E FASE
// =========================================================================

/// Dias inteiros entre dois instantes: `round(|a - b| / 1 dia)`.
///
/// A diferença é absoluta, então uma data de matrícula no futuro envelhece
/// como se estivesse no passado.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let millis = (a - b).num_milliseconds().unsigned_abs() as f64;
    (millis / MILLIS_PER_DAY).round() as i64
}

pub fn phase_for_age(age_days: i64) -> SeatState {
    if age_days > REMOVAL_DAYS {
        SeatState::Expired
    } else if age_days > ACTIVE_DAYS {
        SeatState::PendingRemoval
    } else {
        SeatState::Sold
    }
}

/// Estado que a matrícula impõe ao seu assento. `None` para matrículas removidas.
pub fn record_state(student: &Student, now: DateTime<Utc>) -> Option<SeatState> {
    if student.deleted {
        return None;
    }
    Some(phase_for_age(days_between(now, student.registration_date)))
}

pub fn student_status(student: &Student, now: DateTime<Utc>) -> (StudentStatus, i64) {
    let age = days_between(now, student.registration_date);
    let status = match record_state(student, now) {
        None => StudentStatus::Deleted,
        Some(SeatState::Sold) => StudentStatus::Active,
        Some(SeatState::PendingRemoval) => StudentStatus::PendingRemoval,
        Some(_) => StudentStatus::Expired,
    };
    (status, age)
}

// Menor é "mais ativo". Só faz diferença com dados legados duplicados.
fn activity_rank(state: SeatState) -> u8 {
    match state {
        SeatState::Sold => 0,
        SeatState::PendingRemoval => 1,
        _ => 2,
    }
}

/// Estado imposto por matrículas, assento a assento, para um salão.
fn occupancy(hall: Hall, records: &[Student], now: DateTime<Utc>) -> HashMap<i32, SeatState> {
    let mut occupied: HashMap<i32, SeatState> = HashMap::new();

    for record in records.iter().filter(|r| r.hall == hall) {
        let Some(state) = record_state(record, now) else {
            continue;
        };
        occupied
            .entry(record.seat_number)
            .and_modify(|current| {
                if activity_rank(state) < activity_rank(*current) {
                    *current = state;
                }
            })
            .or_insert(state);
    }

    occupied
}

// =========================================================================
//  MAPA DE ASSENTOS
// =========================================================================

/// `max(50, total configurado, maior assento ocupado)`. Nunca esconde um assento vendido.
pub fn resolve_total_seats(configured: Option<i32>, hall: Hall, records: &[Student]) -> i32 {
    let highest_claimed = records
        .iter()
        .filter(|r| r.hall == hall && !r.deleted)
        .map(|r| r.seat_number)
        .max()
        .unwrap_or(0);

    // Um total gravado fora do limite (arquivo editado à mão) é ignorado
    let configured = configured.filter(|t| *t <= MAX_TOTAL_SEATS).unwrap_or(0);

    MIN_TOTAL_SEATS.max(configured).max(highest_claimed)
}

/// Classifica cada assento de `1..=total_seats` exatamente uma vez.
///
/// Prioridade: matrícula (vendido / pendente / expirado) > override
/// permanente > override temporário > disponível.
pub fn compute_seat_states(
    hall: Hall,
    records: &[Student],
    overrides: &HallOverrides,
    total_seats: i32,
    now: DateTime<Utc>,
) -> BTreeMap<i32, SeatState> {
    let occupied = occupancy(hall, records, now);

    (1..=total_seats)
        .map(|seat| {
            let state = match occupied.get(&seat) {
                Some(state) => *state,
                None => match overrides.kind_of(seat) {
                    Some(OverrideKind::Permanent) => SeatState::RemovedPermanent,
                    Some(OverrideKind::Temporary) => SeatState::RemovedTemporary,
                    None => SeatState::Available,
                },
            };
            (seat, state)
        })
        .collect()
}

/// Resolve o total e monta o mapa completo do salão.
pub fn build_seat_map(
    hall: Hall,
    records: &[Student],
    overrides: &HallOverrides,
    now: DateTime<Utc>,
) -> SeatMap {
    let total_seats = resolve_total_seats(overrides.total_seats, hall, records);
    SeatMap {
        hall,
        total_seats,
        seats: compute_seat_states(hall, records, overrides, total_seats, now),
    }
}

// =========================================================================
//  TRANSIÇÕES DE MATRÍCULA
// =========================================================================

/// Ids de todas as matrículas não removidas com mais de 60 dias.
pub fn sweep_expired(now: DateTime<Utc>, records: &[Student]) -> Vec<Uuid> {
    records
        .iter()
        .filter(|r| record_state(r, now) == Some(SeatState::Expired))
        .map(|r| r.id)
        .collect()
}

/// Assentos válidos: `1..=MAX_TOTAL_SEATS`.
pub fn validate_seat_number(seat: i32) -> Result<(), SeatError> {
    if !(1..=MAX_TOTAL_SEATS).contains(&seat) {
        return Err(SeatError::InvalidSeat(seat.to_string()));
    }
    Ok(())
}

/// Falha com `SeatConflict` se outra matrícula vendida ou pendente já ocupa o assento.
///
/// `claimant` é a própria matrícula (ao atualizar ou restaurar), que não conta
/// como conflito consigo mesma.
pub fn check_seat_assignment(
    hall: Hall,
    seat: i32,
    claimant: Option<Uuid>,
    records: &[Student],
    now: DateTime<Utc>,
) -> Result<(), SeatError> {
    validate_seat_number(seat)?;

    let taken = records.iter().any(|r| {
        Some(r.id) != claimant
            && r.hall == hall
            && r.seat_number == seat
            && record_state(r, now).is_some_and(|s| s.is_held())
    });

    if taken {
        return Err(SeatError::SeatConflict { hall, seat });
    }
    Ok(())
}

/// Planeja a reativação de uma matrícula no assento pedido.
///
/// O motor nunca escolhe outro assento: em conflito, cabe a quem chamou
/// pedir uma alternativa.
pub fn plan_restore(
    student_id: Uuid,
    requested_seat: i32,
    hall: Hall,
    records: &[Student],
    now: DateTime<Utc>,
) -> Result<RestorePlan, SeatError> {
    check_seat_assignment(hall, requested_seat, Some(student_id), records, now)?;

    Ok(RestorePlan {
        student_id,
        final_seat: requested_seat,
        registration_date: now,
    })
}

pub fn pending_removals(records: &[Student], now: DateTime<Utc>) -> Vec<PendingRemoval> {
    records
        .iter()
        .filter(|r| record_state(r, now) == Some(SeatState::PendingRemoval))
        .map(|r| {
            let age_days = days_between(now, r.registration_date);
            PendingRemoval {
                student: r.clone(),
                age_days,
                days_remaining: REMOVAL_DAYS - age_days,
            }
        })
        .collect()
}

// =========================================================================
//  OVERRIDES DE ASSENTO
// =========================================================================

/// Remove um assento manualmente.
///
/// - Assento vendido ou pendente: `NotAvailable`.
/// - Remoção temporária de assento já removido: `NotAvailable`.
/// - Remoção permanente substitui a temporária; repetir é um no-op.
pub fn remove_seat_override(
    overrides: &mut HallOverrides,
    seat: i32,
    mode: OverrideKind,
    seat_map: &SeatMap,
    now: DateTime<Utc>,
) -> Result<(), SeatError> {
    validate_seat_number(seat)?;
    if seat > seat_map.total_seats {
        return Err(SeatError::InvalidSeat(seat.to_string()));
    }

    if seat_map.state_of(seat).is_some_and(|s| s.is_held()) {
        return Err(SeatError::NotAvailable { seat });
    }

    let entry = SeatOverride {
        seat_number: seat,
        removal_date: now,
    };

    match (mode, overrides.kind_of(seat)) {
        (OverrideKind::Temporary, Some(_)) => return Err(SeatError::NotAvailable { seat }),
        (OverrideKind::Temporary, None) => overrides.temporary.push(entry),
        (OverrideKind::Permanent, Some(OverrideKind::Permanent)) => {}
        (OverrideKind::Permanent, _) => {
            overrides.temporary.retain(|o| o.seat_number != seat);
            overrides.permanent.push(entry);
        }
    }

    Ok(())
}

/// Devolve um assento removido.
///
/// Um número além do total faz o salão crescer até ele.
pub fn restore_seat_override(
    overrides: &mut HallOverrides,
    seat: i32,
    total_seats: i32,
) -> Result<OverrideRestore, SeatError> {
    validate_seat_number(seat)?;

    if seat > total_seats {
        overrides.clear(seat);
        overrides.total_seats = Some(seat);
        return Ok(OverrideRestore::Extended { total_seats: seat });
    }

    if overrides.kind_of(seat).is_none() {
        return Err(SeatError::AlreadyAvailable { seat });
    }

    overrides.clear(seat);
    Ok(OverrideRestore::Cleared)
}

// =========================================================================
//  RELATÓRIO MENSAL
// =========================================================================

fn in_month(date: DateTime<Utc>, month: u32, year: Option<i32>) -> bool {
    date.month() == month && year.is_none_or(|y| date.year() == y)
}

/// Vendidos no mês (inclui matrículas já removidas), removidos no mês e o resto.
pub fn monthly_report(
    hall: Hall,
    month: u32,
    year: Option<i32>,
    records: &[Student],
    overrides: &HallOverrides,
    total_seats: i32,
) -> MonthlyReport {
    let sold: BTreeSet<i32> = records
        .iter()
        .filter(|r| r.hall == hall && r.registered_in(month, year))
        .map(|r| r.seat_number)
        .collect();

    let removed: BTreeSet<i32> = overrides
        .entries()
        .filter(|(_, o)| in_month(o.removal_date, month, year))
        .map(|(_, o)| o.seat_number)
        .collect();

    let available = (1..=total_seats)
        .filter(|seat| !sold.contains(seat) && !removed.contains(seat))
        .collect();

    MonthlyReport {
        hall,
        month,
        year,
        total_seats,
        sold_seats: sold.into_iter().collect(),
        removed_seats: removed.into_iter().collect(),
        available_seats: available,
    }
}
