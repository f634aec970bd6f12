// src/services/seat_service.rs

//! Orquestra o motor de assentos com o registro de alunos, o armazenamento
//! de overrides e a verificação de administrador.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{SeatOverrideStore, StudentRegistry},
    models::{
        hall::Hall,
        seat::{MonthlyReport, OverrideKind, OverrideRestore, ReportQuery, SeatMap, SweepReport},
        student::{PendingRemoval, Student},
    },
    services::{
        admin_service::{require_admin, AdminVerifier},
        seat_lifecycle,
    },
};

/// Uma trava por salão. Serializa as mutações de assento dentro do processo.
#[derive(Clone, Default)]
pub struct HallLocks(Arc<[Mutex<()>; 2]>);

impl HallLocks {
    pub async fn lock(&self, hall: Hall) -> MutexGuard<'_, ()> {
        self.0[hall.index()].lock().await
    }

    /// Trava o salão que `hall_of` escolhe para a matrícula e relê o registro
    /// já com a trava, repetindo se ele mudou de salão durante a espera.
    pub async fn lock_record(
        &self,
        registry: &dyn StudentRegistry,
        id: Uuid,
        hall_of: impl Fn(&Student) -> Hall,
    ) -> Result<(Student, MutexGuard<'_, ()>), AppError> {
        let first = registry.find_by_id(id).await?.ok_or(AppError::StudentNotFound)?;
        let mut hall = hall_of(&first);

        loop {
            let guard = self.lock(hall).await;
            let current = registry.find_by_id(id).await?.ok_or(AppError::StudentNotFound)?;

            let wanted = hall_of(&current);
            if wanted == hall {
                return Ok((current, guard));
            }
            tracing::debug!(student_id = %id, from = %hall, to = %wanted, "Matrícula mudou de salão; trocando a trava");
            hall = wanted;
        }
    }
}

#[derive(Clone)]
pub struct SeatService {
    registry: Arc<dyn StudentRegistry>,
    overrides: Arc<dyn SeatOverrideStore>,
    admin: Arc<dyn AdminVerifier>,
    hall_locks: HallLocks,
}

impl SeatService {
    pub fn new(
        registry: Arc<dyn StudentRegistry>,
        overrides: Arc<dyn SeatOverrideStore>,
        admin: Arc<dyn AdminVerifier>,
        hall_locks: HallLocks,
    ) -> Self {
        Self { registry, overrides, admin, hall_locks }
    }

    pub async fn seat_map(&self, hall: Hall, now: DateTime<Utc>) -> Result<SeatMap, AppError> {
        let records = self.registry.list_by_hall(hall, false).await?;
        let overrides = self.overrides.get(hall).await?;

        Ok(seat_lifecycle::build_seat_map(hall, &records, &overrides, now))
    }

    /// Remove (soft delete) toda matrícula com mais de 60 dias.
    ///
    /// Falhas individuais são registradas e contadas; o lote continua.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let records = self.registry.list_all().await?;

        for record in records.iter().filter(|r| !r.deleted && r.registration_date > now) {
            tracing::warn!(
                student_id = %record.id,
                registration_date = %record.registration_date,
                "Matrícula com data no futuro; a idade é contada em valor absoluto"
            );
        }

        let expired = seat_lifecycle::sweep_expired(now, &records);
        let mut report = SweepReport {
            candidates: expired.len(),
            ..Default::default()
        };

        for id in expired {
            match self.registry.soft_delete(id).await {
                Ok(Some(_)) => report.deleted.push(id),
                // Apagada por outro caminho entre a leitura e a escrita
                Ok(None) => tracing::debug!(student_id = %id, "Matrícula sumiu durante a varredura"),
                Err(e) => {
                    tracing::error!(student_id = %id, error = %e, "Falha ao remover matrícula expirada");
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            candidates = report.candidates,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "🧹 Varredura de matrículas expiradas concluída"
        );
        Ok(report)
    }

    /// Reativa uma matrícula no assento pedido, com data de matrícula = `now`.
    pub async fn restore_student(
        &self,
        admin_password: &str,
        student_id: Uuid,
        requested_seat: i32,
        now: DateTime<Utc>,
    ) -> Result<Student, AppError> {
        require_admin(self.admin.as_ref(), admin_password).await?;

        let (student, _guard) = self
            .hall_locks
            .lock_record(self.registry.as_ref(), student_id, |s| s.hall)
            .await?;

        let records = self.registry.list_by_hall(student.hall, false).await?;
        let plan = seat_lifecycle::plan_restore(student_id, requested_seat, student.hall, &records, now)?;

        let restored = self
            .registry
            .restore(&plan)
            .await?
            .ok_or(AppError::StudentNotFound)?;

        tracing::info!(
            student_id = %restored.id,
            hall = %restored.hall,
            seat = restored.seat_number,
            "♻️ Matrícula reativada"
        );
        Ok(restored)
    }

    /// Remove um assento manualmente e devolve o mapa atualizado.
    pub async fn remove_seat(
        &self,
        admin_password: &str,
        hall: Hall,
        seat: i32,
        mode: OverrideKind,
        now: DateTime<Utc>,
    ) -> Result<SeatMap, AppError> {
        require_admin(self.admin.as_ref(), admin_password).await?;
        let _guard = self.hall_locks.lock(hall).await;

        let records = self.registry.list_by_hall(hall, false).await?;
        let mut overrides = self.overrides.get(hall).await?;
        let seat_map = seat_lifecycle::build_seat_map(hall, &records, &overrides, now);

        seat_lifecycle::remove_seat_override(&mut overrides, seat, mode, &seat_map, now)?;
        self.overrides.put(hall, &overrides).await?;

        tracing::info!(%hall, seat, ?mode, "Assento removido");
        Ok(seat_lifecycle::build_seat_map(hall, &records, &overrides, now))
    }

    /// Devolve um assento removido, ou faz o salão crescer até ele.
    pub async fn restore_seat(
        &self,
        admin_password: &str,
        hall: Hall,
        seat: i32,
        now: DateTime<Utc>,
    ) -> Result<OverrideRestore, AppError> {
        require_admin(self.admin.as_ref(), admin_password).await?;
        let _guard = self.hall_locks.lock(hall).await;

        let records = self.registry.list_by_hall(hall, false).await?;
        let mut overrides = self.overrides.get(hall).await?;
        let seat_map = seat_lifecycle::build_seat_map(hall, &records, &overrides, now);

        let outcome = seat_lifecycle::restore_seat_override(&mut overrides, seat, seat_map.total_seats)?;
        self.overrides.put(hall, &overrides).await?;

        tracing::info!(%hall, seat, ?outcome, "Assento devolvido");
        Ok(outcome)
    }

    pub async fn monthly_report(&self, hall: Hall, query: ReportQuery) -> Result<MonthlyReport, AppError> {
        query.validate()?;

        // Vendas do mês contam mesmo que a matrícula já tenha sido removida
        let records = self.registry.list_by_hall(hall, true).await?;
        let overrides = self.overrides.get(hall).await?;
        let total_seats = seat_lifecycle::resolve_total_seats(overrides.total_seats, hall, &records);

        Ok(seat_lifecycle::monthly_report(
            hall,
            query.month,
            query.year,
            &records,
            &overrides,
            total_seats,
        ))
    }

    /// Matrículas pendentes de remoção, as mais urgentes primeiro.
    pub async fn pending_removals(
        &self,
        hall: Option<Hall>,
        search: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingRemoval>, AppError> {
        let records = match hall {
            Some(hall) => self.registry.list_by_hall(hall, false).await?,
            None => self.registry.list_all().await?,
        };

        let matching: Vec<Student> = records
            .into_iter()
            .filter(|r| search.is_none_or(|q| r.matches_search(q)))
            .collect();

        let mut pending = seat_lifecycle::pending_removals(&matching, now);
        pending.sort_by_key(|p| (p.days_remaining, p.student.hall, p.student.seat_number));
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::error::SeatError,
        db::{InMemoryOverrideStore, InMemoryRegistry},
        models::{
            seat::{HallOverrides, SeatState},
            student::StudentChanges,
        },
    };
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    // Verificador fixo, sem bcrypt
    struct FixedPassword(&'static str);

    #[async_trait]
    impl AdminVerifier for FixedPassword {
        async fn verify(&self, password: &str) -> Result<bool, AppError> {
            Ok(password == self.0)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn student(hall: Hall, seat: i32, age_days: i64) -> Student {
        Student {
            id: Uuid::new_v4(),
            name: "Bruno".into(),
            surname: "Lima".into(),
            phone: "11988887777".into(),
            email: Some("bruno@example.com".into()),
            hall,
            seat_number: seat,
            seat_type: None,
            payment_method: None,
            remaining_fees: false,
            fees_amount: None,
            registration_date: now() - Duration::days(age_days),
            deleted: false,
        }
    }

    fn service(registry: InMemoryRegistry) -> (SeatService, InMemoryOverrideStore) {
        let overrides = InMemoryOverrideStore::new();
        let service = SeatService::new(
            Arc::new(registry),
            Arc::new(overrides.clone()),
            Arc::new(FixedPassword("admin123")),
            HallLocks::default(),
        );
        (service, overrides)
    }

    #[tokio::test]
    async fn restore_checks_the_hall_the_record_ends_up_in() {
        let returning = Student {
            deleted: true,
            ..student(Hall::Hall1, 5, 70)
        };
        let holder = student(Hall::Hall2, 5, 2);
        let registry = InMemoryRegistry::with_students([returning.clone(), holder]);
        let locks = HallLocks::default();
        let seats = SeatService::new(
            Arc::new(registry.clone()),
            Arc::new(InMemoryOverrideStore::new()),
            Arc::new(FixedPassword("admin123")),
            locks.clone(),
        );

        // Segura o salão 1 enquanto a reativação espera por ele
        let guard = locks.lock(Hall::Hall1).await;
        let handle = tokio::spawn(async move { seats.restore_student("admin123", returning.id, 5, now()).await });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let moved = StudentChanges {
            hall: Some(Hall::Hall2),
            ..Default::default()
        };
        registry.update(returning.id, &moved).await.unwrap();
        drop(guard);

        let result = handle.await.unwrap();
        assert_matches!(
            result,
            Err(AppError::Seat(SeatError::SeatConflict { hall: Hall::Hall2, seat: 5 }))
        );
        assert!(registry.snapshot().unwrap()[0].deleted);
    }

    #[tokio::test]
    async fn sweep_keeps_going_after_a_failed_delete() {
        let broken = student(Hall::Hall1, 1, 70);
        let fine = student(Hall::Hall2, 2, 90);
        let registry = InMemoryRegistry::with_students([broken.clone(), fine.clone()]);
        registry.fail_writes_for(broken.id).unwrap();
        let (seats, _) = service(registry);

        let report = seats.sweep(now()).await.unwrap();
        assert_eq!(report.candidates, 2);
        assert_eq!(report.deleted, vec![fine.id]);
        assert_eq!(report.failed, vec![broken.id]);
    }

    #[tokio::test]
    async fn registry_outage_is_propagated() {
        let registry = InMemoryRegistry::new();
        registry.set_unavailable(true).unwrap();
        let (seats, _) = service(registry);

        let err = seats.seat_map(Hall::Hall1, now()).await.unwrap_err();
        assert_eq!(err.code(), "REGISTRY_UNAVAILABLE");
    }

    #[tokio::test]
    async fn wrong_password_touches_nothing() {
        let (seats, overrides) = service(InMemoryRegistry::new());

        let result = seats
            .remove_seat("errada", Hall::Hall1, 3, OverrideKind::Temporary, now())
            .await;
        assert_matches!(result, Err(AppError::AdminDenied));
        assert_eq!(overrides.get(Hall::Hall1).await.unwrap(), HallOverrides::default());
    }

    #[tokio::test]
    async fn restoring_beyond_the_total_grows_the_hall() {
        let (seats, _) = service(InMemoryRegistry::new());

        let outcome = seats.restore_seat("admin123", Hall::Hall2, 53, now()).await.unwrap();
        assert_eq!(outcome, OverrideRestore::Extended { total_seats: 53 });

        let map = seats.seat_map(Hall::Hall2, now()).await.unwrap();
        assert_eq!(map.total_seats, 53);
        assert_eq!(map.state_of(53), Some(SeatState::Available));
    }

    #[tokio::test]
    async fn monthly_report_rejects_invalid_month() {
        let (seats, _) = service(InMemoryRegistry::new());

        let result = seats
            .monthly_report(Hall::Hall1, ReportQuery { month: 13, year: None })
            .await;
        assert_matches!(result, Err(AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn pending_removals_are_sorted_by_urgency() {
        let registry = InMemoryRegistry::with_students([
            student(Hall::Hall1, 1, 35),
            student(Hall::Hall2, 2, 58),
            student(Hall::Hall1, 3, 20),
        ]);
        let (seats, _) = service(registry);

        let pending = seats.pending_removals(None, None, now()).await.unwrap();
        let remaining: Vec<i64> = pending.iter().map(|p| p.days_remaining).collect();
        assert_eq!(remaining, vec![2, 25]);

        let only_hall1 = seats.pending_removals(Some(Hall::Hall1), None, now()).await.unwrap();
        assert_eq!(only_hall1.len(), 1);
        assert_eq!(only_hall1[0].student.seat_number, 1);
    }
}
