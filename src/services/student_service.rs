// src/services/student_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::StudentRegistry,
    models::student::{NewStudent, Student, StudentChanges, StudentFilter, StudentView},
    services::{
        admin_service::{require_admin, AdminVerifier},
        seat_lifecycle,
        seat_service::HallLocks,
    },
};

#[derive(Clone)]
pub struct StudentService {
    registry: Arc<dyn StudentRegistry>,
    admin: Arc<dyn AdminVerifier>,
    hall_locks: HallLocks,
}

impl StudentService {
    pub fn new(registry: Arc<dyn StudentRegistry>, admin: Arc<dyn AdminVerifier>, hall_locks: HallLocks) -> Self {
        Self { registry, admin, hall_locks }
    }

    pub async fn register(&self, new: NewStudent, now: DateTime<Utc>) -> Result<Student, AppError> {
        new.validate()?;

        let _guard = self.hall_locks.lock(new.hall).await;

        let records = self.registry.list_by_hall(new.hall, false).await?;
        seat_lifecycle::check_seat_assignment(new.hall, new.seat_number, None, &records, now)?;

        let student = self.registry.create(&new).await?;
        tracing::info!(
            student_id = %student.id,
            hall = %student.hall,
            seat = student.seat_number,
            "✅ Matrícula criada"
        );
        Ok(student)
    }

    pub async fn update(&self, id: Uuid, changes: StudentChanges, now: DateTime<Utc>) -> Result<Student, AppError> {
        changes.validate()?;
        if let Some(seat) = changes.seat_number {
            seat_lifecycle::validate_seat_number(seat)?;
        }

        // Trava o salão de destino e relê o registro já protegido
        let (current, _guard) = self
            .hall_locks
            .lock_record(self.registry.as_ref(), id, |s| changes.hall.unwrap_or(s.hall))
            .await?;

        let target = changes.apply_to(&current);
        if claims_new_seat(&current, &target, now) {
            let records = self.registry.list_by_hall(target.hall, false).await?;
            seat_lifecycle::check_seat_assignment(target.hall, target.seat_number, Some(id), &records, now)?;
        }

        let updated = self.registry.update(id, &changes).await?.ok_or(AppError::StudentNotFound)?;
        if changes.touches_seat() || changes.registration_date.is_some() {
            tracing::info!(student_id = %id, hall = %updated.hall, seat = updated.seat_number, "Assento da matrícula alterado");
        }
        Ok(updated)
    }

    pub async fn list(&self, filter: &StudentFilter, now: DateTime<Utc>) -> Result<Vec<StudentView>, AppError> {
        let records = match filter.hall {
            Some(hall) => self.registry.list_by_hall(hall, filter.include_deleted).await?,
            None => self.registry.list_all().await?,
        };

        let views = records
            .into_iter()
            .filter(|s| filter.matches(s))
            .map(|student| {
                let (status, age_days) = seat_lifecycle::student_status(&student, now);
                StudentView { student, status, age_days }
            })
            .collect();

        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<Student, AppError> {
        self.registry.find_by_id(id).await?.ok_or(AppError::StudentNotFound)
    }

    pub async fn soft_delete(&self, admin_password: &str, id: Uuid) -> Result<Student, AppError> {
        require_admin(self.admin.as_ref(), admin_password).await?;

        let student = self.registry.soft_delete(id).await?.ok_or(AppError::StudentNotFound)?;
        tracing::info!(student_id = %id, "Matrícula removida");
        Ok(student)
    }

    /// Exclusão definitiva. Só vale para matrículas já removidas.
    pub async fn purge(&self, admin_password: &str, id: Uuid) -> Result<Student, AppError> {
        require_admin(self.admin.as_ref(), admin_password).await?;

        let student = self.registry.find_by_id(id).await?.ok_or(AppError::StudentNotFound)?;
        if !student.deleted {
            return Err(AppError::StudentNotDeleted);
        }

        let purged = self.registry.hard_delete(id).await?.ok_or(AppError::StudentNotFound)?;
        tracing::warn!(student_id = %id, "🗑️ Matrícula excluída definitivamente");
        Ok(purged)
    }
}

// A mudança passa a reter um assento que a matrícula não retinha antes:
// troca de salão/assento, ou data nova que devolve um registro expirado.
fn claims_new_seat(current: &Student, target: &Student, now: DateTime<Utc>) -> bool {
    let held = |s: &Student| seat_lifecycle::record_state(s, now).is_some_and(|st| st.is_held());

    if !held(target) {
        return false;
    }
    !held(current) || current.hall != target.hall || current.seat_number != target.seat_number
}
