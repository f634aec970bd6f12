// src/db/student_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        hall::Hall,
        seat::RestorePlan,
        student::{registration_instant, NewStudent, Student, StudentChanges},
    },
};

/// Contrato do registro de alunos.
///
/// O registro só armazena: não conhece estados de ciclo de vida. Toda a
/// filtragem por idade acontece no motor.
#[async_trait]
pub trait StudentRegistry: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Student>, AppError>;

    async fn list_by_hall(&self, hall: Hall, include_deleted: bool) -> Result<Vec<Student>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, AppError>;

    async fn create(&self, new: &NewStudent) -> Result<Student, AppError>;

    async fn update(&self, id: Uuid, changes: &StudentChanges) -> Result<Option<Student>, AppError>;

    /// Aplica um plano de reativação numa única escrita (tudo ou nada).
    async fn restore(&self, plan: &RestorePlan) -> Result<Option<Student>, AppError>;

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Student>, AppError>;

    async fn hard_delete(&self, id: Uuid) -> Result<Option<Student>, AppError>;
}

// O repositório de alunos, responsável por todas as interações com a tabela 'students'
#[derive(Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRegistry for StudentRepository {
    async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            FROM students
            ORDER BY registration_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    async fn list_by_hall(&self, hall: Hall, include_deleted: bool) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            FROM students
            WHERE hall = $1
              AND ($2 OR deleted = FALSE)
            ORDER BY seat_number ASC
            "#,
        )
        .bind(hall)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let maybe_student = sqlx::query_as::<_, Student>(
            r#"
            SELECT
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(maybe_student)
    }

    async fn create(&self, new: &NewStudent) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, FALSE)
            RETURNING
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.phone)
        .bind(new.email.as_deref())
        .bind(new.hall)
        .bind(new.seat_number)
        .bind(new.seat_type.as_deref())
        .bind(new.payment_method.as_deref())
        .bind(new.remaining_fees)
        .bind(new.fees_amount)
        .bind(registration_instant(new.registration_date))
        .fetch_one(&self.pool)
        .await?;

        Ok(student)
    }

    async fn update(&self, id: Uuid, changes: &StudentChanges) -> Result<Option<Student>, AppError> {
        // COALESCE: parâmetro NULL mantém o valor atual da coluna
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET
                name = COALESCE($2, name),
                surname = COALESCE($3, surname),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                hall = COALESCE($6, hall),
                seat_number = COALESCE($7, seat_number),
                seat_type = COALESCE($8, seat_type),
                payment_method = COALESCE($9, payment_method),
                remaining_fees = COALESCE($10, remaining_fees),
                fees_amount = COALESCE($11, fees_amount),
                registration_date = COALESCE($12, registration_date)
            WHERE id = $1
            RETURNING
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.surname.as_deref())
        .bind(changes.phone.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.hall)
        .bind(changes.seat_number)
        .bind(changes.seat_type.as_deref())
        .bind(changes.payment_method.as_deref())
        .bind(changes.remaining_fees)
        .bind(changes.fees_amount)
        .bind(changes.registration_date.map(registration_instant))
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn restore(&self, plan: &RestorePlan) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET
                deleted = FALSE,
                seat_number = $2,
                registration_date = $3
            WHERE id = $1
            RETURNING
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            "#,
        )
        .bind(plan.student_id)
        .bind(plan.final_seat)
        .bind(plan.registration_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET deleted = TRUE
            WHERE id = $1
            RETURNING
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            DELETE FROM students
            WHERE id = $1
            RETURNING
                id, name, surname, phone, email, hall, seat_number,
                seat_type, payment_method, remaining_fees, fees_amount,
                registration_date, deleted
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }
}
