//! Fixtures compartilhadas pelos testes de integração.
//!
//! Tudo roda sobre os adaptadores em memória; nenhum teste precisa de Postgres.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use studyroom::{
    db::{InMemoryAdminStore, InMemoryOverrideStore, InMemoryRegistry},
    models::{
        hall::Hall,
        student::{NewStudent, Student},
    },
    services::{AdminService, HallLocks, SeatService, StudentService},
};

pub const ADMIN_PASSWORD: &str = "salao2025";

// Custo mínimo do bcrypt, para os testes não demorarem
const TEST_HASH_COST: u32 = 4;

/// Instante fixo de avaliação.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

pub fn student(hall: Hall, seat: i32, age_days: i64) -> Student {
    Student {
        id: Uuid::new_v4(),
        name: "Daniela".into(),
        surname: "Rocha".into(),
        phone: "11912345678".into(),
        email: Some("daniela@example.com".into()),
        hall,
        seat_number: seat,
        seat_type: Some("fixed".into()),
        payment_method: Some("pix".into()),
        remaining_fees: false,
        fees_amount: None,
        registration_date: now() - Duration::days(age_days),
        deleted: false,
    }
}

pub fn deleted_student(hall: Hall, seat: i32, age_days: i64) -> Student {
    Student {
        deleted: true,
        ..student(hall, seat, age_days)
    }
}

pub fn new_student(hall: Hall, seat: i32) -> NewStudent {
    NewStudent {
        name: "Eduardo".into(),
        surname: "Melo".into(),
        phone: "11955554444".into(),
        email: Some("eduardo@example.com".into()),
        hall,
        seat_number: seat,
        seat_type: Some("flex".into()),
        payment_method: Some("cash".into()),
        remaining_fees: false,
        fees_amount: None,
        registration_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    }
}

pub struct Fixture {
    pub registry: InMemoryRegistry,
    pub overrides: InMemoryOverrideStore,
    pub admin: AdminService,
    pub seats: SeatService,
    pub students: StudentService,
}

/// Monta os serviços sobre os registros dados. A senha de administrador
/// só é definida quando `with_password` é verdadeiro.
pub async fn fixture_with(records: Vec<Student>, with_password: bool) -> Fixture {
    let registry = InMemoryRegistry::with_students(records);
    let overrides = InMemoryOverrideStore::new();
    let admin = AdminService::with_cost(Arc::new(InMemoryAdminStore::new()), TEST_HASH_COST);

    if with_password {
        admin.set_password(ADMIN_PASSWORD).await.unwrap();
    }

    let hall_locks = HallLocks::default();
    let verifier = Arc::new(admin.clone());

    let seats = SeatService::new(
        Arc::new(registry.clone()),
        Arc::new(overrides.clone()),
        verifier.clone(),
        hall_locks.clone(),
    );
    let students = StudentService::new(Arc::new(registry.clone()), verifier, hall_locks);

    Fixture {
        registry,
        overrides,
        admin,
        seats,
        students,
    }
}

pub async fn fixture(records: Vec<Student>) -> Fixture {
    fixture_with(records, true).await
}
