// src/db/memory.rs

//! Implementações em memória dos colaboradores.
//!
//! Usadas nos testes e para rodar o motor sem Postgres. Os dados ficam em
//! `HashMap`s atrás de um `RwLock`; nenhuma trava é mantida através de um
//! `.await`.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{admin_repo::AdminStore, override_repo::SeatOverrideStore, student_repo::StudentRegistry},
    models::{
        admin::AdminCredential,
        hall::Hall,
        seat::{HallOverrides, RestorePlan},
        student::{registration_instant, NewStudent, Student, StudentChanges},
    },
};

fn poisoned() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("trava do armazenamento em memória envenenada"))
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read().map_err(|_| poisoned())
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write().map_err(|_| poisoned())
}

// =========================================================================
//  REGISTRO DE ALUNOS
// =========================================================================

#[derive(Default)]
struct RegistryData {
    // Ordem de inserção preservada, como numa coleção real
    students: Vec<Student>,
    // Ids cujas escritas falham (simula o banco fora do ar para um registro)
    failing_writes: HashSet<Uuid>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    data: Arc<RwLock<RegistryData>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(students: impl IntoIterator<Item = Student>) -> Self {
        let registry = Self::new();
        if let Ok(mut data) = registry.data.write() {
            data.students.extend(students);
        }
        registry
    }

    /// Insere um registro pronto (datas arbitrárias), sem validação.
    pub fn insert(&self, student: Student) -> Result<(), AppError> {
        write(&self.data)?.students.push(student);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Vec<Student>, AppError> {
        Ok(read(&self.data)?.students.clone())
    }

    /// Faz as próximas escritas nesse id falharem como `REGISTRY_UNAVAILABLE`.
    pub fn fail_writes_for(&self, id: Uuid) -> Result<(), AppError> {
        write(&self.data)?.failing_writes.insert(id);
        Ok(())
    }

    /// Simula o registro inteiro fora do ar.
    pub fn set_unavailable(&self, unavailable: bool) -> Result<(), AppError> {
        write(&self.data)?.unavailable = unavailable;
        Ok(())
    }

    fn check_available(data: &RegistryData) -> Result<(), AppError> {
        if data.unavailable {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }

    fn check_writable(data: &RegistryData, id: Uuid) -> Result<(), AppError> {
        Self::check_available(data)?;
        if data.failing_writes.contains(&id) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }

    // Aplica `f` ao registro, se existir, e devolve a versão gravada
    fn modify<F>(&self, id: Uuid, f: F) -> Result<Option<Student>, AppError>
    where
        F: FnOnce(&mut Student),
    {
        let mut data = write(&self.data)?;
        Self::check_writable(&data, id)?;

        Ok(data.students.iter_mut().find(|s| s.id == id).map(|s| {
            f(s);
            s.clone()
        }))
    }
}

#[async_trait]
impl StudentRegistry for InMemoryRegistry {
    async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        let data = read(&self.data)?;
        Self::check_available(&data)?;
        Ok(data.students.clone())
    }

    async fn list_by_hall(&self, hall: Hall, include_deleted: bool) -> Result<Vec<Student>, AppError> {
        let data = read(&self.data)?;
        Self::check_available(&data)?;

        let mut students: Vec<Student> = data
            .students
            .iter()
            .filter(|s| s.hall == hall && (include_deleted || !s.deleted))
            .cloned()
            .collect();
        students.sort_by_key(|s| s.seat_number);
        Ok(students)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let data = read(&self.data)?;
        Self::check_available(&data)?;
        Ok(data.students.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, new: &NewStudent) -> Result<Student, AppError> {
        let mut data = write(&self.data)?;
        Self::check_available(&data)?;

        let student = Student {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            surname: new.surname.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            hall: new.hall,
            seat_number: new.seat_number,
            seat_type: new.seat_type.clone(),
            payment_method: new.payment_method.clone(),
            remaining_fees: new.remaining_fees,
            fees_amount: new.fees_amount,
            registration_date: registration_instant(new.registration_date),
            deleted: false,
        };
        data.students.push(student.clone());
        Ok(student)
    }

    async fn update(&self, id: Uuid, changes: &StudentChanges) -> Result<Option<Student>, AppError> {
        self.modify(id, |s| *s = changes.apply_to(s))
    }

    async fn restore(&self, plan: &RestorePlan) -> Result<Option<Student>, AppError> {
        self.modify(plan.student_id, |s| {
            s.deleted = false;
            s.seat_number = plan.final_seat;
            s.registration_date = plan.registration_date;
        })
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        self.modify(id, |s| s.deleted = true)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let mut data = write(&self.data)?;
        Self::check_writable(&data, id)?;

        let position = data.students.iter().position(|s| s.id == id);
        Ok(position.map(|p| data.students.remove(p)))
    }
}

// =========================================================================
//  OVERRIDES
// =========================================================================

#[derive(Clone, Default)]
pub struct InMemoryOverrideStore {
    halls: Arc<RwLock<HashMap<Hall, HallOverrides>>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatOverrideStore for InMemoryOverrideStore {
    async fn get(&self, hall: Hall) -> Result<HallOverrides, AppError> {
        Ok(read(&self.halls)?.get(&hall).cloned().unwrap_or_default())
    }

    async fn put(&self, hall: Hall, state: &HallOverrides) -> Result<(), AppError> {
        write(&self.halls)?.insert(hall, state.clone());
        Ok(())
    }
}

// =========================================================================
//  CREDENCIAL DE ADMINISTRADOR
// =========================================================================

#[derive(Clone, Default)]
pub struct InMemoryAdminStore {
    credential: Arc<RwLock<Option<AdminCredential>>>,
}

impl InMemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminStore for InMemoryAdminStore {
    async fn find(&self) -> Result<Option<AdminCredential>, AppError> {
        Ok(read(&self.credential)?.clone())
    }

    async fn save_password_hash(&self, password_hash: &str) -> Result<AdminCredential, AppError> {
        let admin = AdminCredential {
            id: 1,
            password_hash: password_hash.to_string(),
            updated_at: Utc::now(),
        };
        *write(&self.credential)? = Some(admin.clone());
        Ok(admin)
    }
}
