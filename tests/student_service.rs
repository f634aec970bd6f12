//! Operações do registro de alunos: cadastro, alteração, listagem e exclusão.

mod common;

use assert_matches::assert_matches;

use common::{deleted_student, fixture, new_student, now, student, ADMIN_PASSWORD};
use studyroom::{
    common::error::{AppError, SeatError},
    models::{
        hall::Hall,
        seat::SeatState,
        student::{StudentChanges, StudentFilter, StudentStatus},
    },
};

// ---------------------------------------------------------------------------
// Cadastro
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_stores_midnight_utc() {
    let fx = fixture(vec![]).await;

    let created = fx.students.register(new_student(Hall::Hall1, 3), now()).await.unwrap();
    assert_eq!(created.registration_date.to_rfc3339(), "2025-06-01T00:00:00+00:00");
    assert!(!created.deleted);
    assert_eq!(fx.students.get(created.id).await.unwrap(), created);
}

#[tokio::test]
async fn test_register_validates_input() {
    let fx = fixture(vec![]).await;

    let mut nameless = new_student(Hall::Hall1, 1);
    nameless.name = String::new();
    assert_matches!(
        fx.students.register(nameless, now()).await,
        Err(AppError::ValidationError(_))
    );

    let mut bad_email = new_student(Hall::Hall1, 1);
    bad_email.email = Some("nao-e-email".into());
    assert_matches!(
        fx.students.register(bad_email, now()).await,
        Err(AppError::ValidationError(_))
    );

    for seat in [0, -1, 1001, i32::MAX] {
        assert_matches!(
            fx.students.register(new_student(Hall::Hall1, seat), now()).await,
            Err(AppError::Seat(SeatError::InvalidSeat(_)))
        );
    }
    assert!(fx.registry.snapshot().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_held_seats_only() {
    let fx = fixture(vec![
        student(Hall::Hall1, 1, 5),
        student(Hall::Hall1, 2, 45),
        student(Hall::Hall1, 3, 90),
        deleted_student(Hall::Hall1, 4, 5),
    ])
    .await;

    for seat in [1, 2] {
        assert_matches!(
            fx.students.register(new_student(Hall::Hall1, seat), now()).await,
            Err(AppError::Seat(SeatError::SeatConflict { .. }))
        );
    }

    // Expirado, removido ou em outro salão não bloqueia
    fx.students.register(new_student(Hall::Hall1, 3), now()).await.unwrap();
    fx.students.register(new_student(Hall::Hall1, 4), now()).await.unwrap();
    fx.students.register(new_student(Hall::Hall2, 1), now()).await.unwrap();
}

// ---------------------------------------------------------------------------
// Alteração
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_checks_the_target_seat() {
    let moving = student(Hall::Hall1, 1, 5);
    let holder = student(Hall::Hall2, 9, 5);
    let fx = fixture(vec![moving.clone(), holder]).await;

    let into_conflict = StudentChanges {
        hall: Some(Hall::Hall2),
        seat_number: Some(9),
        ..Default::default()
    };
    assert_matches!(
        fx.students.update(moving.id, into_conflict, now()).await,
        Err(AppError::Seat(SeatError::SeatConflict { hall: Hall::Hall2, seat: 9 }))
    );

    // Continuar no próprio assento não é conflito
    let same_seat = StudentChanges {
        seat_number: Some(1),
        phone: Some("1130000000".into()),
        ..Default::default()
    };
    let updated = fx.students.update(moving.id, same_seat, now()).await.unwrap();
    assert_eq!(updated.phone, "1130000000");
    assert_eq!(updated.seat_number, 1);
}

#[tokio::test]
async fn test_new_registration_date_cannot_revive_onto_a_taken_seat() {
    let stale = student(Hall::Hall1, 5, 90);
    let holder = student(Hall::Hall1, 5, 2);
    let fx = fixture(vec![stale.clone(), holder.clone()]).await;

    let revive = StudentChanges {
        registration_date: Some(now().date_naive()),
        ..Default::default()
    };
    assert_matches!(
        fx.students.update(stale.id, revive, now()).await,
        Err(AppError::Seat(SeatError::SeatConflict { hall: Hall::Hall1, seat: 5 }))
    );
    assert_eq!(fx.registry.snapshot().unwrap(), vec![stale.clone(), holder]);

    let map = fx.seats.seat_map(Hall::Hall1, now()).await.unwrap();
    assert_eq!(map.seats_in(SeatState::Sold), vec![5]);

    // Em um assento livre a mesma mudança passa
    let revive_elsewhere = StudentChanges {
        seat_number: Some(6),
        registration_date: Some(now().date_naive()),
        ..Default::default()
    };
    let revived = fx.students.update(stale.id, revive_elsewhere, now()).await.unwrap();
    assert_eq!(revived.seat_number, 6);
}

#[tokio::test]
async fn test_update_rejects_out_of_range_seats() {
    let target = student(Hall::Hall1, 1, 90);
    let fx = fixture(vec![target.clone()]).await;

    for seat in [0, -7, 5000] {
        let changes = StudentChanges {
            seat_number: Some(seat),
            ..Default::default()
        };
        assert_matches!(
            fx.students.update(target.id, changes, now()).await,
            Err(AppError::Seat(SeatError::InvalidSeat(_)))
        );
    }
    assert_eq!(fx.registry.snapshot().unwrap(), vec![target]);
}

#[tokio::test]
async fn test_update_of_unknown_student_is_not_found() {
    let fx = fixture(vec![]).await;
    let changes = StudentChanges {
        name: Some("Novo".into()),
        ..Default::default()
    };
    assert_matches!(
        fx.students.update(uuid::Uuid::new_v4(), changes, now()).await,
        Err(AppError::StudentNotFound)
    );
}

// ---------------------------------------------------------------------------
// Listagem
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_reports_status_and_age() {
    let fx = fixture(vec![
        student(Hall::Hall1, 1, 10),
        student(Hall::Hall1, 2, 40),
        student(Hall::Hall2, 3, 70),
        deleted_student(Hall::Hall2, 4, 70),
    ])
    .await;

    let all = fx.students.list(&StudentFilter::default(), now()).await.unwrap();
    let statuses: Vec<(i32, StudentStatus, i64)> = all
        .iter()
        .map(|v| (v.student.seat_number, v.status, v.age_days))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (1, StudentStatus::Active, 10),
            (2, StudentStatus::PendingRemoval, 40),
            (3, StudentStatus::Expired, 70),
        ]
    );

    let with_deleted = StudentFilter {
        hall: Some(Hall::Hall2),
        include_deleted: true,
        ..Default::default()
    };
    let hall2 = fx.students.list(&with_deleted, now()).await.unwrap();
    assert_eq!(hall2.len(), 2);
    assert_eq!(hall2[1].status, StudentStatus::Deleted);
}

#[tokio::test]
async fn test_list_filters_by_search_month_and_seat_type() {
    let mut fabio = student(Hall::Hall1, 21, 2);
    fabio.name = "Fábio".into();
    fabio.email = None;
    fabio.seat_type = Some("Flex".into());
    let may = student(Hall::Hall1, 22, 10);
    let fx = fixture(vec![fabio.clone(), may.clone()]).await;

    let by_search = StudentFilter {
        search: Some("fábio".into()),
        ..Default::default()
    };
    let found = fx.students.list(&by_search, now()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].student.id, fabio.id);

    // Assento também entra na busca
    let by_seat = StudentFilter {
        search: Some("22".into()),
        ..Default::default()
    };
    assert_eq!(fx.students.list(&by_seat, now()).await.unwrap()[0].student.id, may.id);

    let by_month = StudentFilter {
        month: Some(5),
        ..Default::default()
    };
    let in_may = fx.students.list(&by_month, now()).await.unwrap();
    assert_eq!(in_may.len(), 2);

    let by_type = StudentFilter {
        seat_type: Some("flex".into()),
        ..Default::default()
    };
    let flex = fx.students.list(&by_type, now()).await.unwrap();
    assert_eq!(flex.len(), 1);
    assert_eq!(flex[0].student.id, fabio.id);
}

// ---------------------------------------------------------------------------
// Exclusão
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_purge_requires_a_soft_deleted_record() {
    let target = student(Hall::Hall1, 1, 5);
    let fx = fixture(vec![target.clone()]).await;

    assert_matches!(
        fx.students.purge(ADMIN_PASSWORD, target.id).await,
        Err(AppError::StudentNotDeleted)
    );

    let deleted = fx.students.soft_delete(ADMIN_PASSWORD, target.id).await.unwrap();
    assert!(deleted.deleted);

    fx.students.purge(ADMIN_PASSWORD, target.id).await.unwrap();
    assert_matches!(fx.students.get(target.id).await, Err(AppError::StudentNotFound));
}

#[tokio::test]
async fn test_deletions_need_the_admin_password() {
    let target = deleted_student(Hall::Hall1, 1, 5);
    let fx = fixture(vec![target.clone()]).await;

    assert_matches!(
        fx.students.purge("outra2025", target.id).await,
        Err(AppError::AdminDenied)
    );
    assert_matches!(
        fx.students.soft_delete("outra2025", target.id).await,
        Err(AppError::AdminDenied)
    );
    assert_eq!(fx.registry.snapshot().unwrap(), vec![target]);
}
