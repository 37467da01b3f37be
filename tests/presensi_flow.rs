mod common;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};

use common::{date, memory_pool, records_on, seed_member, seed_record, seed_schedule};
use presensi::database::{attendance_repo, member_repo, schedule_repo};
use presensi::error::AppError;
use presensi::models::AttendanceStatus;
use presensi::services::member_service::{self, RegisterForm};
use presensi::services::photo_store::PhotoStore;
use presensi::services::{auth_service, presensi_service, reconciliation_service, schedule_service};

fn png_data_url() -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode([0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
    )
}

fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn register_form(handle: &str, name: &str) -> RegisterForm {
    RegisterForm {
        handle: handle.to_string(),
        display_name: name.to_string(),
        origin: "Bandung".to_string(),
        status_tag: "Santri".to_string(),
        password: "rahasia123".to_string(),
    }
}

#[tokio::test]
async fn check_in_needs_a_matching_code_for_today() {
    let pool = memory_pool().await;
    let today = date(2024, 3, 4);
    seed_member(&pool, "alice", "Alice", false).await;
    seed_member(&pool, "bob", "Bob", false).await;
    seed_schedule(&pool, today, "Pagi7", &["alice"]).await;

    let err = presensi_service::check_in(&pool, "alice", "SALAH", today)
        .await
        .expect_err("wrong code");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = presensi_service::check_in(&pool, "bob", "PAGI7", today)
        .await
        .expect_err("bob is not scheduled");
    assert!(matches!(err, AppError::BadRequest(_)));

    let record = presensi_service::check_in(&pool, "alice", "  pagi7 ", today)
        .await
        .expect("check in");
    assert_eq!(record.attendance_status(), Some(AttendanceStatus::Present));
    assert_eq!(record.record_date, today);

    let err = presensi_service::check_in(&pool, "alice", "PAGI7", today)
        .await
        .expect_err("second check-in");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(records_on(&pool, today).await.len(), 1);
}

#[tokio::test]
async fn izin_stores_photo_and_blocks_a_second_record() {
    let pool = memory_pool().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let photos = PhotoStore::new(dir.path());
    let today = date(2024, 3, 4);
    seed_member(&pool, "alice", "Alice", false).await;

    let err = presensi_service::submit_izin(&pool, &photos, "alice", "   ", &png_data_url(), today)
        .await
        .expect_err("empty reason");
    assert!(matches!(err, AppError::BadRequest(_)));

    let record =
        presensi_service::submit_izin(&pool, &photos, "alice", "Sakit demam", &png_data_url(), today)
            .await
            .expect("izin");
    assert_eq!(record.attendance_status(), Some(AttendanceStatus::Excused));
    assert_eq!(record.reason.as_deref(), Some("Sakit demam"));
    let photo = record.photo.clone().expect("photo reference");
    assert!(photo.starts_with("izin/"));
    assert!(photos.exists(&photo));

    let err =
        presensi_service::submit_izin(&pool, &photos, "alice", "Lagi", &png_data_url(), today)
            .await
            .expect_err("already recorded");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(files_in(&dir.path().join("izin")), 1);

    presensi_service::delete_attendance(&pool, &photos, &record.id)
        .await
        .expect("delete attendance");
    assert!(!photos.exists(&photo));
    assert!(records_on(&pool, today).await.is_empty());
}

#[tokio::test]
async fn check_in_after_reconciliation_is_refused() {
    let pool = memory_pool().await;
    let day = date(2024, 3, 4);
    seed_schedule(&pool, day, "PAGI", &["alice"]).await;

    reconciliation_service::reconcile_date(&pool, day, date(2024, 3, 5))
        .await
        .expect("reconcile");
    let err = presensi_service::check_in(&pool, "alice", "PAGI", day)
        .await
        .expect_err("absent already recorded");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn schedule_is_created_and_removed_by_group() {
    let pool = memory_pool().await;
    let day = date(2024, 3, 4);
    seed_member(&pool, "alice", "Alice", false).await;
    seed_member(&pool, "bob", "Bob", false).await;

    let participants = schedule_service::parse_participants("alice, bob\nalice\n\n");
    assert_eq!(participants, vec!["alice".to_string(), "bob".to_string()]);

    let inserted = schedule_service::create_schedule(&pool, day, "PAGI", &participants)
        .await
        .expect("create");
    assert_eq!(inserted, 2);

    let again = schedule_service::create_schedule(&pool, day, "PAGI", &participants)
        .await
        .expect("create again");
    assert_eq!(again, 0);

    let err = schedule_service::create_schedule(&pool, day, "PAGI", &["ghost".to_string()])
        .await
        .expect_err("unknown member");
    assert!(matches!(err, AppError::BadRequest(_)));

    let groups = schedule_service::list_schedule(&pool, day).await.expect("list");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].entries.len(), 2);

    let removed = schedule_service::delete_schedule_group(&pool, "PAGI", day)
        .await
        .expect("delete group");
    assert_eq!(removed, 2);
    assert!(schedule_repo::list_for_date(&pool, day)
        .await
        .expect("rows")
        .is_empty());

    let err = schedule_service::delete_schedule_row(&pool, "missing")
        .await
        .expect_err("missing row");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn first_member_is_admin_and_handles_are_unique() {
    let pool = memory_pool().await;

    let first = member_service::register(&pool, &register_form(" Guru ", "Pak Guru"))
        .await
        .expect("first");
    assert_eq!(first.handle, "guru");
    assert!(first.is_admin);

    let second = member_service::register(&pool, &register_form("siswa", "Siswa"))
        .await
        .expect("second");
    assert!(!second.is_admin);

    let err = member_service::register(&pool, &register_form("GURU", "Lain"))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn login_session_round_trip() {
    let pool = memory_pool().await;
    member_service::register(&pool, &register_form("siswa", "Siswa"))
        .await
        .expect("register");

    let err = auth_service::login(&pool, "siswa", "salah-password", Duration::hours(1))
        .await
        .expect_err("bad password");
    assert!(matches!(err, AppError::Unauthorized));

    let token = auth_service::login(&pool, "SISWA", "rahasia123", Duration::hours(1))
        .await
        .expect("login");
    let member = auth_service::resolve_session(&pool, &token, Utc::now())
        .await
        .expect("resolve")
        .expect("active session");
    assert_eq!(member.handle, "siswa");

    let later = Utc::now() + Duration::hours(2);
    assert!(auth_service::resolve_session(&pool, &token, later)
        .await
        .expect("resolve expired")
        .is_none());

    let token = auth_service::login(&pool, "siswa", "rahasia123", Duration::hours(1))
        .await
        .expect("login again");
    auth_service::logout(&pool, &token).await.expect("logout");
    assert!(auth_service::resolve_session(&pool, &token, Utc::now())
        .await
        .expect("resolve after logout")
        .is_none());
}

#[tokio::test]
async fn deleting_a_member_removes_dependent_rows() {
    let pool = memory_pool().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let photos = PhotoStore::new(dir.path());
    let day = date(2024, 3, 4);
    seed_member(&pool, "admin", "Admin", true).await;
    seed_member(&pool, "bob", "Bob", false).await;
    seed_schedule(&pool, day, "PAGI", &["bob"]).await;
    seed_record(&pool, "bob", day, "present").await;

    let err = member_service::delete_member(&pool, &photos, "admin", "admin")
        .await
        .expect_err("self delete");
    assert!(matches!(err, AppError::BadRequest(_)));

    member_service::delete_member(&pool, &photos, "admin", "bob")
        .await
        .expect("delete");
    assert!(member_repo::load_member(&pool, "bob").await.expect("load").is_none());
    assert!(attendance_repo::load_for_member_on(&pool, "bob", day)
        .await
        .expect("records")
        .is_none());
    assert!(schedule_repo::list_for_date(&pool, day)
        .await
        .expect("schedule")
        .is_empty());
}

#[tokio::test]
async fn deleting_attendance_survives_an_unremovable_photo() {
    let pool = memory_pool().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let photos = PhotoStore::new(dir.path());
    let today = date(2024, 3, 4);
    seed_member(&pool, "alice", "Alice", false).await;

    let record =
        presensi_service::submit_izin(&pool, &photos, "alice", "Sakit", &png_data_url(), today)
            .await
            .expect("izin");
    let photo = record.photo.clone().expect("photo reference");

    // A directory in place of the file makes removal fail with something other than NotFound.
    let path = dir.path().join(&photo);
    std::fs::remove_file(&path).expect("remove original file");
    std::fs::create_dir_all(path.join("keep")).expect("block path with a directory");

    presensi_service::delete_attendance(&pool, &photos, &record.id)
        .await
        .expect("record deleted despite photo error");
    assert!(attendance_repo::load_record(&pool, &record.id)
        .await
        .expect("load")
        .is_none());
}
