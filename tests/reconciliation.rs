mod common;

use common::{date, memory_pool, records_on, seed_member, seed_record, seed_schedule};
use presensi::error::AppError;
use presensi::models::AttendanceStatus;
use presensi::services::reconciliation_service::{self, ABSENT_NOTE};

#[tokio::test]
async fn missing_participant_gets_exactly_one_absent_record() {
    let pool = memory_pool().await;
    seed_member(&pool, "alice", "Alice", false).await;
    seed_member(&pool, "bob", "Bob", false).await;
    let day = date(2024, 1, 10);
    seed_schedule(&pool, day, "PAGI", &["alice", "bob"]).await;
    seed_record(&pool, "alice", day, "present").await;

    let outcome = reconciliation_service::reconcile_date(&pool, day, date(2024, 1, 11))
        .await
        .expect("reconcile");
    assert_eq!(outcome.scheduled, 2);
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.failed, 0);

    let records = records_on(&pool, day).await;
    assert_eq!(records.len(), 2);
    let bob: Vec<_> = records.iter().filter(|r| r.member_handle == "bob").collect();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].attendance_status(), Some(AttendanceStatus::Absent));
    assert_eq!(bob[0].reason.as_deref(), Some(ABSENT_NOTE));

    let alice = records.iter().find(|r| r.member_handle == "alice").expect("alice");
    assert_eq!(alice.attendance_status(), Some(AttendanceStatus::Present));
}

#[tokio::test]
async fn running_twice_adds_nothing() {
    let pool = memory_pool().await;
    let day = date(2024, 1, 10);
    seed_schedule(&pool, day, "PAGI", &["alice", "bob", "carol"]).await;
    seed_record(&pool, "carol", day, "excused").await;

    let first = reconciliation_service::reconcile_date(&pool, day, date(2024, 2, 1))
        .await
        .expect("first");
    let second = reconciliation_service::reconcile_date(&pool, day, date(2024, 2, 1))
        .await
        .expect("second");

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);

    let records = records_on(&pool, day).await;
    assert_eq!(records.len(), 3);
    let carol = records.iter().find(|r| r.member_handle == "carol").expect("carol");
    assert_eq!(carol.attendance_status(), Some(AttendanceStatus::Excused));
}

#[tokio::test]
async fn participant_listed_in_two_groups_is_marked_once() {
    let pool = memory_pool().await;
    let day = date(2024, 1, 10);
    seed_schedule(&pool, day, "PAGI", &["alice"]).await;
    seed_schedule(&pool, day, "SORE", &["alice"]).await;

    let outcome = reconciliation_service::reconcile_date(&pool, day, date(2024, 1, 11))
        .await
        .expect("reconcile");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(records_on(&pool, day).await.len(), 1);
}

#[tokio::test]
async fn today_and_future_dates_are_refused() {
    let pool = memory_pool().await;
    let today = date(2024, 1, 10);
    seed_schedule(&pool, today, "PAGI", &["alice"]).await;

    let err = reconciliation_service::reconcile_date(&pool, today, today)
        .await
        .expect_err("today is not past");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(records_on(&pool, today).await.is_empty());
}

#[tokio::test]
async fn batch_covers_only_past_dates_inside_lookback() {
    let pool = memory_pool().await;
    let today = date(2024, 1, 11);
    seed_schedule(&pool, date(2024, 1, 8), "A", &["alice", "bob"]).await;
    seed_schedule(&pool, date(2024, 1, 9), "B", &["alice"]).await;
    seed_schedule(&pool, today, "C", &["alice"]).await;
    seed_schedule(&pool, date(2023, 10, 1), "OLD", &["alice"]).await;
    seed_record(&pool, "bob", date(2024, 1, 8), "present").await;

    let report = reconciliation_service::reconcile_past_dates(&pool, today, 30)
        .await
        .expect("batch");

    assert_eq!(report.dates_checked, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);
    assert!(report.skipped_dates.is_empty());

    assert!(records_on(&pool, today).await.is_empty());
    assert!(records_on(&pool, date(2023, 10, 1)).await.is_empty());
    assert_eq!(records_on(&pool, date(2024, 1, 8)).await.len(), 2);
    assert_eq!(records_on(&pool, date(2024, 1, 9)).await.len(), 1);
}

#[tokio::test]
async fn lookback_beyond_the_calendar_is_rejected() {
    let pool = memory_pool().await;
    seed_schedule(&pool, date(2024, 1, 10), "PAGI", &["alice"]).await;

    let err = reconciliation_service::reconcile_past_dates(&pool, date(2024, 1, 11), 100_000_000)
        .await
        .expect_err("window too large");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(records_on(&pool, date(2024, 1, 10)).await.is_empty());
}

#[tokio::test]
async fn refused_insert_is_counted_and_left_for_the_next_run() {
    let pool = memory_pool().await;
    let day = date(2024, 1, 10);
    seed_schedule(&pool, day, "PAGI", &["alice", "bob"]).await;
    sqlx::query(
        "CREATE TRIGGER refuse_bob BEFORE INSERT ON attendance_records \
         WHEN NEW.member_handle = 'bob' \
         BEGIN SELECT RAISE(ABORT, 'refused'); END",
    )
    .execute(&pool)
    .await
    .expect("create trigger");

    let outcome = reconciliation_service::reconcile_date(&pool, day, date(2024, 1, 11))
        .await
        .expect("reconcile");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.failed, 1);
    let records = records_on(&pool, day).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].member_handle, "alice");

    sqlx::query("DROP TRIGGER refuse_bob")
        .execute(&pool)
        .await
        .expect("drop trigger");
    let retry = reconciliation_service::reconcile_date(&pool, day, date(2024, 1, 11))
        .await
        .expect("retry");
    assert_eq!((retry.inserted, retry.failed), (1, 0));
    assert_eq!(records_on(&pool, day).await.len(), 2);
}

#[tokio::test]
async fn unreadable_date_is_skipped_while_the_batch_continues() {
    let pool = memory_pool().await;
    let today = date(2024, 1, 11);
    seed_schedule(&pool, date(2024, 1, 8), "A", &["alice"]).await;
    seed_schedule(&pool, date(2024, 1, 10), "C", &["carol"]).await;
    // A blob participant cannot be read back as a handle, so 2024-01-09 fails as a whole.
    sqlx::query(
        "INSERT INTO schedule_sessions (id, session_date, participant, code, created_at) \
         VALUES ('broken', '2024-01-09', X'FF', 'B', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .expect("insert broken row");

    let report = reconciliation_service::reconcile_past_dates(&pool, today, 30)
        .await
        .expect("batch");

    assert_eq!(report.dates_checked, 3);
    assert_eq!(report.skipped_dates, vec![date(2024, 1, 9)]);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(records_on(&pool, date(2024, 1, 8)).await.len(), 1);
    assert_eq!(records_on(&pool, date(2024, 1, 10)).await.len(), 1);
}
