mod common;

use common::{date, memory_pool, seed_member, seed_record};
use presensi::services::rekap_service;

#[tokio::test]
async fn monthly_rollup_matches_counts_and_percentages() {
    let pool = memory_pool().await;
    seed_member(&pool, "budi", "budi", false).await;
    seed_member(&pool, "ani", "Ani", false).await;

    seed_record(&pool, "budi", date(2024, 1, 2), "present").await;
    seed_record(&pool, "budi", date(2024, 1, 3), "present").await;
    seed_record(&pool, "budi", date(2024, 1, 31), "absent").await;
    // outside January
    seed_record(&pool, "budi", date(2023, 12, 31), "absent").await;
    seed_record(&pool, "ani", date(2024, 2, 1), "present").await;

    let view = rekap_service::load_rekap(&pool, 2024, 1).await.expect("rekap");
    assert_eq!(view.month_label, "Januari 2024");
    assert_eq!(view.from, date(2024, 1, 1));
    assert_eq!(view.to, date(2024, 1, 31));

    let names: Vec<&str> = view.rows.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ani", "budi"]);

    let ani = &view.rows[0];
    assert_eq!(
        (ani.present_count, ani.absent_count, ani.excused_count, ani.present_percentage),
        (0, 0, 0, 0)
    );
    let budi = &view.rows[1];
    assert_eq!(
        (budi.present_count, budi.absent_count, budi.excused_count, budi.present_percentage),
        (2, 1, 0, 67)
    );

    assert_eq!(view.summary.members, 2);
    assert_eq!(view.summary.present_total, 2);
    assert_eq!(view.summary.absent_total, 1);
}

#[tokio::test]
async fn invalid_month_is_rejected() {
    let pool = memory_pool().await;
    assert!(rekap_service::load_rekap(&pool, 2024, 13).await.is_err());
}
