use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::{attendance_repo, member_repo};
use crate::error::{AppError, AppResult};
use crate::models::{AttendanceRecordRow, AttendanceStatus, MemberRow};

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RekapRow {
    pub handle: String,
    pub display_name: String,
    pub origin: String,
    pub present_count: u32,
    pub absent_count: u32,
    pub excused_count: u32,
    pub present_percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RekapSummary {
    pub members: usize,
    pub present_total: u32,
    pub absent_total: u32,
    pub excused_total: u32,
    pub present_percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RekapView {
    pub year: i32,
    pub month: u32,
    pub month_label: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<RekapRow>,
    pub summary: RekapSummary,
}

/// First and last day of the month.
pub fn month_range(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::bad_request(format!("Bulan tidak valid: {}-{}", year, month)))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| AppError::bad_request(format!("Bulan tidak valid: {}-{}", year, month)))?;
    Ok((first, next_first - Duration::days(1)))
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, year)
}

/// `round(present / total * 100)` with halves rounded up; 0 when there are no records.
pub fn present_percentage(present: u32, absent: u32, excused: u32) -> u32 {
    let total = u64::from(present) + u64::from(absent) + u64::from(excused);
    if total == 0 {
        return 0;
    }
    ((200 * u64::from(present) + total) / (2 * total)) as u32
}

/// One row per member, sorted by display name (case-insensitive, stable).
/// Records of unknown members or with an unknown status are ignored.
pub fn build_rekap(members: &[MemberRow], records: &[AttendanceRecordRow]) -> Vec<RekapRow> {
    let mut counts: HashMap<&str, (u32, u32, u32)> = HashMap::new();
    for record in records {
        let Some(status) = record.attendance_status() else {
            warn!("ignoring record {} with status '{}'", record.id, record.status);
            continue;
        };
        let entry = counts.entry(record.member_handle.as_str()).or_default();
        match status {
            AttendanceStatus::Present => entry.0 += 1,
            AttendanceStatus::Absent => entry.1 += 1,
            AttendanceStatus::Excused => entry.2 += 1,
        }
    }

    let mut rows: Vec<RekapRow> = members
        .iter()
        .map(|m| {
            let (present, absent, excused) =
                counts.get(m.handle.as_str()).copied().unwrap_or_default();
            RekapRow {
                handle: m.handle.clone(),
                display_name: m.display_name.clone(),
                origin: m.origin.clone(),
                present_count: present,
                absent_count: absent,
                excused_count: excused,
                present_percentage: present_percentage(present, absent, excused),
            }
        })
        .collect();

    rows.sort_by_cached_key(|r| r.display_name.to_lowercase());
    rows
}

pub fn summarize(rows: &[RekapRow]) -> RekapSummary {
    let mut summary = RekapSummary {
        members: rows.len(),
        ..Default::default()
    };
    for row in rows {
        summary.present_total += row.present_count;
        summary.absent_total += row.absent_count;
        summary.excused_total += row.excused_count;
    }
    summary.present_percentage = present_percentage(
        summary.present_total,
        summary.absent_total,
        summary.excused_total,
    );
    summary
}

pub async fn load_rekap(pool: &SqlitePool, year: i32, month: u32) -> AppResult<RekapView> {
    let (from, to) = month_range(year, month)?;
    let members = member_repo::list_members(pool).await?;
    let records = attendance_repo::list_in_range(pool, from, to).await?;

    let rows = build_rekap(&members, &records);
    let summary = summarize(&rows);

    Ok(RekapView {
        year,
        month,
        month_label: month_label(year, month),
        from,
        to,
        rows,
        summary,
    })
}

/// Year and month of `date`, used as the default rekap period.
pub fn period_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(handle: &str, name: &str) -> MemberRow {
        MemberRow {
            handle: handle.to_string(),
            display_name: name.to_string(),
            origin: String::new(),
            status_tag: String::new(),
            note: None,
            profile_image: None,
            cover_image: None,
            is_admin: false,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn record(handle: &str, day: u32, status: &str) -> AttendanceRecordRow {
        AttendanceRecordRow {
            id: format!("{}-{}", handle, day),
            member_handle: handle.to_string(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, day).expect("date"),
            status: status.to_string(),
            recorded_at: Utc::now(),
            reason: None,
            photo: None,
        }
    }

    #[test]
    fn percentage_edges() {
        assert_eq!(present_percentage(0, 0, 0), 0);
        assert_eq!(present_percentage(0, 3, 1), 0);
        assert_eq!(present_percentage(2, 1, 0), 67);
        assert_eq!(present_percentage(1, 2, 0), 33);
        assert_eq!(present_percentage(3, 0, 0), 100);
        assert_eq!(present_percentage(1, 0, 1), 50);
        assert_eq!(present_percentage(1, 0, 7), 13); // 12.5 rounds up
    }

    #[test]
    fn counts_per_member_and_zero_for_no_records() {
        let members = vec![member("a", "A"), member("b", "B")];
        let records = vec![
            record("a", 2, "present"),
            record("a", 3, "present"),
            record("a", 4, "absent"),
        ];

        let rows = build_rekap(&members, &records);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            (rows[0].present_count, rows[0].absent_count, rows[0].excused_count),
            (2, 1, 0)
        );
        assert_eq!(rows[0].present_percentage, 67);
        assert_eq!(
            (
                rows[1].present_count,
                rows[1].absent_count,
                rows[1].excused_count,
                rows[1].present_percentage
            ),
            (0, 0, 0, 0)
        );
    }

    #[test]
    fn sorted_case_insensitively_for_any_input_order() {
        let expected = vec!["adi", "Budi", "citra", "Dewi"];
        let orders = [
            vec!["Dewi", "adi", "citra", "Budi"],
            vec!["citra", "Budi", "Dewi", "adi"],
            vec!["adi", "Budi", "citra", "Dewi"],
        ];
        for order in orders {
            let members: Vec<MemberRow> = order
                .iter()
                .map(|n| member(&n.to_lowercase(), n))
                .collect();
            let names: Vec<String> = build_rekap(&members, &[])
                .into_iter()
                .map(|r| r.display_name)
                .collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn unknown_members_and_statuses_are_ignored() {
        let members = vec![member("a", "A")];
        let records = vec![record("ghost", 1, "present"), record("a", 1, "late")];
        let rows = build_rekap(&members, &records);
        assert_eq!(rows[0].present_count + rows[0].absent_count + rows[0].excused_count, 0);
    }

    #[test]
    fn month_range_handles_december_and_leap_years() {
        let (from, to) = month_range(2024, 2).expect("feb");
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 1).expect("d"));
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29).expect("d"));

        let (_, to) = month_range(2023, 12).expect("dec");
        assert_eq!(to, NaiveDate::from_ymd_opt(2023, 12, 31).expect("d"));

        assert!(month_range(2024, 13).is_err());
        assert!(month_range(2024, 0).is_err());
    }

    #[test]
    fn summary_totals() {
        let members = vec![member("a", "A"), member("b", "B")];
        let records = vec![
            record("a", 1, "present"),
            record("b", 1, "excused"),
            record("b", 2, "absent"),
            record("a", 2, "present"),
        ];
        let summary = summarize(&build_rekap(&members, &records));
        assert_eq!(summary.members, 2);
        assert_eq!(
            (summary.present_total, summary.absent_total, summary.excused_total),
            (2, 1, 1)
        );
        assert_eq!(summary.present_percentage, 50);
        assert_eq!(month_label(2024, 1), "Januari 2024");
    }
}
