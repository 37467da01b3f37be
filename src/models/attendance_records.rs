use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRecordRow {
    pub id: String,
    pub member_handle: String,
    pub record_date: NaiveDate,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub photo: Option<String>,
}

impl AttendanceRecordRow {
    pub fn attendance_status(&self) -> Option<AttendanceStatus> {
        AttendanceStatus::parse(&self.status)
    }
}

/// Stored as lowercase text in `attendance_records.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Excused,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "excused" => Some(AttendanceStatus::Excused),
            "absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }

    /// Label shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Hadir",
            AttendanceStatus::Excused => "Izin",
            AttendanceStatus::Absent => "Alpa",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
