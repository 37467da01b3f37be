pub mod attendance_records;
pub mod login_sessions;
pub mod members;
pub mod push_subscriptions;
pub mod schedule_sessions;

pub use attendance_records::{AttendanceRecordRow, AttendanceStatus};
pub use login_sessions::LoginSessionRow;
pub use members::MemberRow;
pub use push_subscriptions::PushSubscriptionRow;
pub use schedule_sessions::ScheduleSessionRow;
