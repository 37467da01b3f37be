pub mod auth_service;
pub mod member_service;
pub mod photo_store;
pub mod presensi_service;
pub mod push_service;
pub mod reconciliation_service;
pub mod rekap_service;
pub mod schedule_service;
