pub mod auth;
pub mod cron;
pub mod dashboard;
pub mod jadwal;
pub mod profile;
pub mod push;
pub mod rekap;
pub mod users;
