pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

/// Set by build.rs; shows which binary is actually running.
pub const BUILD_ID: &str = env!("PRESENSI_BUILD_ID");
