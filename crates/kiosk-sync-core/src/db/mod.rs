//! Database layer for kiosk-sync

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{JobStore, SelectionMode, SqliteJobStore};
