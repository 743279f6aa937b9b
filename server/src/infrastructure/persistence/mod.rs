//! Persistence adapters

pub mod sqlite;
