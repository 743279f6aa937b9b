//! Database infrastructure

pub mod connection_pool;
pub mod schema;

pub use connection_pool::{ConnectionPool, ConnectionPoolConfig};
pub use schema::initialize_schema;
