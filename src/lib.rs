// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;

pub use crate::core::db::{
    array_to_query_string, ConnectOptions, Connector, DatabaseManager, Record, ResultSet,
};
pub use crate::core::{DbmanError, Result};
