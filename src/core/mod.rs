/// Core Module for DBMAN
///
/// This module contains the connector, the database manager and the error
/// type they share.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbmanError, Result};
