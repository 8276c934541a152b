/// Database Module
///
/// This module provides the data-access layer, organized into focused
/// submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): the `Connector`, owner of one live session
/// - **Statement Text** (`sql.rs`): pure builders for the SQL the manager issues
/// - **Records** (`record.rs`): result rows as column-name to string-or-null mappings
/// - **Manager** (`manager.rs`): CRUD facade that builds, binds and executes statements
///
/// ## Threading
///
/// A `Connector` is `Send` but not `Sync`. Use one connector per thread, or
/// serialize access yourself; the manager's exclusive borrow already does so
/// within a single thread.
pub mod connection;
pub mod manager;
pub mod record;
pub mod sql;

pub use connection::*;
pub use manager::*;
pub use record::*;
pub use sql::array_to_query_string;
