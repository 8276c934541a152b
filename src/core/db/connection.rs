/// Connection Management Module
///
/// This module provides the `Connector`, which opens and owns exactly one
/// database session, and `ConnectOptions`, which describes where that
/// session points.

use crate::core::{DbmanError, Result};
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Server value that selects a private in-memory engine instead of a data directory
pub const MEMORY_SERVER: &str = ":memory:";

/// Extension appended to database names that do not carry one
const DATABASE_EXTENSION: &str = "db";

/// Statements applied to every freshly opened session
const SESSION_INIT_SQL: &str = "PRAGMA foreign_keys = ON;";

/// Where a session lives once the server and database names are resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Private in-memory database, discarded when the session closes
    Memory,
    /// Database file inside the server's data directory
    File(PathBuf),
}

impl Target {
    /// Resolves a (server, database) pair to a concrete target.
    ///
    /// The server is a data directory; the database is a file inside it.
    /// `.db` is appended when the database name has no extension.
    pub fn resolve(server: &str, database: &str) -> Self {
        if server == MEMORY_SERVER {
            return Target::Memory;
        }

        let mut path = Path::new(server).join(database);
        if path.extension().is_none() {
            path.set_extension(DATABASE_EXTENSION);
        }
        Target::File(path)
    }

    /// Human-readable form used in logs and connection errors
    pub fn describe(&self) -> String {
        match self {
            Target::Memory => MEMORY_SERVER.to_string(),
            Target::File(path) => path.display().to_string(),
        }
    }
}

/// Parameters for opening a `Connector`.
///
/// Credentials are handed over at open time only. The embedded engine has
/// no authentication, so the password is never stored and the user name is
/// kept purely for diagnostics.
#[derive(Clone)]
pub struct ConnectOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub create_if_missing: bool,
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("create_if_missing", &self.create_if_missing)
            .finish()
    }
}

impl ConnectOptions {
    /// Creates options for an anonymous session that creates the database file on demand
    pub fn new(server: impl Into<String>, database: impl Into<String>) -> Self {
        ConnectOptions {
            server: server.into(),
            database: database.into(),
            user: String::new(),
            password: String::new(),
            create_if_missing: true,
        }
    }

    /// Sets the user name and password
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Controls whether a missing database file is created (`true`) or rejected (`false`)
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Resolves these options to the target the session will open
    pub fn target(&self) -> Target {
        Target::resolve(&self.server, &self.database)
    }
}

/// Owner of one live database session.
///
/// A `Connector` always holds an open connection: construction fails as a
/// whole when the engine refuses to open, and `close` consumes the value.
#[derive(Debug)]
pub struct Connector {
    connection: Connection,
    server: String,
    database: String,
    user: String,
    create_if_missing: bool,
}

impl Connector {
    /// Opens a session described by `options`.
    ///
    /// # Errors
    ///
    /// Returns `DbmanError::Connection` when the database cannot be opened
    /// or the session cannot be initialized.
    pub fn open(options: ConnectOptions) -> Result<Self> {
        let ConnectOptions {
            server,
            database,
            user,
            password,
            create_if_missing,
        } = options;

        if !password.is_empty() {
            debug!("Ignoring password for {}: the engine has no authentication", user);
        }

        let connection = open_session(&Target::resolve(&server, &database), create_if_missing)?;
        info!("Connected to {}/{} as {:?}", server, database, user);

        Ok(Connector {
            connection,
            server,
            database,
            user,
            create_if_missing,
        })
    }

    /// Opens an anonymous session (empty user and password)
    pub fn make_no_auth(server: &str, database: &str) -> Result<Self> {
        Connector::open(ConnectOptions::new(server, database))
    }

    /// Opens a session with explicit credentials
    pub fn make_with_auth(server: &str, database: &str, user: &str, password: &str) -> Result<Self> {
        Connector::open(ConnectOptions::new(server, database).credentials(user, password))
    }

    /// Returns the owned connection.
    ///
    /// Callers may use the full driver surface on it directly.
    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Issues a liveness probe on the existing session.
    pub fn ping(&self) -> Result<()> {
        self.connection
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        debug!("Ping to {}/{} succeeded", self.server, self.database);
        Ok(())
    }

    /// Keep-alive probe, identical to [`Connector::ping`].
    ///
    /// Despite the name this never tears the session down or opens a new
    /// one; a dead session stays dead and the probe reports the error.
    pub fn reconnect(&self) -> Result<()> {
        self.ping()
    }

    /// Switches the session to another database on the same server.
    ///
    /// The engine cannot swap the main schema of a live session, so the new
    /// database is opened first and replaces the current handle only once it
    /// is ready. On failure the current session is left untouched.
    ///
    /// The in-memory server holds a single private database, so switching
    /// there is refused with `DbmanError::Unsupported` instead of silently
    /// discarding its contents.
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        if self.server == MEMORY_SERVER {
            return Err(DbmanError::Unsupported(format!(
                "cannot switch to database {:?} on the {} server",
                name, MEMORY_SERVER
            )));
        }

        let target = Target::resolve(&self.server, name);
        let connection = open_session(&target, self.create_if_missing)?;

        let previous = std::mem::replace(&mut self.connection, connection);
        if let Err((_, e)) = previous.close() {
            warn!("Failed to close session for {}: {}", self.database, e);
        }

        info!("Switched database from {} to {}", self.database, name);
        self.database = name.to_string();
        Ok(())
    }

    /// Closes the session.
    pub fn close(self) -> Result<()> {
        let Connector {
            connection,
            server,
            database,
            ..
        } = self;

        connection.close().map_err(|(_, e)| DbmanError::Database(e))?;
        info!("Closed connection to {}/{}", server, database);
        Ok(())
    }
}

fn open_session(target: &Target, create_if_missing: bool) -> Result<Connection> {
    let connection_error = |source| DbmanError::Connection {
        target: target.describe(),
        source,
    };

    let connection = match target {
        Target::Memory => Connection::open_in_memory(),
        Target::File(path) => {
            let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            if create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
            Connection::open_with_flags(path, flags)
        }
    }
    .map_err(connection_error)?;

    connection
        .execute_batch(SESSION_INIT_SQL)
        .map_err(connection_error)?;

    debug!("Opened session at {}", target.describe());
    Ok(connection)
}
