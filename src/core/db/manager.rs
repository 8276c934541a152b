/// Database Manager Module
///
/// CRUD facade over a `Connector`: builds SQL text, binds untrusted values,
/// executes, and shapes rows into `Record`s.
///
/// ## Sanitization
///
/// Only `insert` values (and anything passed to `bind_parameters`) are bound
/// as parameters. Table names, field names, `WHERE` conditions and `update`
/// values are interpolated verbatim. Never feed those from untrusted input.
///
/// ## Failures
///
/// `send_query` and `send_non_query` absorb failures into an empty result
/// set or a zero count, so "nothing matched" and "statement failed" look the
/// same. Use `last_error` to tell them apart, or the `try_*` variants to get
/// the error itself.

use crate::core::db::connection::Connector;
use crate::core::db::record::{Record, ResultSet};
use crate::core::db::sql;
use crate::core::{DbmanError, Result};
use rusqlite::{Batch, Connection, Statement, ToSql};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Query builder and executor bound to one connector
#[derive(Debug)]
pub struct DatabaseManager<'c> {
    connector: &'c mut Connector,
    /// Message of the most recent failure absorbed by a non-`try_*` call
    last_error: RefCell<Option<String>>,
}

impl<'c> DatabaseManager<'c> {
    /// Wraps `connector`. No I/O happens here.
    pub fn new(connector: &'c mut Connector) -> Self {
        DatabaseManager {
            connector,
            last_error: RefCell::new(None),
        }
    }

    pub fn get_connector(&self) -> &Connector {
        &*self.connector
    }

    pub fn get_connection(&self) -> &Connection {
        self.connector.get_connection()
    }

    /// Message of the most recent absorbed failure.
    ///
    /// Cleared by every successful `send_query`, `send_non_query` and
    /// `run_sql_script` call.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Points every subsequent statement at database `name`
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        self.connector.use_database(name)
    }

    /// Inserts each row in `rows`, binding every value as text.
    ///
    /// With an empty `fields` list the column clause is omitted and values
    /// fill the table's columns in declaration order. Otherwise every row
    /// must have exactly `fields.len()` values; all rows are checked before
    /// anything is executed.
    ///
    /// Returns the number of rows inserted.
    pub fn insert<F, R, V>(&self, table: &str, fields: &[F], rows: &[R]) -> Result<usize>
    where
        F: AsRef<str>,
        R: AsRef<[V]>,
        V: AsRef<str>,
    {
        if !fields.is_empty() {
            for (index, row) in rows.iter().enumerate() {
                let actual = row.as_ref().len();
                if actual != fields.len() {
                    return Err(DbmanError::ArgumentCount {
                        expected: fields.len(),
                        actual,
                        row: index,
                    });
                }
            }
        }

        let mut inserted = 0;
        for row in rows {
            let values = row.as_ref();
            let query = sql::insert_statement(table, fields, values.len());
            let mut statement = self.bind_parameters(&query, values)?;
            inserted += statement.raw_execute()?;
        }
        Ok(inserted)
    }

    /// Inserts one full row positionally into every column of `table`
    pub fn insert_whole<V: AsRef<str>>(&self, table: &str, values: &[V]) -> Result<usize> {
        const NO_FIELDS: &[&str] = &[];
        self.insert::<&str, &[V], V>(table, NO_FIELDS, &[values])
    }

    /// `DELETE FROM table WHERE condition`; `condition` is raw SQL
    pub fn delete_from(&self, table: &str, condition: &str) -> usize {
        self.send_non_query(&sql::delete_statement(table, condition))
    }

    /// `UPDATE table SET k=v, ... WHERE condition`.
    ///
    /// Unlike `insert`, values are interpolated verbatim: string literals
    /// must arrive quoted, and untrusted input must not reach this call.
    pub fn update<K, V>(&self, table: &str, values: &[(K, V)], condition: &str) -> usize
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.send_non_query(&sql::update_statement(table, values, condition))
    }

    pub fn select_with_condition<F: AsRef<str>>(
        &self,
        fields: &[F],
        table: &str,
        condition: &str,
    ) -> ResultSet {
        self.send_query(&sql::select_statement(Some(fields), table, Some(condition)))
    }

    pub fn select_without_condition<F: AsRef<str>>(&self, fields: &[F], table: &str) -> ResultSet {
        self.send_query(&sql::select_statement(Some(fields), table, None))
    }

    pub fn select_all_with_condition(&self, table: &str, condition: &str) -> ResultSet {
        self.send_query(&sql::select_statement::<&str>(None, table, Some(condition)))
    }

    pub fn select_all_without_condition(&self, table: &str) -> ResultSet {
        self.send_query(&sql::select_statement::<&str>(None, table, None))
    }

    /// Runs a row-returning statement and materializes every row.
    ///
    /// Any failure yields an empty result set.
    pub fn send_query(&self, query: &str) -> ResultSet {
        match self.try_query(query) {
            Ok(records) => {
                self.clear_error();
                records
            }
            Err(e) => {
                self.absorb("query", query, e);
                Vec::new()
            }
        }
    }

    /// Like [`DatabaseManager::send_query`], but reports failures
    pub fn try_query(&self, query: &str) -> Result<ResultSet> {
        debug!("Executing query: {}", query);
        let connection = self.get_connection();
        let mut statement = self.prepare_single(query)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let records = statement
            .query_map([], |row| Record::from_row(row, &columns, connection))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Query returned {} rows", records.len());
        Ok(records)
    }

    /// Runs a mutating statement and returns the affected row count.
    ///
    /// Any failure yields 0.
    pub fn send_non_query(&self, statement: &str) -> usize {
        match self.try_non_query(statement) {
            Ok(affected) => {
                self.clear_error();
                affected
            }
            Err(e) => {
                self.absorb("statement", statement, e);
                0
            }
        }
    }

    /// Like [`DatabaseManager::send_non_query`], but reports failures
    pub fn try_non_query(&self, statement: &str) -> Result<usize> {
        debug!("Executing statement: {}", statement);
        let affected = self.prepare_single(statement)?.execute([])?;
        debug!("Statement affected {} rows", affected);
        Ok(affected)
    }

    /// Executes a script file as one multi-statement batch.
    ///
    /// A file that cannot be read is an error. Failures inside the batch are
    /// only logged and kept in `last_error`; statements before the failing
    /// one stay applied.
    pub fn run_sql_script<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let script = fs::read_to_string(path)?;

        match self.execute_batch(path, &script) {
            Ok(()) => self.clear_error(),
            Err(e) => self.absorb("script", &path.display().to_string(), e),
        }
        Ok(())
    }

    /// Like [`DatabaseManager::run_sql_script`], but reports batch failures
    pub fn try_run_sql_script<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let script = fs::read_to_string(path)?;
        self.execute_batch(path, &script)
    }

    /// See [`sql::array_to_query_string`]
    pub fn array_to_query_string<S: AsRef<str>>(items: &[S]) -> String {
        sql::array_to_query_string(items)
    }

    /// Prepares `query` and binds every value as a text parameter.
    ///
    /// The statement comes back bound but not executed. The number of values
    /// must match the number of `?` placeholders.
    pub fn bind_parameters<V: AsRef<str>>(&self, query: &str, values: &[V]) -> Result<Statement<'_>> {
        let mut statement = self.prepare_for(query, values.len())?;
        for (index, value) in values.iter().enumerate() {
            statement.raw_bind_parameter(index + 1, value.as_ref())?;
        }
        Ok(statement)
    }

    /// Typed counterpart of [`DatabaseManager::bind_parameters`]
    pub fn bind_typed_parameters(&self, query: &str, values: &[&dyn ToSql]) -> Result<Statement<'_>> {
        let mut statement = self.prepare_for(query, values.len())?;
        for (index, value) in values.iter().enumerate() {
            statement.raw_bind_parameter(index + 1, *value)?;
        }
        Ok(statement)
    }

    fn prepare_for(&self, query: &str, value_count: usize) -> Result<Statement<'_>> {
        debug!("Preparing statement: {}", query);
        let statement = self.prepare_single(query)?;

        let expected = statement.parameter_count();
        if expected != value_count {
            return Err(DbmanError::ArgumentCount {
                expected,
                actual: value_count,
                row: 0,
            });
        }
        Ok(statement)
    }

    /// Prepares exactly one statement from `sql`.
    ///
    /// The engine would silently ignore anything after the first statement,
    /// so a non-empty tail is rejected before the first one runs.
    fn prepare_single(&self, sql: &str) -> Result<Statement<'_>> {
        let mut batch = Batch::new(self.get_connection(), sql);
        let statement = batch
            .next()?
            .ok_or_else(|| DbmanError::Query("empty statement".to_string()))?;

        if batch.next()?.is_some() {
            return Err(DbmanError::Query(format!(
                "expected a single statement, got more in {:?}",
                sql
            )));
        }
        Ok(statement)
    }

    fn execute_batch(&self, path: &Path, script: &str) -> Result<()> {
        debug!("Running script {} ({} bytes)", path.display(), script.len());
        self.get_connection().execute_batch(script)?;
        Ok(())
    }

    fn absorb(&self, kind: &str, sql: &str, error: DbmanError) {
        warn!("Failed {} {:?}: {}", kind, sql, error);
        *self.last_error.borrow_mut() = Some(error.to_string());
    }

    fn clear_error(&self) {
        self.last_error.borrow_mut().take();
    }
}
