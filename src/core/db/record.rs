/// Record Module
///
/// Result rows as generic column-name to string-or-null mappings.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row.
///
/// Columns keep the order the engine returned them in. Column names are
/// unique within a record: inserting an existing name replaces its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

/// Every row returned by a read query, fully materialized
pub type ResultSet = Vec<Record>;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`, replacing any previous value for that column
    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of `column`; `None` when the column is missing or SQL NULL
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Whether `column` is present and NULL
    pub fn is_null(&self, column: &str) -> bool {
        self.fields
            .iter()
            .any(|(name, value)| name == column && value.is_none())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a record from an engine row, rendering every value as text.
    ///
    /// `conn` must be the session that produced `row`; it renders reals.
    pub(crate) fn from_row(
        row: &Row<'_>,
        columns: &[String],
        conn: &Connection,
    ) -> rusqlite::Result<Self> {
        let mut record = Record::new();
        for (index, column) in columns.iter().enumerate() {
            record.insert(column.clone(), format_value(conn, row.get_ref(index)?)?);
        }
        Ok(record)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Converts a real to text with the engine's own formatting
const REAL_AS_TEXT_SQL: &str = "SELECT CAST(?1 AS TEXT)";

/// Renders an engine value as text; NULL stays `None`.
///
/// Reals go through the engine so `2.0` reads back as `2.0`, exactly as
/// `CAST(col AS TEXT)` would show it.
fn format_value(conn: &Connection, value: ValueRef) -> rusqlite::Result<Option<String>> {
    let text = match value {
        ValueRef::Null => return Ok(None),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => conn.query_row(REAL_AS_TEXT_SQL, [f], |row| row.get::<_, String>(0))?,
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    };
    Ok(Some(text))
}
