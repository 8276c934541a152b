/// Statement Text Module
///
/// Pure builders for the SQL text the database manager issues. Table names,
/// field names, conditions and `SET` values are interpolated verbatim and
/// must come from trusted code. Only `INSERT` values travel as bound
/// parameters.

/// Joins items with `", "` and wraps them in parentheses.
///
/// An empty input yields an empty string, not `"()"`.
pub fn array_to_query_string<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!("({})", join(items))
}

/// `INSERT INTO table (f1, f2) VALUES (?, ?)`, or without the field list when `fields` is empty
pub fn insert_statement<S: AsRef<str>>(table: &str, fields: &[S], value_count: usize) -> String {
    let placeholders = vec!["?"; value_count];
    let values = format!("({})", placeholders.join(", "));

    if fields.is_empty() {
        format!("INSERT INTO {} VALUES {}", table, values)
    } else {
        format!(
            "INSERT INTO {} {} VALUES {}",
            table,
            array_to_query_string(fields),
            values
        )
    }
}

/// `DELETE FROM table WHERE condition`
pub fn delete_statement(table: &str, condition: &str) -> String {
    format!("DELETE FROM {} WHERE {}", table, condition)
}

/// `UPDATE table SET k1=v1, k2=v2 WHERE condition`
///
/// Values are written as-is: quote string literals yourself.
pub fn update_statement<K, V>(table: &str, values: &[(K, V)], condition: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let assignments: Vec<String> = values
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), value.as_ref()))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        assignments.join(", "),
        condition
    )
}

/// `SELECT f1, f2 FROM table [WHERE condition]`; `None` fields select `*`
pub fn select_statement<S: AsRef<str>>(
    fields: Option<&[S]>,
    table: &str,
    condition: Option<&str>,
) -> String {
    let columns = match fields {
        Some(fields) => join(fields),
        None => "*".to_string(),
    };

    match condition {
        Some(condition) => format!("SELECT {} FROM {} WHERE {}", columns, table, condition),
        None => format!("SELECT {} FROM {}", columns, table),
    }
}

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}
