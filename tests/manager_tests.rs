//! End-to-end tests for the connector and database manager against
//! file-backed databases in a temporary data directory.

#[cfg(test)]
mod manager_tests {
    use dbman::{Connector, DatabaseManager, DbmanError};
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tracing::Level;

    /// In-memory log sink shared with a scoped tracing subscriber
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        /// SQL text of every `Executing query:` debug line, in order
        fn queries(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter_map(|line| line.split_once("Executing query: "))
                .map(|(_, sql)| sql.to_string())
                .collect()
        }
    }

    const SCHEMA: &str = "
        CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL,
            notes TEXT
        );
    ";

    /// Creates a data directory with a `shop` database holding the test schema
    fn setup() -> (TempDir, Connector) {
        let dir = TempDir::new().unwrap();
        let server = dir.path().to_str().unwrap();
        let connector = Connector::make_with_auth(server, "shop", "app", "secret").unwrap();
        connector.get_connection().execute_batch(SCHEMA).unwrap();
        (dir, connector)
    }

    #[test]
    fn test_insert_then_select_round_trip() {
        let (_dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        manager
            .insert(
                "products",
                &["id", "name", "price"],
                &[vec!["10", "Lamp", "19.5"]],
            )
            .unwrap();

        let rows = manager.select_all_with_condition("products", "id = 10");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("id"), Some("10"));
        assert_eq!(row.get("name"), Some("Lamp"));
        assert_eq!(row.get("price"), Some("19.5"));
        assert!(row.is_null("notes"));
    }

    #[test]
    fn test_real_values_round_trip_as_stored_text() {
        let (_dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        manager
            .insert("products", &["id", "name", "price"], &[vec!["1", "Pen", "2.0"]])
            .unwrap();

        let rows = manager.select_all_with_condition("products", "id = 1");
        assert_eq!(rows[0].get("price"), Some("2.0"));

        let cast = manager.send_query("SELECT CAST(price AS TEXT) AS price FROM products");
        assert_eq!(rows[0].get("price"), cast[0].get("price"));
    }

    #[test]
    fn test_select_all_without_condition_issues_bare_select() {
        let (_dir, mut connector) = setup();
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let manager = DatabaseManager::new(&mut connector);
            manager.select_all_without_condition("products");
            manager.select_all_with_condition("products", "id = 3");
        });

        assert_eq!(
            log.queries(),
            vec![
                "SELECT * FROM products".to_string(),
                "SELECT * FROM products WHERE id = 3".to_string(),
            ]
        );
    }

    #[test]
    fn test_rows_come_back_in_scan_order() {
        let (_dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        manager
            .insert(
                "products",
                &["name"],
                &[vec!["first"], vec!["second"], vec!["third"]],
            )
            .unwrap();

        let names: Vec<String> = manager
            .select_without_condition(&["name"], "products")
            .iter()
            .filter_map(|row| row.get("name").map(String::from))
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_no_rows_and_failure_both_yield_empty() {
        let (_dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        assert!(manager.select_all_with_condition("products", "id = 999").is_empty());
        assert!(manager.last_error().is_none());

        assert!(manager.select_all_with_condition("products", "id = = 999").is_empty());
        assert!(manager.last_error().is_some());
    }

    #[test]
    fn test_send_non_query_reports_affected_rows() {
        let (_dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);
        manager
            .insert("products", &["name"], &[vec!["a"], vec!["b"], vec!["c"]])
            .unwrap();

        assert_eq!(manager.send_non_query("UPDATE products SET price = 1 WHERE id > 100"), 0);
        assert_eq!(manager.send_non_query("UPDATE products SET price = 1"), 3);
    }

    #[test]
    fn test_use_database_redirects_statements() {
        let (_dir, mut connector) = setup();
        let mut manager = DatabaseManager::new(&mut connector);
        manager.insert_whole("products", &["1", "Lamp", "10", "none"]).unwrap();

        manager.use_database("archive").unwrap();
        assert_eq!(manager.get_connector().database(), "archive");
        assert!(manager.select_all_without_condition("products").is_empty());
        assert!(manager.last_error().unwrap().contains("no such table"));

        manager.use_database("shop").unwrap();
        assert_eq!(manager.select_all_without_condition("products").len(), 1);
    }

    #[test]
    fn test_run_sql_script() {
        let (dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        let script = dir.path().join("seed.sql");
        fs::write(
            &script,
            "INSERT INTO products (name) VALUES ('a');\nINSERT INTO products (name) VALUES ('b');\n",
        )
        .unwrap();

        manager.run_sql_script(&script).unwrap();
        assert!(manager.last_error().is_none());
        assert_eq!(manager.select_all_without_condition("products").len(), 2);
    }

    #[test]
    fn test_script_batch_failure_is_absorbed() {
        let (dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        let script = dir.path().join("broken.sql");
        fs::write(
            &script,
            "INSERT INTO products (name) VALUES ('kept');\nINSERT INTO nowhere VALUES (1);\n",
        )
        .unwrap();

        manager.run_sql_script(&script).unwrap();
        assert!(manager.last_error().is_some());
        assert_eq!(manager.select_all_without_condition("products").len(), 1);

        assert!(matches!(
            manager.try_run_sql_script(&script),
            Err(DbmanError::Database(_))
        ));
    }

    #[test]
    fn test_unreadable_script_is_an_error() {
        let (dir, mut connector) = setup();
        let manager = DatabaseManager::new(&mut connector);

        let result = manager.run_sql_script(dir.path().join("missing.sql"));
        assert!(matches!(result, Err(DbmanError::Io(_))));
    }

    #[test]
    fn test_database_file_persists_across_connectors() {
        let (dir, mut connector) = setup();
        {
            let manager = DatabaseManager::new(&mut connector);
            manager.insert("products", &["name"], &[vec!["durable"]]).unwrap();
        }
        connector.close().unwrap();

        let mut reopened = Connector::make_no_auth(dir.path().to_str().unwrap(), "shop").unwrap();
        let manager = DatabaseManager::new(&mut reopened);
        let rows = manager.select_with_condition(&["name"], "products", "name = 'durable'");
        assert_eq!(rows.len(), 1);
    }
}
