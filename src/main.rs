use dbman::config::{self, Config};
use dbman::{Connector, DatabaseManager, DbmanError, Result};
use std::path::PathBuf;
use std::process;
use tracing::info;

const USAGE: &str = "usage: dbman [--config <path>] <query <sql> | exec <sql> | script <path> | ping>";

/// A parsed command line
#[derive(Debug, PartialEq)]
enum Command {
    Query(String),
    Exec(String),
    Script(PathBuf),
    Ping,
}

fn parse_args(args: &[String]) -> Result<(Option<PathBuf>, Command)> {
    let usage = || DbmanError::Config(USAGE.to_string());

    let mut rest = args;
    let mut config_path = None;
    if rest.first().map(String::as_str) == Some("--config") {
        config_path = Some(PathBuf::from(rest.get(1).ok_or_else(usage)?));
        rest = &rest[2..];
    }

    let command = match rest {
        [cmd, sql] if cmd == "query" => Command::Query(sql.clone()),
        [cmd, sql] if cmd == "exec" => Command::Exec(sql.clone()),
        [cmd, path] if cmd == "script" => Command::Script(PathBuf::from(path)),
        [cmd] if cmd == "ping" => Command::Ping,
        _ => return Err(usage()),
    };
    Ok((config_path, command))
}

fn run(config: &Config, command: Command) -> Result<()> {
    let mut connector = Connector::open(config.connect_options())?;
    let manager = DatabaseManager::new(&mut connector);

    match command {
        Command::Query(sql) => {
            for record in manager.try_query(&sql)? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Exec(sql) => {
            println!("{}", manager.try_non_query(&sql)?);
        }
        Command::Script(path) => {
            manager.try_run_sql_script(&path)?;
            info!("Script {} completed", path.display());
        }
        Command::Ping => {
            manager.get_connector().ping()?;
            println!("ok");
        }
    }

    drop(manager);
    connector.close()
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let config = match config_path.or_else(config::default_config_path) {
        Some(path) => config::load_config(&path),
        None => Err(DbmanError::Config("no configuration file found".to_string())),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting dbman...");

    if let Err(e) = run(&config, command) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
