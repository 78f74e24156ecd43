//! flatdb - interactive shell
//!
//! Usage: `flatdb-cli [--data-dir DIR | --config FILE]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use flatdb::config::Config;
use flatdb::database::Database;
use flatdb::executor::QueryResult;
use flatdb::sql::Operation;

/// Print welcome banner
fn print_banner(db: &Database) {
    println!("flatdb - a flat-file relational store");
    println!("Storage root: {}", db.root().display());
    println!("Type '.help' for help, '.quit' to exit");
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit the shell
  .tables            List all tables
  .schema [table]    Show table schema
  .begin             Start a transaction; statements are queued
  .commit            Run the queued statements
  .rollback          Discard the queued statements

SQL Commands:
  CREATE TABLE ...   Create a new table
  INSERT INTO ...    Insert rows
  SELECT ...         Query data
  UPDATE ...         Update rows
  DELETE FROM ...    Delete rows

Examples:
  CREATE TABLE users (id, name) WITH TYPES (int64, string)
  INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob')
  SELECT * FROM users WHERE id > 1 ORDER BY name
"#
    );
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Vec<String>]) -> String {
    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    let mut output = String::new();

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<width$} ", v, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }
    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));
    output
}

fn print_result(result: &QueryResult) {
    if let Some(msg) = &result.message {
        println!("{}", msg);
    } else if !result.columns.is_empty() {
        print!("{}", format_results(&result.columns, &result.rows));
    }
}

/// Shell state: the open transaction, if any
struct Shell {
    db: Database,
    transaction: Option<u64>,
}

impl Shell {
    fn execute_sql(&mut self, sql: &str) {
        let is_select = sql
            .split_whitespace()
            .next()
            .and_then(Operation::from_keyword)
            .map_or(false, |op| op.is_read_only());

        if is_select {
            match self.db.query(sql) {
                Ok(result) => print_result(&result),
                Err(e) => eprintln!("Error: {}", e),
            }
            return;
        }

        match self.transaction {
            Some(trans_id) => match self.db.exec(trans_id, sql) {
                Ok(()) => println!("Queued in transaction {}", trans_id),
                Err(e) => eprintln!("Error: {}", e),
            },
            None => match self.db.execute(sql) {
                Ok(result) => print_result(&result),
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    /// Handle special dot commands. Returns false when the shell should exit.
    fn handle_special_command(&mut self, cmd: &str) -> bool {
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        match parts.first().copied() {
            Some(".help") => print_help(),
            Some(".quit") | Some(".exit") => {
                if let Some(trans_id) = self.transaction.take() {
                    if self.db.rollback(trans_id).is_ok() {
                        println!("Transaction {} rolled back", trans_id);
                    }
                }
                return false;
            }
            Some(".tables") => match self.db.list_tables() {
                Ok(tables) if tables.is_empty() => println!("No tables found."),
                Ok(tables) => {
                    println!("Tables:");
                    for table in tables {
                        println!("  {}", table);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            Some(".schema") => {
                let tables = match parts.get(1) {
                    Some(table) => Ok(vec![table.to_string()]),
                    None => self.db.list_tables(),
                };
                match tables {
                    Ok(tables) => {
                        for table in tables {
                            match self.db.schema(&table) {
                                Ok(schema) => {
                                    println!("Table: {}", table);
                                    for (column, ty) in schema.columns().iter().zip(schema.types())
                                    {
                                        println!("  {} {}", column, ty);
                                    }
                                }
                                Err(e) => eprintln!("Error: {}", e),
                            }
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Some(".begin") => match self.transaction {
                Some(trans_id) => eprintln!("Transaction {} is already open", trans_id),
                None => match self.db.try_begin() {
                    Ok(trans_id) => {
                        self.transaction = Some(trans_id);
                        println!("Transaction {} started", trans_id);
                    }
                    Err(e) => eprintln!("Error: {}", e),
                },
            },
            Some(".commit") => match self.transaction.take() {
                Some(trans_id) => match self.db.commit(trans_id) {
                    Ok(results) => {
                        for result in &results {
                            print_result(result);
                        }
                        println!("Transaction {} committed", trans_id);
                    }
                    Err(e) => eprintln!("Transaction {} rolled back: {}", trans_id, e),
                },
                None => eprintln!("No open transaction"),
            },
            Some(".rollback") => match self.transaction.take() {
                Some(trans_id) => match self.db.rollback(trans_id) {
                    Ok(()) => println!("Transaction {} rolled back", trans_id),
                    Err(e) => eprintln!("Error: {}", e),
                },
                None => eprintln!("No open transaction"),
            },
            Some(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Type '.help' for available commands.");
            }
            None => {}
        }
        true
    }
}

/// Main REPL loop
fn run_repl(db: Database) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    let mut shell = Shell {
        db,
        transaction: None,
    };

    print_banner(&shell.db);

    loop {
        let prompt = match shell.transaction {
            Some(trans_id) => format!("flatdb({})> ", trans_id),
            None => "flatdb> ".to_string(),
        };

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if line.starts_with('.') {
                    if !shell.handle_special_command(line) {
                        break;
                    }
                } else {
                    shell.execute_sql(line);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        }
    }

    if let Some(trans_id) = shell.transaction.take() {
        shell.db.rollback(trans_id)?;
    }
    println!("Goodbye!");
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flatdb=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn storage_root() -> Result<PathBuf> {
    let mut args = std::env::args().skip(1);
    let mut root = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = args.next().context("--data-dir needs a directory")?;
                root = Some(PathBuf::from(dir));
            }
            "--config" => {
                let file = args.next().context("--config needs a file")?;
                let config = Config::load(&file)
                    .with_context(|| format!("failed to read config '{}'", file))?;
                root = Some(config.database_root());
            }
            other => bail!("unknown argument '{}'", other),
        }
    }
    Ok(root.unwrap_or_else(|| Config::default().database_root()))
}

fn main() -> Result<()> {
    init_logging();

    let root = storage_root()?;
    let db = Database::open(&root)
        .with_context(|| format!("failed to open database at '{}'", root.display()))?;
    run_repl(db)
}
