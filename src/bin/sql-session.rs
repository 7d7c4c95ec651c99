use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use sql_session::prelude::*;
use sql_session::types::ConnectMode;

const CLI_SECTION: &str = "cli";

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one SQL query and print the shaped result as JSON")]
struct Args {
    /// SQLite database path; `:memory:` for a throwaway database.
    #[arg(long, default_value = ":memory:")]
    database: String,
    /// JSON file of connection sections; overrides --database.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = CLI_SECTION)]
    section: String,
    #[arg(long, value_enum, default_value = "raw")]
    mode: ResultMode,
    #[arg(long, value_enum, default_value = "upper")]
    case: KeyCase,
    #[arg(long, value_enum, default_value = "plain")]
    connect_mode: ConnectMode,
    /// Column to key rows by in all-rows-assoc mode.
    #[arg(long)]
    index_field: Option<String>,
    /// Statements run after connecting, separated by `;`.
    #[arg(long)]
    connect_sql: Option<String>,
    #[arg(long)]
    compact: bool,
    #[arg(short, long)]
    verbose: bool,
    sql: String,
}

fn flag_config(args: &Args) -> HashMap<String, HashMap<String, String>> {
    let case = match args.case {
        KeyCase::Upper => "upper",
        KeyCase::Lower => "lower",
    };
    let connect_mode = match args.connect_mode {
        ConnectMode::Plain => "plain",
        ConnectMode::Cached => "cached",
        ConnectMode::Persistent => "persistent",
    };
    let mut section = HashMap::from([
        ("connection".to_string(), args.database.clone()),
        ("caseQuery".to_string(), case.to_string()),
        ("connectMode".to_string(), connect_mode.to_string()),
    ]);
    if let Some(sql) = &args.connect_sql {
        section.insert("connectSQL".to_string(), sql.clone());
    }
    HashMap::from([(args.section.clone(), section)])
}

fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let builder = Connection::builder(SqliteConnector::new());
    let mut conn = match &args.config {
        Some(path) => builder
            .config(JsonConfig::from_str(&std::fs::read_to_string(path)?)?)
            .build(),
        None => builder.config(flag_config(args)).build(),
    };
    conn.connect(&args.section, false)?;

    let mut options = QueryOptions::default();
    if let Some(field) = &args.index_field {
        options = options.with_index_field(field);
    }
    let result = conn
        .query_with(args.mode, &args.sql, &options)?
        .unwrap_or(QueryResult::NoRows);
    tracing::info!(
        rows = conn.last_total_rows(),
        columns = ?conn.last_column_names(),
        "query complete"
    );
    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    conn.disconnect()?;
    Ok(json)
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("sql-session: {err}");
            ExitCode::FAILURE
        }
    }
}
