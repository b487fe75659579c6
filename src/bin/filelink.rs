//! filelink CLI — attach form uploads to database records.
//!
//! Usage:
//!   filelink init [--db path]
//!   filelink attach --config finisher.yaml --form form.yaml --values values.json [--inserted-uid STAGE=UID]... [--db path]
//!   filelink list --table name --uid N [--db path]

use clap::{Parser, Subcommand};
use filelink::{
    AttachFilesToRecord, Finisher, FinisherContext, FormDefinition, FormValues, OpenStore,
    SqliteStore, StageResults,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "filelink",
    version,
    about = "Attach form uploads to database records"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and the file reference table
    Init,
    /// Run the AttachFilesToRecord finisher for one submission
    Attach {
        /// YAML finisher definition (form finishers list or bare options)
        #[arg(long)]
        config: PathBuf,
        /// YAML form definition mapping element identifiers to types
        #[arg(long)]
        form: PathBuf,
        /// JSON object of submitted element values
        #[arg(long)]
        values: PathBuf,
        /// Uid inserted by an earlier stage, as STAGE=UID (repeatable, in order)
        #[arg(long = "inserted-uid", value_name = "STAGE=UID")]
        inserted_uids: Vec<String>,
    },
    /// List file references of one record
    List {
        /// Owning record table
        #[arg(long)]
        table: String,
        /// Owning record uid
        #[arg(long)]
        uid: i64,
    },
}

/// Get the default database path (~/.local/share/filelink/filelink.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("filelink").join("filelink.db")
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "filelink=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init(db: Option<PathBuf>) -> Result<(), String> {
    open_store(db)?;
    println!("Database ready");
    Ok(())
}

fn cmd_attach(
    db: Option<PathBuf>,
    config: &PathBuf,
    form: &PathBuf,
    values: &PathBuf,
    inserted_uids: &[String],
) -> Result<(), String> {
    let form = FormDefinition::load(form)
        .map_err(|e| format!("cannot load '{}': {}", form.display(), e))?;
    let values = FormValues::load(values)
        .map_err(|e| format!("cannot load '{}': {}", values.display(), e))?;

    let mut stages = StageResults::new();
    for assignment in inserted_uids {
        stages.record_assignment(assignment)?;
    }

    let finisher = AttachFilesToRecord::from_config(config, &stages)
        .map_err(|e| format!("cannot load '{}': {}", config.display(), e))?;
    let store = open_store(db)?;
    finisher
        .execute(&FinisherContext::new(&form, &values), &store)
        .map_err(|e| format!("{} failed: {}", finisher.identifier(), e))?;

    let resolved = finisher.options();
    if resolved.is_applicable() {
        let count = store
            .load_file_references(&resolved.table, resolved.record_uid)
            .map_err(|e| e.to_string())?
            .len();
        println!(
            "Record {}:{} has {} file reference(s)",
            resolved.table, resolved.record_uid, count
        );
    } else {
        println!("Nothing to attach: no target record");
    }
    Ok(())
}

fn cmd_list(db: Option<PathBuf>, table: &str, uid: i64) -> Result<(), String> {
    let store = open_store(db)?;
    let links = store
        .load_file_references(table, uid)
        .map_err(|e| e.to_string())?;
    if links.is_empty() {
        println!("No file references for {}:{}", table, uid);
        return Ok(());
    }
    println!("{:<24}  {:>7}  {:>10}  {:>6}", "FIELD", "RANK", "FILE", "PID");
    println!("{}", "-".repeat(53));
    for link in links {
        println!(
            "{:<24}  {:>7}  {:>10}  {:>6}",
            link.target_field, link.rank, link.source_identifier, link.location_id
        );
    }
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Init => cmd_init(cli.db),
        Commands::Attach {
            config,
            form,
            values,
            inserted_uids,
        } => cmd_attach(cli.db, &config, &form, &values, &inserted_uids),
        Commands::List { table, uid } => cmd_list(cli.db, &table, uid),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
