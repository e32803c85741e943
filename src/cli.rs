use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::AppConfig;
use crate::import::{dto::WrittenUser, CsvSource, ImportReport};
use crate::report::{self, HashDisplay};
use crate::state::AppState;
use crate::storage::ConflictSupport;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Load student credentials from CSV into SQLite and check logins")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import users from the CSV at STUDENTS_CSV into STUDENTS_DB
    ///
    /// Existing usernames are updated in place; rows with an empty
    /// username, email or temp_password are skipped.
    Load,
    /// Check a username/password pair against the stored hash
    Login {
        /// Username to check; prompted for when omitted
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Print every stored user
    Show {
        /// Print full password hashes instead of the redacted prefix
        #[arg(long)]
        show_hashes: bool,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

impl Cli {
    pub async fn run(self, config: AppConfig) -> Result<()> {
        match self.command {
            Commands::Load => load(config).await,
            Commands::Login { username } => login(config, username).await,
            Commands::Show {
                show_hashes,
                format,
            } => {
                let hashes = if show_hashes {
                    HashDisplay::Full
                } else {
                    HashDisplay::Redacted
                };
                show(config, hashes, format).await
            }
        }
    }
}

async fn load(config: AppConfig) -> Result<()> {
    // header problems abort before the database is opened
    let source = CsvSource::open(&config.csv_path)?;
    let state = AppState::init(config).await?;
    if state.store.conflict_support() == ConflictSupport::ReplaceOnly {
        eprintln!("WARNING: SQLite is older than 3.24; re-imported users will not keep their id");
    }

    let report = state.importer().load(source).await;
    print_report(&report, &state.config);

    state.close().await;
    Ok(())
}

fn print_report(report: &ImportReport, config: &AppConfig) {
    for written in &report.written {
        println!("{}", written_line(written));
    }
    let degraded = report.ids_not_preserved();
    if degraded > 0 {
        eprintln!(
            "WARNING: this SQLite cannot update in place; {} re-imported user(s) got a new id",
            degraded
        );
    }
    for skipped in &report.skipped {
        match &skipped.username {
            Some(name) => eprintln!("Skipping line {} ({}): {}", skipped.line, name, skipped.reason),
            None => eprintln!("Skipping line {}: {}", skipped.line, skipped.reason),
        }
    }
    println!(
        "Done. Inserted/updated {} users into {}. Bcrypt rounds={}.",
        report.written_count(),
        config.database_path.display(),
        config.bcrypt_cost
    );
}

fn written_line(written: &WrittenUser) -> String {
    format!(
        "Added/updated: {} (line {}, id {})",
        written.username, written.line, written.id
    )
}

async fn login(config: AppConfig, username: Option<String>) -> Result<()> {
    println!("=== Login Demo ===");
    let username = match username {
        Some(u) => u,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password("Password (input hidden): ")
        .context("read password")?;

    let state = AppState::init(config).await?;
    let result = state.authenticator().login(&username, &password).await;
    drop(password);
    state.close().await;

    if result? {
        println!("Login successful!");
    } else {
        println!("Invalid username or password.");
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("read username")?;
    Ok(line.trim().to_string())
}

async fn show(config: AppConfig, hashes: HashDisplay, format: Format) -> Result<()> {
    let state = AppState::init(config).await?;
    let users = report::list_users(state.store.as_ref()).await;
    state.close().await;
    let users = users?;

    match format {
        Format::Table => print!("{}", report::render_table(&users, hashes)),
        Format::Json => println!("{}", report::render_json(&users, hashes)?),
    }
    Ok(())
}
