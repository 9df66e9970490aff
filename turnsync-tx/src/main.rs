//! turnsync-tx - Turn transfer and maintenance CLI
//!
//! Moves tutoring turn records between the line-delimited interchange
//! format, the document store, and the turn/resource REST API:
//!
//! - `import`: interchange file -> turn-ingest endpoint
//! - `export`: document store -> interchange file
//! - `relabel`: rewrite every turn's location/class in an interchange file
//! - `seed`: upsert classes/lessons/students from a seed file
//! - `post`: post a single turn from a JSON file
//! - `summary`: per student+lesson turn counts from the document store

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use turnsync_common::model::Turn;
use turnsync_common::rewrite::Relabel;
use turnsync_tx::api_client::{ApiClient, RetryPolicy};
use turnsync_tx::{pipeline, seed, store};

#[derive(Parser)]
#[command(
    name = "turnsync-tx",
    version,
    about = "Move tutoring turn records between file, document store, and API"
)]
struct Cli {
    /// Per-record progress output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand that writes to the REST API
#[derive(Args)]
struct ApiArgs {
    /// Base URL of the resource API, e.g. http://localhost:62702/api
    #[arg(long, env = "TURNSYNC_API_BASE")]
    api_base: String,

    /// Attempts per destination write before giving up
    #[arg(long, default_value_t = 3)]
    retry_attempts: u32,

    /// Initial backoff between attempts, in milliseconds (doubles per
    /// attempt, capped at 2s)
    #[arg(long, default_value_t = 250)]
    retry_backoff_ms: u64,
}

impl ApiArgs {
    fn client(&self) -> Result<ApiClient> {
        let retry = RetryPolicy {
            max_attempts: self.retry_attempts,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            ..RetryPolicy::default()
        };
        Ok(ApiClient::new(self.api_base.clone(), retry)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Read an interchange file and post every turn to the API
    Import {
        /// Interchange file to read
        file: PathBuf,

        #[command(flatten)]
        api: ApiArgs,

        /// Relabel turns to this location before posting
        #[arg(long, requires = "class")]
        location: Option<String>,

        /// Relabel turns to this class before posting
        #[arg(long, requires = "location")]
        class: Option<String>,
    },

    /// Write every stored turn to an interchange file
    Export {
        /// Interchange file to write
        file: PathBuf,

        /// Path of the document store database
        #[arg(long, env = "TURNSYNC_STORE")]
        store: PathBuf,
    },

    /// Rewrite the location and class of every turn in an interchange file
    Relabel {
        /// New location id
        location: String,

        /// New class id
        class: String,

        /// Interchange file to read
        input: PathBuf,

        /// Interchange file to write
        output: PathBuf,
    },

    /// Upsert classes, lessons, and students from a seed file
    Seed {
        /// TOML seed file
        seed_file: PathBuf,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Post a single turn from a JSON file
    Post {
        /// File holding one turn as a JSON object
        file: PathBuf,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// List (lesson, student, turn count) for the whole document store
    Summary {
        /// Path of the document store database
        #[arg(long, env = "TURNSYNC_STORE")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verbosity is plain configuration: it picks the subscriber filter
    // once at startup
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    info!("Starting turnsync-tx v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Import {
            file,
            api,
            location,
            class,
        } => {
            let client = api.client()?;
            let relabel = match (location, class) {
                (Some(location), Some(class)) => Some(Relabel::new(location, class)),
                _ => None,
            };
            let report = pipeline::import_file(&file, relabel.as_ref(), &client).await?;
            info!(read = report.read, written = report.written, "import complete");
        }

        Command::Export { file, store: path } => {
            let pool = store::connect_readonly(&path).await?;
            let report = pipeline::export_store(&pool, &file).await?;
            pool.close().await;
            info!(written = report.written, "export complete");
        }

        Command::Relabel {
            location,
            class,
            input,
            output,
        } => {
            let relabel = Relabel::new(location, class);
            let report = pipeline::relabel_file(&input, &output, &relabel)?;
            info!(written = report.written, "relabel complete");
        }

        Command::Seed { seed_file, api } => {
            let client = api.client()?;
            let data = seed::load_seed_file(&seed_file)?;
            let report = seed::run_seed(&client, &data).await?;
            info!(
                students = report.students,
                lessons = report.lessons,
                classes = report.classes,
                "seed complete"
            );
        }

        Command::Post { file, api } => {
            let client = api.client()?;
            let contents = std::fs::read_to_string(&file)?;
            let turn: Turn = serde_json::from_str(&contents).map_err(|e| {
                turnsync_common::Error::Validation(format!("{}: {}", file.display(), e))
            })?;
            client.post_turn(&turn).await?;
            info!(turn = %turn.log_label(), "posted turn");
        }

        Command::Summary { store: path } => {
            let pool = store::connect_readonly(&path).await?;
            let rows = store::turn_summary(&pool).await?;
            pool.close().await;
            for row in &rows {
                println!("{}\t{}\t{}", row.lesson_id, row.user_id, row.turn_count);
            }
        }
    }

    Ok(())
}
