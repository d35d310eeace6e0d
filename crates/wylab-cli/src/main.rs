//! Command-line client for a remote compile service.
//!
//! Provides the `wylab` binary. `compile` submits a source file (or the
//! document saved by the previous run) to the service, renders the result
//! onto the source, and optionally runs the generated program. `session`
//! prints the saved session.
//!
//! Configuration comes from `WYLAB_*` environment variables; `--server` and
//! `--db` override them.

mod render;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wylab_client::{ClientConfig, NodeSink, SessionDriver};
use wylab_session::{BufferWidget, FailureKind, RunOutcome, SessionStatus};
use wylab_storage::{SessionStore, SqliteStore};

/// Compile-session client for a remote compiler service.
#[derive(Parser)]
#[command(name = "wylab", about = "Compile-session client for a remote compiler service")]
struct Cli {
    /// Compiler service base URL (overrides WYLAB_SERVER_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Session database path, or ":memory:" (overrides WYLAB_DB_PATH).
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a source file, or the saved session when no file is given.
    Compile {
        /// Source file to submit.
        file: Option<PathBuf>,

        /// Enable verification.
        #[arg(long, conflicts_with = "no_verify")]
        verify: bool,

        /// Disable verification (default: as in the saved session).
        #[arg(long)]
        no_verify: bool,

        /// Search for counterexamples when verification fails.
        #[arg(long)]
        counterexamples: bool,

        /// Run the generated program after a successful compile.
        #[arg(long)]
        run: bool,
    },
    /// Print the saved session.
    Session,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let exit_code = match cli.command {
        Commands::Compile {
            file,
            verify,
            no_verify,
            counterexamples,
            run,
        } => {
            let verify = match (verify, no_verify) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            run_compile(&config, file, verify, counterexamples, run).await
        }
        Commands::Session => run_session(&config),
    };
    process::exit(exit_code);
}

/// Opens the session store. A store that cannot be opened degrades to no
/// persistence rather than failing the command.
fn open_store(config: &ClientConfig) -> SessionStore<SqliteStore> {
    let opened = if config.uses_in_memory_store() {
        SqliteStore::in_memory()
    } else {
        SqliteStore::new(&config.db_path)
    };
    match opened {
        Ok(store) => SessionStore::new(store),
        Err(err) => {
            tracing::warn!(path = %config.db_path, error = %err, "session storage unavailable");
            SessionStore::unavailable()
        }
    }
}

/// Execute the compile subcommand.
///
/// Returns exit code: 0 = success, 1 = compile errors, 2 = server exception
/// or unusable response, 3 = I/O, transport or execution failure.
async fn run_compile(
    config: &ClientConfig,
    file: Option<PathBuf>,
    verify: Option<bool>,
    counterexamples: bool,
    run: bool,
) -> i32 {
    let mut driver = match SessionDriver::connect(
        config,
        BufferWidget::new(),
        open_store(config),
        NodeSink::new(config.node_program.clone()),
    ) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };

    if let Some(path) = file {
        match std::fs::read_to_string(&path) {
            Ok(text) => driver.controller_mut().edit(&text),
            Err(e) => {
                eprintln!("Error: failed to read '{}': {}", path.display(), e);
                return 3;
            }
        }
    }

    let mut flags = driver.controller().flags();
    if let Some(verify) = verify {
        flags.verify = verify;
    }
    flags.counterexamples = counterexamples;

    let status = match driver.compile(flags).await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };

    let controller = driver.controller();
    print!("{}", render::Report::new(controller.widget(), controller.log()));

    match status {
        SessionStatus::Succeeded if run => match driver.controller_mut().run() {
            Ok(RunOutcome::Executed) => 0,
            Ok(RunOutcome::Disarmed) => {
                eprintln!("Error: nothing to run");
                3
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                3
            }
        },
        SessionStatus::Succeeded => 0,
        SessionStatus::Failed(FailureKind::CompileErrors) => 1,
        SessionStatus::Failed(FailureKind::ServerException | FailureKind::Protocol) => 2,
        SessionStatus::Idle | SessionStatus::Pending(_) => 3,
    }
}

/// Execute the session subcommand.
fn run_session(config: &ClientConfig) -> i32 {
    match open_store(config).load() {
        Some(state) => {
            let json = serde_json::to_string_pretty(&state).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize session: {}\"}}", e)
            });
            println!("{}", json);
            0
        }
        None => {
            eprintln!("No saved session.");
            0
        }
    }
}
