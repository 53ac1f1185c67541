//! `fcspec`: compile Python API packages into function-calling schemas.
//!
//! ```bash
//! # every package under ./APIs, `generic_reminders` last
//! fcspec all --src ./APIs --out ./Schemas --defer generic_reminders
//!
//! # a single package
//! fcspec package ./APIs/crm --out ./Schemas
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fcspec::{BatchOptions, Config, DocMode, PackageOptions};

#[derive(Parser, Debug)]
#[command(name = "fcspec", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a single package directory.
    Package {
        /// Package directory containing `__init__.py`
        dir: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./Schemas")]
        out: PathBuf,

        /// Directory dotted locations resolve against [default: the package's parent]
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// raw_docstring, concise or medium_detail
        #[arg(long, default_value_t = DocMode::RawDocstring)]
        doc_mode: DocMode,
    },

    /// Compile every package under a source directory.
    All {
        /// Directory holding one sub-directory per package
        #[arg(long, default_value = "./APIs")]
        src: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./Schemas")]
        out: PathBuf,

        /// Package compiled last, on its own
        #[arg(long)]
        defer: Option<String>,

        /// Only compile these packages
        #[arg(long, num_args = 1)]
        only: Vec<String>,

        /// JSON file selecting doc modes per package
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum packages compiled at once [default: available parallelism]
        #[arg(long)]
        jobs: Option<usize>,
    },
}

/// Initialize tracing. `RUST_LOG` wins; otherwise `FCSPEC_LOG` picks the level.
/// `LOG_FORMAT=json` switches to JSON lines. Everything goes to stderr.
fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match std::env::var("FCSPEC_LOG").as_deref() {
            Ok("debug") => "debug",
            Ok("trace") => "trace",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("fcspec={level}"))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every requested package compiled.
async fn run(command: Command) -> Result<bool> {
    match command {
        Command::Package {
            dir,
            out,
            source_root,
            doc_mode,
        } => {
            let options = PackageOptions {
                doc_mode,
                source_root,
                output_file_name: None,
            };
            let written = tokio::task::spawn_blocking(move || {
                fcspec::generate_package(&dir, &out, &options)
            })
            .await
            .context("package task panicked")??;

            for path in &written {
                println!("{}", path.display());
            }
            Ok(true)
        }
        Command::All {
            src,
            out,
            defer,
            only,
            config,
            jobs,
        } => {
            let config = match config {
                Some(path) => Config::load(&path)?,
                None => Config::default(),
            };
            let defaults = BatchOptions::default();
            let options = BatchOptions {
                source_dir: src,
                output_dir: out,
                deferred: defer,
                only,
                jobs: jobs.unwrap_or(defaults.jobs),
                config,
            };

            let report = fcspec::compile_all(options).await?;
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(files) if files.is_empty() => {
                        println!("{:<32} no schemas", outcome.package)
                    }
                    Ok(files) => println!("{:<32} ok ({} files)", outcome.package, files.len()),
                    Err(e) => println!("{:<32} FAILED: {e}", outcome.package),
                }
            }

            let failed = report.failures().count();
            if failed > 0 {
                tracing::error!(failed, total = report.outcomes.len(), "some packages failed");
            }
            Ok(report.is_success())
        }
    }
}
