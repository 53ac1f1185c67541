//! Compile every package under a source directory.
//!
//! Packages run concurrently on the blocking pool, bounded by a semaphore.
//! One package may be deferred: it starts only after every other package has
//! finished, and runs alone. A failing or panicking package is reported in
//! the [`BatchReport`] without affecting its siblings.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::package::{PackageOptions, generate_package, is_ignored_dir};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Package compiled last, after all others, on its own.
    pub deferred: Option<String>,
    /// Restrict the run to these packages (all when empty).
    pub only: Vec<String>,
    /// Maximum number of packages compiled at once.
    pub jobs: usize,
    pub config: Config,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./APIs"),
            output_dir: PathBuf::from("./Schemas"),
            deferred: None,
            only: Vec::new(),
            jobs: std::thread::available_parallelism().map_or(1, |n| n.get()),
            config: Config::default(),
        }
    }
}

#[derive(Debug)]
pub struct PackageOutcome {
    pub package: String,
    /// Files written, or the reason the package failed.
    pub result: std::result::Result<Vec<PathBuf>, String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<PackageOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &PackageOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Package directory names under `source_dir`, sorted.
pub fn discover_packages(source_dir: &Path) -> Result<Vec<String>> {
    let mut packages: Vec<String> = fs::read_dir(source_dir)
        .map_err(|e| SchemaError::io(source_dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir() && !is_ignored_dir(path))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    packages.sort();
    Ok(packages)
}

fn spawn_package(
    options: &Arc<BatchOptions>,
    package: String,
    permit: Option<tokio::sync::OwnedSemaphorePermit>,
) -> JoinHandle<PackageOutcome> {
    let options = Arc::clone(options);
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let package_options = PackageOptions {
            doc_mode: options.config.doc_mode_for(&package),
            source_root: Some(options.source_dir.clone()),
            output_file_name: None,
        };
        tracing::info!(%package, doc_mode = %package_options.doc_mode, "generating package");

        let result = generate_package(
            &options.source_dir.join(&package),
            &options.output_dir,
            &package_options,
        )
        .map_err(|e| e.to_string());
        if let Err(e) = &result {
            tracing::error!(%package, error = %e, "package failed");
        }
        PackageOutcome { package, result }
    })
}

async fn join_outcome(package: String, handle: JoinHandle<PackageOutcome>) -> PackageOutcome {
    handle.await.unwrap_or_else(|e| {
        tracing::error!(%package, error = %e, "package task panicked");
        PackageOutcome {
            package,
            result: Err(format!("Task panicked: {e}")),
        }
    })
}

/// Compile all packages, then the deferred one.
pub async fn compile_all(options: BatchOptions) -> Result<BatchReport> {
    let packages = discover_packages(&options.source_dir)?;
    fs::create_dir_all(&options.output_dir).map_err(|e| SchemaError::io(&options.output_dir, e))?;

    if let Some(deferred) = &options.deferred
        && !packages.contains(deferred)
    {
        tracing::warn!(package = %deferred, "deferred package not found");
    }

    let selected: Vec<String> = packages
        .into_iter()
        .filter(|p| options.only.is_empty() || options.only.contains(p))
        .collect();
    let (deferred, parallel): (Vec<String>, Vec<String>) = selected
        .into_iter()
        .partition(|p| options.deferred.as_deref() == Some(p.as_str()));

    let options = Arc::new(options);
    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    tracing::info!(packages = parallel.len(), jobs = options.jobs.max(1), "compiling packages");

    let mut handles = Vec::with_capacity(parallel.len());
    for package in parallel {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SchemaError::Other(format!("worker pool closed: {e}")))?;
        let handle = spawn_package(&options, package.clone(), Some(permit));
        handles.push((package, handle));
    }

    let mut report = BatchReport::default();
    for (package, handle) in handles {
        report.outcomes.push(join_outcome(package, handle).await);
    }

    for package in deferred {
        tracing::info!(%package, "compiling deferred package");
        let handle = spawn_package(&options, package.clone(), None);
        report.outcomes.push(join_outcome(package, handle).await);
    }

    Ok(report)
}
