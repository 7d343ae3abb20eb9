//! Tree mode: convert every Blueprint file under a root and write the
//! package index.
//!
//! Files are converted on blocking worker tasks. Each worker writes its own
//! output file and reports back over a channel to a single aggregator task,
//! which is the only owner of the index builder.

use crate::config::Config;
use crate::convert::transpile;
use crate::walker::find_blueprints;
use anyhow::{anyhow, Context, Result};
use bp2nix_codegen::{nix_file_path, PackageIndex, PackageIndexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Worker to aggregator messages
#[derive(Debug)]
pub enum IndexMessage {
    Converted { file: String, names: Vec<String> },
    Failed { file: String, error: String },
    /// All workers have finished
    Done,
}

/// Outcome of a tree conversion
#[derive(Debug)]
pub struct TreeReport {
    pub converted: usize,
    /// Files that failed, with their error
    pub failed: Vec<(String, String)>,
    /// Workers that panicked before reporting
    pub lost: usize,
    pub index: PackageIndex,
    pub index_path: PathBuf,
}

impl TreeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.lost == 0
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len() + self.lost
    }
}

struct Aggregate {
    index: PackageIndex,
    converted: usize,
    failed: Vec<(String, String)>,
}

/// Convert all Blueprint files under `root` into `config.output_dir`
pub async fn convert_tree(root: &Path, config: &Config) -> Result<TreeReport> {
    let output_dir = config.output_dir.clone();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let files = find_blueprints(root, &config.input_file_name, &config.exclude);
    info!(
        "Found {} {} files under {}",
        files.len(),
        config.input_file_name,
        root.display()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let builder = PackageIndexBuilder::new(config.duplicate_policy)
        .with_input_file_name(&config.input_file_name);
    let aggregator = tokio::spawn(aggregate(rx, builder));

    let root = Arc::new(root.to_path_buf());
    let config = Arc::new(config.clone());
    let mut workers = JoinSet::new();
    for file in files {
        let tx = tx.clone();
        let root = Arc::clone(&root);
        let config = Arc::clone(&config);
        workers.spawn_blocking(move || {
            let message = match convert_one(&root, &file, &config) {
                Ok(names) => IndexMessage::Converted { file, names },
                Err(err) => {
                    error!("{:#}", err);
                    IndexMessage::Failed {
                        file,
                        error: format!("{:#}", err),
                    }
                }
            };
            if tx.send(message).is_err() {
                warn!("Package index aggregator stopped early");
            }
        });
    }

    let mut lost = 0;
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            error!("Conversion worker failed: {}", err);
            lost += 1;
        }
    }

    tx.send(IndexMessage::Done)
        .map_err(|_| anyhow!("Package index aggregator stopped early"))?;
    let Aggregate {
        index,
        converted,
        failed,
    } = aggregator.await.context("Package index aggregator failed")?;

    let index_path = output_dir.join(&config.index_file);
    index
        .write_to(&index_path)
        .with_context(|| format!("Failed to write package index: {}", index_path.display()))?;

    info!(
        "Converted {} files ({} failed), indexed {} packages with {} name collisions",
        converted,
        failed.len() + lost,
        index.entries().len(),
        index.collisions().len()
    );

    Ok(TreeReport {
        converted,
        failed,
        lost,
        index,
        index_path,
    })
}

fn convert_one(root: &Path, file: &str, config: &Config) -> Result<Vec<String>> {
    debug!("Converting {}", file);
    let converted = transpile(&root.join(file), file, root, config)
        .with_context(|| format!("Failed to convert {}", file))?;

    let out = config
        .output_dir
        .join(nix_file_path(file, &config.input_file_name));
    fs::write(&out, &converted.output)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(converted.exports)
}

async fn aggregate(
    mut rx: mpsc::UnboundedReceiver<IndexMessage>,
    mut builder: PackageIndexBuilder,
) -> Aggregate {
    let mut converted = 0;
    let mut failed = Vec::new();

    while let Some(message) = rx.recv().await {
        match message {
            IndexMessage::Converted { file, names } => {
                converted += 1;
                builder.report(file, names);
            }
            IndexMessage::Failed { file, error } => {
                builder.fail(file.clone());
                failed.push((file, error));
            }
            IndexMessage::Done => break,
        }
    }

    failed.sort();
    Aggregate {
        index: builder.finalize(),
        converted,
        failed,
    }
}
