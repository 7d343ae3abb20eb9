use anyhow::{bail, Result};
use bp2nix::{convert_file, convert_tree, dump_ast, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "bp2nix")]
#[command(about = "Convert Android.bp (Blueprint) files to Nix expressions", long_about = None)]
#[command(version)]
struct Cli {
    /// Blueprint files to convert in place, or directories to convert as a tree
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Configuration file (defaults to ./bp2nix.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for tree conversions
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the evaluated syntax tree of each file as JSON instead of converting
    #[arg(long)]
    dump_ast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let mut failures = 0;
    for path in &cli.paths {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                error!("{}: {}", path.display(), err);
                failures += 1;
                continue;
            }
        };

        if metadata.is_dir() {
            let report = convert_tree(path, &config).await?;
            info!("Wrote {}", report.index_path.display());
            failures += report.failure_count();
        } else if cli.dump_ast {
            match dump_ast(path) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    error!("{:#}", err);
                    failures += 1;
                }
            }
        } else if let Err(err) = convert_file(path, &config) {
            error!("{:#}", err);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} file(s) failed to convert", failures);
    }
    Ok(())
}
