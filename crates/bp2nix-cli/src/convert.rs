//! Per-file conversion pipeline

use crate::config::Config;
use anyhow::{Context, Result};
use bp2nix_codegen::{sort_lists, GlobExpander, NixCodegen};
use bp2nix_core::NameTable;
use bp2nix_parser::parse_path;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Generated Nix text of one file and the identifiers it exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub output: String,
    pub exports: Vec<String>,
}

/// Parse, expand globs, sort lists, name modules, print.
///
/// `name` is recorded as the file name and anchors glob expansion: patterns
/// are matched under `glob_root.join(parent(name))`.
#[instrument(skip(config), level = "debug")]
pub fn transpile(path: &Path, name: &str, glob_root: &Path, config: &Config) -> Result<Converted> {
    let mut file = parse_path(path, name)?;

    let patterns = GlobExpander::new(glob_root)
        .with_miss_policy(config.glob_miss)
        .expand(&mut file);
    if patterns > 0 {
        debug!("Expanded {} glob patterns in {}", patterns, name);
    }

    sort_lists(&mut file);

    let names = NameTable::resolve(&file, config.export);
    let output = NixCodegen::new(config.export).print(&file, &names)?;
    Ok(Converted {
        output,
        exports: names.into_exports(),
    })
}

/// Output path of a single-file conversion: a trailing `.bp` is replaced
/// by `.nix`, anything else gets `.nix` appended.
pub fn single_file_output(path: &Path) -> PathBuf {
    let path = path.to_string_lossy();
    let stem = path.strip_suffix(".bp").unwrap_or(&path);
    PathBuf::from(format!("{}.nix", stem))
}

/// Convert one file in place, writing the result next to it. Globs are
/// resolved relative to the working directory.
pub fn convert_file(path: &Path, config: &Config) -> Result<Converted> {
    info!("Converting {}", path.display());
    let name = path.to_string_lossy();
    let converted = transpile(path, &name, Path::new(""), config)
        .with_context(|| format!("Failed to convert {}", path.display()))?;

    let out = single_file_output(path);
    fs::write(&out, &converted.output)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Wrote {}", out.display());
    Ok(converted)
}

/// Parsed and evaluated syntax tree as pretty JSON
pub fn dump_ast(path: &Path) -> Result<String> {
    let file = parse_path(path, &path.to_string_lossy())?;
    serde_json::to_string_pretty(&file).context("Failed to serialize syntax tree")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_output() {
        assert_eq!(
            single_file_output(Path::new("a/b/Android.bp")),
            PathBuf::from("a/b/Android.nix")
        );
        assert_eq!(
            single_file_output(Path::new("Blueprints")),
            PathBuf::from("Blueprints.nix")
        );
    }
}
