//! Aggregate package index
//!
//! Every converted file reports the identifiers it exports. Once all files
//! have reported, [`PackageIndexBuilder::finalize`] resolves cross-file name
//! collisions in sorted file order, so the result does not depend on the
//! order reports arrived in.

use crate::error::CodegenError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the aggregate index in the output directory
pub const INDEX_FILE_NAME: &str = "blueprint-packages.nix";

/// Output path of a converted file inside the output directory:
/// `a/b/Android.bp` becomes `a_b.nix`.
pub fn nix_file_path(relative: &str, input_file_name: &str) -> String {
    let flat = relative.replace('/', "_");
    let suffix = format!("_{}", input_file_name);
    let stem = flat.strip_suffix(&suffix).unwrap_or(&flat);
    format!("{}.nix", stem)
}

/// How a name already exported by an earlier file is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Drop only the colliding name from the later file
    #[default]
    SkipName,
    /// Drop the later file from the index entirely
    SkipFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub name: String,
    pub file: String,
    pub first_seen: String,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate assigned name {} in {} (first seen in {})",
            self.name, self.file, self.first_seen
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Input path relative to the tree root
    pub file: String,
    /// Converted file name, relative to the index
    pub nix_file: String,
    /// Sorted exported identifiers
    pub names: Vec<String>,
}

impl IndexEntry {
    /// Directory handed to `callBPPackage`
    pub fn package_dir(&self) -> String {
        match Path::new(&self.file).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.display().to_string(),
            _ => ".".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct PackageIndexBuilder {
    policy: DuplicatePolicy,
    input_file_name: String,
    reports: BTreeMap<String, BTreeSet<String>>,
    failed: BTreeSet<String>,
}

impl PackageIndexBuilder {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            input_file_name: "Android.bp".to_string(),
            reports: BTreeMap::new(),
            failed: BTreeSet::new(),
        }
    }

    pub fn with_input_file_name(mut self, name: impl Into<String>) -> Self {
        self.input_file_name = name.into();
        self
    }

    /// Record the identifiers exported by a converted file
    pub fn report(&mut self, file: impl Into<String>, names: impl IntoIterator<Item = String>) {
        let file = file.into();
        if self.failed.contains(&file) {
            debug!("Ignoring report for failed file {}", file);
            return;
        }
        self.reports.entry(file).or_default().extend(names);
    }

    /// Record a file that could not be converted. It never contributes
    /// identifiers, even if it reported some earlier.
    pub fn fail(&mut self, file: impl Into<String>) {
        let file = file.into();
        self.reports.remove(&file);
        self.failed.insert(file);
    }

    pub fn finalize(self) -> PackageIndex {
        let mut first_seen: HashMap<String, String> = HashMap::new();
        let mut entries = Vec::new();
        let mut collisions = Vec::new();

        for (file, names) in self.reports {
            let (fresh, clashes): (Vec<String>, Vec<String>) =
                names.into_iter().partition(|name| !first_seen.contains_key(name));

            let file_collisions: Vec<Collision> = clashes
                .into_iter()
                .map(|name| Collision {
                    first_seen: first_seen.get(&name).cloned().unwrap_or_default(),
                    name,
                    file: file.clone(),
                })
                .collect();
            for collision in &file_collisions {
                warn!("{}", collision);
            }

            let kept = match self.policy {
                DuplicatePolicy::SkipFile if !file_collisions.is_empty() => {
                    warn!("Skipping {} from the package index", file);
                    Vec::new()
                }
                _ => fresh,
            };
            collisions.extend(file_collisions);

            if kept.is_empty() {
                continue;
            }
            for name in &kept {
                first_seen.insert(name.clone(), file.clone());
            }
            entries.push(IndexEntry {
                nix_file: nix_file_path(&file, &self.input_file_name),
                file,
                names: kept,
            });
        }

        PackageIndex {
            entries,
            collisions,
            failed: self.failed.into_iter().collect(),
        }
    }
}

/// The finalized index, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndex {
    entries: Vec<IndexEntry>,
    collisions: Vec<Collision>,
    failed: Vec<String>,
}

impl PackageIndex {
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn render(&self) -> Result<String, CodegenError> {
        let mut output = String::new();
        writeln!(output, "{{ callBPPackage }}:")?;
        writeln!(output, "{{")?;
        for entry in &self.entries {
            writeln!(
                output,
                "  inherit (callBPPackage \"{}\" ./{} {{}})",
                entry.package_dir(),
                entry.nix_file
            )?;
            writeln!(output, "    {};", entry.names.join(" "))?;
            writeln!(output)?;
        }
        writeln!(output, "}}")?;
        Ok(output)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CodegenError> {
        info!("Writing {}", path.display());
        std::fs::write(path, self.render()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nix_file_path() {
        assert_eq!(nix_file_path("a/b/Android.bp", "Android.bp"), "a_b.nix");
        assert_eq!(nix_file_path("frameworks/Android.bp", "Android.bp"), "frameworks.nix");
        assert_eq!(nix_file_path("Android.bp", "Android.bp"), "Android.bp.nix");
        assert_eq!(nix_file_path("x/Blueprints", "Blueprints"), "x.nix");
    }

    #[test]
    fn test_package_dir() {
        let entry = |file: &str| IndexEntry {
            file: file.to_string(),
            nix_file: String::new(),
            names: Vec::new(),
        };
        assert_eq!(entry("a/b/Android.bp").package_dir(), "a/b");
        assert_eq!(entry("Android.bp").package_dir(), ".");
    }

    #[test]
    fn test_skip_name_keeps_rest_of_file() {
        let mut builder = PackageIndexBuilder::new(DuplicatePolicy::SkipName);
        builder.report("b/Android.bp", names(&["abc", "def"]));
        builder.report("a/Android.bp", names(&["abc"]));
        let index = builder.finalize();

        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.entries()[0].file, "a/Android.bp");
        assert_eq!(index.entries()[1].names, names(&["def"]));
        assert_eq!(
            index.collisions(),
            &[Collision {
                name: "abc".to_string(),
                file: "b/Android.bp".to_string(),
                first_seen: "a/Android.bp".to_string(),
            }]
        );
    }

    #[test]
    fn test_skip_file_drops_whole_file() {
        let mut builder = PackageIndexBuilder::new(DuplicatePolicy::SkipFile);
        builder.report("a/Android.bp", names(&["abc"]));
        builder.report("b/Android.bp", names(&["abc", "def"]));
        builder.report("c/Android.bp", names(&["def"]));
        let index = builder.finalize();

        let files: Vec<_> = index.entries().iter().map(|e| e.file.as_str()).collect();
        // b was dropped, so its def never claimed the name
        assert_eq!(files, vec!["a/Android.bp", "c/Android.bp"]);
        assert_eq!(index.collisions().len(), 1);
    }

    #[test]
    fn test_failed_and_empty_files_omitted() {
        let mut builder = PackageIndexBuilder::new(DuplicatePolicy::SkipName);
        builder.report("a/Android.bp", names(&["abc"]));
        builder.report("empty/Android.bp", Vec::new());
        builder.fail("a/Android.bp");
        builder.report("a/Android.bp", names(&["late"]));
        let index = builder.finalize();

        assert!(index.entries().is_empty());
        assert_eq!(index.failed(), &["a/Android.bp".to_string()]);
        assert_eq!(index.render().unwrap(), "{ callBPPackage }:\n{\n}\n");
    }
}
