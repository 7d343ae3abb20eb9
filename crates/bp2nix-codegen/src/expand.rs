//! Glob expansion of file-list properties
//!
//! Blueprint accepts wildcards in source lists (`srcs: ["*.c"]`) and resolves
//! them at build time. Nix needs concrete paths, so the patterns are
//! resolved against the tree before printing.

use bp2nix_core::{Expression, File, List, Pos, StringLit};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Property name suffixes whose list values hold paths
const PATH_PROPERTY_SUFFIXES: [&str; 4] = ["srcs", "dirs", "data", "files"];

/// What to do when a pattern matches nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobMissPolicy {
    #[default]
    Silent,
    Warn,
}

pub fn is_path_property(name: &str) -> bool {
    PATH_PROPERTY_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[derive(Debug, Clone)]
pub struct GlobExpander {
    root: PathBuf,
    miss: GlobMissPolicy,
}

impl GlobExpander {
    /// Patterns resolve relative to `root` joined with the directory of the
    /// file being expanded.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            miss: GlobMissPolicy::default(),
        }
    }

    pub fn with_miss_policy(mut self, miss: GlobMissPolicy) -> Self {
        self.miss = miss;
        self
    }

    /// Expand every wildcard element of the file's path properties in place.
    /// Returns the number of patterns seen.
    #[instrument(skip(self, file), fields(file = %file.name), level = "debug")]
    pub fn expand(&self, file: &mut File) -> usize {
        let dir = Path::new(&file.name).parent().unwrap_or(Path::new(""));
        let base = self.root.join(dir);
        let file_name = file.name.clone();

        let mut patterns = 0;
        for module in file.modules_mut() {
            for property in &mut module.map.properties {
                if !is_path_property(&property.name) {
                    continue;
                }
                if let Expression::List(list) = &mut property.value {
                    patterns += self.expand_list(&base, list, &file_name);
                }
            }
        }
        patterns
    }

    fn expand_list(&self, base: &Path, list: &mut List, file_name: &str) -> usize {
        let mut patterns = 0;
        for value in std::mem::take(&mut list.values) {
            match value {
                Expression::String(s) if s.value.contains('*') => {
                    patterns += 1;
                    let matches = glob_relative(base, &s.value);
                    if matches.is_empty() {
                        self.report_miss(&s.value, file_name);
                    } else {
                        debug!("{} matched {} paths", s.value, matches.len());
                    }
                    list.values.extend(matches.into_iter().enumerate().map(|(i, path)| {
                        if i == 0 {
                            Expression::String(StringLit {
                                value: path,
                                literal_pos: s.literal_pos,
                                end_pos: s.end_pos,
                            })
                        } else {
                            Expression::String(StringLit::synthesized(path, Pos::NONE))
                        }
                    }));
                }
                other => list.values.push(other),
            }
        }
        patterns
    }

    fn report_miss(&self, pattern: &str, file_name: &str) {
        match self.miss {
            GlobMissPolicy::Silent => debug!("No matches for {} in {}", pattern, file_name),
            GlobMissPolicy::Warn => warn!("No matches for {} in {}", pattern, file_name),
        }
    }
}

/// `base` without `.` components: `./pkg` becomes `pkg` and `.` becomes
/// empty, matching the paths `glob` yields
fn clean_base(base: &Path) -> PathBuf {
    base.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Sorted paths matching `pattern` under `base`, relative to `base`.
/// Unreadable entries and invalid patterns count as no match.
fn glob_relative(base: &Path, pattern: &str) -> Vec<String> {
    let base = clean_base(base);
    let base = base.as_path();
    let full_pattern = if base.as_os_str().is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", Pattern::escape(&base.to_string_lossy()), pattern)
    };

    let mut matches: Vec<String> = glob::glob(&full_pattern)
        .ok()
        .map(|paths| {
            paths
                .filter_map(|p| p.ok())
                .filter_map(|p| p.strip_prefix(base).ok().map(|r| r.display().to_string()))
                .collect()
        })
        .unwrap_or_default();
    matches.sort();
    matches
}
