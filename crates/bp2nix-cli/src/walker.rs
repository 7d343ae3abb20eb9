//! Blueprint file discovery for tree mode

use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Files under `root` whose name ends with `input_file_name`, as sorted
/// `/`-separated paths relative to `root`. Paths containing any `exclude`
/// substring are skipped.
pub fn find_blueprints(root: &Path, input_file_name: &str, exclude: &[String]) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(input_file_name))
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        })
        .filter(|rel| match exclude.iter().find(|pattern| rel.contains(pattern.as_str())) {
            Some(pattern) => {
                trace!("Excluding {} ({})", rel, pattern);
                false
            }
            None => true,
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_blueprints() {
        let root = tempfile::tempdir().unwrap();
        for rel in [
            "Android.bp",
            "b/Android.bp",
            "a/x/Android.bp",
            "device/google/Android.bp",
            "prebuilts/vndk/v30/Android.bp",
            "a/README.md",
            "c/NotAndroid.bp",
        ] {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }

        let exclude = vec!["device/".to_string(), "prebuilts/vndk/".to_string()];
        let files = find_blueprints(root.path(), "Android.bp", &exclude);
        assert_eq!(
            files,
            vec!["Android.bp", "a/x/Android.bp", "b/Android.bp", "c/NotAndroid.bp"]
        );
    }
}
