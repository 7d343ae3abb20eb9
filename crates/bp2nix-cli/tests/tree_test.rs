//! Tree conversion over a temporary source tree

use bp2nix::{convert_tree, Config};
use bp2nix_codegen::DuplicatePolicy;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn source_tree(root: &Path) -> std::io::Result<()> {
    write(root, "Android.bp", "cc_defaults { name: \"top_defaults\" }\n")?;
    write(
        root,
        "a/Android.bp",
        "cc_library {\n    name: \"libfoo\",\n    srcs: [\"*.c\"],\n}\n",
    )?;
    write(root, "a/y.c", "")?;
    write(root, "a/x.c", "")?;
    write(
        root,
        "b/Android.bp",
        "cc_library { name: \"libfoo\" }\ncc_binary { name: \"bar\" }\n",
    )?;
    write(root, "broken/Android.bp", "cc_library {\n")?;
    write(root, "device/vendor/Android.bp", "cc_library { name: \"vendor\" }\n")?;
    Ok(())
}

/// Every file is converted, failures are reported and the index is written
#[tokio::test]
async fn test_convert_tree() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    source_tree(src.path())?;

    let config = Config {
        output_dir: out.path().to_path_buf(),
        ..Default::default()
    };
    let report = convert_tree(src.path(), &config).await?;

    assert!(!report.is_success());
    assert_eq!(report.converted, 3);
    assert_eq!(report.lost, 0);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken/Android.bp");
    assert_eq!(report.index.collisions().len(), 1);

    let index = fs::read_to_string(out.path().join("blueprint-packages.nix"))?;
    assert_eq!(
        index,
        r#"{ callBPPackage }:
{
  inherit (callBPPackage "." ./Android.bp.nix {})
    top_defaults;

  inherit (callBPPackage "a" ./a.nix {})
    libfoo;

  inherit (callBPPackage "b" ./b.nix {})
    bar;

}
"#
    );

    let a = fs::read_to_string(out.path().join("a.nix"))?;
    assert!(a.starts_with("{ cc_library }:\n"));
    let (x, y) = (a.find("\"x.c\"").ok_or("x.c")?, a.find("\"y.c\"").ok_or("y.c")?);
    assert!(x < y);

    // b.nix still binds libfoo; only the index skips it
    let b = fs::read_to_string(out.path().join("b.nix"))?;
    assert!(b.contains("in { inherit bar libfoo; }"));

    assert!(!out.path().join("broken.nix").exists());
    assert!(!out.path().join("device_vendor.nix").exists());
    Ok(())
}

/// With skip-file, a colliding file leaves the index entirely
#[tokio::test]
async fn test_convert_tree_skip_file() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    source_tree(src.path())?;
    fs::remove_file(src.path().join("broken/Android.bp"))?;

    let config = Config {
        output_dir: out.path().join("nested/out"),
        duplicate_policy: DuplicatePolicy::SkipFile,
        index_file: "packages.nix".to_string(),
        ..Default::default()
    };
    let report = convert_tree(src.path(), &config).await?;

    assert!(report.is_success());
    let files: Vec<&str> = report.index.entries().iter().map(|e| e.file.as_str()).collect();
    assert_eq!(files, vec!["Android.bp", "a/Android.bp"]);
    assert_eq!(report.index_path, out.path().join("nested/out/packages.nix"));
    assert!(report.index_path.is_file());
    assert!(out.path().join("nested/out/b.nix").is_file());
    Ok(())
}

/// An empty tree still produces an index
#[tokio::test]
async fn test_convert_empty_tree() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempfile::tempdir()?;
    let out = tempfile::tempdir()?;
    let config = Config {
        output_dir: out.path().to_path_buf(),
        ..Default::default()
    };

    let report = convert_tree(src.path(), &config).await?;
    assert!(report.is_success());
    assert_eq!(report.converted, 0);
    assert_eq!(
        fs::read_to_string(report.index_path)?,
        "{ callBPPackage }:\n{\n}\n"
    );
    Ok(())
}
