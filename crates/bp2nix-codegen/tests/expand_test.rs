//! Glob expansion against a real directory tree

use bp2nix_codegen::{sort_lists, Codegen, GlobExpander, GlobMissPolicy, NixCodegen};
use bp2nix_core::Expression;
use bp2nix_parser::parse_and_eval;
use pretty_assertions::assert_eq;
use std::fs;

const ANDROID_BP: &str = r#"foo {
    srcs: [
        "main.c",
        "src/*.c",
    ],
    cflags: ["*.c"],
    data: ["none/*.bin"],
}
"#;

fn strings(value: &Expression) -> Vec<&str> {
    match value {
        Expression::List(list) => list.values.iter().filter_map(|v| v.eval_str()).collect(),
        _ => Vec::new(),
    }
}

/// Patterns in path properties become the sorted files they match
#[test]
fn test_expand_path_properties() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let pkg = root.path().join("pkg");
    fs::create_dir_all(pkg.join("src/sub"))?;
    for name in ["src/b.c", "src/a.c", "src/sub/c.c", "src/readme.txt"] {
        fs::write(pkg.join(name), "")?;
    }

    let mut file = parse_and_eval("pkg/Android.bp", ANDROID_BP)?;
    let patterns = GlobExpander::new(root.path())
        .with_miss_policy(GlobMissPolicy::Warn)
        .expand(&mut file);
    assert_eq!(patterns, 2);

    let module = file.modules().next().ok_or("missing module")?;
    let srcs = &module.property("srcs").ok_or("missing srcs")?.value;
    assert_eq!(strings(srcs), vec!["main.c", "src/a.c", "src/b.c"]);
    if let Expression::List(list) = srcs {
        assert_eq!(list.values[1].pos().line, 4);
        assert!(list.values[2].pos().is_none());
    }
    assert_eq!(strings(&module.property("cflags").ok_or("missing cflags")?.value), vec!["*.c"]);
    assert!(strings(&module.property("data").ok_or("missing data")?.value).is_empty());

    sort_lists(&mut file);
    let output = NixCodegen::default().generate(&file)?;
    assert_eq!(
        output,
        r#"{ foo }:
let

_missingName = foo {
    srcs = [
        "main.c"
        "src/a.c"
        "src/b.c"
    ];
    cflags = ["*.c"];
    data = [];
};

in { inherit _missingName; }
"#
    );
    Ok(())
}

/// Expanded elements sort together with the rest of the list
#[test]
fn test_expanded_elements_are_sorted() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    for name in ["b.java", "d.java"] {
        fs::write(root.path().join(name), "")?;
    }

    let mut file = parse_and_eval(
        "Android.bp",
        "java_library {\n    srcs: [\n        \"*.java\",\n        \"a.java\",\n        \"c.java\",\n    ],\n}\n",
    )?;
    GlobExpander::new(root.path()).expand(&mut file);
    sort_lists(&mut file);

    let module = file.modules().next().ok_or("missing module")?;
    assert_eq!(
        strings(&module.property("srcs").ok_or("missing srcs")?.value),
        vec!["a.java", "b.java", "c.java", "d.java"]
    );
    Ok(())
}
