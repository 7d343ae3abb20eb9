//! Parser behavior on whole Blueprint files

use bp2nix_core::{Expression, ValueKind};
use bp2nix_parser::{parse_and_eval, parse_path, BlueprintParser, Parser, ParserError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const ANDROID_BP: &str = r#"
// Common sources
common_srcs = [
    "common.c",
    "util.c",
]

cc_defaults {
    name: "libfoo_defaults",
    cflags: ["-Wall"],
}

cc_library {
    name: "libfoo",
    defaults: ["libfoo_defaults"],
    srcs: common_srcs + ["foo.c"],
    shared_libs: [
        "liblog",
    ],
    enabled: true,
    target: {
        android: {
            cflags: ["-DANDROID"],
        },
    },
}
"#;

/// A realistic file parses into definitions with their values attached
#[test]
fn test_realistic_file() -> Result<(), Box<dyn std::error::Error>> {
    let file = parse_and_eval("foo/Android.bp", ANDROID_BP)?;
    assert_eq!(file.name, "foo/Android.bp");
    assert_eq!(file.defs.len(), 3);
    assert_eq!(file.comments.len(), 1);
    assert_eq!(file.comments[0].comments[0].text(), "// Common sources");

    let names: Vec<_> = file.modules().filter_map(|m| m.declared_name()).collect();
    assert_eq!(names, vec!["libfoo_defaults", "libfoo"]);

    let libfoo = file.modules().nth(1).ok_or("missing module")?;
    let srcs = libfoo.property("srcs").ok_or("missing srcs")?;
    assert_eq!(srcs.value.kind(), ValueKind::Operator);
    match srcs.value.eval() {
        Expression::List(list) => {
            let values: Vec<_> = list.values.iter().filter_map(|v| v.eval_str()).collect();
            assert_eq!(values, vec!["common.c", "util.c", "foo.c"]);
        }
        other => panic!("expected list, got {:?}", other),
    }
    Ok(())
}

/// Every evaluation error is reported, not just the first
#[test]
fn test_collects_evaluation_errors() {
    let err = parse_and_eval("Android.bp", "a = b\nc = \"x\" + 1\n").unwrap_err();
    let messages: Vec<_> = err.errors().iter().map(|e| e.message.clone()).collect();
    assert_eq!(
        messages,
        vec![
            "undefined variable b".to_string(),
            "Mismatched operand types for '+': string and integer".to_string(),
        ]
    );
    assert_eq!(
        err.to_string(),
        "Android.bp: 1:5: undefined variable b\nAndroid.bp: 2:9: Mismatched operand types for '+': string and integer"
    );
}

/// Subtraction is a syntax error
#[test]
fn test_subtraction_rejected() {
    let err = parse_and_eval("Android.bp", "x = 2 - 1").unwrap_err();
    assert!(matches!(err, ParserError::Syntax { .. }));
    assert_eq!(err.errors()[0].message, "subtraction not supported");
}

/// Trailing commas are accepted everywhere a list of items is
#[test]
fn test_trailing_commas() -> Result<(), Box<dyn std::error::Error>> {
    let file = parse_and_eval("Android.bp", "foo { a: [1, 2,], b: { c: \"d\", }, }")?;
    assert_eq!(file.modules().count(), 1);
    Ok(())
}

/// The trait front end parses under its configured name
#[test]
fn test_blueprint_parser_trait() -> Result<(), Box<dyn std::error::Error>> {
    let parser = BlueprintParser::new("a/b/Android.bp");
    let file = parser.parse("foo { name: \"x\" }".to_string())?;
    assert_eq!(file.name, "a/b/Android.bp");
    Ok(())
}

/// Files are read from disk and must be UTF-8
#[test]
fn test_parse_path() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let good = dir.path().join("Android.bp");
    std::fs::write(&good, "foo { name: \"x\" }\n")?;
    let file = parse_path(&good, "Android.bp")?;
    assert_eq!(file.defs.len(), 1);

    let bad = dir.path().join("bad.bp");
    std::fs::write(&bad, [0x66, 0x6f, 0xff, 0xfe])?;
    let err = parse_path(&bad, "bad.bp").unwrap_err();
    assert!(matches!(err, ParserError::Encoding { .. }));

    let missing = parse_path(&dir.path().join("missing.bp"), "missing.bp").unwrap_err();
    assert!(matches!(missing, ParserError::Io(_)));
    Ok(())
}

proptest! {
    /// Arbitrary input yields a file or an error, never a panic
    #[test]
    fn prop_never_panics(src in "[a-z{}\\[\\]:,=+\"/* \n0-9-]{0,64}") {
        let _ = parse_and_eval("Android.bp", &src);
    }

    /// String literals decode to the text that was quoted
    #[test]
    fn prop_string_literal_value(value in "[a-zA-Z0-9 ./_-]{0,32}") {
        let src = format!("x = \"{}\"", value);
        let file = parse_and_eval("Android.bp", &src).unwrap();
        let assignment = file.assignments().next().unwrap();
        prop_assert_eq!(assignment.value.eval_str(), Some(value.as_str()));
    }
}
