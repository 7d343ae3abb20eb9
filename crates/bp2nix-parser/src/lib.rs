//! Blueprint (Android.bp) parser
//!
//! Produces an evaluated [`bp2nix_core::File`]: positions and comments are
//! preserved for printing, and every variable reference already knows its
//! value.

pub mod error;
pub mod parser;
pub mod scanner;

use bp2nix_core::File;
use std::path::Path;
use tracing::{debug, instrument};

pub use error::{ParseError, ParserError};
pub use parser::{Scope, SourceParser};

/// Common trait for Blueprint front ends
pub trait Parser {
    type Input;

    fn parse(&self, input: Self::Input) -> Result<File, ParserError>;
}

/// Parses Blueprint source text under a fixed file name
#[derive(Debug, Clone)]
pub struct BlueprintParser {
    name: String,
}

impl BlueprintParser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Parser for BlueprintParser {
    type Input = String;

    fn parse(&self, input: Self::Input) -> Result<File, ParserError> {
        parse_and_eval(&self.name, &input)
    }
}

/// Parse and evaluate Blueprint source. `name` is recorded in the returned
/// file and used in error messages.
#[instrument(skip(source), fields(bytes = source.len()))]
pub fn parse_and_eval(name: &str, source: &str) -> Result<File, ParserError> {
    SourceParser::new(source)
        .parse(name)
        .map_err(|errors| ParserError::Syntax {
            file: name.to_string(),
            errors,
        })
}

/// Read and parse a file from disk. `name` is normally the path relative to
/// the tree being converted.
pub fn parse_path(path: &Path, name: &str) -> Result<File, ParserError> {
    let bytes = std::fs::read(path)?;
    let source = String::from_utf8(bytes).map_err(|_| ParserError::Encoding {
        file: name.to_string(),
    })?;
    debug!("Read {} ({} bytes)", path.display(), source.len());
    parse_and_eval(name, &source)
}
