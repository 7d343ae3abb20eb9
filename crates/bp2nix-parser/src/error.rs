use bp2nix_core::Pos;
use std::fmt;
use thiserror::Error;

/// A single syntax or evaluation error at a source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub pos: Pos,
    pub message: String,
}

impl ParseError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("{file}: {}", format_errors(.file, .errors))]
    Syntax {
        file: String,
        errors: Vec<ParseError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{file} is not valid UTF-8")]
    Encoding { file: String },
}

impl ParserError {
    /// Individual errors for a syntax failure, empty otherwise
    pub fn errors(&self) -> &[ParseError] {
        match self {
            ParserError::Syntax { errors, .. } => errors,
            _ => &[],
        }
    }
}

fn format_errors(file: &str, errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&format!("\n{}: ", file))
}
