use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid Nix identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Mismatched operand types for '{operator}': {left} and {right}")]
    MismatchedOperands {
        operator: char,
        left: String,
        right: String,
    },

    #[error("Integer overflow in '{0}'")]
    Overflow(char),
}
