//! Core syntax tree and naming rules for bp2nix

pub mod ast;
pub mod error;
pub mod naming;
pub mod pos;
pub mod value;

pub use ast::{
    Anchor, Assignment, Bool, Comment, CommentGroup, Definition, Expression, File, Int64, List,
    Map, Module, Operator, Property, StringLit, Variable,
};
pub use error::CoreError;
pub use naming::{ExportPolicy, Identifier, NameTable, PLACEHOLDER_NAME};
pub use pos::Pos;
pub use value::ValueKind;
