//! bp2nix library: configuration and the conversion drivers behind the CLI

pub mod config;
pub mod convert;
pub mod tree;
pub mod walker;

pub use config::{Config, CONFIG_FILE_NAME};
pub use convert::{convert_file, dump_ast, single_file_output, transpile, Converted};
pub use tree::{convert_tree, IndexMessage, TreeReport};
pub use walker::find_blueprints;
