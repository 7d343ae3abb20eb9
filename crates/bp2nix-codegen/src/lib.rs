//! Nix code generation for evaluated Blueprint files

pub mod error;
pub mod expand;
pub mod index;
pub mod printer;
pub mod sort;

use bp2nix_core::{ExportPolicy, File, NameTable};
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub use error::CodegenError;
pub use expand::{GlobExpander, GlobMissPolicy};
pub use index::{
    nix_file_path, Collision, DuplicatePolicy, IndexEntry, PackageIndex, PackageIndexBuilder,
    INDEX_FILE_NAME,
};
pub use printer::NixPrinter;
pub use sort::sort_lists;

/// Common trait for all code generators
pub trait Codegen {
    fn generate(&mut self, file: &File) -> Result<String, CodegenError>;
}

/// Renders a file as a Nix function of its module types:
///
/// ```text
/// { cc_library }:
/// let
///
/// libfoo = cc_library { ... };
///
/// in { inherit libfoo; }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NixCodegen {
    export: ExportPolicy,
}

impl NixCodegen {
    pub fn new(export: ExportPolicy) -> Self {
        Self { export }
    }

    pub fn export_policy(&self) -> ExportPolicy {
        self.export
    }

    /// Print with identifiers the caller already resolved
    pub fn print(&self, file: &File, names: &NameTable) -> Result<String, CodegenError> {
        let module_count = file.modules().count();
        if names.modules().len() != module_count {
            return Err(CodegenError::Generation(format!(
                "{}: {} names resolved for {} modules",
                file.name,
                names.modules().len(),
                module_count
            )));
        }

        let types: BTreeSet<&str> = file.modules().map(|m| m.type_name.as_str()).collect();
        let mut output = String::new();
        if types.is_empty() {
            writeln!(output, "{{ }}:")?;
        } else {
            let params: Vec<&str> = types.into_iter().collect();
            writeln!(output, "{{ {} }}:", params.join(", "))?;
        }
        writeln!(output, "let")?;
        writeln!(output)?;

        output.push_str(&NixPrinter::new(file, names).print());

        writeln!(output)?;
        if names.exports().is_empty() {
            writeln!(output, "in {{ }}")?;
        } else {
            writeln!(output, "in {{ inherit {}; }}", names.exports().join(" "))?;
        }
        Ok(output)
    }
}

impl Codegen for NixCodegen {
    fn generate(&mut self, file: &File) -> Result<String, CodegenError> {
        let names = NameTable::resolve(file, self.export);
        self.print(file, &names)
    }
}
