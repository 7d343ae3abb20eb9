//! Emitted identifiers for module invocations
//!
//! Each module becomes a `let` binding in the generated Nix. Its name comes
//! from the module's own `name` property when that is a usable Nix
//! identifier; anything else falls back to [`PLACEHOLDER_NAME`].

use crate::ast::{File, Module};
use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Name bound to modules without a usable `name` property. Several unnamed
/// modules in one file all share it.
pub const PLACEHOLDER_NAME: &str = "_missingName";

static NIX_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_'-]*$").expect("identifier regex"));

/// A string known to match the Nix identifier grammar
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        if NIX_IDENTIFIER.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(CoreError::InvalidIdentifier(name.to_string()))
        }
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_NAME
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a name against the Nix identifier grammar
pub fn is_valid_nix_identifier(name: &str) -> bool {
    NIX_IDENTIFIER.is_match(name)
}

/// Which top-level bindings end up in a file's `inherit` export block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportPolicy {
    /// Only module invocations are exported
    #[default]
    Modules,
    /// Modules plus top-level variable assignments
    ModulesAndAssignments,
}

impl Module {
    /// The declared `name` property, when it evaluates to a string
    pub fn declared_name(&self) -> Option<&str> {
        self.property("name").and_then(|p| p.value.eval_str())
    }

    /// Resolve the identifier this module is bound to
    pub fn identifier(&self) -> Identifier {
        match self.declared_name() {
            Some(name) => Identifier::parse(name).unwrap_or_else(|err| {
                debug!("Module '{}' at {}: {}", self.type_name, self.type_pos, err);
                Identifier::placeholder()
            }),
            None => Identifier::placeholder(),
        }
    }
}

/// Identifiers resolved once per file, shared by the printer and the
/// package index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameTable {
    /// One identifier per module definition, in definition order
    modules: Vec<Identifier>,
    /// Sorted, de-duplicated export set
    exports: Vec<String>,
}

impl NameTable {
    pub fn resolve(file: &File, policy: ExportPolicy) -> Self {
        let modules: Vec<Identifier> = file.modules().map(Module::identifier).collect();

        let mut exports: BTreeSet<String> =
            modules.iter().map(|id| id.as_str().to_string()).collect();
        if policy == ExportPolicy::ModulesAndAssignments {
            exports.extend(file.assignments().map(|a| a.name.clone()));
        }

        Self {
            modules,
            exports: exports.into_iter().collect(),
        }
    }

    /// Identifier of the `index`-th module definition of the file
    pub fn module(&self, index: usize) -> Option<&Identifier> {
        self.modules.get(index)
    }

    pub fn modules(&self) -> &[Identifier] {
        &self.modules
    }

    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    pub fn into_exports(self) -> Vec<String> {
        self.exports
    }
}
