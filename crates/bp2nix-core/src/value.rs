//! Semantic classification of evaluated expressions
//!
//! Every pass that needs to know "what is this value" asks here instead of
//! matching on the tree shape itself.

use crate::ast::{Definition, Expression, Int64, List, Map, Property, StringLit};
use crate::error::CoreError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
    List,
    Map,
    Variable,
    Operator,
    Module,
}

impl ValueKind {
    /// Scalars whose printed form is fixed text
    pub fn is_literal(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Integer | ValueKind::Boolean)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "bool",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Variable => "variable",
            ValueKind::Operator => "operator",
            ValueKind::Module => "module",
        };
        f.write_str(name)
    }
}

impl Expression {
    /// Syntactic kind of this node
    pub fn kind(&self) -> ValueKind {
        match self {
            Expression::String(_) => ValueKind::String,
            Expression::Int64(_) => ValueKind::Integer,
            Expression::Bool(_) => ValueKind::Boolean,
            Expression::List(_) => ValueKind::List,
            Expression::Map(_) => ValueKind::Map,
            Expression::Variable(_) => ValueKind::Variable,
            Expression::Operator(_) => ValueKind::Operator,
        }
    }

    /// Kind of the value this node evaluates to
    pub fn value_kind(&self) -> ValueKind {
        self.eval().kind()
    }
}

impl Definition {
    pub fn kind(&self) -> ValueKind {
        match self {
            Definition::Assignment(a) => a.value.value_kind(),
            Definition::Module(_) => ValueKind::Module,
        }
    }
}

/// Evaluate `left + right` over already evaluated operands.
///
/// Strings concatenate, integers add, lists append and maps merge with
/// same-named properties added recursively. Any other pairing is an error.
pub fn evaluate_plus(left: &Expression, right: &Expression) -> Result<Expression, CoreError> {
    match (left.eval(), right.eval()) {
        (Expression::String(a), Expression::String(b)) => Ok(Expression::String(
            StringLit::synthesized(format!("{}{}", a.value, b.value), a.literal_pos),
        )),
        (Expression::Int64(a), Expression::Int64(b)) => {
            let value = a.value.checked_add(b.value).ok_or(CoreError::Overflow('+'))?;
            Ok(Expression::Int64(Int64 {
                value,
                literal_pos: a.literal_pos,
                token: value.to_string(),
            }))
        }
        (Expression::List(a), Expression::List(b)) => Ok(Expression::List(List {
            lbrace_pos: a.lbrace_pos,
            rbrace_pos: b.rbrace_pos,
            values: a.values.iter().chain(&b.values).cloned().collect(),
        })),
        (Expression::Map(a), Expression::Map(b)) => Ok(Expression::Map(merge_maps(a, b)?)),
        (a, b) => Err(CoreError::MismatchedOperands {
            operator: '+',
            left: a.kind().to_string(),
            right: b.kind().to_string(),
        }),
    }
}

fn merge_maps(a: &Map, b: &Map) -> Result<Map, CoreError> {
    let mut properties = a.properties.clone();
    for prop in &b.properties {
        match properties.iter_mut().find(|p| p.name == prop.name) {
            Some(existing) => {
                existing.value = evaluate_plus(&existing.value, &prop.value)?;
            }
            None => properties.push(Property {
                name: prop.name.clone(),
                name_pos: prop.name_pos,
                colon_pos: prop.colon_pos,
                value: prop.value.clone(),
            }),
        }
    }
    Ok(Map {
        lbrace_pos: a.lbrace_pos,
        rbrace_pos: b.rbrace_pos,
        properties,
    })
}
