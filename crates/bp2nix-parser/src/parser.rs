//! Recursive-descent parser with inline evaluation
//!
//! Assignments are evaluated as they are parsed and bound in a [`Scope`], so
//! every later variable reference and `+` expression carries its value.
//! Evaluation problems (unknown variables, mismatched operands) are collected
//! and parsing continues; a syntax error stops the parse.

use crate::error::ParseError;
use crate::scanner::{Scanner, Token};
use bp2nix_core::value::evaluate_plus;
use bp2nix_core::{
    Assignment, Bool, Comment, CommentGroup, Definition, Expression, File, Int64, List, Map,
    Module, Operator, Pos, Property, StringLit, Variable,
};
use std::collections::HashMap;
use tracing::trace;

type PResult<T> = Result<T, ParseError>;

/// Variables assigned so far, bound to their evaluated values
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Expression>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.vars.get(name)
    }

    fn add(&mut self, name: &str, value: Expression) -> Result<(), String> {
        if self.vars.contains_key(name) {
            return Err(format!("variable already set: {}", name));
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }
}

pub struct SourceParser<'a> {
    scanner: Scanner<'a>,
    tok: Token,
    pos: Pos,
    /// Just past the current token
    end: Pos,
    comments: Vec<CommentGroup>,
    errors: Vec<ParseError>,
    scope: Scope,
}

impl<'a> SourceParser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            tok: Token::Eof,
            pos: Pos::NONE,
            end: Pos::NONE,
            comments: Vec::new(),
            errors: Vec::new(),
            scope: Scope::default(),
        }
    }

    /// Parse and evaluate the whole source. Returns every error found.
    pub fn parse(mut self, name: &str) -> Result<File, Vec<ParseError>> {
        let defs = match self.next().and_then(|_| self.parse_definitions()) {
            Ok(defs) => defs,
            Err(err) => {
                self.errors.push(err);
                Vec::new()
            }
        };

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        trace!(
            "Parsed {}: {} definitions, {} comment groups",
            name,
            defs.len(),
            self.comments.len()
        );
        Ok(File {
            name: name.to_string(),
            defs,
            comments: self.comments,
        })
    }

    /// Advance to the next non-comment token. Comments in between are
    /// grouped: a blank line starts a new group.
    fn next(&mut self) -> PResult<()> {
        let (mut tok, mut pos) = self.scanner.scan()?;
        if matches!(tok, Token::Comment(_)) {
            let mut group: Vec<Comment> = Vec::new();
            while let Token::Comment(text) = tok {
                if let Some(last) = group.last() {
                    if pos.line > last.end().line + 1 {
                        self.comments.push(CommentGroup {
                            comments: std::mem::take(&mut group),
                        });
                    }
                }
                group.push(Comment::new(&text, pos));
                (tok, pos) = self.scanner.scan()?;
            }
            self.comments.push(CommentGroup { comments: group });
        }
        self.tok = tok;
        self.pos = pos;
        self.end = self.scanner.pos();
        Ok(())
    }

    fn is_char(&self, c: char) -> bool {
        self.tok == Token::Char(c)
    }

    fn accept(&mut self, c: char) -> PResult<Pos> {
        if self.is_char(c) {
            let pos = self.pos;
            self.next()?;
            Ok(pos)
        } else {
            Err(self.unexpected(&format!("\"{}\"", c)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(self.pos, format!("expected {}, found {}", expected, self.tok))
    }

    fn parse_definitions(&mut self) -> PResult<Vec<Definition>> {
        let mut defs = Vec::new();
        loop {
            match self.tok.clone() {
                Token::Ident(name) => {
                    let pos = self.pos;
                    self.next()?;
                    match self.tok {
                        Token::Char('=') => defs.push(self.parse_assignment(name, pos)?),
                        Token::Char('{') | Token::Char('(') => {
                            defs.push(self.parse_module(name, pos)?)
                        }
                        Token::Char('+') => {
                            return Err(ParseError::new(
                                self.pos,
                                format!("\"+=\" on {} has no equivalent in a Nix let block", name),
                            ))
                        }
                        _ => return Err(self.unexpected("\"=\" or \"+=\" or \"{\" or \"(\"")),
                    }
                }
                Token::Eof => return Ok(defs),
                _ => return Err(self.unexpected("assignment or module definition")),
            }
        }
    }

    fn parse_assignment(&mut self, name: String, name_pos: Pos) -> PResult<Definition> {
        let equals_pos = self.accept('=')?;
        let value = self.parse_expression()?;
        if let Err(message) = self.scope.add(&name, value.eval().clone()) {
            self.errors.push(ParseError::new(name_pos, message));
        }
        Ok(Definition::Assignment(Assignment {
            name,
            name_pos,
            equals_pos,
            value,
        }))
    }

    fn parse_module(&mut self, type_name: String, type_pos: Pos) -> PResult<Definition> {
        let compat = self.is_char('(');
        let lbrace_pos = self.pos;
        self.next()?;
        let properties = self.parse_property_list(compat)?;
        let rbrace_pos = self.accept(if compat { ')' } else { '}' })?;
        Ok(Definition::Module(Module {
            type_name,
            type_pos,
            map: Map {
                lbrace_pos,
                rbrace_pos,
                properties,
            },
        }))
    }

    /// `name: value, ...` (or `name = value, ...` in legacy module syntax)
    fn parse_property_list(&mut self, compat: bool) -> PResult<Vec<Property>> {
        let mut properties: Vec<Property> = Vec::new();
        while let Token::Ident(name) = self.tok.clone() {
            let name_pos = self.pos;
            self.next()?;
            let colon_pos = self.accept(if compat { '=' } else { ':' })?;
            let value = self.parse_expression()?;

            if properties.iter().any(|p| p.name == name) {
                self.errors.push(ParseError::new(
                    name_pos,
                    format!("property {:?} already defined", name),
                ));
            }
            properties.push(Property {
                name,
                name_pos,
                colon_pos,
                value,
            });

            if !self.is_char(',') {
                break;
            }
            self.next()?;
        }
        Ok(properties)
    }

    fn parse_expression(&mut self) -> PResult<Expression> {
        let mut value = self.parse_value()?;
        loop {
            match self.tok {
                Token::Char('+') => {
                    let operator_pos = self.pos;
                    self.next()?;
                    let rhs = self.parse_value()?;
                    value = self.evaluate_operator(value, rhs, '+', operator_pos);
                }
                Token::Char('-') => {
                    return Err(ParseError::new(self.pos, "subtraction not supported"))
                }
                _ => return Ok(value),
            }
        }
    }

    fn evaluate_operator(
        &mut self,
        left: Expression,
        right: Expression,
        operator: char,
        operator_pos: Pos,
    ) -> Expression {
        let value = match evaluate_plus(&left, &right) {
            Ok(value) => value,
            Err(err) => {
                self.errors.push(ParseError::new(operator_pos, err.to_string()));
                left.eval().clone()
            }
        };
        Expression::Operator(Operator {
            operator,
            operator_pos,
            args: Box::new([left, right]),
            value: Box::new(value),
        })
    }

    fn parse_value(&mut self) -> PResult<Expression> {
        match self.tok.clone() {
            Token::Ident(name) => {
                let pos = self.pos;
                self.next()?;
                Ok(match name.as_str() {
                    "true" | "false" => Expression::Bool(Bool {
                        value: name == "true",
                        literal_pos: pos,
                        token: name,
                    }),
                    _ => self.variable(name, pos),
                })
            }
            Token::Int(_) | Token::Char('-') => self.parse_int(),
            Token::String(value) => {
                let literal_pos = self.pos;
                let end_pos = self.end;
                self.next()?;
                Ok(Expression::String(StringLit {
                    value,
                    literal_pos,
                    end_pos,
                }))
            }
            Token::Char('[') => self.parse_list(),
            Token::Char('{') => {
                let lbrace_pos = self.pos;
                self.next()?;
                let properties = self.parse_property_list(false)?;
                let rbrace_pos = self.accept('}')?;
                Ok(Expression::Map(Map {
                    lbrace_pos,
                    rbrace_pos,
                    properties,
                }))
            }
            _ => Err(self.unexpected("bool, list, map, integer or string value")),
        }
    }

    fn variable(&mut self, name: String, name_pos: Pos) -> Expression {
        let value = match self.scope.get(&name) {
            Some(value) => value.clone(),
            None => {
                self.errors.push(ParseError::new(
                    name_pos,
                    format!("undefined variable {}", name),
                ));
                Expression::String(StringLit::synthesized("", name_pos))
            }
        };
        Expression::Variable(Variable {
            name,
            name_pos,
            value: Box::new(value),
        })
    }

    fn parse_int(&mut self) -> PResult<Expression> {
        let literal_pos = self.pos;
        let negative = self.is_char('-');
        if negative {
            self.next()?;
        }
        let digits = match &self.tok {
            Token::Int(digits) => digits.clone(),
            _ => return Err(self.unexpected("integer")),
        };
        let token = if negative {
            format!("-{}", digits)
        } else {
            digits
        };
        let value = token
            .parse::<i64>()
            .map_err(|_| ParseError::new(literal_pos, format!("integer out of range: {}", token)))?;
        self.next()?;
        Ok(Expression::Int64(Int64 {
            value,
            literal_pos,
            token,
        }))
    }

    fn parse_list(&mut self) -> PResult<Expression> {
        let lbrace_pos = self.pos;
        self.next()?;
        let mut values = Vec::new();
        while !self.is_char(']') {
            values.push(self.parse_expression()?);
            if !self.is_char(',') {
                break;
            }
            self.next()?;
        }
        let rbrace_pos = self.accept(']')?;
        Ok(Expression::List(List {
            lbrace_pos,
            rbrace_pos,
            values,
        }))
    }
}
