//! Position-driven Nix printer
//!
//! Output layout follows the source: line breaks and blank lines are derived
//! by comparing each token's source position with the previous one, and
//! comment groups are flushed as soon as the next token's position passes
//! them. Tokens without a source position ([`Pos::NONE`]) print at the
//! current position.

use bp2nix_core::{
    Anchor, Assignment, CommentGroup, Definition, Expression, File, Identifier, List, Map, Module,
    NameTable, Pos, Property, ValueKind,
};
use std::borrow::Cow;
use std::mem;

const INDENT: usize = 4;

/// Words that cannot be used as bare attribute names
const NIX_KEYWORDS: [&str; 10] = [
    "assert", "else", "if", "in", "inherit", "let", "or", "rec", "then", "with",
];

/// Quote a string as a Nix string literal
pub fn nix_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Attribute name as it must appear on the left of `=`
pub fn attr_name(name: &str) -> Cow<'_, str> {
    if NIX_KEYWORDS.contains(&name) || !bp2nix_core::naming::is_valid_nix_identifier(name) {
        Cow::Owned(nix_string(name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Nix operator for a `+` chain, chosen from the evaluated operand kinds
pub fn nix_operator(operands: &[&Expression]) -> &'static str {
    let kinds = operands.iter().map(|e| e.value_kind());
    let mut symbol = "+";
    for kind in kinds {
        match kind {
            ValueKind::List => return "++",
            ValueKind::Map => symbol = "//",
            _ => {}
        }
    }
    symbol
}

/// Collect the operands of a `+` chain in source order, with the position
/// of each operator between them
fn flatten<'e>(expr: &'e Expression, operands: &mut Vec<&'e Expression>, operators: &mut Vec<Pos>) {
    match expr {
        Expression::Operator(op) => {
            flatten(&op.args[0], operands, operators);
            operators.push(op.operator_pos);
            flatten(&op.args[1], operands, operators);
        }
        other => operands.push(other),
    }
}

pub struct NixPrinter<'a> {
    file: &'a File,
    names: &'a NameTable,
    output: String,
    /// Source position of the last printed token
    pos: Pos,
    pending_space: bool,
    /// 0: none, 1: newline, 2: blank line, -1: swallow leading whitespace
    pending_newline: i8,
    indent_list: Vec<usize>,
    cur_comment: usize,
    skipped_comments: Vec<&'a CommentGroup>,
}

impl<'a> NixPrinter<'a> {
    pub fn new(file: &'a File, names: &'a NameTable) -> Self {
        Self {
            file,
            names,
            output: String::new(),
            pos: Pos::new(0, 1, 1),
            pending_space: false,
            pending_newline: -1,
            indent_list: vec![0],
            cur_comment: 0,
            skipped_comments: Vec::new(),
        }
    }

    /// Print every definition and trailing comment of the file
    pub fn print(mut self) -> String {
        let file = self.file;
        let mut module_index = 0;
        for def in &file.defs {
            match def {
                Definition::Assignment(assignment) => self.print_assignment(assignment),
                Definition::Module(module) => {
                    let ident = self
                        .names
                        .module(module_index)
                        .cloned()
                        .unwrap_or_else(Identifier::placeholder);
                    module_index += 1;
                    self.print_module(module, &ident);
                }
            }
        }
        self.flush();
        self.output
    }

    fn print_assignment(&mut self, assignment: &Assignment) {
        self.print_token(&assignment.name, assignment.name_pos);
        self.request_space();
        self.print_token("=", assignment.equals_pos);
        self.request_space();
        self.print_expression(&assignment.value);
        self.print_token(";", Pos::NONE);
        self.request_newline();
    }

    fn print_module(&mut self, module: &Module, ident: &Identifier) {
        self.print_token(ident.as_str(), module.type_pos);
        self.request_space();
        self.print_token("=", module.type_pos);
        self.request_space();
        self.print_token(&module.type_name, module.type_pos);
        self.print_map(&module.map);
        self.print_token(";", Pos::NONE);
        self.request_double_newline();
    }

    fn print_expression(&mut self, value: &Expression) {
        match value {
            Expression::Variable(v) => self.print_token(&v.name, v.name_pos),
            Expression::Operator(_) => self.print_operator(value),
            Expression::Bool(b) => {
                self.print_token(if b.value { "true" } else { "false" }, b.literal_pos)
            }
            Expression::Int64(i) => self.print_token(&i.value.to_string(), i.literal_pos),
            Expression::String(s) => self.print_token(&nix_string(&s.value), s.literal_pos),
            Expression::List(list) => self.print_list(list),
            Expression::Map(map) => self.print_map(map),
        }
    }

    fn print_list(&mut self, list: &List) {
        self.request_space();
        self.print_token("[", list.lbrace_pos);
        if list.values.len() > 1 || list.lbrace_pos.line != list.rbrace_pos.line {
            self.request_newline();
            self.indent(self.cur_indent() + INDENT);
            for value in &list.values {
                self.print_list_element(value);
                self.request_newline();
            }
            self.unindent(list.rbrace_pos);
        } else {
            for value in &list.values {
                self.print_list_element(value);
            }
        }
        self.print_token("]", list.rbrace_pos);
    }

    /// List elements are whitespace separated in Nix, so operator chains
    /// and negative numbers need parentheses.
    fn print_list_element(&mut self, value: &Expression) {
        let wrap = match value {
            Expression::Operator(_) => true,
            Expression::Int64(i) => i.value < 0,
            _ => false,
        };
        if wrap {
            self.print_token("(", value.pos());
            self.print_expression(value);
            self.print_token(")", Pos::NONE);
        } else {
            self.print_expression(value);
        }
    }

    fn print_map(&mut self, map: &Map) {
        self.request_space();
        self.print_token("{", map.lbrace_pos);
        if !map.properties.is_empty() || map.lbrace_pos.line != map.rbrace_pos.line {
            self.request_newline();
            self.indent(self.cur_indent() + INDENT);
            for property in &map.properties {
                self.print_property(property);
                self.print_token(";", Pos::NONE);
                self.request_newline();
            }
            self.unindent(map.rbrace_pos);
        }
        self.print_token("}", map.rbrace_pos);
    }

    fn print_property(&mut self, property: &Property) {
        self.print_token(&attr_name(&property.name), property.name_pos);
        self.request_space();
        self.print_token("=", property.colon_pos);
        self.request_space();
        self.print_expression(&property.value);
    }

    /// Print a whole `+` chain with one operator symbol. The first line
    /// break indents every continuation line one level deeper.
    fn print_operator(&mut self, expr: &Expression) {
        let mut operands = Vec::new();
        let mut operators = Vec::new();
        flatten(expr, &mut operands, &mut operators);
        let symbol = nix_operator(&operands);

        self.print_expression(operands[0]);
        let mut indented = false;
        for (i, operator_pos) in operators.iter().enumerate() {
            self.request_space();
            self.print_token(symbol, *operator_pos);
            if operands[i].end().line == operands[i + 1].pos().line {
                self.request_space();
            } else {
                if !indented {
                    indented = true;
                    self.indent(self.cur_indent() + INDENT);
                }
                self.request_newline();
            }
            self.print_expression(operands[i + 1]);
        }

        if indented {
            self.unindent(self.pos);
        }
    }

    /// Print a token along with any comments and whitespace between it and
    /// the previously printed token
    fn print_token(&mut self, s: &str, pos: Pos) {
        let newline = self.pending_newline != 0;
        let pos = if pos.is_none() { self.pos } else { pos };

        if newline {
            self.print_end_of_line_comments_before(pos, Some(pos));
            self.request_newlines_for_pos(pos);
        }

        self.print_in_line_comments_before(pos);
        self.flush_space();
        self.output.push_str(s);
        self.pos = pos;
    }

    /// Print single-line `/* */` groups that start before `pos`. Anything
    /// else is held back until the next line break.
    fn print_in_line_comments_before(&mut self, pos: Pos) {
        let file = self.file;
        let comments = &file.comments;
        while self.cur_comment < comments.len() && comments[self.cur_comment].pos().offset < pos.offset {
            let group = &comments[self.cur_comment];
            if group.is_inline() {
                self.print_comment(group, Some(pos));
                self.request_space();
            } else {
                self.skipped_comments.push(group);
            }
            self.cur_comment += 1;
        }
    }

    /// Print held-back comments and every comment on a line before `pos`.
    /// `next` is the node that follows them, if any.
    fn print_end_of_line_comments_before(&mut self, pos: Pos, next: Option<Pos>) {
        for group in mem::take(&mut self.skipped_comments) {
            self.print_comment(group, next);
            self.request_newline_only();
        }
        let file = self.file;
        let comments = &file.comments;
        while self.cur_comment < comments.len() && comments[self.cur_comment].pos().line < pos.line {
            self.print_comment(&comments[self.cur_comment], next);
            self.request_newline_only();
            self.cur_comment += 1;
        }
    }

    /// Request line breaks matching the gap between the last printed
    /// position and `pos`. One blank line at most.
    fn request_newlines_for_pos(&mut self, pos: Pos) -> bool {
        if pos.line > self.pos.line {
            self.request_newline_only();
            if pos.line > self.pos.line + 1 {
                self.pending_newline = 2;
            }
            return true;
        }
        false
    }

    fn request_space(&mut self) {
        self.pending_space = true;
    }

    /// Ask for a newline without flushing end-of-line comments
    fn request_newline_only(&mut self) {
        if self.pending_newline == 0 {
            self.pending_newline = 1;
        }
    }

    /// Ask for a newline, printing comments that trail the current line
    fn request_newline(&mut self) {
        let mut pos = self.pos;
        pos.line += 1;
        self.print_end_of_line_comments_before(pos, None);
        self.request_newline_only();
    }

    fn request_double_newline(&mut self) {
        self.request_newline();
        self.pending_newline = 2;
    }

    fn flush_space(&mut self) {
        match self.pending_newline {
            1 => {
                self.output.push('\n');
                self.pad(self.cur_indent());
            }
            2 => {
                self.output.push_str("\n\n");
                self.pad(self.cur_indent());
            }
            0 if self.pending_space => self.output.push(' '),
            _ => {}
        }
        self.pending_space = false;
        self.pending_newline = 0;
    }

    /// Print a comment group. Line comments become `#` comments; block
    /// comments are kept, re-indented to at least the current level.
    fn print_comment(&mut self, group: &CommentGroup, next: Option<Pos>) {
        for comment in &group.comments {
            match Anchor::classify(self.pos, comment.slash, next) {
                Anchor::Inline => self.request_space(),
                // own line, ahead of `next` or closing its scope
                Anchor::Before | Anchor::Standalone => {
                    self.request_newlines_for_pos(comment.slash);
                }
            }

            let line_comment = comment.is_line_comment();
            let last = comment.lines.len().saturating_sub(1);
            for (i, line) in comment.lines.iter().enumerate() {
                let line = line.trim_end();
                self.flush_space();
                if i > 0 {
                    let own_indent = line.len() - line.trim_start().len();
                    let cur = self.cur_indent();
                    self.pad(own_indent.max(cur) - cur);
                }
                let text = line.trim();
                match text.strip_prefix("//") {
                    Some(rest) if line_comment => {
                        self.output.push_str("# ");
                        self.output.push_str(rest);
                    }
                    _ => self.output.push_str(text),
                }
                if i < last {
                    self.request_newline_only();
                }
            }
            self.pos = comment.end();
        }
    }

    /// Print comments after the last token, then the final newline
    fn flush(&mut self) {
        for group in mem::take(&mut self.skipped_comments) {
            if !self.request_newlines_for_pos(group.pos()) {
                self.request_space();
            }
            self.print_comment(group, None);
        }
        let file = self.file;
        let comments = &file.comments;
        while self.cur_comment < comments.len() {
            self.print_comment(&comments[self.cur_comment], None);
            self.cur_comment += 1;
        }
        self.output.push('\n');
    }

    fn pad(&mut self, width: usize) {
        self.output.extend(std::iter::repeat(' ').take(width));
    }

    fn indent(&mut self, width: usize) {
        self.indent_list.push(width);
    }

    fn unindent(&mut self, pos: Pos) {
        self.print_end_of_line_comments_before(pos, None);
        if self.indent_list.len() > 1 {
            self.indent_list.pop();
        }
    }

    fn cur_indent(&self) -> usize {
        self.indent_list.last().copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nix_string_escaping() {
        assert_eq!(nix_string("plain"), "\"plain\"");
        assert_eq!(nix_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(nix_string("${FOO} $BAR"), "\"\\${FOO} $BAR\"");
        assert_eq!(nix_string("tab\there\nnl\r"), "\"tab\\there\\nnl\\r\"");
    }

    #[test]
    fn test_attr_name_quotes_keywords() {
        assert_eq!(attr_name("srcs"), "srcs");
        assert_eq!(attr_name("inherit"), "\"inherit\"");
        assert_eq!(attr_name("with"), "\"with\"");
        assert_eq!(attr_name("lib.foo"), "\"lib.foo\"");
    }
}
