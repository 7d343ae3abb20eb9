//! Blueprint syntax tree
//!
//! The tree is produced already evaluated: variable references and operator
//! expressions carry the value they evaluate to, so later passes never need a
//! scope to know whether `a + b` joins strings or lists.

use crate::pos::Pos;
use serde::Serialize;

/// A parsed Blueprint file
#[derive(Debug, Clone, Default, Serialize)]
pub struct File {
    /// Path of the file as given to the parser
    pub name: String,
    pub defs: Vec<Definition>,
    /// Comment groups in source order
    pub comments: Vec<CommentGroup>,
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.defs.iter().filter_map(|def| match def {
            Definition::Module(m) => Some(m),
            Definition::Assignment(_) => None,
        })
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.defs.iter_mut().filter_map(|def| match def {
            Definition::Module(m) => Some(m),
            Definition::Assignment(_) => None,
        })
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.defs.iter().filter_map(|def| match def {
            Definition::Assignment(a) => Some(a),
            Definition::Module(_) => None,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "def", rename_all = "snake_case")]
pub enum Definition {
    Assignment(Assignment),
    Module(Module),
}

impl Definition {
    pub fn pos(&self) -> Pos {
        match self {
            Definition::Assignment(a) => a.name_pos,
            Definition::Module(m) => m.type_pos,
        }
    }
}

/// `name = value`
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub name: String,
    pub name_pos: Pos,
    pub equals_pos: Pos,
    pub value: Expression,
}

/// `type { prop: value, ... }` or the legacy `type(prop = value, ...)`
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub type_name: String,
    pub type_pos: Pos,
    pub map: Map,
}

impl Module {
    pub fn properties(&self) -> &[Property] {
        &self.map.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.map.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,
    pub name_pos: Pos,
    /// Position of the `:` (or `=` in legacy module syntax)
    pub colon_pos: Pos,
    pub value: Expression,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    String(StringLit),
    Int64(Int64),
    Bool(Bool),
    List(List),
    Map(Map),
    Variable(Variable),
    Operator(Operator),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLit {
    pub value: String,
    pub literal_pos: Pos,
    /// Just past the closing quote in the source. Escapes and raw strings
    /// make this differ from the decoded length.
    pub end_pos: Pos,
}

impl StringLit {
    /// A string with no source text of its own
    pub fn synthesized(value: impl Into<String>, literal_pos: Pos) -> Self {
        Self {
            value: value.into(),
            literal_pos,
            end_pos: Pos::NONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Int64 {
    pub value: i64,
    pub literal_pos: Pos,
    /// Source spelling, used to compute the end position
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bool {
    pub value: bool,
    pub literal_pos: Pos,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct List {
    pub lbrace_pos: Pos,
    pub rbrace_pos: Pos,
    pub values: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Map {
    pub lbrace_pos: Pos,
    pub rbrace_pos: Pos,
    pub properties: Vec<Property>,
}

impl Map {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A reference to a previously assigned variable
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub name: String,
    pub name_pos: Pos,
    /// The value bound to the variable at the point of reference
    pub value: Box<Expression>,
}

/// A binary operator expression. Blueprint only has `+`.
#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub operator: char,
    pub operator_pos: Pos,
    pub args: Box<[Expression; 2]>,
    /// The evaluated result
    pub value: Box<Expression>,
}

impl Expression {
    /// Position of the first token of the expression
    pub fn pos(&self) -> Pos {
        match self {
            Expression::String(s) => s.literal_pos,
            Expression::Int64(i) => i.literal_pos,
            Expression::Bool(b) => b.literal_pos,
            Expression::List(l) => l.lbrace_pos,
            Expression::Map(m) => m.lbrace_pos,
            Expression::Variable(v) => v.name_pos,
            Expression::Operator(o) => o.args[0].pos(),
        }
    }

    /// Position just past the last token of the expression
    pub fn end(&self) -> Pos {
        match self {
            Expression::String(s) if !s.end_pos.is_none() => s.end_pos,
            Expression::String(s) => s.literal_pos.advance(s.value.len() + 2),
            Expression::Int64(i) => i.literal_pos.advance(i.token.len()),
            Expression::Bool(b) => b.literal_pos.advance(b.token.len()),
            Expression::List(l) => l.rbrace_pos.advance(1),
            Expression::Map(m) => m.rbrace_pos.advance(1),
            Expression::Variable(v) => v.name_pos.advance(v.name.len()),
            Expression::Operator(o) => o.args[1].end(),
        }
    }

    /// The evaluated form of this expression. Literals, lists and maps are
    /// their own value; references and operators yield what they computed.
    pub fn eval(&self) -> &Expression {
        match self {
            Expression::Variable(v) => v.value.eval(),
            Expression::Operator(o) => o.value.eval(),
            other => other,
        }
    }

    /// The evaluated string value, if this expression evaluates to a string
    pub fn eval_str(&self) -> Option<&str> {
        match self.eval() {
            Expression::String(s) => Some(&s.value),
            _ => None,
        }
    }

    pub fn set_pos(&mut self, pos: Pos) {
        match self {
            Expression::String(s) => {
                s.end_pos = s.end_pos.relocate(s.literal_pos, pos);
                s.literal_pos = pos;
            }
            Expression::Int64(i) => i.literal_pos = pos,
            Expression::Bool(b) => b.literal_pos = pos,
            Expression::List(l) => l.lbrace_pos = pos,
            Expression::Map(m) => m.lbrace_pos = pos,
            Expression::Variable(v) => v.name_pos = pos,
            Expression::Operator(o) => o.args[0].set_pos(pos),
        }
    }
}

/// A single `//` or `/* */` comment, split into raw lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub lines: Vec<String>,
    /// Position of the opening `//` or `/*`
    pub slash: Pos,
}

impl Comment {
    pub fn new(text: &str, slash: Pos) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            slash,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_line_comment(&self) -> bool {
        self.lines.first().is_some_and(|l| l.starts_with("//"))
    }

    pub fn end(&self) -> Pos {
        let text_len = self.text().len();
        Pos {
            offset: self.slash.offset + text_len,
            line: self.slash.line + self.lines.len().saturating_sub(1),
            column: self.slash.column + text_len,
        }
    }
}

/// Comments with no token and no blank line between them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
}

impl CommentGroup {
    pub fn pos(&self) -> Pos {
        self.comments.first().map_or(Pos::NONE, |c| c.slash)
    }

    pub fn end(&self) -> Pos {
        self.comments.last().map_or(Pos::NONE, Comment::end)
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// True for a group that fits on one line and holds only `/* */`
    /// comments; those can sit between two tokens without a line break.
    pub fn is_inline(&self) -> bool {
        match self.comments.first() {
            Some(first) => !first.is_line_comment() && first.lines.len() == 1,
            None => false,
        }
    }
}

/// Where a comment sits relative to the surrounding syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Anchor {
    /// On its own line, ahead of the next node
    Before,
    /// On the same line as the previous token
    Inline,
    /// On its own line with no node after it
    Standalone,
}

impl Anchor {
    /// Classify a comment starting at `comment`, given the position of the
    /// previously emitted token and of the next node, if any.
    pub fn classify(prev: Pos, comment: Pos, next: Option<Pos>) -> Self {
        if comment.line <= prev.line {
            Anchor::Inline
        } else if next.is_some() {
            Anchor::Before
        } else {
            Anchor::Standalone
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(value: &str, pos: Pos) -> Expression {
        Expression::String(StringLit::synthesized(value, pos))
    }

    #[test]
    fn test_eval_follows_variables_and_operators() {
        let list = Expression::List(List {
            lbrace_pos: Pos::new(0, 1, 1),
            rbrace_pos: Pos::new(5, 1, 6),
            values: vec![string("a", Pos::new(1, 1, 2))],
        });
        let var = Expression::Variable(Variable {
            name: "v".to_string(),
            name_pos: Pos::new(20, 2, 1),
            value: Box::new(list),
        });
        assert!(matches!(var.eval(), Expression::List(_)));
        assert_eq!(var.end(), Pos::new(21, 2, 2));
    }

    #[test]
    fn test_moving_string_moves_its_end() {
        let mut s = Expression::String(StringLit {
            value: "a\tb".to_string(),
            literal_pos: Pos::new(4, 1, 5),
            end_pos: Pos::new(10, 1, 11),
        });
        assert_eq!(s.end(), Pos::new(10, 1, 11));

        s.set_pos(Pos::new(20, 3, 9));
        assert_eq!(s.end(), Pos::new(26, 3, 15));

        s.set_pos(Pos::NONE);
        assert!(matches!(&s, Expression::String(lit) if lit.end_pos.is_none()));
    }

    #[test]
    fn test_comment_end_spans_lines() {
        let c = Comment::new("/* a\n   b */", Pos::new(10, 3, 1));
        assert_eq!(c.lines.len(), 2);
        assert_eq!(c.end().line, 4);
        assert_eq!(c.end().offset, 10 + 12);
        assert!(!c.is_line_comment());
    }

    #[test]
    fn test_inline_groups() {
        let block = CommentGroup {
            comments: vec![Comment::new("/* x */", Pos::new(0, 1, 1))],
        };
        let line = CommentGroup {
            comments: vec![Comment::new("// x", Pos::new(0, 1, 1))],
        };
        assert!(block.is_inline());
        assert!(!line.is_inline());
        assert!(!CommentGroup::default().is_inline());
        assert_eq!(CommentGroup::default().pos(), Pos::NONE);
    }

    #[test]
    fn test_anchor_classification() {
        let prev = Pos::new(10, 2, 5);
        assert_eq!(
            Anchor::classify(prev, Pos::new(12, 2, 7), Some(Pos::new(30, 3, 1))),
            Anchor::Inline
        );
        assert_eq!(
            Anchor::classify(prev, Pos::new(20, 3, 1), Some(Pos::new(30, 4, 1))),
            Anchor::Before
        );
        assert_eq!(
            Anchor::classify(prev, Pos::new(20, 3, 1), None),
            Anchor::Standalone
        );
    }
}
