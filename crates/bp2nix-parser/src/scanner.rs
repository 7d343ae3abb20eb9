//! Tokenizer for Blueprint source
//!
//! Comments are returned as tokens so the parser can group them and keep
//! their positions; whitespace is skipped.

use crate::error::ParseError;
use bp2nix_core::Pos;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    /// Decimal digits as written
    Int(String),
    /// Decoded string literal value
    String(String),
    /// Raw comment text including the `//` or `/* */` markers
    Comment(String),
    /// Single-character punctuation: `{ } [ ] ( ) : , = + -`
    Char(char),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Int(s) => write!(f, "{}", s),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Comment(_) => write!(f, "comment"),
            Token::Char(c) => write!(f, "\"{}\"", c),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

pub struct Scanner<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Position of the next unread character
    pub fn pos(&self) -> Pos {
        Pos::new(self.offset, self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n')) {
            self.bump();
        }
    }

    fn is_ident_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_ident_cont(c: char) -> bool {
        Self::is_ident_start(c) || c.is_ascii_digit()
    }

    /// Scan the next token and the position of its first character
    pub fn scan(&mut self) -> Result<(Token, Pos), ParseError> {
        self.skip_whitespace();
        let pos = self.pos();
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok((Token::Eof, pos)),
        };

        let token = match c {
            '/' => match self.peek_second() {
                Some('/') => self.scan_line_comment(),
                Some('*') => self.scan_block_comment(pos)?,
                _ => return Err(ParseError::new(pos, "unexpected \"/\"")),
            },
            '"' => Token::String(self.scan_string(pos)?),
            '`' => Token::String(self.scan_raw_string(pos)?),
            c if Self::is_ident_start(c) => Token::Ident(self.take_while(Self::is_ident_cont)),
            c if c.is_ascii_digit() => Token::Int(self.take_while(|c| c.is_ascii_digit())),
            '{' | '}' | '[' | ']' | '(' | ')' | ':' | ',' | '=' | '+' | '-' => {
                self.bump();
                Token::Char(c)
            }
            other => {
                return Err(ParseError::new(
                    pos,
                    format!("invalid character {:?}", other),
                ))
            }
        };
        Ok((token, pos))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.offset;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.src[start..self.offset].to_string()
    }

    fn scan_line_comment(&mut self) -> Token {
        let start = self.offset;
        while self.peek().is_some_and(|c| c != '\n') {
            self.bump();
        }
        Token::Comment(self.src[start..self.offset].to_string())
    }

    fn scan_block_comment(&mut self, pos: Pos) -> Result<Token, ParseError> {
        let start = self.offset;
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(Token::Comment(self.src[start..self.offset].to_string()));
                }
                Some(_) => {}
                None => return Err(ParseError::new(pos, "comment not terminated")),
            }
        }
    }

    fn scan_string(&mut self, pos: Pos) -> Result<String, ParseError> {
        self.bump();
        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some('\n') | None => return Err(ParseError::new(pos, "literal not terminated")),
                Some(c) => c,
            };
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let escape_pos = self.pos();
                    self.scan_escape(&mut out, escape_pos)?;
                }
                c => out.push(c),
            }
        }
    }

    fn scan_escape(&mut self, out: &mut String, pos: Pos) -> Result<(), ParseError> {
        let c = self
            .bump()
            .ok_or_else(|| ParseError::new(pos, "literal not terminated"))?;
        let decoded = match c {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => self.scan_code_point(2, 16, pos)?,
            'u' => self.scan_code_point(4, 16, pos)?,
            'U' => self.scan_code_point(8, 16, pos)?,
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    let digit = self
                        .bump()
                        .and_then(|d| d.to_digit(8))
                        .ok_or_else(|| ParseError::new(pos, "invalid octal escape"))?;
                    value = value * 8 + digit;
                }
                char::from_u32(value).ok_or_else(|| ParseError::new(pos, "invalid octal escape"))?
            }
            other => {
                return Err(ParseError::new(
                    pos,
                    format!("unknown escape sequence \\{}", other),
                ))
            }
        };
        out.push(decoded);
        Ok(())
    }

    fn scan_code_point(&mut self, digits: usize, radix: u32, pos: Pos) -> Result<char, ParseError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|d| d.to_digit(radix))
                .ok_or_else(|| ParseError::new(pos, "invalid hex escape"))?;
            value = value * radix + digit;
        }
        char::from_u32(value).ok_or_else(|| ParseError::new(pos, "escape is not a valid code point"))
    }

    fn scan_raw_string(&mut self, pos: Pos) -> Result<String, ParseError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(out),
                Some('\r') => {}
                Some(c) => out.push(c),
                None => return Err(ParseError::new(pos, "literal not terminated")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<(Token, Pos)> {
        let mut scanner = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, pos) = scanner.scan().unwrap();
            if tok == Token::Eof {
                break;
            }
            out.push((tok, pos));
        }
        out
    }

    #[test]
    fn test_positions_are_one_based() {
        let toks = tokens("foo {\n  srcs: [\"a.c\"],\n}");
        assert_eq!(toks[0], (Token::Ident("foo".into()), Pos::new(0, 1, 1)));
        assert_eq!(toks[1], (Token::Char('{'), Pos::new(4, 1, 5)));
        assert_eq!(toks[2], (Token::Ident("srcs".into()), Pos::new(8, 2, 3)));
        assert_eq!(toks[5].0, Token::String("a.c".into()));
    }

    #[test]
    fn test_comments_are_tokens() {
        let toks = tokens("// one\n/* two\n three */ x");
        assert_eq!(toks[0].0, Token::Comment("// one".into()));
        assert_eq!(toks[1].0, Token::Comment("/* two\n three */".into()));
        assert_eq!(toks[1].1.line, 2);
        assert_eq!(toks[2], (Token::Ident("x".into()), Pos::new(24, 3, 11)));
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(r#""a\tb\n\"c\"\x41é\101""#);
        assert_eq!(toks[0].0, Token::String("a\tb\n\"c\"A\u{e9}A".into()));
    }

    #[test]
    fn test_raw_string() {
        let toks = tokens("`a\\b\r\nc`");
        assert_eq!(toks[0].0, Token::String("a\\b\nc".into()));
    }

    #[test]
    fn test_unterminated_literal() {
        let err = Scanner::new("\"abc\nfoo").scan().unwrap_err();
        assert_eq!(err.message, "literal not terminated");
        assert_eq!(err.pos, Pos::new(0, 1, 1));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Scanner::new("/* abc").scan().unwrap_err();
        assert_eq!(err.message, "comment not terminated");
    }

    #[test]
    fn test_invalid_character() {
        let err = Scanner::new("  @").scan().unwrap_err();
        assert_eq!(err.pos, Pos::new(2, 1, 3));
    }
}
