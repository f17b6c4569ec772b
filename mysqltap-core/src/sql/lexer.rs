//! Greedy single-pass SQL tokenizer.
//!
//! The lexer never fails: an unterminated string or comment is returned as
//! a best-effort token running to the end of input, and the problem is
//! recorded as a [`LexError`].

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Words lexed as keywords (matched case-insensitively, emitted upper-cased).
pub const KEYWORDS: &[&str] = &[
    "select", "count", "from", "where", "and", "or", "insert", "update", "concat", "if",
    "as", "left", "join", "inner", "outer", "on", "like", "limit", "distinct", "set",
    "autocommit", "ignore", "into", "ifnull", "rollback", "begin", "commit", "delete",
    "replace", "min", "max", "date_sub", "asc", "values", "in", "now", "unix_timestamp",
    "order", "duplicate", "current_timestamp", "by", "group", "key", "desc", "interval",
    "rand", "day", "hour", "using", "found_rows", "sql_calc_found_rows", "from_unixtime",
    "between", "for", "minute", "offset", "second", "show", "full", "processlist",
];

/// Whether `word` is a keyword, ignoring ASCII case.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKind {
    Keyword,
    /// Identifier, bare or backtick-quoted.
    Token,
    Number,
    String,
    Comment,
    Symbol,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Token => "token",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::Symbol => "symbol",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: CompactString,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<CompactString>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated {quote} string starting at byte {start}")]
    UnterminatedString { start: usize, quote: char },

    #[error("unterminated comment starting at byte {start}")]
    UnterminatedComment { start: usize },
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_word_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn is_number_continue(b: u8) -> bool {
    b.is_ascii_digit() || b == b'.'
}

/// Iterator over the tokens of a SQL string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Problems found so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn word(&mut self, start: usize) -> Token {
        self.take_while(is_word_continue);
        let word = &self.src[start..self.pos];
        if is_keyword(word) {
            Token::new(TokenKind::Keyword, word.to_ascii_uppercase())
        } else {
            Token::new(TokenKind::Token, word)
        }
    }

    fn comment(&mut self, start: usize) -> Token {
        match self.src[self.pos..].find("*/") {
            Some(offset) => self.pos += offset + 2,
            None => {
                self.pos = self.src.len();
                self.errors.push(LexError::UnterminatedComment { start });
            }
        }
        Token::new(TokenKind::Comment, &self.src[start..self.pos])
    }

    fn quoted(&mut self, start: usize, quote: u8) -> Token {
        let bytes = self.src.as_bytes();
        let mut terminated = false;
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            self.pos += 1;
            if b == b'\\' {
                // Skip the escaped byte; a multi-byte character continues
                // with non-ASCII bytes that never match a quote.
                if self.pos < bytes.len() {
                    self.pos += 1;
                }
            } else if b == quote {
                terminated = true;
                break;
            }
        }

        if !terminated {
            self.errors.push(LexError::UnterminatedString {
                start,
                quote: quote as char,
            });
        }

        let kind = if quote == b'`' {
            TokenKind::Token
        } else {
            TokenKind::String
        };
        Token::new(kind, &self.src[start..self.pos])
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let b = self.peek()?;
            let start = self.pos;
            self.pos += 1;

            if is_whitespace(b) {
                continue;
            }
            if b.is_ascii_alphabetic() {
                return Some(self.word(start));
            }
            if b.is_ascii_digit() {
                self.take_while(is_number_continue);
                return Some(Token::new(TokenKind::Number, &self.src[start..self.pos]));
            }
            if b.is_ascii_punctuation() {
                let next = self.peek();
                return Some(match (b, next) {
                    (b'/', Some(b'*')) => {
                        self.pos += 1;
                        self.comment(start)
                    }
                    (b'\'' | b'"' | b'`', _) => self.quoted(start, b),
                    (b'!', Some(b'=')) => {
                        self.pos += 1;
                        Token::new(TokenKind::Symbol, "!=")
                    }
                    _ => Token::new(TokenKind::Symbol, &self.src[start..self.pos]),
                });
            }
            // Control and non-ASCII bytes outside literals are dropped.
        }
    }
}

/// Tokenize a whole statement.
pub fn tokenize(sql: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(sql);
    let tokens = lexer.by_ref().collect();
    (tokens, lexer.into_errors())
}
