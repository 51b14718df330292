//! # Calculator Tokens
//!
//! This module defines the token model shared by the lexer, the parser, and
//! the AST:
//!
//! - [`TokenKind`]: the fixed token alphabet (end-of-input, literals,
//!   identifiers, punctuation, and operators),
//! - [`TokenValue`]: the payload of a token,
//! - [`Name`]: a fixed 4-byte, zero-padded identifier,
//! - [`Span`]: the byte range a token covers within its statement,
//! - [`Token`]: the triple of the above.
//!
//! Tokens are `Copy`; AST leaves hold them by value.
use std::fmt;

/// The kind of a lexical token.
///
/// The discriminant order is also the terminal order used by the grammar
/// tables, so it must not be rearranged without regenerating them (the tables
/// are built from [`TokenKind::ALL`] at startup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TokenKind {
    End = 0,
    Int,
    Ident,
    Define,
    LeftParen,
    RightParen,
    Comma,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    ShiftLeft,
    ShiftRight,
    ShiftRightLogical,
}

impl TokenKind {
    pub const COUNT: usize = 25;

    pub const ALL: [TokenKind; Self::COUNT] = [
        TokenKind::End,
        TokenKind::Int,
        TokenKind::Ident,
        TokenKind::Define,
        TokenKind::LeftParen,
        TokenKind::RightParen,
        TokenKind::Comma,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Asterisk,
        TokenKind::Slash,
        TokenKind::Percent,
        TokenKind::Ampersand,
        TokenKind::Pipe,
        TokenKind::Caret,
        TokenKind::Tilde,
        TokenKind::EqEq,
        TokenKind::NotEq,
        TokenKind::Less,
        TokenKind::LessEq,
        TokenKind::Greater,
        TokenKind::GreaterEq,
        TokenKind::ShiftLeft,
        TokenKind::ShiftRight,
        TokenKind::ShiftRightLogical,
    ];

    /// The surface text of the token, or a descriptive label for tokens that
    /// carry a payload.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::End => "end",
            TokenKind::Int => "integer",
            TokenKind::Ident => "identifier",
            TokenKind::Define => ":=",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "<>",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::ShiftLeft => "<<",
            TokenKind::ShiftRight => ">>",
            TokenKind::ShiftRightLogical => ">>>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A variable or function name: up to four bytes, zero-padded.
///
/// Identifiers start with a lowercase letter, so the all-zero name never
/// denotes a valid identifier; the symbol table uses it to mark free slots.
/// Equality is plain byte-array equality.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name([u8; Name::MAX_LEN]);

impl Name {
    /// Maximum identifier length in bytes.
    pub const MAX_LEN: usize = 4;

    /// The all-zero name of an unused symbol-table slot.
    pub const EMPTY: Name = Name([0; Name::MAX_LEN]);

    /// Builds a name from identifier text.
    ///
    /// Returns `None` unless `s` is 1 to 4 bytes, starts with `a`-`z`, and
    /// continues with `a`-`z` or `0`-`9`.
    ///
    /// ```rust
    /// # use mincalc::Name;
    /// assert_eq!(Name::new("abcd").unwrap().as_str(), "abcd");
    /// assert!(Name::new("abcde").is_none());
    /// assert!(Name::new("1a").is_none());
    /// ```
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let (&first, rest) = bytes.split_first()?;
        if bytes.len() > Self::MAX_LEN || !first.is_ascii_lowercase() {
            return None;
        }
        if !rest.iter().all(|&b| is_ident_continue(b)) {
            return None;
        }
        let mut raw = [0; Self::MAX_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Some(Self(raw))
    }

    pub(crate) const fn from_raw(raw: [u8; Self::MAX_LEN]) -> Self {
        Self(raw)
    }

    /// Returns `true` for the all-zero name.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Length of the name without padding.
    pub fn len(&self) -> usize {
        self.0.iter().position(|&b| b == 0).unwrap_or(Self::MAX_LEN)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0[..self.len()]).unwrap_or_default()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

#[inline]
pub(crate) fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

/// A half-open byte range `[start, end)` within a statement's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The payload carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValue {
    /// No associated data (punctuation, operators, end-of-input).
    None,

    /// Integer literal.
    Int(i32),

    /// Identifier.
    Ident(Name),
}

/// A lexical token: its kind, payload, and position in the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, span: Span) -> Self {
        Self { kind, value, span }
    }

    /// The identifier carried by this token, if any.
    pub fn name(&self) -> Option<Name> {
        match self.value {
            TokenValue::Ident(name) => Some(name),
            _ => None,
        }
    }
}
