//! # Calculator Lexer
//!
//! [`Lexer`] turns the bytes of one statement into [`Token`]s, one per call to
//! [`Lexer::next_token`]. Spaces and newlines between tokens are skipped. The
//! end of the text, or a NUL byte, yields [`TokenKind::End`]; once reached,
//! further calls keep returning it.
//!
//! Integer literals are at most 10 decimal digits and accumulate with
//! wrapping 32-bit arithmetic, so `4294967295` lexes as `-1`. Identifiers are
//! at most 4 characters.
use crate::error::CalcError;
use crate::token::{Name, Span, Token, TokenKind, TokenValue, is_ident_continue};

/// Maximum number of digits in an integer literal.
pub const MAX_DIGITS: usize = 10;

/// A byte-oriented lexer over a single statement.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset: just past the last token returned.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> u8 {
        self.input.get(self.pos).copied().unwrap_or(0)
    }

    fn error(&self, message: &'static str) -> CalcError {
        CalcError::Lex {
            message,
            offset: self.pos,
        }
    }

    /// Returns the next token, or a lexer error positioned at the offending
    /// byte.
    pub fn next_token(&mut self) -> Result<Token, CalcError> {
        while matches!(self.peek(), b' ' | b'\n') {
            self.pos += 1;
        }
        let start = self.pos;
        let c = self.peek();

        let (kind, value) = match c {
            0 => (TokenKind::End, TokenValue::None),
            b'0'..=b'9' => (TokenKind::Int, TokenValue::Int(self.number()?)),
            b'a'..=b'z' => (TokenKind::Ident, TokenValue::Ident(self.ident()?)),
            _ => (self.operator()?, TokenValue::None),
        };
        let token = Token::new(kind, value, Span::new(start, self.pos));
        log::trace!("token {:?} at {}..{}", token.kind, start, self.pos);
        Ok(token)
    }

    fn number(&mut self) -> Result<i32, CalcError> {
        let mut value = 0i32;
        let mut digits = 0;
        while self.peek().is_ascii_digit() {
            if digits == MAX_DIGITS {
                return Err(self.error("number literal too long"));
            }
            let d = i32::from(self.peek() - b'0');
            value = value.wrapping_mul(10).wrapping_add(d);
            digits += 1;
            self.pos += 1;
        }
        Ok(value)
    }

    fn ident(&mut self) -> Result<Name, CalcError> {
        let mut raw = [0u8; Name::MAX_LEN];
        let mut len = 0;
        while len == 0 || is_ident_continue(self.peek()) {
            if len == Name::MAX_LEN {
                return Err(self.error("identifier too long"));
            }
            raw[len] = self.peek();
            len += 1;
            self.pos += 1;
        }
        Ok(Name::from_raw(raw))
    }

    /// Punctuation and operators. Longest match wins: `>>>` over `>>` over `>`.
    fn operator(&mut self) -> Result<TokenKind, CalcError> {
        let c = self.peek();
        let kind = match c {
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b',' => TokenKind::Comma,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Asterisk,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'&' => TokenKind::Ampersand,
            b'|' => TokenKind::Pipe,
            b'^' => TokenKind::Caret,
            b'~' => TokenKind::Tilde,
            b':' | b'=' => {
                self.pos += 1;
                if self.peek() != b'=' {
                    return Err(self.error("expected '='"));
                }
                if c == b':' { TokenKind::Define } else { TokenKind::EqEq }
            }
            b'<' => {
                self.pos += 1;
                match self.peek() {
                    b'=' => TokenKind::LessEq,
                    b'<' => TokenKind::ShiftLeft,
                    b'>' => TokenKind::NotEq,
                    _ => return Ok(TokenKind::Less),
                }
            }
            b'>' => {
                self.pos += 1;
                match self.peek() {
                    b'=' => TokenKind::GreaterEq,
                    b'>' => {
                        self.pos += 1;
                        if self.peek() != b'>' {
                            return Ok(TokenKind::ShiftRight);
                        }
                        TokenKind::ShiftRightLogical
                    }
                    _ => return Ok(TokenKind::Greater),
                }
            }
            _ => return Err(self.error("invalid character")),
        };
        self.pos += 1;
        Ok(kind)
    }
}

/// Lexes a whole statement, up to and including the end token.
pub fn tokenize(input: &[u8]) -> Result<Vec<Token>, CalcError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        tokens.push(token);
        if token.kind == TokenKind::End {
            return Ok(tokens);
        }
    }
}
