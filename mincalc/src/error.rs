//! # Calculator Error Type
//!
//! This module defines [`CalcError`], the single error surface of the
//! calculator pipeline. Every failure of a statement, from lexing through
//! evaluation, is reported as one of its variants:
//!
//! - **Lexing** ([`CalcError::Lex`]) and **parsing** ([`CalcError::Parse`]),
//!   both carrying the byte offset at which processing stopped,
//! - **Name resolution** ([`CalcError::Undefined`], [`CalcError::Type`]),
//! - **Calls** ([`CalcError::Arity`]),
//! - **Bounded storage** ([`CalcError::Exhausted`]),
//! - **Arithmetic** ([`CalcError::Arithmetic`]),
//! - **Broken internal invariants** ([`CalcError::Internal`]).
//!
//! Store-specific errors ([`SymTabError`], [`FunStoreError`]) convert into
//! [`CalcError::Exhausted`] so `?` can be used at call sites.
use crate::funstore::FunStoreError;
use crate::symtab::SymTabError;
use crate::token::Name;
use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// A bounded resource that can run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Symbol-table slots.
    Variables,
    /// Function-definition text storage.
    FunctionDefinitions,
    /// AST arena nodes.
    TreeMemory,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Variables => "out of variable space",
            Resource::FunctionDefinitions => "out of function-definition space",
            Resource::TreeMemory => "out of tree memory",
        })
    }
}

/// What a name was expected to denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
        })
    }
}

/// How a symbol was misused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Misuse {
    /// A name bound to a function was read as a value.
    FunctionAsValue,
    /// A name bound to a plain value was called.
    ValueAsFunction,
}

impl fmt::Display for Misuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Misuse::FunctionAsValue => "function used as value",
            Misuse::ValueAsFunction => "value used as function",
        })
    }
}

/// Represents all possible errors that can occur within the calculator.
///
/// # Examples
/// ```rust
/// # use mincalc::{CalcError, Resource};
/// let err = CalcError::Exhausted(Resource::Variables);
/// assert_eq!(err.to_string(), "out of variable space");
/// assert_eq!(err.offset(), None);
///
/// let err = CalcError::Lex { message: "invalid character", offset: 3 };
/// assert_eq!(err.offset(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Malformed token.
    #[error("lexer error: {message}")]
    Lex { message: &'static str, offset: usize },

    /// Token sequence not accepted by the grammar.
    #[error("parser error: {message}")]
    Parse { message: String, offset: usize },

    /// A name that is not in the symbol table (and not a parameter in scope).
    #[error("undefined {kind} `{name}`")]
    Undefined { kind: SymbolKind, name: Name },

    /// A variable used as a function, or a function used as a value.
    #[error("type error: {misuse} `{name}`")]
    Type { misuse: Misuse, name: Name },

    /// Call argument count differs from the definition's parameter count.
    #[error("arity error: `{name}` takes {expected} argument(s), {found} given")]
    Arity { name: Name, expected: usize, found: usize },

    /// A bounded store is full.
    #[error("{0}")]
    Exhausted(Resource),

    /// Division or remainder by zero, or a shift amount outside `0..32`.
    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    /// An internal invariant did not hold.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl CalcError {
    /// Byte offset within the statement text at which lexing or parsing
    /// stopped. Only lexer and parser errors carry one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CalcError::Lex { offset, .. } | CalcError::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        CalcError::Parse {
            message: message.into(),
            offset,
        }
    }

    /// Reports a broken internal invariant. Debug builds stop right here.
    pub(crate) fn internal(message: &'static str) -> Self {
        debug_assert!(false, "internal error: {message}");
        log::error!("internal error: {}", message);
        CalcError::Internal(message)
    }
}

impl From<SymTabError> for CalcError {
    fn from(e: SymTabError) -> Self {
        match e {
            SymTabError::Full { .. } => CalcError::Exhausted(Resource::Variables),
        }
    }
}

impl From<FunStoreError> for CalcError {
    fn from(e: FunStoreError) -> Self {
        match e {
            FunStoreError::Full { .. } => CalcError::Exhausted(Resource::FunctionDefinitions),
        }
    }
}
