//! # mincalc
//!
//! A tiny integer calculator language with user-defined functions, built
//! for hosts where every store has a fixed capacity.
//!
//! A statement is one line: an assignment (`x := 1 + 2`), a function
//! definition (`f(a, b) := a * b + x`), or an expression (`f(x, 3) >>> 1`).
//! Values are wrapping 32-bit integers. Functions see only their parameters
//! and the globals; their definitions are kept as text and parsed again on
//! every call.
//!
//! ## Overview
//!
//! - [`lexer`]: bytes to [`Token`]s,
//! - [`grammar`]: the grammar as data and its generated SLR(1) table,
//! - [`parser`]: the shift-reduce engine building trees in the [`Arena`],
//! - [`symtab`] and [`funstore`]: the fixed-capacity global stores,
//! - [`eval`]: the tree-walking evaluator,
//! - [`session`]: statement dispatch over all of the above,
//! - [`repl`]: the line-oriented driver used by the `mincalc` binary.
//!
//! ## Example
//!
//! ```rust
//! use mincalc::{CalcError, Outcome, Session};
//!
//! let mut session = Session::new();
//! session.exec("sq(n) := n * n").unwrap();
//! assert_eq!(session.exec("sq(3) + 1").unwrap(), Outcome::Value(10));
//!
//! let err = session.exec("sq(1, 2)").unwrap_err();
//! assert!(matches!(err, CalcError::Arity { expected: 1, found: 2, .. }));
//! ```
pub mod arena;
pub mod config;
pub mod error;
pub mod eval;
pub mod funstore;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod session;
pub mod symtab;
pub mod token;

pub use arena::{Arena, Node, NodeRef};
pub use config::Config;
pub use error::{CalcError, Misuse, Resource, SymbolKind};
pub use eval::Frame;
pub use funstore::{FunRef, FunStore, FunStoreError};
pub use lexer::Lexer;
pub use parser::{Parser, ParserStats};
pub use session::{Outcome, Session};
pub use symtab::{SymTab, SymTabError, VarEntry};
pub use token::{Name, Span, Token, TokenKind, TokenValue};
