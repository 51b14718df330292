//! # Session
//!
//! A [`Session`] owns everything one interpreter instance needs: the symbol
//! table, the function store, the AST arena, and the parser. Sessions are
//! independent of each other.
//!
//! Each call to [`Session::exec`] runs one statement to completion. Statements
//! containing `:=` are parsed as assignments or function definitions, all
//! others as expressions. Whatever the outcome, the arena is cleared before
//! `exec` returns; the symbol table and function store keep everything they
//! were given.
use crate::arena::{Arena, Node};
use crate::config::Config;
use crate::error::CalcError;
use crate::eval::Frame;
use crate::funstore::FunStore;
use crate::grammar::{Rule, Start};
use crate::lexer::Lexer;
use crate::parser::{Parser, ParserStats, skip_chain};
use crate::symtab::SymTab;
use crate::token::{Name, TokenKind};

/// What a successfully executed statement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line.
    Empty,
    /// An expression was evaluated.
    Value(i32),
    /// `name := expr` stored a value.
    Assigned { name: Name, value: i32 },
    /// `name(params) := expr` stored a definition.
    Defined { name: Name },
}

impl Outcome {
    /// The value to show the user, if any.
    pub fn value(&self) -> Option<i32> {
        match self {
            Outcome::Value(value) | Outcome::Assigned { value, .. } => Some(*value),
            Outcome::Empty | Outcome::Defined { .. } => None,
        }
    }
}

/// An interpreter instance.
///
/// ```rust
/// # use mincalc::{Outcome, Session};
/// let mut session = Session::new();
/// session.exec("sq(n) := n*n").unwrap();
/// session.exec("x := 7").unwrap();
/// assert_eq!(session.exec("sq(x) + 1").unwrap(), Outcome::Value(50));
/// ```
#[derive(Debug)]
pub struct Session {
    config: Config,
    pub(crate) vars: SymTab,
    pub(crate) funs: FunStore,
    pub(crate) arena: Arena,
    pub(crate) parser: Parser,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with the default capacities.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        log::debug!("new session: {:?}", config);
        Self {
            config,
            vars: SymTab::with_capacity(config.var_slots),
            funs: FunStore::with_capacity(config.fundef_bytes),
            arena: Arena::with_capacity(config.tree_nodes),
            parser: Parser::new(config.parser_stack),
        }
    }

    /// Executes one statement.
    ///
    /// An error aborts only this statement. Lexer and parser errors carry
    /// the offset within `line` at which processing stopped.
    pub fn exec(&mut self, line: &str) -> Result<Outcome, CalcError> {
        self.exec_bytes(line.as_bytes())
    }

    /// Executes one statement given as raw bytes. Bytes outside the
    /// language's character set are reported as lexer errors.
    pub fn exec_bytes(&mut self, line: &[u8]) -> Result<Outcome, CalcError> {
        let result = self.dispatch(line);
        match &result {
            Ok(outcome) => log::debug!("{:?}: {} tree nodes used", outcome, self.arena.len()),
            Err(e) => log::debug!("statement failed: {}", e),
        }
        self.arena.clear();
        result
    }

    fn dispatch(&mut self, text: &[u8]) -> Result<Outcome, CalcError> {
        if Lexer::new(text).next_token()?.kind == TokenKind::End {
            return Ok(Outcome::Empty);
        }
        let start = Start::for_text(text);
        let root = self.parser.parse(&mut self.arena, text, start)?;
        match start {
            Start::Expr => Ok(Outcome::Value(self.eval(root, &Frame::global())?)),
            Start::SetVar => self.set_var(root, text),
        }
    }

    /// Handles an accepted assignment or function definition.
    fn set_var(&mut self, root: Node, text: &[u8]) -> Result<Outcome, CalcError> {
        match skip_chain(&self.arena, root)? {
            Node::Branch {
                rule: Rule::Assign,
                child1,
                child2,
            } => {
                let name = self.ident(child1)?;
                let value = self.eval(self.node(child2)?, &Frame::global())?;
                let entry = self.vars.get_or_create(name)?;
                entry.value = value;
                entry.fun = None;
                log::debug!("{} := {}", name, value);
                Ok(Outcome::Assigned { name, value })
            }
            Node::Branch {
                rule: Rule::FunDef,
                child1,
                ..
            } => {
                let (name, params) = self.fun_head(child1)?;
                let fun = self.funs.append(text)?;
                let entry = self.vars.get_or_create(name).inspect_err(|_| {
                    log::warn!("`{}` not bound; its definition text stays in the store", name);
                })?;
                entry.fun = Some(fun);
                log::debug!(
                    "defined {}/{} at offset {} ({} of {} bytes used)",
                    name,
                    params.len(),
                    fun.offset(),
                    self.funs.used(),
                    self.funs.capacity()
                );
                Ok(Outcome::Defined { name })
            }
            _ => Err(CalcError::internal("unexpected set-variable statement")),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The global symbol table.
    pub fn vars(&self) -> &SymTab {
        &self.vars
    }

    pub fn funs(&self) -> &FunStore {
        &self.funs
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn parser_stats(&self) -> ParserStats {
        self.parser.stats()
    }

    /// The value of global variable `name`, if it exists and is not a
    /// function.
    pub fn value(&self, name: &str) -> Option<i32> {
        let entry = self.vars.lookup(Name::new(name)?)?;
        (!entry.is_function()).then_some(entry.value)
    }

    /// The stored definition text of function `name`.
    pub fn definition(&self, name: &str) -> Option<&str> {
        let fun = self.vars.lookup(Name::new(name)?)?.fun?;
        std::str::from_utf8(self.funs.get(fun)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Misuse, Resource, SymbolKind};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn value(session: &mut Session, line: &str) -> i32 {
        match session.exec(line) {
            Ok(Outcome::Value(v)) => v,
            other => panic!("{line:?}: expected a value, got {other:?}"),
        }
    }

    #[test]
    fn empty_lines_are_no_ops() {
        init_logger();
        let mut s = Session::new();
        assert_eq!(s.exec(""), Ok(Outcome::Empty));
        assert_eq!(s.exec("   "), Ok(Outcome::Empty));
        assert_eq!(s.exec("\n"), Ok(Outcome::Empty));
        assert!(s.vars().is_empty());
    }

    #[test]
    fn assignment_outcome_and_value() {
        init_logger();
        let mut s = Session::new();
        let x = Name::new("x").unwrap();
        assert_eq!(s.exec("x := 2+3"), Ok(Outcome::Assigned { name: x, value: 5 }));
        assert_eq!(s.value("x"), Some(5));
        assert_eq!(value(&mut s, "x*x"), 25);
    }

    #[test]
    fn failed_assignment_creates_nothing() {
        let mut s = Session::new();
        assert_eq!(
            s.exec("y := z"),
            Err(CalcError::Undefined {
                kind: SymbolKind::Variable,
                name: Name::new("z").unwrap()
            })
        );
        assert!(s.vars().lookup(Name::new("y").unwrap()).is_none());
    }

    #[test]
    fn self_reference_in_assignment_needs_prior_value() {
        let mut s = Session::new();
        assert!(s.exec("n := n + 1").is_err());
        s.exec("n := 1").unwrap();
        s.exec("n := n + 1").unwrap();
        assert_eq!(s.value("n"), Some(2));
    }

    #[test]
    fn definition_stores_whole_statement() {
        let mut s = Session::new();
        let f = Name::new("f").unwrap();
        assert_eq!(s.exec("f(a, b) := a - b"), Ok(Outcome::Defined { name: f }));
        assert_eq!(s.definition("f"), Some("f(a, b) := a - b"));
        assert_eq!(s.funs().used(), "f(a, b) := a - b".len() + 1);
        assert_eq!(value(&mut s, "f(10, 3)"), 7);
    }

    #[test]
    fn names_flip_between_value_and_function() {
        let mut s = Session::new();
        s.exec("g() := 4").unwrap();
        let g = Name::new("g").unwrap();
        assert_eq!(
            s.exec("g + 1"),
            Err(CalcError::Type {
                misuse: Misuse::FunctionAsValue,
                name: g
            })
        );
        s.exec("g := 9").unwrap();
        assert_eq!(value(&mut s, "g"), 9);
        assert_eq!(
            s.exec("g()"),
            Err(CalcError::Type {
                misuse: Misuse::ValueAsFunction,
                name: g
            })
        );
        s.exec("g() := 5").unwrap();
        assert_eq!(value(&mut s, "g()"), 5);
        assert_eq!(s.value("g"), None);
    }

    #[test]
    fn arena_is_cleared_after_every_statement() {
        let mut s = Session::new();
        s.exec("1+2*3").unwrap();
        assert!(s.arena().is_empty());
        assert!(s.exec("1 +").is_err());
        assert!(s.arena().is_empty());
        assert!(s.arena().high_water() > 0);
        assert!(s.parser_stats().tokens > 0);
    }

    #[test]
    fn failed_definition_keeps_previous_one() {
        let cfg = Config {
            fundef_bytes: 16,
            ..Config::default()
        };
        let mut s = Session::with_config(cfg);
        s.exec("f(a) := a+1").unwrap();
        assert_eq!(
            s.exec("f(a) := a+2"),
            Err(CalcError::Exhausted(Resource::FunctionDefinitions))
        );
        assert_eq!(value(&mut s, "f(1)"), 2);
    }

    #[test]
    fn definition_without_variable_space_leaks_text() {
        let cfg = Config {
            var_slots: 1,
            ..Config::default()
        };
        let mut s = Session::with_config(cfg);
        s.exec("x := 1").unwrap();
        assert_eq!(
            s.exec("f() := 1"),
            Err(CalcError::Exhausted(Resource::Variables))
        );
        assert_eq!(s.funs().used(), "f() := 1".len() + 1);
        assert_eq!(s.value("x"), Some(1));
    }

    #[test]
    fn non_ascii_bytes_are_lexer_errors() {
        let mut s = Session::new();
        assert_eq!(
            s.exec_bytes(b"1 + \xff"),
            Err(CalcError::Lex {
                message: "invalid character",
                offset: 4
            })
        );
        assert_eq!(s.exec_bytes(b"x := 3"), Ok(Outcome::Assigned { name: Name::new("x").unwrap(), value: 3 }));
        assert!(s.arena().is_empty());
    }

    #[test]
    fn config_is_applied() {
        let cfg = Config {
            var_slots: 3,
            fundef_bytes: 10,
            tree_nodes: 20,
            parser_stack: 30,
        };
        let s = Session::with_config(cfg);
        assert_eq!(s.config(), &cfg);
        assert_eq!(s.vars().capacity(), 3);
        assert_eq!(s.funs().capacity(), 10);
        assert_eq!(s.arena().capacity(), 20);
    }
}
