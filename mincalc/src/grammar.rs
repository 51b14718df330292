//! # Calculator Grammar
//!
//! The grammar is data: [`RULES`] lists every production together with the
//! right-hand-side positions whose subtrees become the children of the
//! reduced node. The SLR(1) table is generated from it by `mincalc-gen` the
//! first time the parser needs it.
//!
//! Two start productions share one automaton. Statements containing `:=`
//! begin in the set-variable start state, which accepts only assignments and
//! function definitions; all other statements begin in the expression start
//! state.
//!
//! ```text
//! SetVarStmt  -> SetVar
//! SetVar      -> Assign | FunDef
//! Assign      -> id := Or
//! FunDef      -> FunHead := Or
//! FunHead     -> id ( IdListOpt )
//! ExprStmt    -> Or
//! Or          -> Or | Xor       | Xor
//! Xor         -> Xor ^ And      | And
//! And         -> And & Equality | Equality
//! Equality    -> Equality (== | <>) Relation | Relation
//! Relation    -> Relation (< | <= | > | >=) Shift | Shift
//! Shift       -> Shift (<< | >> | >>>) Additive | Additive
//! Additive    -> Additive (+ | -) Multiplicative | Multiplicative
//! Multiplicative -> Multiplicative (* | / | %) Unary | Unary
//! Unary       -> (~ | + | -) Unary | Term
//! Term        -> int | id | FunCall | ( Or )
//! FunCall     -> id ( ArgListOpt )
//! IdListOpt   -> <empty> | IdList
//! IdList      -> id | id , IdList
//! ArgListOpt  -> <empty> | ArgList
//! ArgList     -> Or | Or , ArgList
//! ```
use crate::token::TokenKind;
use anyhow::{Context, Result, anyhow};
use mincalc_gen::{Action, Grammar, Table};
use once_cell::sync::Lazy;
use std::io::Write;

/// Nonterminal symbols. Their discriminants are the nonterminal indices of
/// the generated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerm {
    SetVarStart,
    ExprStart,
    SetVarStmt,
    ExprStmt,
    SetVar,
    Assign,
    FunDef,
    FunHead,
    Or,
    Xor,
    And,
    Equality,
    Relation,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Term,
    FunCall,
    IdListOpt,
    IdList,
    ArgListOpt,
    ArgList,
}

impl NonTerm {
    pub const COUNT: usize = 23;

    pub const ALL: [NonTerm; Self::COUNT] = [
        NonTerm::SetVarStart,
        NonTerm::ExprStart,
        NonTerm::SetVarStmt,
        NonTerm::ExprStmt,
        NonTerm::SetVar,
        NonTerm::Assign,
        NonTerm::FunDef,
        NonTerm::FunHead,
        NonTerm::Or,
        NonTerm::Xor,
        NonTerm::And,
        NonTerm::Equality,
        NonTerm::Relation,
        NonTerm::Shift,
        NonTerm::Additive,
        NonTerm::Multiplicative,
        NonTerm::Unary,
        NonTerm::Term,
        NonTerm::FunCall,
        NonTerm::IdListOpt,
        NonTerm::IdList,
        NonTerm::ArgListOpt,
        NonTerm::ArgList,
    ];
}

/// A grammar symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sym {
    N(NonTerm),
    T(TokenKind),
}

impl Sym {
    /// Dense index: nonterminals first, then terminals in [`TokenKind`] order.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Sym::N(n) => n as usize,
            Sym::T(t) => NonTerm::COUNT + t as usize,
        }
    }
}

/// Grammar rules. A rule's discriminant is its production index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    StartSetVar,
    StartExpr,
    StmtSetVar,
    StmtExpr,
    SetVarAssign,
    SetVarFunDef,
    Assign,
    FunDef,
    FunHead,
    ExprOr,
    BitOr,
    ExprXor,
    BitXor,
    ExprAnd,
    BitAnd,
    ExprEquality,
    Eq,
    Ne,
    ExprRelation,
    Lt,
    Le,
    Gt,
    Ge,
    ExprShift,
    Shl,
    Shr,
    Ushr,
    ExprAdditive,
    Add,
    Sub,
    ExprMultiplicative,
    Mul,
    Div,
    Rem,
    ExprUnary,
    Not,
    Pos,
    Neg,
    TermInt,
    TermIdent,
    TermCall,
    TermGroup,
    FunCall,
    IdListEmpty,
    IdListSome,
    IdListLast,
    IdListCons,
    ArgListEmpty,
    ArgListSome,
    ArgListLast,
    ArgListCons,
}

impl Rule {
    pub const COUNT: usize = 51;

    #[inline]
    pub fn def(self) -> &'static RuleDef {
        &RULES[self as usize]
    }

    /// Rules whose node only forwards its single child: statement wrappers,
    /// precedence-level fall-throughs, terms, and parenthesized groups.
    pub fn is_chain(self) -> bool {
        matches!(
            self,
            Rule::StmtSetVar
                | Rule::StmtExpr
                | Rule::SetVarAssign
                | Rule::SetVarFunDef
                | Rule::ExprOr
                | Rule::ExprXor
                | Rule::ExprAnd
                | Rule::ExprEquality
                | Rule::ExprRelation
                | Rule::ExprShift
                | Rule::ExprAdditive
                | Rule::ExprMultiplicative
                | Rule::ExprUnary
                | Rule::TermInt
                | Rule::TermIdent
                | Rule::TermCall
                | Rule::TermGroup
        )
    }

    /// Right-hand-side position of the first retained child.
    pub fn child1(self) -> Option<usize> {
        self.def().children.first().copied()
    }

    /// Right-hand-side position of the second retained child.
    pub fn child2(self) -> Option<usize> {
        self.def().children.get(1).copied()
    }
}

/// One production: `lhs -> rhs`, keeping the subtrees at `children`.
#[derive(Debug)]
pub struct RuleDef {
    pub rule: Rule,
    pub lhs: NonTerm,
    pub rhs: &'static [Sym],
    pub children: &'static [usize],
}

macro_rules! rules {
    ($($rule:ident : $lhs:ident -> [$($sym:expr),*] keep [$($c:literal),*];)*) => {
        [$(RuleDef {
            rule: Rule::$rule,
            lhs: NonTerm::$lhs,
            rhs: &[$($sym),*],
            children: &[$($c),*],
        },)*]
    };
}

use self::Sym::{N, T};
use NonTerm as Nt;
use TokenKind as Tk;

/// All productions, indexed by [`Rule`].
pub static RULES: [RuleDef; Rule::COUNT] = rules! {
    StartSetVar: SetVarStart -> [N(Nt::SetVarStmt)] keep [];
    StartExpr: ExprStart -> [N(Nt::ExprStmt)] keep [];
    StmtSetVar: SetVarStmt -> [N(Nt::SetVar)] keep [0];
    StmtExpr: ExprStmt -> [N(Nt::Or)] keep [0];
    SetVarAssign: SetVar -> [N(Nt::Assign)] keep [0];
    SetVarFunDef: SetVar -> [N(Nt::FunDef)] keep [0];
    Assign: Assign -> [T(Tk::Ident), T(Tk::Define), N(Nt::Or)] keep [0, 2];
    FunDef: FunDef -> [N(Nt::FunHead), T(Tk::Define), N(Nt::Or)] keep [0, 2];
    FunHead: FunHead -> [T(Tk::Ident), T(Tk::LeftParen), N(Nt::IdListOpt), T(Tk::RightParen)] keep [0, 2];
    ExprOr: Or -> [N(Nt::Xor)] keep [0];
    BitOr: Or -> [N(Nt::Or), T(Tk::Pipe), N(Nt::Xor)] keep [0, 2];
    ExprXor: Xor -> [N(Nt::And)] keep [0];
    BitXor: Xor -> [N(Nt::Xor), T(Tk::Caret), N(Nt::And)] keep [0, 2];
    ExprAnd: And -> [N(Nt::Equality)] keep [0];
    BitAnd: And -> [N(Nt::And), T(Tk::Ampersand), N(Nt::Equality)] keep [0, 2];
    ExprEquality: Equality -> [N(Nt::Relation)] keep [0];
    Eq: Equality -> [N(Nt::Equality), T(Tk::EqEq), N(Nt::Relation)] keep [0, 2];
    Ne: Equality -> [N(Nt::Equality), T(Tk::NotEq), N(Nt::Relation)] keep [0, 2];
    ExprRelation: Relation -> [N(Nt::Shift)] keep [0];
    Lt: Relation -> [N(Nt::Relation), T(Tk::Less), N(Nt::Shift)] keep [0, 2];
    Le: Relation -> [N(Nt::Relation), T(Tk::LessEq), N(Nt::Shift)] keep [0, 2];
    Gt: Relation -> [N(Nt::Relation), T(Tk::Greater), N(Nt::Shift)] keep [0, 2];
    Ge: Relation -> [N(Nt::Relation), T(Tk::GreaterEq), N(Nt::Shift)] keep [0, 2];
    ExprShift: Shift -> [N(Nt::Additive)] keep [0];
    Shl: Shift -> [N(Nt::Shift), T(Tk::ShiftLeft), N(Nt::Additive)] keep [0, 2];
    Shr: Shift -> [N(Nt::Shift), T(Tk::ShiftRight), N(Nt::Additive)] keep [0, 2];
    Ushr: Shift -> [N(Nt::Shift), T(Tk::ShiftRightLogical), N(Nt::Additive)] keep [0, 2];
    ExprAdditive: Additive -> [N(Nt::Multiplicative)] keep [0];
    Add: Additive -> [N(Nt::Additive), T(Tk::Plus), N(Nt::Multiplicative)] keep [0, 2];
    Sub: Additive -> [N(Nt::Additive), T(Tk::Minus), N(Nt::Multiplicative)] keep [0, 2];
    ExprMultiplicative: Multiplicative -> [N(Nt::Unary)] keep [0];
    Mul: Multiplicative -> [N(Nt::Multiplicative), T(Tk::Asterisk), N(Nt::Unary)] keep [0, 2];
    Div: Multiplicative -> [N(Nt::Multiplicative), T(Tk::Slash), N(Nt::Unary)] keep [0, 2];
    Rem: Multiplicative -> [N(Nt::Multiplicative), T(Tk::Percent), N(Nt::Unary)] keep [0, 2];
    ExprUnary: Unary -> [N(Nt::Term)] keep [0];
    Not: Unary -> [T(Tk::Tilde), N(Nt::Unary)] keep [1];
    Pos: Unary -> [T(Tk::Plus), N(Nt::Unary)] keep [1];
    Neg: Unary -> [T(Tk::Minus), N(Nt::Unary)] keep [1];
    TermInt: Term -> [T(Tk::Int)] keep [0];
    TermIdent: Term -> [T(Tk::Ident)] keep [0];
    TermCall: Term -> [N(Nt::FunCall)] keep [0];
    TermGroup: Term -> [T(Tk::LeftParen), N(Nt::Or), T(Tk::RightParen)] keep [1];
    FunCall: FunCall -> [T(Tk::Ident), T(Tk::LeftParen), N(Nt::ArgListOpt), T(Tk::RightParen)] keep [0, 2];
    IdListEmpty: IdListOpt -> [] keep [];
    IdListSome: IdListOpt -> [N(Nt::IdList)] keep [0];
    IdListLast: IdList -> [T(Tk::Ident)] keep [0];
    IdListCons: IdList -> [T(Tk::Ident), T(Tk::Comma), N(Nt::IdList)] keep [0, 2];
    ArgListEmpty: ArgListOpt -> [] keep [];
    ArgListSome: ArgListOpt -> [N(Nt::ArgList)] keep [0];
    ArgListLast: ArgList -> [N(Nt::Or)] keep [0];
    ArgListCons: ArgList -> [N(Nt::Or), T(Tk::Comma), N(Nt::ArgList)] keep [0, 2];
};

/// Symbol names as they appear in grammar reports.
fn symbol_names() -> impl Iterator<Item = String> {
    let nonterms = NonTerm::ALL.iter().map(|n| format!("{n:?}"));
    let terms = TokenKind::ALL.iter().map(|t| match t {
        TokenKind::End => "$".to_string(),
        TokenKind::Int => "int".to_string(),
        TokenKind::Ident => "id".to_string(),
        t => format!("'{}'", t.label()),
    });
    nonterms.chain(terms)
}

/// Builds the calculator grammar from [`RULES`].
pub fn grammar() -> Result<Grammar> {
    let mut g = Grammar::new(symbol_names(), NonTerm::COUNT, Sym::T(TokenKind::End).index())?;
    for def in RULES.iter() {
        let rhs: Vec<usize> = def.rhs.iter().map(|s| s.index()).collect();
        let prod = match def.rule {
            Rule::StartSetVar | Rule::StartExpr => g.add_start(def.lhs as usize, &rhs)?,
            _ => g.add_production(def.lhs as usize, &rhs)?,
        };
        anyhow::ensure!(prod == def.rule as usize, "rule {:?} is out of order", def.rule);
    }
    Ok(g)
}

/// Writes the grammar report: productions, LR(0) states, FIRST and FOLLOW
/// sets.
pub fn write_report<W: Write>(out: &mut W) -> Result<()> {
    grammar()?.write_report(out).context("cannot write grammar report")
}

/// An automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateID(pub usize);

/// A parser action with the production index resolved to a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserAction {
    Error,
    Accept,
    Shift(StateID),
    Reduce(Rule),
    Goto(StateID),
}

struct Tables {
    table: Table,
    starts: [StateID; 2],
}

fn build_tables() -> Result<Tables> {
    let table = grammar()?.build()?;
    let start = |i: usize| {
        table
            .start_state(i)
            .map(StateID)
            .ok_or_else(|| anyhow!("missing start state {}", i))
    };
    let starts = [start(Start::SetVar as usize)?, start(Start::Expr as usize)?];
    log::debug!("calculator automaton has {} states", table.n_states());
    Ok(Tables { table, starts })
}

static TABLES: Lazy<Tables> =
    Lazy::new(|| build_tables().expect("calculator grammar must be a conflict-free SLR(1) grammar"));

/// Looks up the action for `sym` in `state`.
#[inline]
pub fn action(state: StateID, sym: Sym) -> ParserAction {
    match TABLES.table.action(state.0, sym.index()) {
        Action::Error => ParserAction::Error,
        Action::Accept => ParserAction::Accept,
        Action::Shift(s) => ParserAction::Shift(StateID(s)),
        Action::Goto(s) => ParserAction::Goto(StateID(s)),
        Action::Reduce(p) => RULES
            .get(p)
            .map_or(ParserAction::Error, |def| ParserAction::Reduce(def.rule)),
    }
}

/// Which start production a statement is parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Start {
    /// Assignment or function definition.
    SetVar = 0,
    /// Expression.
    Expr = 1,
}

impl Start {
    /// Picks the start production for a statement: [`Start::SetVar`] when its
    /// text contains `:=`, [`Start::Expr`] otherwise. Text after a NUL byte is
    /// ignored, as the lexer never reaches it.
    ///
    /// ```rust
    /// # use mincalc::grammar::Start;
    /// assert_eq!(Start::for_text(b"x := 1"), Start::SetVar);
    /// assert_eq!(Start::for_text(b"x == 1"), Start::Expr);
    /// ```
    pub fn for_text(text: &[u8]) -> Start {
        let text = text.split(|&b| b == 0).next().unwrap_or_default();
        if text.windows(2).any(|w| w == b":=") {
            Start::SetVar
        } else {
            Start::Expr
        }
    }

    /// The automaton state the parser starts in.
    pub fn state(self) -> StateID {
        TABLES.starts[self as usize]
    }

    /// The rule of the tree root once a statement is accepted.
    pub fn root_rule(self) -> Rule {
        match self {
            Start::SetVar => Rule::StmtSetVar,
            Start::Expr => Rule::StmtExpr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn rules_are_indexed_by_discriminant() {
        for (i, def) in RULES.iter().enumerate() {
            assert_eq!(def.rule as usize, i, "{:?}", def.rule);
            for &c in def.children {
                assert!(c < def.rhs.len(), "{:?} keeps position {}", def.rule, c);
            }
            assert!(def.children.len() <= 2);
        }
        for (i, n) in NonTerm::ALL.iter().enumerate() {
            assert_eq!(*n as usize, i);
        }
    }

    #[test]
    fn grammar_is_slr1() {
        init_logger();
        let table = grammar().unwrap().build().unwrap();
        assert!(table.n_states() > 0);
    }

    #[test]
    fn start_states_differ() {
        init_logger();
        let svar = Start::SetVar.state();
        let expr = Start::Expr.state();
        assert_ne!(svar, expr);
        // an integer can begin an expression but not an assignment
        assert!(matches!(action(expr, Sym::T(TokenKind::Int)), ParserAction::Shift(_)));
        assert_eq!(action(svar, Sym::T(TokenKind::Int)), ParserAction::Error);
        assert!(matches!(action(svar, Sym::T(TokenKind::Ident)), ParserAction::Shift(_)));
    }

    #[test]
    fn start_selection_looks_for_define() {
        assert_eq!(Start::for_text(b"f(x) := x"), Start::SetVar);
        assert_eq!(Start::for_text(b"1 : = 2"), Start::Expr);
        assert_eq!(Start::for_text(b"1\0:="), Start::Expr);
        assert_eq!(Start::for_text(b""), Start::Expr);
    }

    #[test]
    fn child_positions() {
        assert_eq!(Rule::Assign.child1(), Some(0));
        assert_eq!(Rule::Assign.child2(), Some(2));
        assert_eq!(Rule::TermGroup.child1(), Some(1));
        assert_eq!(Rule::TermGroup.child2(), None);
        assert_eq!(Rule::IdListEmpty.child1(), None);
    }

    #[test]
    fn chain_rules_keep_exactly_one_child() {
        for def in RULES.iter().filter(|d| d.rule.is_chain()) {
            assert_eq!(def.children.len(), 1, "{:?}", def.rule);
        }
        assert!(!Rule::Neg.is_chain());
        assert!(!Rule::ArgListLast.is_chain());
    }

    #[test]
    fn report_lists_productions() {
        let mut out = Vec::new();
        write_report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("PS,{}", Rule::COUNT)));
        assert!(text.contains("Assign -> id ':=' Or"));
    }
}
