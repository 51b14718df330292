//! # Calculator Parser
//!
//! A table-driven SLR(1) shift-reduce engine. [`Parser::feed`] consumes one
//! token at a time: it performs every reduction the table asks for and then
//! shifts the token, so the parse is complete once the end token has been
//! fed. [`Parser::result`] hands back the root node if the statement was
//! accepted under the chosen start production.
//!
//! The parser keeps two parallel stacks: automaton states, and the node of
//! each shifted or reduced symbol. A reduction pops the rule's right-hand
//! side, moves the children the rule retains into the [`Arena`], and pushes a
//! new [`Node::Branch`] followed by the goto state.
use crate::arena::{Arena, Node, NodeRef};
use crate::error::CalcError;
use crate::grammar::{self, ParserAction, Rule, Start, StateID, Sym};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use smartstring::alias::String;
use std::fmt::Write;

/// Counters accumulated over the lifetime of a [`Parser`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    /// Deepest state stack seen.
    pub max_depth: usize,
}

/// The shift-reduce engine.
#[derive(Debug)]
pub struct Parser {
    states: Vec<StateID>,
    nodes: Vec<Node>,
    start: Start,
    accepted: bool,
    capacity: usize,
    stats: ParserStats,
}

impl Parser {
    /// Creates a parser whose stacks hold at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let mut parser = Self {
            states: Vec::with_capacity(capacity.min(64)),
            nodes: Vec::with_capacity(capacity.min(64)),
            start: Start::Expr,
            accepted: false,
            capacity,
            stats: ParserStats::default(),
        };
        parser.reset(Start::Expr);
        parser
    }

    /// Clears both stacks and seeds the state stack with the start state.
    pub fn reset(&mut self, start: Start) {
        self.states.clear();
        self.nodes.clear();
        self.states.push(start.state());
        self.start = start;
        self.accepted = false;
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    fn top(&self) -> Result<StateID, CalcError> {
        self.states
            .last()
            .copied()
            .ok_or_else(|| CalcError::internal("empty parser state stack"))
    }

    fn push(&mut self, node: Node, state: StateID, offset: usize) -> Result<(), CalcError> {
        if self.states.len() >= self.capacity {
            return Err(CalcError::parse("parser stack overflow", offset));
        }
        self.nodes.push(node);
        self.states.push(state);
        self.stats.max_depth = self.stats.max_depth.max(self.states.len());
        Ok(())
    }

    /// Feeds one token: reduces as long as the table says so, then shifts or
    /// accepts.
    ///
    /// A token the table rejects in the current state is a parser error at the
    /// end of that token.
    pub fn feed(&mut self, arena: &mut Arena, token: Token) -> Result<(), CalcError> {
        let offset = token.span.end;
        if self.accepted {
            return Err(CalcError::parse("unexpected input after end", offset));
        }
        self.stats.tokens += 1;
        if log::log_enabled!(log::Level::Trace) {
            self.dump_state(&token);
        }
        loop {
            match grammar::action(self.top()?, Sym::T(token.kind)) {
                ParserAction::Shift(state) => {
                    log::trace!("Shift {:?}", state);
                    self.push(Node::Leaf(token), state, offset)?;
                    self.stats.shifts += 1;
                    return Ok(());
                }
                ParserAction::Reduce(rule) => {
                    log::trace!("Reduce {:?}", rule);
                    self.reduce(arena, rule, offset)?;
                    self.stats.reductions += 1;
                }
                ParserAction::Accept => {
                    log::trace!("Accept");
                    self.nodes.push(Node::Leaf(token));
                    self.accepted = true;
                    return Ok(());
                }
                ParserAction::Error => {
                    let mut message = String::new();
                    let _ = match token.kind {
                        TokenKind::End => write!(message, "unexpected end of input"),
                        kind @ (TokenKind::Int | TokenKind::Ident) => write!(message, "unexpected {}", kind),
                        kind => write!(message, "unexpected `{}`", kind),
                    };
                    return Err(CalcError::parse(message, offset));
                }
                ParserAction::Goto(_) => return Err(CalcError::internal("goto on a terminal")),
            }
        }
    }

    fn reduce(&mut self, arena: &mut Arena, rule: Rule, offset: usize) -> Result<(), CalcError> {
        let def = rule.def();
        let n = def.rhs.len();
        if self.nodes.len() < n || self.states.len() <= n {
            return Err(CalcError::internal("parser stack underflow"));
        }
        let base = self.nodes.len() - n;
        let mut children = [None; 2];
        for (slot, &pos) in children.iter_mut().zip(def.children) {
            *slot = Some(arena.alloc(self.nodes[base + pos])?);
        }
        let node = Node::Branch {
            rule,
            child1: children[0],
            child2: children[1],
        };
        self.nodes.truncate(base);
        self.states.truncate(self.states.len() - n);
        let ParserAction::Goto(state) = grammar::action(self.top()?, Sym::N(def.lhs)) else {
            return Err(CalcError::internal("missing goto after reduction"));
        };
        self.push(node, state, offset)
    }

    /// The root of the accepted statement.
    ///
    /// Returns `None` unless the end token has been accepted and the stacks
    /// hold exactly the statement node of the chosen start production
    /// followed by the end token.
    pub fn result(&self) -> Option<Node> {
        if !self.accepted || self.states.first() != Some(&self.start.state()) {
            return None;
        }
        match self.nodes.as_slice() {
            [root, Node::Leaf(Token { kind: TokenKind::End, .. })]
                if root.rule() == Some(self.start.root_rule()) =>
            {
                Some(*root)
            }
            _ => None,
        }
    }

    /// Lexes and parses one statement under `start`.
    pub fn parse(&mut self, arena: &mut Arena, text: &[u8], start: Start) -> Result<Node, CalcError> {
        self.reset(start);
        let mut lexer = Lexer::new(text);
        loop {
            let token = lexer.next_token()?;
            self.feed(arena, token)?;
            if token.kind == TokenKind::End {
                break;
            }
        }
        self.result()
            .ok_or_else(|| CalcError::parse("internal error", lexer.pos()))
    }

    /// Traces the state stack paired with the symbols on it, followed by
    /// the incoming token.
    pub fn dump_state(&self, incoming: &Token) {
        let mut output = String::new();
        for (i, state) in self.states.iter().enumerate() {
            let _ = write!(output, "<{}> ", state.0);
            match self.nodes.get(i) {
                Some(Node::Leaf(t)) => {
                    let _ = write!(output, "{} ", t.kind);
                }
                Some(Node::Branch { rule, .. }) => {
                    let _ = write!(output, "{:?} ", rule.def().lhs);
                }
                None => {}
            }
        }
        let _ = write!(output, "<-  {:?}", incoming.kind);
        log::trace!("{}", output);
    }
}

/// Descends through pass-through rules (see [`Rule::is_chain`]) and returns
/// the first node that does something of its own.
pub fn skip_chain(arena: &Arena, mut node: Node) -> Result<Node, CalcError> {
    while let Node::Branch {
        rule,
        child1: Some(child),
        ..
    } = node
    {
        if !rule.is_chain() {
            break;
        }
        node = arena.get(child)?;
    }
    Ok(node)
}

/// Retained children of a branch node.
pub fn children(node: &Node) -> (Option<NodeRef>, Option<NodeRef>) {
    match node {
        Node::Branch { child1, child2, .. } => (*child1, *child2),
        Node::Leaf(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenValue;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn parse(text: &str, start: Start) -> Result<(Node, Arena), CalcError> {
        let mut arena = Arena::with_capacity(256);
        let mut parser = Parser::new(256);
        let root = parser.parse(&mut arena, text.as_bytes(), start)?;
        Ok((root, arena))
    }

    fn parse_err(text: &str, start: Start) -> (String, usize) {
        match parse(text, start).unwrap_err() {
            CalcError::Parse { message, offset } => (message, offset),
            e => panic!("expected parser error, got {e:?}"),
        }
    }

    /// Renders a tree as nested s-expressions, eliding single-child chains.
    fn show(arena: &Arena, node: Node) -> std::string::String {
        let node = skip_chain(arena, node).unwrap();
        match node {
            Node::Leaf(t) => match t.value {
                TokenValue::Int(v) => v.to_string(),
                TokenValue::Ident(n) => n.to_string(),
                TokenValue::None => t.kind.to_string(),
            },
            Node::Branch { rule, child1, child2 } => {
                let mut s = format!("({:?}", rule);
                for c in [child1, child2].into_iter().flatten() {
                    s.push(' ');
                    s.push_str(&show(arena, arena.get(c).unwrap()));
                }
                s.push(')');
                s
            }
        }
    }

    #[test]
    fn precedence_and_associativity() {
        init_logger();
        let (root, arena) = parse("2+3*4", Start::Expr).unwrap();
        assert_eq!(root.rule(), Some(Rule::StmtExpr));
        assert_eq!(show(&arena, root), "(Add 2 (Mul 3 4))");

        let (root, arena) = parse("1-2-3", Start::Expr).unwrap();
        assert_eq!(show(&arena, root), "(Sub (Sub 1 2) 3)");

        let (root, arena) = parse("1<<2+1", Start::Expr).unwrap();
        assert_eq!(show(&arena, root), "(Shl 1 (Add 2 1))");

        let (root, arena) = parse("a|b^c&d==e<f", Start::Expr).unwrap();
        assert_eq!(show(&arena, root), "(BitOr a (BitXor b (BitAnd c (Eq d (Lt e f)))))");
    }

    #[test]
    fn unary_and_groups() {
        let (root, arena) = parse("-(1+2)*~x", Start::Expr).unwrap();
        assert_eq!(show(&arena, root), "(Mul (Neg (Add 1 2)) (Not x))");
    }

    #[test]
    fn calls_and_definitions() {
        let (root, arena) = parse("f(1, g(), x)", Start::Expr).unwrap();
        assert_eq!(
            show(&arena, root),
            "(FunCall f (ArgListSome (ArgListCons 1 (ArgListCons (FunCall g (ArgListEmpty)) (ArgListLast x)))))"
        );

        let (root, arena) = parse("f(a,b) := a+b", Start::SetVar).unwrap();
        assert_eq!(root.rule(), Some(Rule::StmtSetVar));
        assert_eq!(
            show(&arena, root),
            "(FunDef (FunHead f (IdListSome (IdListCons a (IdListLast b)))) (Add a b))"
        );

        let (root, arena) = parse("x := 5", Start::SetVar).unwrap();
        assert_eq!(show(&arena, root), "(Assign x 5)");
    }

    #[test]
    fn set_var_start_rejects_expressions() {
        assert_eq!(parse_err("1 := 2", Start::SetVar), ("unexpected integer".into(), 1));
        assert_eq!(parse_err("f(1) := 2", Start::SetVar), ("unexpected integer".into(), 3));
        assert_eq!(parse_err("x := 1 := 2", Start::SetVar).1, 9);
    }

    #[test]
    fn error_offsets() {
        assert_eq!(parse_err("1 +", Start::Expr), ("unexpected end of input".into(), 3));
        assert_eq!(parse_err("(1", Start::Expr).1, 2);
        assert_eq!(parse_err("1 2", Start::Expr), ("unexpected integer".into(), 3));
        assert_eq!(parse_err("1 )", Start::Expr), ("unexpected `)`".into(), 3));
    }

    #[test]
    fn lexer_errors_pass_through() {
        assert!(matches!(
            parse("1 + $", Start::Expr),
            Err(CalcError::Lex { offset: 4, .. })
        ));
    }

    #[test]
    fn arena_exhaustion_is_reported() {
        let mut arena = Arena::with_capacity(2);
        let mut parser = Parser::new(256);
        assert_eq!(
            parser.parse(&mut arena, b"1+2+3", Start::Expr),
            Err(CalcError::Exhausted(crate::Resource::TreeMemory))
        );
    }

    #[test]
    fn stack_overflow_is_a_parser_error() {
        let mut arena = Arena::with_capacity(1024);
        let mut parser = Parser::new(8);
        let text = "((((((((((1))))))))))";
        let err = parser.parse(&mut arena, text.as_bytes(), Start::Expr).unwrap_err();
        assert!(matches!(err, CalcError::Parse { ref message, .. } if message == "parser stack overflow"));
    }

    #[test]
    fn stats_accumulate() {
        let mut arena = Arena::with_capacity(64);
        let mut parser = Parser::new(64);
        parser.parse(&mut arena, b"1+2", Start::Expr).unwrap();
        let stats = parser.stats();
        assert_eq!(stats.tokens, 4);
        assert_eq!(stats.shifts, 3);
        assert!(stats.reductions > 0);
        assert!(stats.max_depth >= 3);
    }

    #[test]
    fn feed_after_accept_fails() {
        let mut arena = Arena::with_capacity(64);
        let mut parser = Parser::new(64);
        parser.parse(&mut arena, b"1", Start::Expr).unwrap();
        assert!(parser.result().is_some());
        let end = crate::lexer::tokenize(b"").unwrap()[0];
        assert!(parser.feed(&mut arena, end).is_err());
    }
}
