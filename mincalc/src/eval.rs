//! # Evaluator
//!
//! A recursive tree walker over the arena. Values are `i32` and arithmetic
//! wraps. Names resolve against the current [`Frame`] first, then against
//! the global symbol table.
//!
//! Calls re-parse the callee's stored definition into the same arena as the
//! calling statement, so a statement's trees, including those of all nested
//! calls, stay valid until the statement ends. Deep recursion therefore
//! ends in [`Resource::TreeMemory`](crate::Resource::TreeMemory) exhaustion.
use crate::arena::{Node, NodeRef};
use crate::error::{CalcError, Misuse, SymbolKind};
use crate::grammar::{Rule, Start};
use crate::parser::{children, skip_chain};
use crate::session::Session;
use crate::token::{Name, TokenValue};
use std::fmt;

/// Parameter bindings of one function call.
///
/// Top-level statements evaluate under an empty frame. A callee never sees
/// its caller's frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frame {
    locals: Vec<(Name, i32)>,
}

impl Frame {
    /// The empty frame of a top-level statement.
    pub fn global() -> Self {
        Self::default()
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            locals: Vec::with_capacity(n),
        }
    }

    fn bind(&mut self, name: Name, value: i32) {
        self.locals.push((name, value));
    }

    /// The value bound to `name`. With duplicate parameter names the first
    /// binding wins.
    pub fn get(&self, name: Name) -> Option<i32> {
        self.locals.iter().find(|(n, _)| *n == name).map(|&(_, v)| v)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.locals.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Rules describing one right-recursive list shape.
struct ListRules {
    empty: Rule,
    some: Rule,
    last: Rule,
    cons: Rule,
}

const ID_LIST: ListRules = ListRules {
    empty: Rule::IdListEmpty,
    some: Rule::IdListSome,
    last: Rule::IdListLast,
    cons: Rule::IdListCons,
};

const ARG_LIST: ListRules = ListRules {
    empty: Rule::ArgListEmpty,
    some: Rule::ArgListSome,
    last: Rule::ArgListLast,
    cons: Rule::ArgListCons,
};

impl Session {
    pub(crate) fn node(&self, r: Option<NodeRef>) -> Result<Node, CalcError> {
        let r = r.ok_or_else(|| CalcError::internal("missing child node"))?;
        self.arena.get(r)
    }

    pub(crate) fn ident(&self, r: Option<NodeRef>) -> Result<Name, CalcError> {
        self.node(r)?
            .token()
            .and_then(|t| t.name())
            .ok_or_else(|| CalcError::internal("expected an identifier leaf"))
    }

    /// Flattens an optional list into its item nodes, in source order.
    fn list_items(&self, opt: Option<NodeRef>, rules: &ListRules) -> Result<Vec<NodeRef>, CalcError> {
        let mut items = Vec::new();
        let mut node = self.node(opt)?;
        match node.rule() {
            Some(r) if r == rules.empty => return Ok(items),
            Some(r) if r == rules.some => node = self.node(children(&node).0)?,
            _ => return Err(CalcError::internal("malformed list")),
        }
        loop {
            let (item, rest) = children(&node);
            items.push(item.ok_or_else(|| CalcError::internal("list item without a node"))?);
            match node.rule() {
                Some(r) if r == rules.last => return Ok(items),
                Some(r) if r == rules.cons => node = self.node(rest)?,
                _ => return Err(CalcError::internal("malformed list")),
            }
        }
    }

    /// Name and parameter names of a function head.
    pub(crate) fn fun_head(&self, head: Option<NodeRef>) -> Result<(Name, Vec<Name>), CalcError> {
        let Node::Branch {
            rule: Rule::FunHead,
            child1,
            child2,
        } = self.node(head)?
        else {
            return Err(CalcError::internal("expected a function head"));
        };
        let name = self.ident(child1)?;
        let params = self
            .list_items(child2, &ID_LIST)?
            .into_iter()
            .map(|r| self.ident(Some(r)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((name, params))
    }

    fn resolve(&self, name: Name, frame: &Frame) -> Result<i32, CalcError> {
        if let Some(value) = frame.get(name) {
            return Ok(value);
        }
        match self.vars.lookup(name) {
            None => Err(CalcError::Undefined {
                kind: SymbolKind::Variable,
                name,
            }),
            Some(entry) if entry.is_function() => Err(CalcError::Type {
                misuse: Misuse::FunctionAsValue,
                name,
            }),
            Some(entry) => Ok(entry.value),
        }
    }

    fn eval_ref(&mut self, r: Option<NodeRef>, frame: &Frame) -> Result<i32, CalcError> {
        let node = self.node(r)?;
        self.eval(node, frame)
    }

    /// Evaluates an expression tree under `frame`.
    pub(crate) fn eval(&mut self, node: Node, frame: &Frame) -> Result<i32, CalcError> {
        match skip_chain(&self.arena, node)? {
            Node::Leaf(token) => match token.value {
                TokenValue::Int(value) => Ok(value),
                TokenValue::Ident(name) => self.resolve(name, frame),
                TokenValue::None => Err(CalcError::internal("operator token in expression")),
            },
            Node::Branch { rule, child1, child2 } => match rule {
                Rule::Not => Ok(!self.eval_ref(child1, frame)?),
                Rule::Pos => self.eval_ref(child1, frame),
                Rule::Neg => Ok(self.eval_ref(child1, frame)?.wrapping_neg()),
                Rule::FunCall => self.call(child1, child2, frame),
                Rule::BitOr
                | Rule::BitXor
                | Rule::BitAnd
                | Rule::Eq
                | Rule::Ne
                | Rule::Lt
                | Rule::Le
                | Rule::Gt
                | Rule::Ge
                | Rule::Shl
                | Rule::Shr
                | Rule::Ushr
                | Rule::Add
                | Rule::Sub
                | Rule::Mul
                | Rule::Div
                | Rule::Rem => {
                    let lhs = self.eval_ref(child1, frame)?;
                    let rhs = self.eval_ref(child2, frame)?;
                    binary(rule, lhs, rhs)
                }
                _ => Err(CalcError::internal("unexpected rule in expression")),
            },
        }
    }

    /// Calls the function named by `name_ref` with the argument list at
    /// `args_ref`, evaluating the arguments under the caller's `frame`.
    fn call(&mut self, name_ref: Option<NodeRef>, args_ref: Option<NodeRef>, frame: &Frame) -> Result<i32, CalcError> {
        let name = self.ident(name_ref)?;
        let entry = self.vars.lookup(name).ok_or(CalcError::Undefined {
            kind: SymbolKind::Function,
            name,
        })?;
        let fun = entry.fun.ok_or(CalcError::Type {
            misuse: Misuse::ValueAsFunction,
            name,
        })?;
        let args = self.list_items(args_ref, &ARG_LIST)?;

        let text = self
            .funs
            .get(fun)
            .ok_or_else(|| CalcError::internal("dangling function reference"))?;
        let root = self.parser.parse(&mut self.arena, text, Start::SetVar)?;
        let Node::Branch {
            rule: Rule::FunDef,
            child1: head,
            child2: body,
        } = skip_chain(&self.arena, root)?
        else {
            return Err(CalcError::internal("stored text is not a function definition"));
        };
        let (_, params) = self.fun_head(head)?;
        if params.len() != args.len() {
            return Err(CalcError::Arity {
                name,
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut locals = Frame::with_capacity(params.len());
        for (param, arg) in params.into_iter().zip(args) {
            let arg = self.arena.get(arg)?;
            let value = self.eval(arg, frame)?;
            locals.bind(param, value);
        }
        log::debug!("call {}({}), {} tree nodes in use", name, locals, self.arena.len());
        self.eval_ref(body, &locals)
    }
}

fn shift_amount(n: i32) -> Result<u32, CalcError> {
    u32::try_from(n)
        .ok()
        .filter(|&n| n < i32::BITS)
        .ok_or(CalcError::Arithmetic("shift amount out of range"))
}

/// Applies a binary operator rule.
pub fn binary(rule: Rule, a: i32, b: i32) -> Result<i32, CalcError> {
    Ok(match rule {
        Rule::BitOr => a | b,
        Rule::BitXor => a ^ b,
        Rule::BitAnd => a & b,
        Rule::Eq => i32::from(a == b),
        Rule::Ne => i32::from(a != b),
        Rule::Lt => i32::from(a < b),
        Rule::Le => i32::from(a <= b),
        Rule::Gt => i32::from(a > b),
        Rule::Ge => i32::from(a >= b),
        Rule::Shl => a << shift_amount(b)?,
        Rule::Shr => a >> shift_amount(b)?,
        Rule::Ushr => ((a as u32) >> shift_amount(b)?) as i32,
        Rule::Add => a.wrapping_add(b),
        Rule::Sub => a.wrapping_sub(b),
        Rule::Mul => a.wrapping_mul(b),
        Rule::Div => {
            if b == 0 {
                return Err(CalcError::Arithmetic("division by zero"));
            }
            a.wrapping_div(b)
        }
        Rule::Rem => {
            if b == 0 {
                return Err(CalcError::Arithmetic("remainder by zero"));
            }
            a.wrapping_rem(b)
        }
        _ => return Err(CalcError::internal("not a binary operator")),
    })
}
