//! # AST Arena
//!
//! Parse trees live in a bounded bump arena. The parser keeps the node of
//! every symbol on its stack by value; when a rule is reduced, only the
//! children the rule retains are moved into the arena and the new node refers
//! to them by [`NodeRef`]. Nothing is freed individually: the whole arena is
//! cleared once the current top-level statement has finished, which also
//! invalidates every outstanding [`NodeRef`].
use crate::error::{CalcError, Resource};
use crate::grammar::Rule;
use crate::token::Token;

/// A handle to a node in the [`Arena`].
///
/// Handles carry the generation of the arena they were issued in; using one
/// after [`Arena::clear`] is reported as an internal error instead of
/// silently reading a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    index: u32,
    generation: u32,
}

/// A parse-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// A terminal.
    Leaf(Token),

    /// A reduced rule with up to two retained children.
    Branch {
        rule: Rule,
        child1: Option<NodeRef>,
        child2: Option<NodeRef>,
    },
}

impl Node {
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Node::Branch { rule, .. } => Some(*rule),
            Node::Leaf(_) => None,
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Leaf(token) => Some(token),
            Node::Branch { .. } => None,
        }
    }
}

/// A bounded bump allocator for [`Node`]s.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    capacity: usize,
    generation: u32,
    high_water: usize,
}

impl Arena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
            generation: 0,
            high_water: 0,
        }
    }

    /// Moves `node` into the arena.
    ///
    /// Fails with [`Resource::TreeMemory`] once `capacity` nodes are live.
    pub fn alloc(&mut self, node: Node) -> Result<NodeRef, CalcError> {
        if self.nodes.len() >= self.capacity {
            log::debug!("arena full at {} nodes", self.capacity);
            return Err(CalcError::Exhausted(Resource::TreeMemory));
        }
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        self.high_water = self.high_water.max(self.nodes.len());
        Ok(NodeRef {
            index,
            generation: self.generation,
        })
    }

    /// Copies out the node behind `r`.
    pub fn get(&self, r: NodeRef) -> Result<Node, CalcError> {
        if r.generation != self.generation {
            return Err(CalcError::internal("stale tree node reference"));
        }
        self.nodes
            .get(r.index as usize)
            .copied()
            .ok_or_else(|| CalcError::internal("dangling tree node reference"))
    }

    /// Releases every node and invalidates all handles.
    pub fn clear(&mut self) {
        log::debug!("arena cleared ({} nodes)", self.nodes.len());
        self.nodes.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most nodes ever live at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
