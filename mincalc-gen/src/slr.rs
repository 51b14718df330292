// LR(0) item machinery, FIRST/FOLLOW computations, and SLR(1) action table
// construction over an integer-encoded grammar.
//
// Encoding: every production is a `Vec<usize>` whose element `0` is the
// left-hand side and whose remaining elements are the right-hand side.
// Symbols `< n_nonterm` are nonterminals, the rest are terminals.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

/// An LR(0) item: a production index and a dot position.
///
/// Because element `0` of a production is its left-hand side, the dot of a
/// fresh item sits at `1`, and the item is complete when `dot == prod.len()`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    /// The index of the production in the grammar.
    pub prod: usize,

    /// The position of the dot within the production (1-based over the RHS).
    pub dot: usize,
}

/// A set of LR(0) items.
pub type ItemSet = BTreeSet<Item>;

/// The canonical collection of LR(0) item sets.
///
/// States are numbered in discovery order, so the closures of the seed items
/// passed to [`construct_set`] receive the lowest state numbers.
#[derive(Debug, Default)]
pub struct Collection {
    sets: Vec<ItemSet>,
    index: BTreeMap<ItemSet, usize>,
}

impl Collection {
    /// Number of states in the collection.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if the collection has no states.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Iterates over the item sets in state order.
    pub fn iter(&self) -> std::slice::Iter<'_, ItemSet> {
        self.sets.iter()
    }

    /// Returns the state number of `target`, if it is part of the collection.
    pub fn find(&self, target: &ItemSet) -> Option<usize> {
        self.index.get(target).copied()
    }

    fn insert(&mut self, set: ItemSet) -> (usize, bool) {
        if let Some(&i) = self.index.get(&set) {
            return (i, false);
        }
        let i = self.sets.len();
        self.index.insert(set.clone(), i);
        self.sets.push(set);
        (i, true)
    }
}

/// Computes the LR(0) closure of a set of items.
///
/// For each item whose dot precedes a nonterminal, the items for all
/// productions of that nonterminal are added, until a fixed point is reached.
pub fn closure(items: &ItemSet, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let mut c = items.clone();
    let mut pending: Vec<Item> = items.iter().cloned().collect();
    while let Some(item) = pending.pop() {
        let p = &prods[item.prod];
        if item.dot >= p.len() {
            continue;
        }
        let t = p[item.dot];
        if t >= n_nonterm {
            continue;
        }
        for (j, q) in prods.iter().enumerate() {
            if q[0] == t {
                let new_item = Item { prod: j, dot: 1 };
                if c.insert(new_item.clone()) {
                    pending.push(new_item);
                }
            }
        }
    }
    c
}

/// Computes the LR(0) goto of an item set on `sym`: the closure of all items
/// advanced past `sym`.
pub fn goto(items: &ItemSet, sym: usize, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let mut moved = ItemSet::new();
    for item in items {
        let p = &prods[item.prod];
        if item.dot < p.len() && p[item.dot] == sym {
            moved.insert(Item {
                prod: item.prod,
                dot: item.dot + 1,
            });
        }
    }
    closure(&moved, prods, n_nonterm)
}

/// Constructs the canonical collection of LR(0) item sets.
///
/// Every production listed in `seeds` contributes its own initial state
/// (the closure of its fresh item), numbered `0..seeds.len()` in order unless
/// two seeds happen to share a closure.
pub fn construct_set(prods: &[Vec<usize>], seeds: &[usize], n_nonterm: usize, n_sym: usize) -> Collection {
    let mut c = Collection::default();
    let mut work = Vec::new();
    for &seed in seeds {
        let start = ItemSet::from([Item { prod: seed, dot: 1 }]);
        let (i, fresh) = c.insert(closure(&start, prods, n_nonterm));
        if fresh {
            work.push(i);
        }
    }
    while let Some(state) = work.pop() {
        for sym in 0..n_sym {
            let nxt = goto(&c.sets[state], sym, prods, n_nonterm);
            if nxt.is_empty() {
                continue;
            }
            let (i, fresh) = c.insert(nxt);
            if fresh {
                work.push(i);
            }
        }
    }
    c
}

/// Computes FIRST sets and nullability for all grammar symbols.
///
/// Returns one FIRST set per symbol (terminals map to themselves) and a flag
/// per symbol telling whether it can derive the empty string.
pub fn first_sets(prods: &[Vec<usize>], n_nonterm: usize, n_sym: usize) -> (Vec<BTreeSet<usize>>, Vec<bool>) {
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_sym];
    let mut nullable = vec![false; n_sym];
    for (t, set) in first.iter_mut().enumerate().skip(n_nonterm) {
        set.insert(t);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                let first_sym = first[sym].clone();
                for f in first_sym {
                    if first[lhs].insert(f) {
                        changed = true;
                    }
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}

/// Computes FOLLOW sets for all nonterminals.
///
/// Each symbol in `start_syms` is followed by the end-of-input terminal `eos`.
pub fn follow_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    start_syms: &[usize],
    eos: usize,
    first: &[BTreeSet<usize>],
    nullable: &[bool],
) -> Vec<BTreeSet<usize>> {
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nonterm];
    for &s in start_syms {
        follow[s].insert(eos);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let rhs = &prod[1..];
            for (i, &b) in rhs.iter().enumerate() {
                if b >= n_nonterm {
                    continue;
                }
                let mut beta_nullable = true;
                let mut first_beta = BTreeSet::new();
                for &sym in &rhs[i + 1..] {
                    first_beta.extend(first[sym].iter().copied());
                    if !nullable[sym] {
                        beta_nullable = false;
                        break;
                    }
                }
                for f in first_beta {
                    if follow[b].insert(f) {
                        changed = true;
                    }
                }
                if beta_nullable && lhs != b {
                    let follow_lhs = follow[lhs].clone();
                    for f in follow_lhs {
                        if follow[b].insert(f) {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
    follow
}

/// A single parser action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// No valid move: the input is rejected.
    Error,
    /// Reduction by a start production on end-of-input.
    Accept,
    /// Push the lookahead terminal and move to the state.
    Shift(usize),
    /// Reduce by the production with this index.
    Reduce(usize),
    /// Post-reduction transition on a nonterminal.
    Goto(usize),
}

/// The raw SLR(1) table: one row per state, one cell per symbol, each cell a
/// set of candidate actions (more than one means a conflict).
pub type Tab = Vec<Vec<BTreeSet<Action>>>;

/// Constructs the SLR(1) table from the canonical collection.
///
/// Shift entries come from transitions on terminals, goto entries from
/// transitions on nonterminals, reduce entries from completed items over the
/// FOLLOW set of the production's left-hand side. Completed items of the
/// productions listed in `starts` become `Accept` on `eos`.
pub fn construct_slr(
    c: &Collection,
    flw: &[BTreeSet<usize>],
    prods: &[Vec<usize>],
    starts: &[usize],
    n_nonterm: usize,
    n_sym: usize,
    eos: usize,
) -> Tab {
    let mut tab: Tab = vec![vec![BTreeSet::new(); n_sym]; c.len()];

    for (state, ssi) in c.iter().enumerate() {
        for sym in 0..n_sym {
            let nxt = goto(ssi, sym, prods, n_nonterm);
            if nxt.is_empty() {
                continue;
            }
            if let Some(ns) = c.find(&nxt) {
                let act = if sym < n_nonterm {
                    Action::Goto(ns)
                } else {
                    Action::Shift(ns)
                };
                tab[state][sym].insert(act);
            }
        }

        for item in ssi {
            let p = &prods[item.prod];
            if item.dot != p.len() {
                continue;
            }
            if starts.contains(&item.prod) {
                tab[state][eos].insert(Action::Accept);
            } else {
                for &t in &flw[p[0]] {
                    tab[state][t].insert(Action::Reduce(item.prod));
                }
            }
        }
    }
    tab
}

/// Writes the canonical collection of item sets, one item per line.
pub fn write_set<W: Write>(out: &mut W, c: &Collection, prods: &[Vec<usize>], names: &[String]) -> io::Result<()> {
    writeln!(out, "CS,{}\n", c.len())?;
    for (i, state) in c.iter().enumerate() {
        for item in state {
            write!(out, "C,{},", i)?;
            let p = &prods[item.prod];
            for (j, t) in p.iter().enumerate() {
                if j == item.dot {
                    write!(out, ". ")?;
                }
                write!(out, "{} ", names[*t])?;
                if j == 0 {
                    write!(out, "-> ")?;
                }
            }
            if p.len() == item.dot {
                write!(out, ". ")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the grammar productions as `P,<index>,<LHS> -> <RHS symbols>`.
pub fn write_prods<W: Write>(out: &mut W, prods: &[Vec<usize>], names: &[String]) -> io::Result<()> {
    writeln!(out, "PS,{}\n", prods.len())?;
    for (i, prod) in prods.iter().enumerate() {
        write!(out, "P,{},", i)?;
        for (j, t) in prod.iter().enumerate() {
            write!(out, "{} ", names[*t])?;
            if j == 0 {
                write!(out, "-> ")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes FIRST sets (when `nullable` is given) or FOLLOW sets.
pub fn write_fstflw<W: Write>(
    out: &mut W,
    vs: &[BTreeSet<usize>],
    nullable: Option<&[bool]>,
    names: &[String],
) -> io::Result<()> {
    let label = if nullable.is_some() { "FIRST" } else { "FOLLOW" };
    for (sym, set) in vs.iter().enumerate() {
        write!(out, "{},{},{{", label, names[sym])?;
        if nullable.is_some_and(|n| n[sym]) {
            write!(out, "`empty', ")?;
        }
        for &t in set {
            write!(out, "{}, ", names[t])?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}
