use crate::slr::{self, Action};
use anyhow::{Result, bail, ensure};
use std::io::{self, Write};

/// A context-free grammar described as data, ready for SLR(1) construction.
///
/// Symbols are dense indices: `0..n_nonterm` are nonterminals, the rest are
/// terminals, and `end` is the terminal that marks end-of-input. A grammar may
/// carry several augmented start productions; each one yields its own
/// designated start state in the generated [`Table`].
#[derive(Debug, Clone)]
pub struct Grammar {
    names: Vec<String>,
    n_nonterm: usize,
    end: usize,
    prods: Vec<Vec<usize>>,
    starts: Vec<usize>,
}

impl Grammar {
    /// Creates an empty grammar over the given symbol names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, n_nonterm: usize, end: usize) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        ensure!(n_nonterm <= names.len(), "more nonterminals ({}) than symbols ({})", n_nonterm, names.len());
        ensure!(
            end >= n_nonterm && end < names.len(),
            "end-of-input symbol {} is not a terminal",
            end
        );
        Ok(Self {
            names,
            n_nonterm,
            end,
            prods: Vec::new(),
            starts: Vec::new(),
        })
    }

    /// Appends the production `lhs -> rhs` and returns its index.
    pub fn add_production(&mut self, lhs: usize, rhs: &[usize]) -> Result<usize> {
        ensure!(lhs < self.n_nonterm, "left-hand side {} is not a nonterminal", lhs);
        for &sym in rhs {
            ensure!(sym < self.names.len(), "unknown symbol {} in production for {}", sym, self.names[lhs]);
            ensure!(sym != self.end, "end-of-input may not appear in a production");
        }
        let mut prod = Vec::with_capacity(rhs.len() + 1);
        prod.push(lhs);
        prod.extend_from_slice(rhs);
        self.prods.push(prod);
        Ok(self.prods.len() - 1)
    }

    /// Appends an augmented start production `lhs -> rhs` and returns its index.
    ///
    /// Completing this production on end-of-input is an `Accept`.
    pub fn add_start(&mut self, lhs: usize, rhs: &[usize]) -> Result<usize> {
        let i = self.add_production(lhs, rhs)?;
        self.starts.push(i);
        Ok(i)
    }

    /// Builds the SLR(1) action/goto table.
    ///
    /// Fails if there are no start productions or if any cell ends up with
    /// more than one action (a shift/reduce or reduce/reduce conflict); every
    /// conflicting cell is listed in the error message.
    pub fn build(&self) -> Result<Table> {
        ensure!(!self.starts.is_empty(), "grammar has no start production");
        let n_sym = self.names.len();
        let c = slr::construct_set(&self.prods, &self.starts, self.n_nonterm, n_sym);
        let (fst, nullable) = slr::first_sets(&self.prods, self.n_nonterm, n_sym);
        let start_syms: Vec<usize> = self.starts.iter().map(|&p| self.prods[p][0]).collect();
        let flw = slr::follow_sets(&self.prods, self.n_nonterm, &start_syms, self.end, &fst, &nullable);
        let tab = slr::construct_slr(&c, &flw, &self.prods, &self.starts, self.n_nonterm, n_sym, self.end);

        let mut conflicts = Vec::new();
        let mut actions = Vec::with_capacity(tab.len());
        for (state, row) in tab.into_iter().enumerate() {
            let mut cells = Vec::with_capacity(n_sym);
            for (sym, cell) in row.into_iter().enumerate() {
                if cell.len() > 1 {
                    conflicts.push(format!("state {} on {}: {:?}", state, self.names[sym], cell));
                }
                cells.push(cell.into_iter().next().unwrap_or(Action::Error));
            }
            actions.push(cells);
        }
        if !conflicts.is_empty() {
            bail!("grammar is not SLR(1):\n{}", conflicts.join("\n"));
        }

        let mut start_states = Vec::with_capacity(self.starts.len());
        for &p in &self.starts {
            let seed = slr::ItemSet::from([slr::Item { prod: p, dot: 1 }]);
            let Some(state) = c.find(&slr::closure(&seed, &self.prods, self.n_nonterm)) else {
                bail!("start production {} has no state", p);
            };
            start_states.push(state);
        }

        log::debug!(
            "built SLR(1) table: {} states, {} symbols, {} productions",
            actions.len(),
            n_sym,
            self.prods.len()
        );
        Ok(Table {
            actions,
            start_states,
        })
    }

    /// Writes a human-readable report: productions, LR(0) item sets, FIRST and
    /// FOLLOW sets.
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let n_sym = self.names.len();
        slr::write_prods(out, &self.prods, &self.names)?;
        writeln!(out)?;
        let c = slr::construct_set(&self.prods, &self.starts, self.n_nonterm, n_sym);
        slr::write_set(out, &c, &self.prods, &self.names)?;
        let (fst, nullable) = slr::first_sets(&self.prods, self.n_nonterm, n_sym);
        slr::write_fstflw(out, &fst, Some(&nullable), &self.names)?;
        writeln!(out)?;
        let start_syms: Vec<usize> = self.starts.iter().map(|&p| self.prods[p][0]).collect();
        let flw = slr::follow_sets(&self.prods, self.n_nonterm, &start_syms, self.end, &fst, &nullable);
        slr::write_fstflw(out, &flw, None, &self.names)?;
        Ok(())
    }
}

/// A conflict-free SLR(1) table.
#[derive(Debug, Clone)]
pub struct Table {
    actions: Vec<Vec<Action>>,
    start_states: Vec<usize>,
}

impl Table {
    /// The action for `(state, sym)`. Out-of-range lookups are `Error`.
    #[inline]
    pub fn action(&self, state: usize, sym: usize) -> Action {
        self.actions
            .get(state)
            .and_then(|row| row.get(sym))
            .copied()
            .unwrap_or(Action::Error)
    }

    /// The designated start state of the `i`-th start production, in the
    /// order the start productions were added.
    pub fn start_state(&self, i: usize) -> Option<usize> {
        self.start_states.get(i).copied()
    }

    /// Number of automaton states.
    pub fn n_states(&self) -> usize {
        self.actions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // symbols: S=0 E=1 T=2 | +=3 id=4 (=5 )=6 $=7
    fn arith() -> Grammar {
        let mut g = Grammar::new(["S", "E", "T", "+", "id", "(", ")", "$"], 3, 7).unwrap();
        g.add_start(0, &[1]).unwrap();
        g.add_production(1, &[1, 3, 2]).unwrap();
        g.add_production(1, &[2]).unwrap();
        g.add_production(2, &[4]).unwrap();
        g.add_production(2, &[5, 1, 6]).unwrap();
        g
    }

    fn run(table: &Table, start: usize, input: &[usize], prods: &[(usize, usize)]) -> bool {
        let mut states = vec![table.start_state(start).unwrap()];
        let mut i = 0;
        loop {
            let sym = input[i];
            match table.action(*states.last().unwrap(), sym) {
                Action::Shift(s) => {
                    states.push(s);
                    i += 1;
                }
                Action::Reduce(p) => {
                    let (lhs, len) = prods[p];
                    states.truncate(states.len() - len);
                    let Action::Goto(s) = table.action(*states.last().unwrap(), lhs) else {
                        return false;
                    };
                    states.push(s);
                }
                Action::Accept => return true,
                Action::Error | Action::Goto(_) => return false,
            }
        }
    }

    #[test]
    fn builds_conflict_free_table_and_accepts() {
        init_logger();
        let table = arith().build().unwrap();
        let prods = [(0, 1), (1, 3), (1, 1), (2, 1), (2, 3)];
        // id + ( id + id )
        assert!(run(&table, 0, &[4, 3, 5, 4, 3, 4, 6, 7], &prods));
        // id + + id
        assert!(!run(&table, 0, &[4, 3, 3, 4, 7], &prods));
    }

    #[test]
    fn ambiguous_grammar_is_rejected() {
        init_logger();
        // E -> E + E | id
        let mut g = Grammar::new(["S", "E", "+", "id", "$"], 2, 4).unwrap();
        g.add_start(0, &[1]).unwrap();
        g.add_production(1, &[1, 2, 1]).unwrap();
        g.add_production(1, &[3]).unwrap();
        let err = g.build().unwrap_err();
        assert!(err.to_string().contains("not SLR(1)"));
    }

    #[test]
    fn two_start_productions_get_distinct_states() {
        init_logger();
        // A -> a ; B -> b ; S1 -> A ; S2 -> B
        let mut g = Grammar::new(["S1", "S2", "A", "B", "a", "b", "$"], 4, 6).unwrap();
        g.add_start(0, &[2]).unwrap();
        g.add_start(1, &[3]).unwrap();
        g.add_production(2, &[4]).unwrap();
        g.add_production(3, &[5]).unwrap();
        let table = g.build().unwrap();
        let s1 = table.start_state(0).unwrap();
        let s2 = table.start_state(1).unwrap();
        assert_ne!(s1, s2);
        assert!(matches!(table.action(s1, 4), Action::Shift(_)));
        assert_eq!(table.action(s1, 5), Action::Error);
        assert!(matches!(table.action(s2, 5), Action::Shift(_)));
        assert_eq!(table.action(s2, 4), Action::Error);
    }

    #[test]
    fn rejects_malformed_productions() {
        let mut g = Grammar::new(["S", "x", "$"], 1, 2).unwrap();
        assert!(g.add_production(1, &[0]).is_err());
        assert!(g.add_production(0, &[9]).is_err());
        assert!(g.add_production(0, &[2]).is_err());
        assert!(Grammar::new(["S", "x"], 1, 0).is_err());
        assert!(g.build().is_err());
    }

    #[test]
    fn report_contains_all_sections() {
        let mut out = Vec::new();
        arith().write_report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PS,5"));
        assert!(text.contains("CS,"));
        assert!(text.contains("FIRST,E,{"));
        assert!(text.contains("FOLLOW,T,{"));
    }
}
