//! SLR(1) parse table construction.
//!
//! `mincalc-gen` turns a grammar described as data ([`Grammar`]) into a
//! conflict-free action/goto [`Table`]. It is used by `mincalc` to build the
//! calculator automaton once at startup, and can render a report of the
//! productions, LR(0) item sets, and FIRST/FOLLOW sets for debugging.
//!
//! ```rust
//! use mincalc_gen::{Action, Grammar};
//!
//! // S -> E ; E -> E + n | n        symbols: S E | + n $
//! let mut g = Grammar::new(["S", "E", "+", "n", "$"], 2, 4).unwrap();
//! g.add_start(0, &[1]).unwrap();
//! g.add_production(1, &[1, 2, 3]).unwrap();
//! g.add_production(1, &[3]).unwrap();
//! let table = g.build().unwrap();
//! let start = table.start_state(0).unwrap();
//! assert!(matches!(table.action(start, 3), Action::Shift(_)));
//! assert_eq!(table.action(start, 2), Action::Error);
//! ```

mod grammar;
pub mod slr;

pub use grammar::{Grammar, Table};
pub use slr::Action;
