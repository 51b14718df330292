//! # symtab
//!
//! A fixed-capacity, flat symbol table. Every global name, whether it holds
//! a plain value or refers to a function definition, occupies one slot.
//! Slots are allocated in order and never freed; an all-zero name marks a
//! free slot.
//!
//! ## Example
//! ```rust
//! # use mincalc::{Name, SymTab};
//! let mut st = SymTab::with_capacity(4);
//! let x = Name::new("x").unwrap();
//! st.get_or_create(x).unwrap().value = 42;
//! assert_eq!(st.lookup(x).unwrap().value, 42);
//! assert_eq!(st.len(), 1);
//! ```
use crate::funstore::FunRef;
use crate::token::Name;
use thiserror::Error;

/// Errors that can occur when operating on a [`SymTab`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymTabError {
    /// Every slot is taken.
    #[error("symbol table full ({capacity} slots)")]
    Full {
        /// Total number of slots.
        capacity: usize,
    },
}

/// A symbol-table slot.
///
/// When `fun` is set the name denotes a function and `value` is unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarEntry {
    pub name: Name,
    pub value: i32,
    pub fun: Option<FunRef>,
}

impl VarEntry {
    pub fn is_function(&self) -> bool {
        self.fun.is_some()
    }
}

/// A fixed number of [`VarEntry`] slots searched linearly.
#[derive(Debug)]
pub struct SymTab {
    slots: Vec<VarEntry>,
    used: usize,
}

impl SymTab {
    /// Creates a table with `capacity` free slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![VarEntry::default(); capacity],
            used: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn position(&self, name: Name) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.slots[..self.used].iter().position(|e| e.name == name)
    }

    /// Finds the slot named `name`.
    pub fn lookup(&self, name: Name) -> Option<&VarEntry> {
        self.position(name).map(|i| &self.slots[i])
    }

    /// Takes the first free slot for `name`, with value `0` and no function.
    ///
    /// Does not check whether `name` is already present; see
    /// [`SymTab::get_or_create`].
    pub fn create(&mut self, name: Name) -> Result<&mut VarEntry, SymTabError> {
        let capacity = self.slots.len();
        let slot = self.slots.get_mut(self.used).ok_or(SymTabError::Full { capacity })?;
        *slot = VarEntry {
            name,
            ..VarEntry::default()
        };
        self.used += 1;
        log::debug!("symtab: created `{}` ({}/{})", name, self.used, capacity);
        Ok(slot)
    }

    /// Returns the slot named `name`, creating it if absent.
    pub fn get_or_create(&mut self, name: Name) -> Result<&mut VarEntry, SymTabError> {
        match self.position(name) {
            Some(i) => Ok(&mut self.slots[i]),
            None => self.create(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn create_and_lookup() {
        let mut st = SymTab::with_capacity(2);
        assert!(st.is_empty());
        st.create(name("a")).unwrap().value = 1;
        st.create(name("b")).unwrap().value = 2;
        assert_eq!(st.lookup(name("a")).unwrap().value, 1);
        assert_eq!(st.lookup(name("b")).unwrap().value, 2);
        assert!(st.lookup(name("c")).is_none());
        assert_eq!(st.len(), 2);
    }

    #[test]
    fn full_table_rejects_new_names() {
        let mut st = SymTab::with_capacity(1);
        st.get_or_create(name("a")).unwrap();
        assert_eq!(
            st.get_or_create(name("b")).unwrap_err(),
            SymTabError::Full { capacity: 1 }
        );
        // existing names are still reachable
        st.get_or_create(name("a")).unwrap().value = 7;
        assert_eq!(st.lookup(name("a")).unwrap().value, 7);
    }

    #[test]
    fn get_or_create_reuses_slot() {
        let mut st = SymTab::with_capacity(4);
        st.get_or_create(name("x")).unwrap().value = 3;
        assert_eq!(st.get_or_create(name("x")).unwrap().value, 3);
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn empty_name_is_never_found() {
        let mut st = SymTab::with_capacity(2);
        assert!(st.lookup(Name::EMPTY).is_none());
        st.create(name("q")).unwrap();
        assert!(st.lookup(Name::EMPTY).is_none());
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn new_entries_are_plain_zero_values() {
        let mut st = SymTab::with_capacity(1);
        let e = st.create(name("z")).unwrap();
        assert_eq!(e.value, 0);
        assert!(!e.is_function());
    }
}
