//! # funstore
//!
//! Function definitions are kept as source text, not as trees: the full
//! text of each defining statement is appended to a bounded buffer, and the
//! defining name's symbol-table entry records where it starts. Every call
//! parses the stored text again.
//!
//! Texts are NUL-terminated and never removed, so redefining a function
//! leaves the previous text behind.
use thiserror::Error;

/// Errors that can occur when operating on a [`FunStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunStoreError {
    #[error("function store full: {requested} bytes requested, {available} available")]
    Full { requested: usize, available: usize },
}

/// Location of a stored definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunRef(usize);

impl FunRef {
    /// Byte offset of the text within the store.
    pub fn offset(self) -> usize {
        self.0
    }
}

/// An append-only, bounded buffer of NUL-terminated definition texts.
#[derive(Debug)]
pub struct FunStore {
    buf: Vec<u8>,
    capacity: usize,
}

impl FunStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `text` and its terminator.
    ///
    /// Only the part of `text` before its first NUL byte is stored. Fails
    /// without storing anything if the text and terminator do not fit.
    ///
    /// ```rust
    /// # use mincalc::FunStore;
    /// let mut store = FunStore::with_capacity(16);
    /// let f = store.append(b"f(x) := x").unwrap();
    /// assert_eq!(store.get(f), Some(&b"f(x) := x"[..]));
    /// assert_eq!(store.used(), 10);
    /// ```
    pub fn append(&mut self, text: &[u8]) -> Result<FunRef, FunStoreError> {
        let text = text.split(|&b| b == 0).next().unwrap_or_default();
        let requested = text.len() + 1;
        let available = self.remaining();
        if requested > available {
            log::debug!("funstore: {} bytes do not fit in {}", requested, available);
            return Err(FunStoreError::Full { requested, available });
        }
        let r = FunRef(self.buf.len());
        self.buf.extend_from_slice(text);
        self.buf.push(0);
        log::debug!("funstore: stored {} bytes at {}", requested, r.0);
        Ok(r)
    }

    /// The text stored at `r`, without its terminator.
    pub fn get(&self, r: FunRef) -> Option<&[u8]> {
        let tail = self.buf.get(r.0..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        Some(&tail[..end])
    }

    /// Bytes in use, terminators included.
    pub fn used(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts_are_stored_back_to_back() {
        let mut store = FunStore::with_capacity(32);
        let a = store.append(b"f() := 1").unwrap();
        let b = store.append(b"g(x) := x").unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 9);
        assert_eq!(store.get(a), Some(&b"f() := 1"[..]));
        assert_eq!(store.get(b), Some(&b"g(x) := x"[..]));
        assert_eq!(store.used(), 19);
    }

    #[test]
    fn exact_fit_and_overflow() {
        let mut store = FunStore::with_capacity(4);
        assert_eq!(
            store.append(b"abcd"),
            Err(FunStoreError::Full {
                requested: 5,
                available: 4
            })
        );
        assert_eq!(store.used(), 0);
        store.append(b"abc").unwrap();
        assert_eq!(store.remaining(), 0);
        assert!(store.append(b"").is_err());
    }

    #[test]
    fn text_stops_at_nul() {
        let mut store = FunStore::with_capacity(8);
        let r = store.append(b"ab\0cd").unwrap();
        assert_eq!(store.get(r), Some(&b"ab"[..]));
        assert_eq!(store.used(), 3);
    }

    #[test]
    fn out_of_range_ref() {
        let store = FunStore::with_capacity(8);
        assert_eq!(store.get(FunRef(3)), None);
    }
}
