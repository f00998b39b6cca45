//! Symbol interning context.
//!
//! Symbols are stored inside values as `u32` indices into a
//! [`SymbolContext`]; serializers consult the context for the
//! NUL-terminated byte form. Interning is append-only, so concurrent
//! readers always observe a monotonically growing table.
//!
//! A context is usually shared per connection behind an `Arc`; sharing one
//! context across connections is possible but values are only comparable
//! within the context that interned their symbols.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::CodecError;

#[derive(Debug, Default)]
struct Inner {
    index: HashMap<String, u32>,
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    text: String,
    // text bytes plus the trailing NUL, ready for the wire
    wire: Vec<u8>,
}

/// Append-only mapping `string -> u32` with reverse lookup.
///
/// Cloned handles (via `Arc`) share the same table. Lock poisoning is
/// treated as unrecoverable corruption of the interning table.
#[derive(Debug, Default)]
pub struct SymbolContext {
    inner: RwLock<Inner>,
}

impl SymbolContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its stable index.
    ///
    /// Interning the same string twice returns the same index.
    pub fn intern(&self, s: &str) -> u32 {
        let mut inner = self.write();
        if let Some(&idx) = inner.index.get(s) {
            return idx;
        }
        let idx = inner.entries.len() as u32;
        let mut wire = Vec::with_capacity(s.len() + 1);
        wire.extend_from_slice(s.as_bytes());
        wire.push(0);
        inner.entries.push(Entry { text: s.to_owned(), wire });
        inner.index.insert(s.to_owned(), idx);
        idx
    }

    /// Intern raw wire bytes (without the trailing NUL).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidUtf8`] for non-UTF-8 input; the table
    /// is left unchanged.
    pub fn intern_bytes(&self, bytes: &[u8]) -> Result<u32, CodecError> {
        let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { what: "symbol" })?;
        Ok(self.intern(s))
    }

    /// Index of an already-interned string, without interning it.
    #[must_use]
    pub fn find(&self, s: &str) -> Option<u32> {
        self.read().index.get(s).copied()
    }

    /// String form of an interned symbol.
    #[must_use]
    pub fn lookup_str(&self, idx: u32) -> Option<String> {
        self.read().entries.get(idx as usize).map(|e| e.text.clone())
    }

    /// NUL-terminated byte form of an interned symbol.
    #[must_use]
    pub fn wire_bytes(&self, idx: u32) -> Option<Vec<u8>> {
        self.read().entries.get(idx as usize).map(|e| e.wire.clone())
    }

    /// Number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether the context has no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // INVARIANT: interning only appends; a panic while holding the lock
    // means the table is unusable, so propagating the poison is correct.
    #[allow(clippy::unwrap_used)]
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let ctx = SymbolContext::new();
        assert_eq!(ctx.intern("hello"), 0);
        assert_eq!(ctx.intern("world"), 1);
        assert_eq!(ctx.intern("hello"), 0);
        assert_eq!(ctx.intern("world"), 1);
        assert_eq!(ctx.intern("how"), 2);
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn reverse_lookup() {
        let ctx = SymbolContext::new();
        ctx.intern("hello");
        ctx.intern("world");
        let idx = ctx.intern("how");
        assert_eq!(ctx.lookup_str(idx), Some("how".to_owned()));
        assert_eq!(ctx.wire_bytes(idx), Some(b"how\0".to_vec()));
        assert_eq!(ctx.lookup_str(99), None);
    }

    #[test]
    fn non_ascii_symbols_intern() {
        let ctx = SymbolContext::new();
        let idx = ctx.intern("\u{1f4a9}");
        assert_eq!(ctx.lookup_str(idx).as_deref(), Some("\u{1f4a9}"));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let ctx = SymbolContext::new();
        ctx.intern("keep");
        let err = ctx.intern_bytes(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { what: "symbol" });
        // the failed intern must not corrupt the table
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn find_does_not_intern() {
        let ctx = SymbolContext::new();
        assert_eq!(ctx.find("ghost"), None);
        assert_eq!(ctx.len(), 0);
        let idx = ctx.intern("ghost");
        assert_eq!(ctx.find("ghost"), Some(idx));
    }
}
