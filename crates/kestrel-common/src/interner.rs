//! String interning.
//!
//! Identifiers, property names and string literal values are interned once and
//! referred to by `Atom` afterwards. Comparing two atoms is a `u32` compare.
//!
//! The interner is shared by reference across the solver and checker, so
//! `intern` takes `&self`: the lookup table is a `DashMap` and the reverse
//! table sits behind an `RwLock`.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, PoisonError, RwLock};

/// Interned string handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string. Always present.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Atom::NONE
    }
}

/// Thread-safe string interner.
pub struct Interner {
    map: DashMap<Arc<str>, Atom>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        let interner = Interner {
            map: DashMap::new(),
            strings: RwLock::new(Vec::new()),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Atom::NONE);
        interner
    }

    /// Intern a string, returning the existing atom when already present.
    pub fn intern(&self, s: &str) -> Atom {
        if let Some(atom) = self.map.get(s) {
            return *atom;
        }
        let key: Arc<str> = Arc::from(s);
        match self.map.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut strings = self.strings.write().unwrap_or_else(PoisonError::into_inner);
                let atom = Atom(strings.len() as u32);
                strings.push(entry.key().clone());
                entry.insert(atom);
                atom
            }
        }
    }

    /// Resolve an atom back to its string. Unknown atoms resolve to "".
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.read().unwrap_or_else(PoisonError::into_inner);
        strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    pub fn len(&self) -> usize {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let interner = Interner::new();
        let a = interner.intern("value");
        let b = interner.intern("value");
        let c = interner.intern("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*interner.resolve(a), "value");
    }

    #[test]
    fn test_empty_string_is_none() {
        let interner = Interner::new();
        assert_eq!(interner.intern(""), Atom::NONE);
        assert!(Atom::NONE.is_none());
    }
}
