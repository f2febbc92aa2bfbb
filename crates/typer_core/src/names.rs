//! Interned identifier names.

use rustc_hash::FxHashMap;

/// Handle to an interned name. Id 0 is the empty name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameRef(pub u32);

impl NameRef {
    pub const EMPTY: NameRef = NameRef(0);

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Dense intern table mapping strings to stable `NameRef` ids.
#[derive(Debug, Clone)]
pub struct NameTable {
    names: Vec<String>,
    lookup: FxHashMap<String, NameRef>,
}

impl NameTable {
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::new(),
            lookup: FxHashMap::default(),
        };
        let empty = table.intern("");
        debug_assert_eq!(empty, NameRef::EMPTY);
        table
    }

    pub fn intern(&mut self, name: &str) -> NameRef {
        if let Some(id) = self.lookup.get(name) {
            return *id;
        }
        let id = NameRef(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// Lookup without interning.
    pub fn find(&self, name: &str) -> Option<NameRef> {
        self.lookup.get(name).copied()
    }

    pub fn show(&self, name: NameRef) -> &str {
        &self.names[name.0 as usize]
    }

    pub fn names_used(&self) -> u32 {
        self.names.len() as u32
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedups() {
        let mut t = NameTable::new();
        let a = t.intern("foo");
        let b = t.intern("foo");
        let c = t.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(t.show(a), "foo");
        assert_eq!(t.show(c), "bar");
    }

    #[test]
    fn test_empty_is_zero() {
        let t = NameTable::new();
        assert_eq!(t.find(""), Some(NameRef::EMPTY));
        assert_eq!(t.show(NameRef::EMPTY), "");
    }
}
