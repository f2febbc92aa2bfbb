//! Symbol arena — every declared entity the checker knows about.
//!
//! Symbols form a tree rooted at a synthetic root symbol (slot 0): classes
//! and modules own their members, methods own their arguments. Ownership is
//! acyclic; cross-references are by `SymbolRef`, never by direct ownership.

use crate::loc::Loc;
use crate::names::NameRef;
use crate::types::Type;

/// Handle into the symbol arena. Slot 0 is the synthetic root; user symbols
/// are dense starting at 1 and live only as long as their `GlobalState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolRef(pub u32);

impl SymbolRef {
    pub const ROOT: SymbolRef = SymbolRef(0);

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

/// What a symbol declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    ClassOrModule { is_module: bool },
    Method,
    Field,
    StaticField,
    MethodArgument,
    TypeMember,
    TypeArgument,
}

/// The written (pre-resolution) shape of a `sig` attached to a method.
/// Type names are stored exactly as written so the structural hash is
/// independent of what they resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSig {
    /// (argument name, written type name) in declaration order.
    pub params: Vec<(NameRef, NameRef)>,
    /// Written return type name; the interned name `self` denotes the
    /// receiver's own type.
    pub returns: NameRef,
}

/// One declared entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: NameRef,
    pub owner: SymbolRef,
    pub kind: SymbolKind,
    pub definition_loc: Loc,
    /// Resolved result type: return type for methods, declared type for
    /// arguments and static fields. `None` until the resolver runs.
    pub result_type: Option<Type>,
    /// Child symbols in declaration order.
    pub members: Vec<SymbolRef>,
    /// For methods: argument symbols in positional order.
    pub arguments: Vec<SymbolRef>,
    /// For classes: superclass name as written (`class A < B`).
    pub superclass_name: Option<NameRef>,
    /// For classes: superclass resolved by the resolver.
    pub superclass: Option<SymbolRef>,
    /// For methods: attached signature, if any.
    pub declared_sig: Option<DeclaredSig>,
}

impl Symbol {
    pub fn new(name: NameRef, owner: SymbolRef, kind: SymbolKind, definition_loc: Loc) -> Self {
        Self {
            name,
            owner,
            kind,
            definition_loc,
            result_type: None,
            members: Vec::new(),
            arguments: Vec::new(),
            superclass_name: None,
            superclass: None,
            declared_sig: None,
        }
    }

    pub fn is_class_or_module(&self) -> bool {
        matches!(self.kind, SymbolKind::ClassOrModule { .. })
    }

    pub fn is_module(&self) -> bool {
        matches!(self.kind, SymbolKind::ClassOrModule { is_module: true })
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, SymbolKind::ClassOrModule { is_module: false })
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    pub fn is_field(&self) -> bool {
        self.kind == SymbolKind::Field
    }

    pub fn is_static_field(&self) -> bool {
        self.kind == SymbolKind::StaticField
    }

    pub fn is_method_argument(&self) -> bool {
        self.kind == SymbolKind::MethodArgument
    }

    pub fn is_type_member(&self) -> bool {
        self.kind == SymbolKind::TypeMember
    }

    pub fn is_type_argument(&self) -> bool {
        self.kind == SymbolKind::TypeArgument
    }

    /// Type members of a generic class, in declaration order.
    pub fn type_members(&self, gs: &crate::global_state::GlobalState) -> Vec<SymbolRef> {
        self.members
            .iter()
            .copied()
            .filter(|m| gs.symbol(*m).is_type_member())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        let s = Symbol::new(
            NameRef(1),
            SymbolRef::ROOT,
            SymbolKind::ClassOrModule { is_module: false },
            Loc::none(),
        );
        assert!(s.is_class_or_module());
        assert!(s.is_class());
        assert!(!s.is_module());
        assert!(!s.is_method());
    }

    #[test]
    fn test_root_ref() {
        assert!(SymbolRef::ROOT.is_root());
        assert!(!SymbolRef(3).is_root());
    }
}
