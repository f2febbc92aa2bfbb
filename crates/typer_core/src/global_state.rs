//! The entire compiler world: file table, name table, symbol arena, and the
//! error/query queue.
//!
//! Two instances of this type drive the language server: an indexed baseline
//! and a checked snapshot cloned from it. `deep_copy` duplicates every table
//! but shares the error queue, so both generations feed one consumer.

use std::hash::Hasher;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::errors::ErrorQueue;
use crate::files::{File, FileRef};
use crate::loc::Loc;
use crate::names::{NameRef, NameTable};
use crate::symbols::{Symbol, SymbolKind, SymbolRef};

pub struct GlobalState {
    /// Slot 0 is the null sentinel; live files are dense starting at 1.
    files: Vec<Option<Arc<File>>>,
    files_by_path: FxHashMap<String, FileRef>,
    names: NameTable,
    /// Slot 0 is the synthetic root symbol.
    symbols: Vec<Symbol>,
    pub error_queue: Arc<ErrorQueue>,
    /// When set, `ErrorRegion`s discard instead of flushing on exit.
    pub silence_errors: bool,
    /// Single-point cursor of interest; the typechecker emits query
    /// responses for expressions covering it. `Loc::none()` disables.
    pub lsp_query_loc: Loc,
    file_table_frozen: bool,
    name_table_frozen: bool,
    symbol_table_frozen: bool,
}

impl GlobalState {
    pub fn new(error_queue: Arc<ErrorQueue>) -> Self {
        let mut names = NameTable::new();
        let root_name = names.intern("<root>");
        let root = Symbol::new(
            root_name,
            SymbolRef::ROOT,
            SymbolKind::ClassOrModule { is_module: true },
            Loc::none(),
        );
        Self {
            files: vec![None],
            files_by_path: FxHashMap::default(),
            names,
            symbols: vec![root],
            error_queue,
            silence_errors: false,
            lsp_query_loc: Loc::none(),
            file_table_frozen: false,
            name_table_frozen: false,
            symbol_table_frozen: false,
        }
    }

    /// Duplicate every table. The error queue is shared, not copied.
    pub fn deep_copy(&self) -> GlobalState {
        GlobalState {
            files: self.files.clone(),
            files_by_path: self.files_by_path.clone(),
            names: self.names.clone(),
            symbols: self.symbols.clone(),
            error_queue: Arc::clone(&self.error_queue),
            silence_errors: self.silence_errors,
            lsp_query_loc: self.lsp_query_loc,
            file_table_frozen: self.file_table_frozen,
            name_table_frozen: self.name_table_frozen,
            symbol_table_frozen: self.symbol_table_frozen,
        }
    }

    // === Files ===

    pub fn enter_file(&mut self, file: Arc<File>) -> FileRef {
        assert!(!self.file_table_frozen, "file table is frozen");
        assert!(
            !self.files_by_path.contains_key(file.path()),
            "enter_file: path {} already present",
            file.path()
        );
        let fref = FileRef::new(self.files.len() as u32);
        self.files_by_path.insert(file.path().to_string(), fref);
        self.files.push(Some(file));
        fref
    }

    /// Swap the contents of an existing slot. The table does not grow, so
    /// this is legal even while the file table is frozen.
    pub fn replace_file(&mut self, fref: FileRef, file: Arc<File>) {
        let slot = self
            .files
            .get_mut(fref.id() as usize)
            .unwrap_or_else(|| panic!("replace_file: no slot for file id {}", fref.id()));
        let existing = slot.as_ref().expect("replace_file: empty slot");
        assert_eq!(
            existing.path(),
            file.path(),
            "replace_file must keep the path"
        );
        *slot = Some(file);
    }

    pub fn find_file_by_path(&self, path: &str) -> FileRef {
        self.files_by_path.get(path).copied().unwrap_or_default()
    }

    pub fn file(&self, fref: FileRef) -> &Arc<File> {
        self.files[fref.id() as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("no file for id {}", fref.id()))
    }

    /// Size of the file table including the null slot, so valid ids are
    /// `1..files_used()`.
    pub fn files_used(&self) -> u32 {
        self.files.len() as u32
    }

    /// Dense file table aligned by id; slot 0 is `None`.
    pub fn files(&self) -> &[Option<Arc<File>>] {
        &self.files
    }

    // === Names ===

    pub fn intern_name(&mut self, name: &str) -> NameRef {
        if let Some(existing) = self.names.find(name) {
            return existing;
        }
        assert!(!self.name_table_frozen, "name table is frozen");
        self.names.intern(name)
    }

    pub fn find_name(&self, name: &str) -> Option<NameRef> {
        self.names.find(name)
    }

    pub fn show_name(&self, name: NameRef) -> &str {
        self.names.show(name)
    }

    // === Symbols ===

    pub fn symbol(&self, sym: SymbolRef) -> &Symbol {
        &self.symbols[sym.id() as usize]
    }

    pub fn symbol_mut(&mut self, sym: SymbolRef) -> &mut Symbol {
        assert!(!self.symbol_table_frozen, "symbol table is frozen");
        &mut self.symbols[sym.id() as usize]
    }

    /// Size of the arena including the root, so user symbols are
    /// `1..symbols_used()`.
    pub fn symbols_used(&self) -> u32 {
        self.symbols.len() as u32
    }

    /// Child of `owner` with the given name, if any.
    pub fn find_member(&self, owner: SymbolRef, name: NameRef) -> Option<SymbolRef> {
        self.symbol(owner)
            .members
            .iter()
            .copied()
            .find(|m| self.symbol(*m).name == name)
    }

    /// Method lookup along the superclass chain.
    pub fn find_method(&self, klass: SymbolRef, name: NameRef) -> Option<SymbolRef> {
        let mut current = Some(klass);
        while let Some(k) = current {
            if let Some(member) = self.find_member(k, name) {
                if self.symbol(member).is_method() {
                    return Some(member);
                }
            }
            current = self.symbol(k).superclass;
            if current == Some(k) {
                break;
            }
        }
        None
    }

    /// Resolve a possibly-qualified constant written in `scope`: the first
    /// part is looked up along the lexical owner chain (innermost first,
    /// ending at the root), the rest by plain member lookup.
    pub fn lookup_constant(&self, scope: SymbolRef, parts: &[String]) -> Option<SymbolRef> {
        let (first, rest) = parts.split_first()?;
        let first_name = self.find_name(first)?;

        let mut found = None;
        let mut current = scope;
        loop {
            if let Some(member) = self.find_member(current, first_name) {
                found = Some(member);
                break;
            }
            if current.is_root() {
                break;
            }
            current = self.symbol(current).owner;
        }

        let mut resolved = found?;
        for part in rest {
            let part_name = self.find_name(part)?;
            resolved = self.find_member(resolved, part_name)?;
        }
        Some(resolved)
    }

    fn alloc_symbol(&mut self, symbol: Symbol) -> SymbolRef {
        assert!(!self.symbol_table_frozen, "symbol table is frozen");
        let sym = SymbolRef(self.symbols.len() as u32);
        self.symbols.push(symbol);
        sym
    }

    /// Enter (or re-open) a class or module under `owner`.
    pub fn enter_class_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
        is_module: bool,
    ) -> SymbolRef {
        if let Some(existing) = self.find_member(owner, name) {
            if self.symbol(existing).is_class_or_module() {
                self.symbol_mut(existing).definition_loc = loc;
                return existing;
            }
        }
        let sym = self.alloc_symbol(Symbol::new(
            name,
            owner,
            SymbolKind::ClassOrModule { is_module },
            loc,
        ));
        self.symbol_mut(owner).members.push(sym);
        sym
    }

    /// Enter a method under `owner`. Re-entering an existing name reuses the
    /// slot (arguments and signature reset) and reports `redefined`.
    pub fn enter_method_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
    ) -> (SymbolRef, bool) {
        if let Some(existing) = self.find_member(owner, name) {
            if self.symbol(existing).is_method() {
                let data = self.symbol_mut(existing);
                data.definition_loc = loc;
                data.arguments.clear();
                data.declared_sig = None;
                data.result_type = None;
                return (existing, true);
            }
        }
        let sym = self.alloc_symbol(Symbol::new(name, owner, SymbolKind::Method, loc));
        self.symbol_mut(owner).members.push(sym);
        (sym, false)
    }

    pub fn enter_method_argument_symbol(
        &mut self,
        loc: Loc,
        method: SymbolRef,
        name: NameRef,
    ) -> SymbolRef {
        let sym = self.alloc_symbol(Symbol::new(name, method, SymbolKind::MethodArgument, loc));
        self.symbol_mut(method).arguments.push(sym);
        sym
    }

    pub fn enter_field_symbol(&mut self, loc: Loc, owner: SymbolRef, name: NameRef) -> SymbolRef {
        if let Some(existing) = self.find_member(owner, name) {
            if self.symbol(existing).is_field() {
                return existing;
            }
        }
        let sym = self.alloc_symbol(Symbol::new(name, owner, SymbolKind::Field, loc));
        self.symbol_mut(owner).members.push(sym);
        sym
    }

    /// Enter a static field (constant). A pre-existing one reports
    /// `duplicate`.
    pub fn enter_static_field_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
    ) -> (SymbolRef, bool) {
        if let Some(existing) = self.find_member(owner, name) {
            if self.symbol(existing).is_static_field() {
                return (existing, true);
            }
        }
        let sym = self.alloc_symbol(Symbol::new(name, owner, SymbolKind::StaticField, loc));
        self.symbol_mut(owner).members.push(sym);
        (sym, false)
    }

    pub fn enter_type_member_symbol(
        &mut self,
        loc: Loc,
        owner: SymbolRef,
        name: NameRef,
    ) -> SymbolRef {
        if let Some(existing) = self.find_member(owner, name) {
            if self.symbol(existing).is_type_member() {
                return existing;
            }
        }
        let sym = self.alloc_symbol(Symbol::new(name, owner, SymbolKind::TypeMember, loc));
        self.symbol_mut(owner).members.push(sym);
        sym
    }

    /// `A::B::c`-style qualified name, walking the owner chain.
    pub fn full_name(&self, sym: SymbolRef) -> String {
        if sym.is_root() {
            return "<root>".to_string();
        }
        let mut parts = Vec::new();
        let mut current = sym;
        while !current.is_root() {
            let data = self.symbol(current);
            parts.push(self.show_name(data.name).to_string());
            current = data.owner;
        }
        parts.reverse();
        parts.join("::")
    }

    // === Freezing ===

    pub fn freeze_all(&mut self) {
        self.file_table_frozen = true;
        self.name_table_frozen = true;
        self.symbol_table_frozen = true;
    }

    pub fn is_file_table_frozen(&self) -> bool {
        self.file_table_frozen
    }

    pub fn is_name_table_frozen(&self) -> bool {
        self.name_table_frozen
    }

    pub fn is_symbol_table_frozen(&self) -> bool {
        self.symbol_table_frozen
    }

    // === Structural hash ===

    /// Digest of the externally observable declarations: class/module tree,
    /// superclass names, type members, method headers (argument names and
    /// written sig types), and static fields (name plus initializer type).
    /// Never method bodies, fields declared inside bodies, comments, or
    /// locations — so an edit that only touches bodies leaves the hash
    /// unchanged.
    pub fn hash(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.hash_symbol_shape(SymbolRef::ROOT, &mut hasher);
        let digest = hasher.finish();
        (digest ^ (digest >> 32)) as u32
    }

    fn hash_symbol_shape(&self, sym: SymbolRef, hasher: &mut FxHasher) {
        let data = self.symbol(sym);
        let tag: u8 = match data.kind {
            SymbolKind::ClassOrModule { is_module: false } => 1,
            SymbolKind::ClassOrModule { is_module: true } => 2,
            SymbolKind::Method => 3,
            // Fields are declared inside method bodies; digesting them would
            // make the hash body-sensitive.
            SymbolKind::Field => return,
            SymbolKind::StaticField => 5,
            SymbolKind::MethodArgument => 6,
            SymbolKind::TypeMember => 7,
            SymbolKind::TypeArgument => 8,
        };
        hasher.write_u8(tag);
        hasher.write(self.show_name(data.name).as_bytes());
        if let Some(superclass_name) = data.superclass_name {
            hasher.write_u8(b'<');
            hasher.write(self.show_name(superclass_name).as_bytes());
        }
        if data.is_static_field() {
            // A constant's initializer shape is part of its declaration.
            if let Some(ty) = &data.result_type {
                hasher.write(ty.show(self).as_bytes());
            }
        }
        if data.is_method() {
            for arg in &data.arguments {
                hasher.write_u8(b'(');
                hasher.write(self.show_name(self.symbol(*arg).name).as_bytes());
            }
            if let Some(sig) = &data.declared_sig {
                for (param, written_type) in &sig.params {
                    hasher.write_u8(b':');
                    hasher.write(self.show_name(*param).as_bytes());
                    hasher.write(self.show_name(*written_type).as_bytes());
                }
                hasher.write_u8(b'>');
                hasher.write(self.show_name(sig.returns).as_bytes());
            }
        }
        for member in &data.members {
            self.hash_symbol_shape(*member, hasher);
        }
        hasher.write_u8(b';');
    }
}

/// Scoped unfreeze of the file table; restores the previous freeze state on
/// every exit path. Derefs to the state so entering files reads naturally.
pub struct UnfreezeFileTable<'gs> {
    gs: &'gs mut GlobalState,
    was_frozen: bool,
}

impl<'gs> UnfreezeFileTable<'gs> {
    pub fn new(gs: &'gs mut GlobalState) -> Self {
        let was_frozen = gs.file_table_frozen;
        gs.file_table_frozen = false;
        Self { gs, was_frozen }
    }
}

impl Drop for UnfreezeFileTable<'_> {
    fn drop(&mut self) {
        self.gs.file_table_frozen = self.was_frozen;
    }
}

impl Deref for UnfreezeFileTable<'_> {
    type Target = GlobalState;
    fn deref(&self) -> &GlobalState {
        self.gs
    }
}

impl DerefMut for UnfreezeFileTable<'_> {
    fn deref_mut(&mut self) -> &mut GlobalState {
        self.gs
    }
}

/// Scoped unfreeze of the name table.
pub struct UnfreezeNameTable<'gs> {
    gs: &'gs mut GlobalState,
    was_frozen: bool,
}

impl<'gs> UnfreezeNameTable<'gs> {
    pub fn new(gs: &'gs mut GlobalState) -> Self {
        let was_frozen = gs.name_table_frozen;
        gs.name_table_frozen = false;
        Self { gs, was_frozen }
    }
}

impl Drop for UnfreezeNameTable<'_> {
    fn drop(&mut self) {
        self.gs.name_table_frozen = self.was_frozen;
    }
}

impl Deref for UnfreezeNameTable<'_> {
    type Target = GlobalState;
    fn deref(&self) -> &GlobalState {
        self.gs
    }
}

impl DerefMut for UnfreezeNameTable<'_> {
    fn deref_mut(&mut self) -> &mut GlobalState {
        self.gs
    }
}

/// Scoped unfreeze of the symbol table.
pub struct UnfreezeSymbolTable<'gs> {
    gs: &'gs mut GlobalState,
    was_frozen: bool,
}

impl<'gs> UnfreezeSymbolTable<'gs> {
    pub fn new(gs: &'gs mut GlobalState) -> Self {
        let was_frozen = gs.symbol_table_frozen;
        gs.symbol_table_frozen = false;
        Self { gs, was_frozen }
    }
}

impl Drop for UnfreezeSymbolTable<'_> {
    fn drop(&mut self) {
        self.gs.symbol_table_frozen = self.was_frozen;
    }
}

impl Deref for UnfreezeSymbolTable<'_> {
    type Target = GlobalState;
    fn deref(&self) -> &GlobalState {
        self.gs
    }
}

impl DerefMut for UnfreezeSymbolTable<'_> {
    fn deref_mut(&mut self) -> &mut GlobalState {
        self.gs
    }
}
