//! Typer Core — the compiler world shared by every phase.
//!
//! Holds:
//! - **Files** — interned file table with stable `FileRef` ids
//! - **Locations** — byte-offset ranges convertible to line/column pairs
//! - **Names** — interned identifier table
//! - **Symbols** — arena of declared entities rooted at a synthetic root
//! - **Types** — the checker's type representation and substitution ops
//! - **GlobalState** — the whole world: tables, freeze scopes, structural hash
//! - **Errors** — the concurrent error/query channel and scoped error regions

pub mod errors;
pub mod files;
pub mod global_state;
pub mod loc;
pub mod names;
pub mod query;
pub mod symbols;
pub mod types;

pub use errors::{ErrorClass, ErrorLine, ErrorQueue, ErrorRegion, ErrorSection, PendingError};
pub use files::{File, FileRef, SourceType};
pub use global_state::{
    GlobalState, UnfreezeFileTable, UnfreezeNameTable, UnfreezeSymbolTable,
};
pub use loc::{Detail, Loc};
pub use names::{NameRef, NameTable};
pub use query::{DispatchComponent, QueryKind, QueryResponse, TypeAndOrigins};
pub use symbols::{DeclaredSig, Symbol, SymbolKind, SymbolRef};
pub use types::{LiteralValue, Type, TypeConstraint};
