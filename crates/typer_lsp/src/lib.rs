//! Typer LSP — the incremental language-server core.
//!
//! Keeps two generations of compiler state synchronized with the editor:
//! an indexed **baseline** that grows with every known file, and a checked
//! **snapshot** cloned from it. Each batch of edits either re-checks just
//! the edited files against the existing snapshot (fast path) or rebuilds
//! the snapshot from the baseline (slow path); a per-file structural
//! definition hash decides which.
//!
//! Speaks length-framed JSON-RPC over any `BufRead`/`Write` pair — stdin
//! and stdout in production, in-memory pipes in tests.

pub mod diagnostics;
pub mod incremental;
pub mod methods;
pub mod protocol;
pub mod query;
pub mod server;
pub mod symbols;
pub mod uri;

pub use methods::{LspMethod, MethodKind};
pub use protocol::{read_message, write_message, ProtocolError};
pub use server::LspLoop;
