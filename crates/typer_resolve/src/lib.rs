//! Typer Resolve — fills the symbol table from parsed trees.
//!
//! Two passes over each tree:
//! - **namer** enters every declared symbol (classes, modules, methods,
//!   arguments, fields, static fields, type members) and reports
//!   redefinitions;
//! - **resolver** links superclass references and signature types, and
//!   assigns static field types.
//!
//! Re-running both passes over an already-populated state is legal; it
//! re-reports redefinition diagnostics, which the interactive server
//! silences.

pub mod namer;
pub mod resolver;

use typer_ast::SourceFile;
use typer_core::GlobalState;

/// Run namer then resolver over a batch of trees.
pub fn resolve(gs: &mut GlobalState, trees: &[&SourceFile]) {
    for tree in trees {
        namer::enter_tree(gs, tree);
    }
    for tree in trees {
        resolver::resolve_tree(gs, tree);
    }
}

#[cfg(test)]
mod tests;
