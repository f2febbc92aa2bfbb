//! Typer Pipeline — drives lexing, parsing, resolution, and type checking
//! over a `GlobalState`.
//!
//! Phases:
//! - **index** — lex + parse one file into an `IndexedTree` (parallel over a
//!   batch; results are ordered by input position, not completion order)
//! - **resolve** — namer + resolver over a batch of trees
//! - **typecheck** — parallel body inference over a shared read-only state
//!
//! Also owns the payload bootstrap and the per-file definition hash used by
//! the incremental engine.

pub mod payload;

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use typer_ast::SourceFile;
use typer_core::errors::classes;
use typer_core::{
    ErrorQueue, ErrorRegion, File, FileRef, GlobalState, Loc, PendingError, SourceType,
    UnfreezeFileTable, UnfreezeNameTable, UnfreezeSymbolTable,
};
use typer_lexer::Lexer;
use typer_parser::Parser;

/// Driver configuration.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Workspace-relative source paths known at startup.
    pub input_file_names: Vec<String>,
    pub verbose: bool,
}

/// The parsed, not-yet-resolved tree for one file, keyed by its FileRef id.
#[derive(Debug, Clone)]
pub struct IndexedTree {
    pub fref: FileRef,
    pub ast: SourceFile,
}

impl IndexedTree {
    pub fn deep_copy(&self) -> IndexedTree {
        self.clone()
    }
}

/// Enter and resolve the payload stubs, then freeze every table. The
/// resulting state is the empty baseline all others derive from.
pub fn bootstrap(gs: &mut GlobalState) {
    let file = Arc::new(File::new(
        payload::PAYLOAD_PATH,
        payload::PAYLOAD,
        SourceType::Payload,
    ));
    let fref = gs.enter_file(file);
    let tree = index_one(gs, fref);
    resolve(gs, std::slice::from_ref(&tree));
    gs.freeze_all();
}

/// Lex and parse one file already present in `gs`. Parse and lex errors go
/// to the error queue; the returned tree is whatever could be recovered.
pub fn index_one(gs: &GlobalState, fref: FileRef) -> IndexedTree {
    let file = gs.file(fref);
    if file.source_type == SourceType::TombStone {
        return IndexedTree {
            fref,
            ast: SourceFile {
                items: Vec::new(),
                loc: Loc::new(fref, 0, 0),
            },
        };
    }

    let lex = Lexer::new(file.source()).tokenize();
    for err in &lex.errors {
        gs.error_queue.push_error(PendingError::new(
            Loc::new(fref, err.span.start, err.span.end),
            classes::parser::PARSE_ERROR,
            err.message.clone(),
        ));
    }

    let parsed = Parser::new(lex.tokens, fref).parse();
    for err in &parsed.errors {
        gs.error_queue.push_error(PendingError::new(
            err.loc,
            classes::parser::PARSE_ERROR,
            err.message.clone(),
        ));
    }

    IndexedTree {
        fref,
        ast: parsed.ast,
    }
}

/// Index a batch in parallel. Output order matches `frefs`, so downstream
/// aggregation is deterministic.
pub fn index(gs: &GlobalState, frefs: &[FileRef]) -> Vec<IndexedTree> {
    debug!(files = frefs.len(), "indexing");
    frefs.par_iter().map(|fref| index_one(gs, *fref)).collect()
}

/// Run namer + resolver over `trees`, unfreezing the name and symbol tables
/// for the duration.
pub fn resolve(gs: &mut GlobalState, trees: &[IndexedTree]) {
    let mut names = UnfreezeNameTable::new(gs);
    let mut symbols = UnfreezeSymbolTable::new(&mut names);
    let borrowed: Vec<&SourceFile> = trees.iter().map(|t| &t.ast).collect();
    typer_resolve::resolve(&mut symbols, &borrowed);
}

/// Type check `trees` in parallel against a shared read-only state.
/// Diagnostics and query responses land in the state's error queue.
pub fn typecheck(gs: &GlobalState, trees: &[IndexedTree]) {
    debug!(files = trees.len(), "typechecking");
    trees
        .par_iter()
        .for_each(|tree| typer_infer::check_tree(gs, &tree.ast));
}

/// Structural definition hash of one file, computed in a throwaway state
/// with silenced errors: enter just this file, index it, resolve it in
/// isolation, and digest the declared symbol shapes.
pub fn definition_hash(file: &Arc<File>) -> u32 {
    if file.source_type == SourceType::TombStone {
        return 0;
    }
    // Nothing drains this queue while the file is processed, so it must
    // not exert backpressure.
    let queue = Arc::new(ErrorQueue::new(usize::MAX));
    let mut lgs = GlobalState::new(queue);
    bootstrap(&mut lgs);
    lgs.silence_errors = true;

    let hash;
    {
        let mut files = UnfreezeFileTable::new(&mut lgs);
        let fref = files.enter_file(Arc::clone(file));
        let tree = index_one(&files, fref);
        resolve(&mut files, std::slice::from_ref(&tree));
        hash = files.hash();
    }

    let _region = ErrorRegion::new(&lgs);
    hash
}
