//! The fast/slow path scheduler and the state it maintains.
//!
//! A batch of changed files takes the fast path only when every file is
//! already known to the baseline and none of their definition hashes moved.
//! One structural change anywhere sends the whole batch down the slow path.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use typer_core::{File, FileRef, SourceType, UnfreezeFileTable};
use typer_pipeline as pipeline;

use crate::server::LspLoop;

impl<R: BufRead, W: Write> LspLoop<R, W> {
    /// Enter a file into the baseline (reusing its slot if the path is
    /// known), index it, and record the tree.
    pub(crate) fn add_new_file(&mut self, file: Arc<File>) -> FileRef {
        let mut fref = self.initial_gs.find_file_by_path(file.path());
        if fref.exists() {
            self.initial_gs.replace_file(fref, file);
        } else {
            let mut files = UnfreezeFileTable::new(&mut self.initial_gs);
            fref = files.enter_file(file);
        }

        let tree = pipeline::index_one(&self.initial_gs, fref);
        let id = fref.id() as usize;
        if id >= self.indexed.len() {
            self.indexed.resize_with(id + 1, || None);
        }
        self.indexed[id] = Some(tree);
        fref
    }

    /// Definition hashes for a dense file table, aligned by id. Empty slots
    /// hash to 0. One worker job per file.
    pub(crate) fn compute_state_hashes(files: &[Option<Arc<File>>]) -> Vec<u32> {
        files
            .par_iter()
            .map(|slot| slot.as_ref().map(pipeline::definition_hash).unwrap_or(0))
            .collect()
    }

    fn compute_batch_hashes(files: &[Arc<File>]) -> Vec<u32> {
        files.par_iter().map(pipeline::definition_hash).collect()
    }

    /// Load every known source from disk and rebuild the indexed-tree
    /// vector. Called once, when the client reports itself initialized.
    pub(crate) fn reindex_from_filesystem(&mut self) {
        self.indexed.clear();

        let mut names: BTreeSet<String> = self.opts.input_file_names.iter().cloned().collect();
        for id in 1..self.initial_gs.files_used() {
            let fref = FileRef::new(id);
            let file = self.initial_gs.file(fref);
            if file.source_type == SourceType::Normal {
                names.insert(file.path().to_string());
            }
        }

        let mut frefs = Vec::new();
        for name in names {
            let content = match std::fs::read_to_string(&name) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %name, %err, "could not read workspace file");
                    continue;
                }
            };
            let file = Arc::new(File::new(name, content, SourceType::Normal));
            let mut fref = self.initial_gs.find_file_by_path(file.path());
            if fref.exists() {
                self.initial_gs.replace_file(fref, file);
            } else {
                let mut files = UnfreezeFileTable::new(&mut self.initial_gs);
                fref = files.enter_file(file);
            }
            frefs.push(fref);
        }

        for tree in pipeline::index(&self.initial_gs, &frefs) {
            let id = tree.fref.id() as usize;
            if id >= self.indexed.len() {
                self.indexed.resize_with(id + 1, || None);
            }
            self.indexed[id] = Some(tree);
        }
    }

    /// Decide fast or slow for one batch of changed files, then run it.
    pub(crate) fn try_fast_path(&mut self, changed: Vec<Arc<File>>) {
        debug!(
            files = changed.len(),
            "checking whether the fast path is available"
        );
        let hashes = Self::compute_batch_hashes(&changed);
        assert_eq!(changed.len(), hashes.len());

        let mut good = true;
        let mut subset = Vec::new();
        for (i, file) in changed.iter().enumerate() {
            let was_files = self.initial_gs.files_used();
            let fref = self.add_new_file(Arc::clone(file));
            let id = fref.id() as usize;

            if was_files != self.initial_gs.files_used() {
                info!(file = file.path(), "taking slow path: new file");
                good = false;
                if self.global_state_hashes.len() <= id {
                    self.global_state_hashes.resize(id + 1, 0);
                    self.global_state_hashes[id] = hashes[i];
                }
            } else {
                if hashes[i] != self.global_state_hashes[id] {
                    info!(file = file.path(), "taking slow path: changed definitions");
                    good = false;
                    self.global_state_hashes[id] = hashes[i];
                }
                if good {
                    // A missing snapshot slot cannot be re-edited in place.
                    if (id as u32) < self.final_gs.files_used() {
                        self.final_gs.replace_file(fref, Arc::clone(file));
                    } else {
                        info!(file = file.path(), "taking slow path: snapshot has no slot");
                        good = false;
                    }
                }
                subset.push(fref);
            }
        }

        if good {
            self.invalidate_errors_for(&subset);
            info!("taking fast path");
            let updated = pipeline::index(&self.final_gs, &subset);
            assert_eq!(subset.len(), updated.len());
            for tree in &updated {
                let id = tree.fref.id() as usize;
                if id >= self.indexed.len() {
                    self.indexed.resize_with(id + 1, || None);
                }
                self.indexed[id] = Some(tree.deep_copy());
            }
            pipeline::resolve(&mut self.final_gs, &updated);
            pipeline::typecheck(&self.final_gs, &updated);
        } else {
            self.run_slow_path(changed);
        }
    }

    /// Rebuild the snapshot: fold the changed files into the baseline,
    /// clone it, and re-resolve and re-check the entire workspace.
    pub(crate) fn run_slow_path(&mut self, changed: Vec<Arc<File>>) {
        info!("taking slow path");
        self.invalidate_all_errors();

        for file in changed {
            self.add_new_file(file);
        }

        let copies: Vec<pipeline::IndexedTree> = self
            .indexed
            .iter()
            .flatten()
            .map(|tree| tree.deep_copy())
            .collect();

        self.final_gs = self.initial_gs.deep_copy();
        pipeline::resolve(&mut self.final_gs, &copies);
        pipeline::typecheck(&self.final_gs, &copies);
    }
}
