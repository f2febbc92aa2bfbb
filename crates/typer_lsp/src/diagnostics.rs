//! Draining the error queue and publishing diagnostics.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use typer_core::errors::classes;
use typer_core::{ErrorClass, FileRef, Loc, SourceType};

use crate::methods::LspMethod;
use crate::protocol::ProtocolError;
use crate::server::LspLoop;

/// Diagnostic kinds suppressed in interactive mode: frequent false
/// positives while an edit is half-typed, and unavoidable noise from
/// re-running the namer over an already-populated snapshot.
pub(crate) fn silence_error(what: ErrorClass) -> bool {
    what == classes::namer::REDEFINITION_OF_METHOD
        || what == classes::resolver::DUPLICATE_VARIABLE_DECLARATION
        || what == classes::resolver::REDEFINITION_OF_PARENTS
}

impl<R: BufRead, W: Write> LspLoop<R, W> {
    /// Move queued errors into the per-file accumulator, recording which
    /// files have publications pending. Tombstoned files are garbage
    /// collected from the accumulator.
    pub(crate) fn drain_errors(&mut self) {
        for error in self.initial_gs.error_queue.drain_errors() {
            if silence_error(error.what) {
                continue;
            }
            let file = error.loc.file;
            self.errors_accumulated.entry(file).or_default().push(error);

            // Deduplicate only against the immediately previous entry;
            // repeated publications are allowed.
            if self.updated_errors.last() == Some(&file) {
                continue;
            }
            self.updated_errors.push(file);
        }

        let initial_gs = &self.initial_gs;
        self.errors_accumulated.retain(|fref, _| {
            !fref.exists() || initial_gs.file(*fref).source_type != SourceType::TombStone
        });
    }

    /// Forget all accumulated diagnostics, but queue every file that had
    /// some for republication so stale squiggles get cleared.
    pub(crate) fn invalidate_all_errors(&mut self) {
        let mut had_errors: Vec<FileRef> = self.errors_accumulated.keys().copied().collect();
        had_errors.sort();
        self.updated_errors = had_errors;
        self.errors_accumulated.clear();
    }

    /// Forget diagnostics for the given files and queue them for
    /// republication.
    pub(crate) fn invalidate_errors_for(&mut self, subset: &[FileRef]) {
        for fref in subset {
            self.errors_accumulated.remove(fref);
            if self.updated_errors.last() != Some(fref) {
                self.updated_errors.push(*fref);
            }
        }
    }

    /// Drain, then publish one notification per file with pending updates.
    pub(crate) fn push_errors(&mut self) -> Result<(), ProtocolError> {
        self.drain_errors();

        let files = std::mem::take(&mut self.updated_errors);
        for file in files {
            if !file.exists() {
                continue;
            }
            let file_data = self.final_gs.file(file);
            let uri = if file_data.source_type == SourceType::Payload {
                file_data.path().to_string()
            } else {
                self.local_to_remote(file_data.path())
            };

            let diagnostics: Vec<Value> = self
                .errors_accumulated
                .get(&file)
                .map(|errors| {
                    errors
                        .iter()
                        .map(|error| {
                            let mut diagnostic = json!({
                                "range": self.loc_to_range(error.loc),
                                "code": error.what.code,
                                "message": error.formatted,
                            });
                            if !error.sections.is_empty() {
                                let related: Vec<Value> = error
                                    .sections
                                    .iter()
                                    .flat_map(|section| {
                                        section.messages.iter().map(|line| {
                                            let message = if line.formatted.is_empty() {
                                                &section.header
                                            } else {
                                                &line.formatted
                                            };
                                            json!({
                                                "location": self.loc_to_location(line.loc),
                                                "message": message,
                                            })
                                        })
                                    })
                                    .collect();
                                diagnostic["relatedInformation"] = Value::Array(related);
                            }
                            diagnostic
                        })
                        .collect()
                })
                .unwrap_or_default();

            let params = json!({
                "uri": uri,
                "diagnostics": diagnostics,
            });
            self.send_notification(&LspMethod::PUSH_DIAGNOSTICS, params)?;
        }
        Ok(())
    }

    /// Internal one-based positions to protocol zero-based positions.
    pub(crate) fn loc_to_range(&self, loc: Loc) -> Value {
        if loc.is_none() {
            return json!({
                "start": {"line": 0, "character": 0},
                "end": {"line": 0, "character": 0},
            });
        }
        let (begin, end) = loc.position(&self.final_gs);
        json!({
            "start": {"line": begin.line - 1, "character": begin.column - 1},
            "end": {"line": end.line - 1, "character": end.column - 1},
        })
    }

    pub(crate) fn loc_to_location(&self, loc: Loc) -> Value {
        if loc.is_none() {
            return json!({"uri": "", "range": self.loc_to_range(loc)});
        }
        let file = self.final_gs.file(loc.file);
        let uri = if file.source_type == SourceType::Payload {
            // Editors append their own `#line,col` fragment when they open
            // a location; a `#L<line>` suffix keeps the link usable in a
            // browser as well.
            let (begin, _) = loc.position(&self.final_gs);
            format!("{}#L{}", file.path(), begin.line)
        } else {
            self.fref_to_uri(loc.file)
        };
        json!({
            "uri": uri,
            "range": self.loc_to_range(loc),
        })
    }
}
