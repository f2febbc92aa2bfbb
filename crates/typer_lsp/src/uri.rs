//! The file mirror: editor URIs to and from workspace-relative paths.

use std::io::{BufRead, Write};

use typer_core::{FileRef, SourceType};

use crate::server::LspLoop;

impl<R: BufRead, W: Write> LspLoop<R, W> {
    /// Strip the registered rootUri prefix. A URI outside the root (or any
    /// URI before `initialize` registered a root) yields `None`.
    pub(crate) fn remote_to_local(&self, uri: &str) -> Option<String> {
        if self.root_uri.is_empty() {
            return None;
        }
        let prefix = format!("{}/", self.root_uri);
        uri.strip_prefix(&prefix).map(str::to_string)
    }

    /// Re-qualify a workspace-relative path with the rootUri.
    pub(crate) fn local_to_remote(&self, path: &str) -> String {
        format!("{}/{}", self.root_uri, path)
    }

    /// An unknown or out-of-root URI resolves to the null FileRef.
    pub(crate) fn uri_to_fref(&self, uri: &str) -> FileRef {
        match self.remote_to_local(uri) {
            Some(path) => self.initial_gs.find_file_by_path(&path),
            None => FileRef::NULL,
        }
    }

    /// Payload files are addressed by bare path; everything else gets a
    /// rootUri-qualified URI.
    pub(crate) fn fref_to_uri(&self, fref: FileRef) -> String {
        let file = self.final_gs.file(fref);
        if file.source_type == SourceType::Payload {
            file.path().to_string()
        } else {
            self.local_to_remote(file.path())
        }
    }
}
