//! The event loop: reads framed messages, dispatches them, and owns the two
//! compiler states plus everything derived from them.

use std::io::{BufRead, Write};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{json, Value};
use tracing::{info, trace, warn};

use typer_core::{ErrorQueue, File, FileRef, GlobalState, PendingError, SourceType};
use typer_pipeline::{bootstrap, IndexedTree, Options};

use crate::methods::{LspMethod, MethodKind};
use crate::protocol::{
    self, Notification, Request, Response, ProtocolError, INVALID_PARAMS, METHOD_NOT_FOUND,
};

/// Continuation invoked when the client answers a server-initiated request.
pub(crate) type Callback<R, W> =
    Box<dyn FnOnce(&mut LspLoop<R, W>, Value) -> Result<(), ProtocolError>>;

pub(crate) struct ResponseHandler<R, W> {
    pub(crate) on_result: Callback<R, W>,
    pub(crate) on_error: Callback<R, W>,
}

/// Whether the loop keeps reading after a message.
enum Flow {
    Continue,
    Exit,
}

pub struct LspLoop<R, W> {
    reader: R,
    pub(crate) writer: W,
    pub(crate) opts: Options,
    /// The baseline: file-entered and indexed, never typechecked.
    pub(crate) initial_gs: GlobalState,
    /// The checked snapshot, freshened on fast paths and rebuilt on slow
    /// paths.
    pub(crate) final_gs: GlobalState,
    /// Indexed trees, dense by FileRef id. Grown, never shrunk.
    pub(crate) indexed: Vec<Option<IndexedTree>>,
    /// Definition hash per FileRef id, parallel to the file table.
    pub(crate) global_state_hashes: Vec<u32>,
    pub(crate) errors_accumulated: FxHashMap<FileRef, Vec<PendingError>>,
    pub(crate) updated_errors: Vec<FileRef>,
    awaiting_response: FxHashMap<String, ResponseHandler<R, W>>,
    pub(crate) root_uri: String,
    request_counter: u64,
}

impl<R: BufRead, W: Write> LspLoop<R, W> {
    pub fn new(opts: Options, reader: R, writer: W) -> Self {
        let queue = Arc::new(ErrorQueue::default());
        let mut initial_gs = GlobalState::new(queue);
        bootstrap(&mut initial_gs);
        let final_gs = initial_gs.deep_copy();
        Self {
            reader,
            writer,
            opts,
            initial_gs,
            final_gs,
            indexed: Vec::new(),
            global_state_hashes: Vec::new(),
            errors_accumulated: FxHashMap::default(),
            updated_errors: Vec::new(),
            awaiting_response: FxHashMap::default(),
            root_uri: String::new(),
            request_counter: 0,
        }
    }

    /// Run until `exit`, EOF, or a wire-level failure.
    pub fn run(&mut self) -> Result<(), ProtocolError> {
        loop {
            let Some(json) = protocol::read_message(&mut self.reader)? else {
                info!("eof");
                return Ok(());
            };
            trace!(message = %json, "read");

            let value: Value = serde_json::from_str(&json)?;

            if self.handle_replies(&value)? {
                continue;
            }

            let Some(method_name) = value.get("method").and_then(Value::as_str) else {
                warn!("message with neither method nor reply payload");
                continue;
            };

            match LspMethod::get_by_name(method_name) {
                Some(method) if method.kind == MethodKind::ServerInitiated => {
                    // Not something a client may initiate.
                    if let Some(id) = value.get("id") {
                        self.send_error(
                            id.clone(),
                            METHOD_NOT_FOUND,
                            format!("Unknown method: {}", method_name),
                        )?;
                    }
                }
                Some(method) if method.is_notification => {
                    info!(method = method.name, "processing notification");
                    match self.handle_notification(method, &value)? {
                        Flow::Exit => return Ok(()),
                        Flow::Continue => {}
                    }
                }
                Some(method) => {
                    info!(method = method.name, "processing request");
                    self.handle_request(method, &value)?;
                }
                None => {
                    if let Some(id) = value.get("id") {
                        self.send_error(
                            id.clone(),
                            METHOD_NOT_FOUND,
                            format!("Unknown method: {}", method_name),
                        )?;
                    } else {
                        trace!(method = method_name, "ignoring unknown notification");
                    }
                }
            }
        }
    }

    // === Incoming message kinds ===

    /// Route replies to server-initiated requests. Returns true if the
    /// message was a reply.
    fn handle_replies(&mut self, value: &Value) -> Result<bool, ProtocolError> {
        if value.get("result").is_some() {
            if let Some(id) = value.get("id").and_then(Value::as_str) {
                if let Some(handler) = self.awaiting_response.remove(id) {
                    (handler.on_result)(self, value["result"].clone())?;
                }
            }
            return Ok(true);
        }
        if value.get("error").is_some() {
            if let Some(id) = value.get("id").and_then(Value::as_str) {
                if let Some(handler) = self.awaiting_response.remove(id) {
                    (handler.on_error)(self, value["error"].clone())?;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_notification(
        &mut self,
        method: &LspMethod,
        value: &Value,
    ) -> Result<Flow, ProtocolError> {
        match method.name {
            "exit" => return Ok(Flow::Exit),
            "initialized" => {
                self.reindex_from_filesystem();
                self.run_slow_path(Vec::new());
                self.push_errors()?;
                self.global_state_hashes = Self::compute_state_hashes(self.final_gs.files());
            }
            "textDocument/didOpen" => {
                let params = &value["params"];
                let uri = params["textDocument"]["uri"].as_str().unwrap_or("");
                let content = params["textDocument"]["text"].as_str().unwrap_or("");
                if let Some(path) = self.remote_to_local(uri) {
                    let file = Arc::new(File::new(path, content, SourceType::Normal));
                    self.try_fast_path(vec![file]);
                    self.push_errors()?;
                }
            }
            "textDocument/didChange" => {
                let params = &value["params"];
                let uri = params["textDocument"]["uri"].as_str().unwrap_or("");
                let content = params["contentChanges"][0]["text"].as_str().unwrap_or("");
                if let Some(path) = self.remote_to_local(uri) {
                    let file = Arc::new(File::new(path, content, SourceType::Normal));
                    self.try_fast_path(vec![file]);
                    self.push_errors()?;
                }
            }
            "workspace/didChangeWatchedFiles" => {
                let params = value["params"].clone();
                self.send_request(
                    &LspMethod::READ_FILE,
                    params,
                    Box::new(|lsp, edits| {
                        let mut files = Vec::new();
                        for change in edits.as_array().into_iter().flatten() {
                            let uri = change["uri"].as_str().unwrap_or("");
                            let Some(path) = lsp.remote_to_local(uri) else {
                                continue;
                            };
                            let file = match change["content"].as_str() {
                                Some(content) => File::new(path, content, SourceType::Normal),
                                // The file is gone; keep its slot as a
                                // tombstone.
                                None => File::tombstone(path),
                            };
                            files.push(Arc::new(file));
                        }
                        lsp.try_fast_path(files);
                        lsp.push_errors()
                    }),
                    Box::new(|_, _| Ok(())),
                )?;
            }
            "$/cancelRequest" => {
                // Recognized, deliberately ignored: batches run to
                // completion.
            }
            other => {
                trace!(method = other, "notification with no effect");
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_request(&mut self, method: &LspMethod, value: &Value) -> Result<(), ProtocolError> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match method.name {
            "initialize" => {
                self.root_uri = value["params"]["rootUri"]
                    .as_str()
                    .unwrap_or("")
                    .trim_end_matches('/')
                    .to_string();
                let result = json!({
                    "capabilities": {
                        "textDocumentSync": 1,
                        "documentSymbolProvider": true,
                        "workspaceSymbolProvider": true,
                        "definitionProvider": true,
                        "hoverProvider": true
                    }
                });
                self.send_result(id, result)
            }
            "shutdown" => self.send_result(id, Value::Null),
            "textDocument/documentSymbol" => self.handle_document_symbol(id, value),
            "workspaceSymbol" => self.handle_workspace_symbol(id, value),
            "textDocument/definition" => self.handle_definition(id, value),
            "textDocument/hover" => self.handle_hover(id, value),
            other => self.send_error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            ),
        }
    }

    // === Outgoing messages ===

    fn send_raw(&mut self, content: &str) -> Result<(), ProtocolError> {
        trace!(message = %content, "write");
        protocol::write_message(&mut self.writer, content)?;
        Ok(())
    }

    pub(crate) fn send_result(&mut self, id: Value, result: Value) -> Result<(), ProtocolError> {
        let response = Response::success(id, result);
        let encoded = serde_json::to_string(&response)?;
        self.send_raw(&encoded)
    }

    pub(crate) fn send_error(
        &mut self,
        id: Value,
        code: i64,
        message: impl Into<String>,
    ) -> Result<(), ProtocolError> {
        let response = Response::error(id, code, message);
        let encoded = serde_json::to_string(&response)?;
        self.send_raw(&encoded)
    }

    pub(crate) fn send_invalid_params(
        &mut self,
        id: Value,
        message: impl Into<String>,
    ) -> Result<(), ProtocolError> {
        self.send_error(id, INVALID_PARAMS, message)
    }

    pub(crate) fn send_notification(
        &mut self,
        method: &LspMethod,
        params: Value,
    ) -> Result<(), ProtocolError> {
        assert!(method.is_notification);
        assert!(matches!(
            method.kind,
            MethodKind::ServerInitiated | MethodKind::Both
        ));
        let notification = Notification::new(method.name, params);
        let encoded = serde_json::to_string(&notification)?;
        self.send_raw(&encoded)
    }

    pub(crate) fn send_request(
        &mut self,
        method: &LspMethod,
        params: Value,
        on_result: Callback<R, W>,
        on_error: Callback<R, W>,
    ) -> Result<(), ProtocolError> {
        assert!(!method.is_notification);
        assert!(matches!(
            method.kind,
            MethodKind::ServerInitiated | MethodKind::Both
        ));
        self.request_counter += 1;
        let id = format!("typer-req-{}", self.request_counter);
        self.awaiting_response.insert(
            id.clone(),
            ResponseHandler {
                on_result,
                on_error,
            },
        );
        let request = Request::new(id, method.name, params);
        let encoded = serde_json::to_string(&request)?;
        self.send_raw(&encoded)
    }
}
