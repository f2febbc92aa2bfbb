//! Positional queries: definition and hover.

use std::io::{BufRead, Write};
use std::sync::Arc;

use serde_json::{json, Value};

use typer_core::{
    types, Detail, FileRef, GlobalState, Loc, QueryKind, SymbolRef, Type, TypeConstraint,
};

use crate::protocol::ProtocolError;
use crate::server::LspLoop;

/// A symbol's result type as seen through a concrete receiver: generic
/// classes are instantiated via the receiver's applied type, `self` is
/// replaced with the receiver, and a constraint (if present) instantiates
/// generic methods.
fn get_result_type(
    gs: &GlobalState,
    of_what: SymbolRef,
    receiver: &Type,
    constraint: Option<&TypeConstraint>,
) -> Type {
    let mut result = match receiver {
        Type::Applied { klass, targs } => {
            types::result_type_as_seen_from(gs, of_what, *klass, targs)
        }
        _ => gs
            .symbol(of_what)
            .result_type
            .clone()
            .unwrap_or(Type::Untyped),
    };
    result = types::replace_self_type(gs, &result, receiver);
    if let Some(constraint) = constraint {
        result = types::instantiate(gs, &result, constraint);
    }
    result
}

impl<R: BufRead, W: Write> LspLoop<R, W> {
    /// Point the cursor of interest at (line, character), re-check just that
    /// file, and leave the emitted query responses in the queue. The cursor
    /// is cleared on the way out so later checks stay quiet.
    pub(crate) fn setup_lsp_query_by_loc(&mut self, fref: FileRef, line: u64, character: u64) {
        let file = Arc::clone(self.final_gs.file(fref));
        let detail = Detail {
            line: line as u32 + 1,
            column: character as u32 + 1,
        };
        let offset = file.detail_to_offset(detail);
        let loc = Loc::new(fref, offset, offset);

        self.initial_gs.lsp_query_loc = loc;
        self.final_gs.lsp_query_loc = loc;

        self.try_fast_path(vec![file]);

        self.initial_gs.lsp_query_loc = Loc::none();
        self.final_gs.lsp_query_loc = Loc::none();
    }

    fn query_position(&mut self, id: &Value, value: &Value) -> Result<Option<(u64, u64)>, ProtocolError> {
        let position = &value["params"]["position"];
        match (position["line"].as_u64(), position["character"].as_u64()) {
            (Some(line), Some(character)) => Ok(Some((line, character))),
            _ => {
                self.send_invalid_params(id.clone(), "malformed position")?;
                Ok(None)
            }
        }
    }

    pub(crate) fn handle_definition(&mut self, id: Value, value: &Value) -> Result<(), ProtocolError> {
        let uri = value["params"]["textDocument"]["uri"]
            .as_str()
            .unwrap_or("");
        let fref = self.uri_to_fref(uri);
        if !fref.exists() {
            return self.send_invalid_params(
                id,
                format!("Did not find file at uri {} in textDocument/definition", uri),
            );
        }
        let Some((line, character)) = self.query_position(&id, value)? else {
            return Ok(());
        };

        self.setup_lsp_query_by_loc(fref, line, character);
        let responses = self.final_gs.error_queue.drain_query_responses();

        let mut result = Vec::new();
        if let Some(resp) = responses.into_iter().next() {
            match resp.kind {
                QueryKind::Ident => {
                    if let Some(origin) = resp.ret_type.origins.first() {
                        result.push(self.loc_to_location(*origin));
                    }
                }
                _ => {
                    for component in &resp.dispatch_components {
                        let loc = self.final_gs.symbol(component.method).definition_loc;
                        if loc.exists() {
                            result.push(self.loc_to_location(loc));
                        }
                    }
                }
            }
        }
        self.send_result(id, Value::Array(result))
    }

    pub(crate) fn handle_hover(&mut self, id: Value, value: &Value) -> Result<(), ProtocolError> {
        let uri = value["params"]["textDocument"]["uri"]
            .as_str()
            .unwrap_or("");
        let fref = self.uri_to_fref(uri);
        if !fref.exists() {
            return self.send_invalid_params(
                id,
                format!("Did not find file at uri {} in textDocument/hover", uri),
            );
        }
        let Some((line, character)) = self.query_position(&id, value)? else {
            return Ok(());
        };

        self.setup_lsp_query_by_loc(fref, line, character);
        let mut responses = self.final_gs.error_queue.drain_query_responses();

        if responses.is_empty() {
            return self.send_invalid_params(
                id,
                "Did not find symbol at hover location in textDocument/hover",
            );
        }
        let resp = responses.remove(0);

        match resp.kind {
            QueryKind::Send => {
                if resp.dispatch_components.is_empty() {
                    return self.send_invalid_params(
                        id,
                        "Did not find any dispatchComponents for a SEND QueryResponse in textDocument/hover",
                    );
                }
                let gs = &self.final_gs;
                let mut contents = String::new();
                for component in &resp.dispatch_components {
                    let mut ret_type = resp.ret_type.ty.clone();
                    if let Some(constraint) = &resp.constraint {
                        ret_type = types::instantiate(gs, &ret_type, constraint);
                    }
                    let method_data = gs.symbol(component.method);
                    let mut type_and_arg_names = Vec::new();
                    if method_data.is_method() {
                        for arg in &method_data.arguments {
                            let arg_type = get_result_type(
                                gs,
                                *arg,
                                &component.receiver,
                                resp.constraint.as_ref(),
                            );
                            type_and_arg_names.push(format!(
                                "{}: {}",
                                gs.show_name(gs.symbol(*arg).name),
                                arg_type.show(gs)
                            ));
                        }
                    }
                    if !contents.is_empty() {
                        contents.push(' ');
                    }
                    contents.push_str(&format!(
                        "```{} {}({})```",
                        ret_type.show(gs),
                        gs.full_name(component.method),
                        type_and_arg_names.join(", ")
                    ));
                }
                // Markdown, not plain text: clients try to linkify things
                // like <Class:Foo> otherwise.
                let result = json!({
                    "contents": {"kind": "markdown", "value": contents}
                });
                self.send_result(id, result)
            }
            QueryKind::Ident | QueryKind::Constant | QueryKind::Literal => {
                let shown = resp.ret_type.ty.show(&self.final_gs);
                let result = json!({
                    "contents": {"kind": "markdown", "value": shown}
                });
                self.send_result(id, result)
            }
        }
    }
}
