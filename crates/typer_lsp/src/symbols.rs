//! Document and workspace symbol queries.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use typer_core::{SymbolKind, SymbolRef};

use crate::protocol::ProtocolError;
use crate::server::LspLoop;

/// Protocol SymbolKind constants.
/// Module = 2, Class = 5, Method = 6, Field = 8, Constructor = 9,
/// Variable = 13, Constant = 14, TypeParameter = 26.
fn protocol_symbol_kind(
    gs: &typer_core::GlobalState,
    sym: SymbolRef,
) -> Option<i64> {
    let data = gs.symbol(sym);
    match data.kind {
        SymbolKind::ClassOrModule { is_module: true } => Some(2),
        SymbolKind::ClassOrModule { is_module: false } => Some(5),
        SymbolKind::Method => {
            if gs.show_name(data.name) == "initialize" {
                Some(9)
            } else {
                Some(6)
            }
        }
        SymbolKind::Field => Some(8),
        SymbolKind::StaticField => Some(14),
        SymbolKind::MethodArgument => Some(13),
        SymbolKind::TypeMember | SymbolKind::TypeArgument => Some(26),
    }
}

impl<R: BufRead, W: Write> LspLoop<R, W> {
    /// SymbolInformation for one symbol, or `None` for symbols with no
    /// definition location or no protocol kind.
    pub(crate) fn symbol_info(&self, sym: SymbolRef) -> Option<Value> {
        let data = self.final_gs.symbol(sym);
        if !data.definition_loc.file.exists() {
            return None;
        }
        let kind = protocol_symbol_kind(&self.final_gs, sym)?;
        Some(json!({
            "name": self.final_gs.show_name(data.name),
            "kind": kind,
            "location": self.loc_to_location(data.definition_loc),
            "containerName": self.final_gs.full_name(data.owner),
        }))
    }

    pub(crate) fn handle_document_symbol(
        &mut self,
        id: Value,
        value: &Value,
    ) -> Result<(), ProtocolError> {
        let uri = value["params"]["textDocument"]["uri"]
            .as_str()
            .unwrap_or("");
        let fref = self.uri_to_fref(uri);

        let mut result = Vec::new();
        for idx in 1..self.final_gs.symbols_used() {
            let sym = SymbolRef(idx);
            if self.final_gs.symbol(sym).definition_loc.file == fref {
                if let Some(info) = self.symbol_info(sym) {
                    result.push(info);
                }
            }
        }
        self.send_result(id, Value::Array(result))
    }

    pub(crate) fn handle_workspace_symbol(
        &mut self,
        id: Value,
        value: &Value,
    ) -> Result<(), ProtocolError> {
        let query = value["params"]["query"].as_str().unwrap_or("");

        let mut result = Vec::new();
        for idx in 1..self.final_gs.symbols_used() {
            let sym = SymbolRef(idx);
            if self.final_gs.show_name(self.final_gs.symbol(sym).name) == query {
                if let Some(info) = self.symbol_info(sym) {
                    result.push(info);
                }
            }
        }
        self.send_result(id, Value::Array(result))
    }
}
