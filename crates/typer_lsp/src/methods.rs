//! Known protocol methods and their dispatch metadata.

/// Who may initiate a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    ClientInitiated,
    ServerInitiated,
    Both,
}

/// One method descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspMethod {
    pub name: &'static str,
    pub is_notification: bool,
    pub kind: MethodKind,
}

impl LspMethod {
    pub const CANCEL_REQUEST: LspMethod = LspMethod {
        name: "$/cancelRequest",
        is_notification: true,
        kind: MethodKind::Both,
    };
    pub const INITIALIZE: LspMethod = LspMethod {
        name: "initialize",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };
    pub const INITIALIZED: LspMethod = LspMethod {
        name: "initialized",
        is_notification: true,
        kind: MethodKind::ClientInitiated,
    };
    pub const SHUTDOWN: LspMethod = LspMethod {
        name: "shutdown",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };
    pub const EXIT: LspMethod = LspMethod {
        name: "exit",
        is_notification: true,
        kind: MethodKind::ClientInitiated,
    };
    pub const REGISTER_CAPABILITY: LspMethod = LspMethod {
        name: "client/registerCapability",
        is_notification: false,
        kind: MethodKind::ServerInitiated,
    };
    pub const UNREGISTER_CAPABILITY: LspMethod = LspMethod {
        name: "client/unregisterCapability",
        is_notification: false,
        kind: MethodKind::ServerInitiated,
    };
    pub const DID_CHANGE_WATCHED_FILES: LspMethod = LspMethod {
        name: "workspace/didChangeWatchedFiles",
        is_notification: true,
        kind: MethodKind::ClientInitiated,
    };
    pub const PUSH_DIAGNOSTICS: LspMethod = LspMethod {
        name: "textDocument/publishDiagnostics",
        is_notification: true,
        kind: MethodKind::ServerInitiated,
    };
    pub const TEXT_DOCUMENT_DID_OPEN: LspMethod = LspMethod {
        name: "textDocument/didOpen",
        is_notification: true,
        kind: MethodKind::ClientInitiated,
    };
    pub const TEXT_DOCUMENT_DID_CHANGE: LspMethod = LspMethod {
        name: "textDocument/didChange",
        is_notification: true,
        kind: MethodKind::ClientInitiated,
    };
    pub const TEXT_DOCUMENT_DOCUMENT_SYMBOL: LspMethod = LspMethod {
        name: "textDocument/documentSymbol",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };
    pub const TEXT_DOCUMENT_DEFINITION: LspMethod = LspMethod {
        name: "textDocument/definition",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };
    pub const TEXT_DOCUMENT_HOVER: LspMethod = LspMethod {
        name: "textDocument/hover",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };
    pub const READ_FILE: LspMethod = LspMethod {
        name: "workspace/readFile",
        is_notification: false,
        kind: MethodKind::ServerInitiated,
    };
    pub const WORKSPACE_SYMBOL: LspMethod = LspMethod {
        name: "workspaceSymbol",
        is_notification: false,
        kind: MethodKind::ClientInitiated,
    };

    pub const ALL_METHODS: &'static [LspMethod] = &[
        Self::CANCEL_REQUEST,
        Self::INITIALIZE,
        Self::INITIALIZED,
        Self::SHUTDOWN,
        Self::EXIT,
        Self::REGISTER_CAPABILITY,
        Self::UNREGISTER_CAPABILITY,
        Self::DID_CHANGE_WATCHED_FILES,
        Self::PUSH_DIAGNOSTICS,
        Self::TEXT_DOCUMENT_DID_OPEN,
        Self::TEXT_DOCUMENT_DID_CHANGE,
        Self::TEXT_DOCUMENT_DOCUMENT_SYMBOL,
        Self::TEXT_DOCUMENT_DEFINITION,
        Self::TEXT_DOCUMENT_HOVER,
        Self::READ_FILE,
        Self::WORKSPACE_SYMBOL,
    ];

    pub fn get_by_name(name: &str) -> Option<&'static LspMethod> {
        Self::ALL_METHODS.iter().find(|m| m.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name() {
        let m = LspMethod::get_by_name("textDocument/hover").unwrap();
        assert!(!m.is_notification);
        assert_eq!(m.kind, MethodKind::ClientInitiated);
        assert!(LspMethod::get_by_name("textDocument/rename").is_none());
    }

    #[test]
    fn test_all_methods_unique() {
        for (i, a) in LspMethod::ALL_METHODS.iter().enumerate() {
            for b in &LspMethod::ALL_METHODS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
