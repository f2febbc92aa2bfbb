//! Query responses — what the typechecker reports back for a cursor query.

use crate::loc::Loc;
use crate::symbols::SymbolRef;
use crate::types::{Type, TypeConstraint};

/// What kind of expression the query location landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Send,
    Ident,
    Constant,
    Literal,
}

/// A type plus the locations it was derived from.
#[derive(Debug, Clone)]
pub struct TypeAndOrigins {
    pub ty: Type,
    pub origins: Vec<Loc>,
}

impl TypeAndOrigins {
    pub fn new(ty: Type, origin: Loc) -> Self {
        Self {
            ty,
            origins: vec![origin],
        }
    }
}

/// One concrete method resolution for a call site.
#[derive(Debug, Clone)]
pub struct DispatchComponent {
    pub method: SymbolRef,
    pub receiver: Type,
}

/// Pushed by the typechecker when an expression covers the query location.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub kind: QueryKind,
    pub ret_type: TypeAndOrigins,
    pub dispatch_components: Vec<DispatchComponent>,
    pub constraint: Option<TypeConstraint>,
}

impl QueryResponse {
    pub fn ident(ret_type: TypeAndOrigins) -> Self {
        Self {
            kind: QueryKind::Ident,
            ret_type,
            dispatch_components: Vec::new(),
            constraint: None,
        }
    }

    pub fn constant(ret_type: TypeAndOrigins) -> Self {
        Self {
            kind: QueryKind::Constant,
            ret_type,
            dispatch_components: Vec::new(),
            constraint: None,
        }
    }

    pub fn literal(ret_type: TypeAndOrigins) -> Self {
        Self {
            kind: QueryKind::Literal,
            ret_type,
            dispatch_components: Vec::new(),
            constraint: None,
        }
    }

    pub fn send(
        ret_type: TypeAndOrigins,
        dispatch_components: Vec<DispatchComponent>,
        constraint: Option<TypeConstraint>,
    ) -> Self {
        Self {
            kind: QueryKind::Send,
            ret_type,
            dispatch_components,
            constraint,
        }
    }
}
