//! Typer AST — syntax tree for the Ruby-style source language.
//!
//! Every node carries a `Loc`. Trees are plain data: `Clone` is the
//! deep-copy the incremental engine relies on when it re-checks copies of
//! indexed trees.

use typer_core::Loc;

/// Top-level parse of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub loc: Loc,
}

/// A statement at class/module/file level.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    ClassDef(ClassDef),
    MethodDef(MethodDef),
    /// `NAME = expr` — a static field declaration.
    ConstAssign(ConstAssign),
    /// A bare expression at file or class level.
    Expr(Expr),
}

impl Item {
    pub fn loc(&self) -> Loc {
        match self {
            Item::ClassDef(c) => c.loc,
            Item::MethodDef(m) => m.loc,
            Item::ConstAssign(c) => c.loc,
            Item::Expr(e) => e.loc(),
        }
    }
}

/// `class A < B ... end` or `module M ... end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: ConstantPath,
    pub is_module: bool,
    /// `class Box[T]` type member names, with their locs.
    pub type_members: Vec<(String, Loc)>,
    pub superclass: Option<ConstantPath>,
    pub body: Vec<Item>,
    pub loc: Loc,
    /// Span of the `class Name` / `module Name` header.
    pub header_loc: Loc,
}

/// `def name(args) ... end` with an optional preceding sig.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub name: String,
    pub name_loc: Loc,
    pub args: Vec<MethodArg>,
    pub sig: Option<Sig>,
    pub body: Vec<Expr>,
    pub loc: Loc,
    /// Span of the `def name(args)` header.
    pub header_loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodArg {
    pub name: String,
    pub loc: Loc,
}

/// `sig { params(x: Integer).returns(String) }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sig {
    pub params: Vec<SigParam>,
    /// Written return type; `self` means the receiver's own type.
    pub returns: ConstantPath,
    pub loc: Loc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SigParam {
    pub name: String,
    pub ty: ConstantPath,
    pub loc: Loc,
}

/// `NAME = expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstAssign {
    pub name: String,
    pub name_loc: Loc,
    pub value: Expr,
    pub loc: Loc,
}

/// A possibly-qualified constant reference: `A`, `A::B`, or the keyword
/// `self` in sig position.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPath {
    pub parts: Vec<String>,
    pub loc: Loc,
}

impl ConstantPath {
    /// The written form, e.g. `A::B`.
    pub fn show(&self) -> String {
        self.parts.join("::")
    }

    pub fn is_self(&self) -> bool {
        self.parts.len() == 1 && self.parts[0] == "self"
    }
}

/// Expressions inside method bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit { value: i64, loc: Loc },
    FloatLit { value: f64, loc: Loc },
    StringLit { value: String, loc: Loc },
    SymbolLit { value: String, loc: Loc },
    NilLit { loc: Loc },
    TrueLit { loc: Loc },
    FalseLit { loc: Loc },
    SelfExpr { loc: Loc },
    /// Local variable read or zero-argument self-send.
    Ident { name: String, loc: Loc },
    ConstantRef(ConstantPath),
    /// `x = expr`.
    LocalAssign { name: String, name_loc: Loc, value: Box<Expr>, loc: Loc },
    /// `@x = expr`.
    IvarAssign { name: String, name_loc: Loc, value: Box<Expr>, loc: Loc },
    /// `@x`.
    IvarRead { name: String, loc: Loc },
    /// `recv.name(args)` or `name(args)` with no receiver.
    Send {
        receiver: Option<Box<Expr>>,
        name: String,
        name_loc: Loc,
        args: Vec<Expr>,
        loc: Loc,
    },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Expr::IntLit { loc, .. }
            | Expr::FloatLit { loc, .. }
            | Expr::StringLit { loc, .. }
            | Expr::SymbolLit { loc, .. }
            | Expr::NilLit { loc }
            | Expr::TrueLit { loc }
            | Expr::FalseLit { loc }
            | Expr::SelfExpr { loc }
            | Expr::Ident { loc, .. }
            | Expr::LocalAssign { loc, .. }
            | Expr::IvarAssign { loc, .. }
            | Expr::IvarRead { loc, .. }
            | Expr::Send { loc, .. } => *loc,
            Expr::ConstantRef(path) => path.loc,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use typer_core::FileRef;

    #[test]
    fn test_constant_path_show() {
        let path = ConstantPath {
            parts: vec!["A".into(), "B".into()],
            loc: Loc::none(),
        };
        assert_eq!(path.show(), "A::B");
        assert!(!path.is_self());
    }

    #[test]
    fn test_clone_is_deep() {
        let f = FileRef::new(1);
        let original = Expr::Send {
            receiver: Some(Box::new(Expr::Ident {
                name: "a".into(),
                loc: Loc::new(f, 0, 1),
            })),
            name: "f".into(),
            name_loc: Loc::new(f, 2, 3),
            args: vec![Expr::IntLit {
                value: 1,
                loc: Loc::new(f, 4, 5),
            }],
            loc: Loc::new(f, 0, 6),
        };
        let copy = original.clone();
        assert_eq!(original, copy);
    }
}
