//! Resolver — links superclasses and signature types after the namer ran.

use typer_ast::*;
use typer_core::errors::classes;
use typer_core::{GlobalState, LiteralValue, PendingError, SymbolRef, Type};

/// Resolve declaration-level references in `tree`.
pub fn resolve_tree(gs: &mut GlobalState, tree: &SourceFile) {
    for item in &tree.items {
        resolve_item(gs, SymbolRef::ROOT, item);
    }
}

fn resolve_item(gs: &mut GlobalState, owner: SymbolRef, item: &Item) {
    match item {
        Item::ClassDef(class) => resolve_class(gs, owner, class),
        Item::MethodDef(method) => resolve_method(gs, owner, method),
        Item::ConstAssign(konst) => resolve_static_field(gs, owner, konst),
        Item::Expr(_) => {}
    }
}

/// Find the symbol the namer entered for this definition.
fn named_symbol(gs: &GlobalState, owner: SymbolRef, path: &ConstantPath) -> Option<SymbolRef> {
    let mut current = owner;
    for part in &path.parts {
        let name = gs.find_name(part)?;
        current = gs.find_member(current, name)?;
    }
    Some(current)
}

fn resolve_class(gs: &mut GlobalState, owner: SymbolRef, class: &ClassDef) {
    let Some(sym) = named_symbol(gs, owner, &class.name) else {
        return;
    };

    if let Some(superclass) = &class.superclass {
        match gs.lookup_constant(sym, &superclass.parts) {
            Some(parent) if gs.symbol(parent).is_class_or_module() => {
                gs.symbol_mut(sym).superclass = Some(parent);
            }
            _ => {
                gs.error_queue.push_error(PendingError::new(
                    superclass.loc,
                    classes::resolver::STUB_CONSTANT,
                    format!("Unable to resolve constant `{}`", superclass.show()),
                ));
            }
        }
    }

    for item in &class.body {
        resolve_item(gs, sym, item);
    }
}

fn resolve_method(gs: &mut GlobalState, owner: SymbolRef, method: &MethodDef) {
    let Some(name) = gs.find_name(&method.name) else {
        return;
    };
    let Some(sym) = gs.find_member(owner, name) else {
        return;
    };

    let Some(sig) = &method.sig else {
        return;
    };

    // Arguments are matched to sig params by name; a sig for a missing
    // argument is ignored (the namer already shaped the method).
    let arguments = gs.symbol(sym).arguments.clone();
    for param in &sig.params {
        let resolved = resolve_sig_type(gs, sym, owner, &param.ty);
        if let Some(param_name) = gs.find_name(&param.name) {
            if let Some(arg) = arguments
                .iter()
                .copied()
                .find(|a| gs.symbol(*a).name == param_name)
            {
                gs.symbol_mut(arg).result_type = Some(resolved.clone());
            }
        }
    }

    let returns = resolve_sig_type(gs, sym, owner, &sig.returns);
    gs.symbol_mut(sym).result_type = Some(returns);
}

/// Resolve a written sig type in the lexical scope of the method's owner.
fn resolve_sig_type(
    gs: &mut GlobalState,
    _method: SymbolRef,
    owner: SymbolRef,
    written: &ConstantPath,
) -> Type {
    if written.is_self() {
        return Type::SelfType;
    }
    match gs.lookup_constant(owner, &written.parts) {
        Some(found) if gs.symbol(found).is_type_member() || gs.symbol(found).is_type_argument() => {
            Type::TypeVar(found)
        }
        Some(found) if gs.symbol(found).is_class_or_module() => Type::Instance(found),
        _ => {
            gs.error_queue.push_error(PendingError::new(
                written.loc,
                classes::resolver::STUB_CONSTANT,
                format!("Unable to resolve constant `{}`", written.show()),
            ));
            Type::Untyped
        }
    }
}

/// Static fields pick up the type of a literal initializer; anything more
/// involved stays untyped.
fn resolve_static_field(gs: &mut GlobalState, owner: SymbolRef, konst: &ConstAssign) {
    let Some(name) = gs.find_name(&konst.name) else {
        return;
    };
    let Some(sym) = gs.find_member(owner, name) else {
        return;
    };
    let ty = literal_type(gs, &konst.value);
    gs.symbol_mut(sym).result_type = Some(ty);
}

fn literal_type(gs: &GlobalState, expr: &Expr) -> Type {
    let instance_of = |name: &str| {
        gs.find_name(name)
            .and_then(|n| gs.find_member(SymbolRef::ROOT, n))
            .map(Type::Instance)
            .unwrap_or(Type::Untyped)
    };
    let literal_of = |name: &str, value: LiteralValue| {
        gs.find_name(name)
            .and_then(|n| gs.find_member(SymbolRef::ROOT, n))
            .map(|sym| Type::Literal(sym, value))
            .unwrap_or(Type::Untyped)
    };
    match expr {
        Expr::IntLit { value, .. } => literal_of("Integer", LiteralValue::Integer(*value)),
        Expr::FloatLit { value, .. } => literal_of("Float", LiteralValue::Float(*value)),
        Expr::StringLit { value, .. } => {
            literal_of("String", LiteralValue::String(value.clone()))
        }
        Expr::SymbolLit { value, .. } => {
            literal_of("Symbol", LiteralValue::Symbol(value.clone()))
        }
        Expr::NilLit { .. } => instance_of("NilClass"),
        Expr::TrueLit { .. } => instance_of("TrueClass"),
        Expr::FalseLit { .. } => instance_of("FalseClass"),
        _ => Type::Untyped,
    }
}
