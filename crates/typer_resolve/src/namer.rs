//! Namer — enters declared symbols into the global state.

use typer_ast::*;
use typer_core::errors::classes;
use typer_core::{GlobalState, PendingError, SymbolRef};

/// Enter every declaration in `tree`.
pub fn enter_tree(gs: &mut GlobalState, tree: &SourceFile) {
    for item in &tree.items {
        enter_item(gs, SymbolRef::ROOT, item);
    }
}

fn enter_item(gs: &mut GlobalState, owner: SymbolRef, item: &Item) {
    match item {
        Item::ClassDef(class) => enter_class(gs, owner, class),
        Item::MethodDef(method) => enter_method(gs, owner, method),
        Item::ConstAssign(konst) => enter_static_field(gs, owner, konst),
        Item::Expr(_) => {}
    }
}

fn enter_class(gs: &mut GlobalState, owner: SymbolRef, class: &ClassDef) {
    // `class A::B` enters intermediate path parts as modules.
    let mut current = owner;
    let (last, prefix) = class
        .name
        .parts
        .split_last()
        .expect("constant path has at least one part");
    for part in prefix {
        let name = gs.intern_name(part);
        current = gs.enter_class_symbol(class.header_loc, current, name, true);
    }
    let name = gs.intern_name(last);
    let sym = gs.enter_class_symbol(class.header_loc, current, name, class.is_module);

    for (member_name, member_loc) in &class.type_members {
        let member_name = gs.intern_name(member_name);
        gs.enter_type_member_symbol(*member_loc, sym, member_name);
    }

    if let Some(superclass) = &class.superclass {
        let written = gs.intern_name(&superclass.show());
        match gs.symbol(sym).superclass_name {
            Some(existing) if existing != written => {
                let full_name = gs.full_name(sym);
                gs.error_queue.push_error(PendingError::new(
                    superclass.loc,
                    classes::resolver::REDEFINITION_OF_PARENTS,
                    format!("Parent of class `{}` redefined", full_name),
                ));
            }
            Some(_) => {}
            None => {
                gs.symbol_mut(sym).superclass_name = Some(written);
            }
        }
    }

    for item in &class.body {
        enter_item(gs, sym, item);
    }
}

fn enter_method(gs: &mut GlobalState, owner: SymbolRef, method: &MethodDef) {
    let name = gs.intern_name(&method.name);
    let (sym, redefined) = gs.enter_method_symbol(method.header_loc, owner, name);
    if redefined {
        let full_name = gs.full_name(sym);
        gs.error_queue.push_error(PendingError::new(
            method.name_loc,
            classes::namer::REDEFINITION_OF_METHOD,
            format!("Method `{}` redefined", full_name),
        ));
    }

    for arg in &method.args {
        let arg_name = gs.intern_name(&arg.name);
        gs.enter_method_argument_symbol(arg.loc, sym, arg_name);
    }

    if let Some(sig) = &method.sig {
        let params = sig
            .params
            .iter()
            .map(|p| {
                let param_name = gs.intern_name(&p.name);
                let written_type = gs.intern_name(&p.ty.show());
                (param_name, written_type)
            })
            .collect();
        let returns = gs.intern_name(&sig.returns.show());
        gs.symbol_mut(sym).declared_sig = Some(typer_core::DeclaredSig { params, returns });
    }

    // Instance variable assignments anywhere in the body declare fields on
    // the enclosing class. Top-level methods have no class to carry them.
    if !owner.is_root() {
        for expr in &method.body {
            enter_fields(gs, owner, expr);
        }
    }
}

fn enter_fields(gs: &mut GlobalState, owner: SymbolRef, expr: &Expr) {
    match expr {
        Expr::IvarAssign {
            name,
            name_loc,
            value,
            ..
        } => {
            let field_name = gs.intern_name(name);
            gs.enter_field_symbol(*name_loc, owner, field_name);
            enter_fields(gs, owner, value);
        }
        Expr::LocalAssign { value, .. } => enter_fields(gs, owner, value),
        Expr::Send { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                enter_fields(gs, owner, receiver);
            }
            for arg in args {
                enter_fields(gs, owner, arg);
            }
        }
        _ => {}
    }
}

fn enter_static_field(gs: &mut GlobalState, owner: SymbolRef, konst: &ConstAssign) {
    let name = gs.intern_name(&konst.name);
    let (sym, duplicate) = gs.enter_static_field_symbol(konst.name_loc, owner, name);
    if duplicate {
        let full_name = gs.full_name(sym);
        gs.error_queue.push_error(PendingError::new(
            konst.name_loc,
            classes::resolver::DUPLICATE_VARIABLE_DECLARATION,
            format!("Duplicate declaration of `{}`", full_name),
        ));
    }
}
