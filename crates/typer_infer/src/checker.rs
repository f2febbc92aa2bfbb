//! Body inference and method dispatch.

use rustc_hash::FxHashMap;

use typer_ast::*;
use typer_core::errors::classes;
use typer_core::{
    types, DispatchComponent, ErrorLine, ErrorSection, GlobalState, Loc, PendingError,
    QueryResponse, SymbolRef, Type, TypeAndOrigins,
};

/// Check every method body and file-level expression in `tree`.
pub fn check_tree(gs: &GlobalState, tree: &SourceFile) {
    let mut checker = Checker::new(gs);
    // File-level expressions share one scope.
    checker.env.push(FxHashMap::default());
    for item in &tree.items {
        checker.check_item(SymbolRef::ROOT, item);
    }
}

struct Checker<'gs> {
    gs: &'gs GlobalState,
    /// Local bindings: name -> (type, declaration loc).
    env: Vec<FxHashMap<String, (Type, Loc)>>,
}

impl<'gs> Checker<'gs> {
    fn new(gs: &'gs GlobalState) -> Self {
        Self {
            gs,
            env: Vec::new(),
        }
    }

    fn check_item(&mut self, owner: SymbolRef, item: &Item) {
        match item {
            Item::ClassDef(class) => {
                let sym = self
                    .gs
                    .lookup_constant(owner, &class.name.parts)
                    .filter(|s| self.gs.symbol(*s).is_class_or_module());
                // The namer ran before us; a missing symbol means the tree
                // changed under our feet.
                let Some(sym) = sym else {
                    return;
                };
                for inner in &class.body {
                    self.check_item(sym, inner);
                }
            }
            Item::MethodDef(method) => self.check_method(owner, method),
            Item::ConstAssign(konst) => {
                self.check_expr(owner, &konst.value);
            }
            Item::Expr(expr) => {
                self.check_expr(owner, expr);
            }
        }
    }

    fn check_method(&mut self, owner: SymbolRef, method: &MethodDef) {
        let Some(name) = self.gs.find_name(&method.name) else {
            return;
        };
        let Some(sym) = self.gs.find_member(owner, name) else {
            return;
        };

        let mut scope = FxHashMap::default();
        for arg in self.gs.symbol(sym).arguments.clone() {
            let data = self.gs.symbol(arg);
            let arg_name = self.gs.show_name(data.name).to_string();
            let arg_type = data.result_type.clone().unwrap_or(Type::Untyped);
            scope.insert(arg_name, (arg_type, data.definition_loc));
        }
        self.env.push(scope);

        let mut last = None;
        for expr in &method.body {
            last = Some(self.check_expr(owner, expr));
        }
        self.env.pop();

        // Enforce a declared return type against the body's final value.
        if let (Some(declared), Some(last)) = (self.gs.symbol(sym).result_type.clone(), last) {
            self.check_return_type(method, &declared, &last);
        }
    }

    fn check_return_type(&mut self, method: &MethodDef, declared: &Type, last: &TypeAndOrigins) {
        let got = last.ty.widen();
        let expected = match declared {
            // An unresolvable or self-typed return is not checked here.
            Type::Untyped | Type::SelfType | Type::TypeVar(_) => return,
            other => other.clone(),
        };
        if matches!(got, Type::Untyped) {
            return;
        }
        // `nil` returns are tolerated by the subset.
        if let Type::Instance(klass) = &got {
            if self.gs.full_name(*klass) == "NilClass" {
                return;
            }
        }
        if got != expected {
            let error = PendingError::new(
                method.header_loc,
                classes::infer::RETURN_TYPE_MISMATCH,
                format!(
                    "Returning value that does not conform to method result type `{}`",
                    expected.show(self.gs)
                ),
            )
            .with_section(ErrorSection {
                header: format!("Expected `{}`", expected.show(self.gs)),
                messages: vec![ErrorLine {
                    loc: last.origins.first().copied().unwrap_or(Loc::none()),
                    formatted: format!("Got `{}`", got.show(self.gs)),
                }],
            });
            self.gs.error_queue.push_error(error);
        }
    }

    fn check_expr(&mut self, owner: SymbolRef, expr: &Expr) -> TypeAndOrigins {
        match expr {
            Expr::IntLit { value, loc } => self.literal(
                "Integer",
                typer_core::LiteralValue::Integer(*value),
                *loc,
            ),
            Expr::FloatLit { value, loc } => self.literal(
                "Float",
                typer_core::LiteralValue::Float(*value),
                *loc,
            ),
            Expr::StringLit { value, loc } => self.literal(
                "String",
                typer_core::LiteralValue::String(value.clone()),
                *loc,
            ),
            Expr::SymbolLit { value, loc } => self.literal(
                "Symbol",
                typer_core::LiteralValue::Symbol(value.clone()),
                *loc,
            ),
            Expr::NilLit { loc } => self.builtin_instance("NilClass", *loc),
            Expr::TrueLit { loc } => self.builtin_instance("TrueClass", *loc),
            Expr::FalseLit { loc } => self.builtin_instance("FalseClass", *loc),
            Expr::SelfExpr { loc } => TypeAndOrigins::new(self.self_type(owner), *loc),
            Expr::Ident { name, loc } => self.check_ident(owner, name, *loc),
            Expr::ConstantRef(path) => self.check_constant(owner, path),
            Expr::LocalAssign {
                name,
                name_loc,
                value,
                ..
            } => {
                let value_type = self.check_expr(owner, value);
                let binding = (value_type.ty.clone(), *name_loc);
                if let Some(scope) = self.env.last_mut() {
                    scope.insert(name.clone(), binding);
                }
                value_type
            }
            Expr::IvarAssign { value, .. } => self.check_expr(owner, value),
            Expr::IvarRead { name, loc } => {
                let ty = self
                    .gs
                    .find_name(name)
                    .and_then(|n| self.gs.find_member(owner, n))
                    .and_then(|f| self.gs.symbol(f).result_type.clone())
                    .unwrap_or(Type::Untyped);
                TypeAndOrigins::new(ty, *loc)
            }
            Expr::Send {
                receiver,
                name,
                name_loc,
                args,
                loc,
            } => self.check_send(owner, receiver.as_deref(), name, *name_loc, args, *loc),
        }
    }

    // === Leaves ===

    fn literal(
        &mut self,
        class_name: &str,
        value: typer_core::LiteralValue,
        loc: Loc,
    ) -> TypeAndOrigins {
        let ty = self
            .builtin_class(class_name)
            .map(|sym| Type::Literal(sym, value))
            .unwrap_or(Type::Untyped);
        let result = TypeAndOrigins::new(ty, loc);
        if self.query_hit(loc) {
            self.gs
                .error_queue
                .push_query_response(QueryResponse::literal(result.clone()));
        }
        result
    }

    fn builtin_instance(&mut self, class_name: &str, loc: Loc) -> TypeAndOrigins {
        let ty = self
            .builtin_class(class_name)
            .map(Type::Instance)
            .unwrap_or(Type::Untyped);
        let result = TypeAndOrigins::new(ty, loc);
        if self.query_hit(loc) {
            self.gs
                .error_queue
                .push_query_response(QueryResponse::literal(result.clone()));
        }
        result
    }

    fn builtin_class(&self, name: &str) -> Option<SymbolRef> {
        self.gs
            .find_name(name)
            .and_then(|n| self.gs.find_member(SymbolRef::ROOT, n))
            .filter(|s| self.gs.symbol(*s).is_class_or_module())
    }

    fn self_type(&self, owner: SymbolRef) -> Type {
        if owner.is_root() {
            self.builtin_class("Object")
                .map(Type::Instance)
                .unwrap_or(Type::Untyped)
        } else {
            Type::Instance(owner)
        }
    }

    fn check_ident(&mut self, owner: SymbolRef, name: &str, loc: Loc) -> TypeAndOrigins {
        if let Some((ty, origin)) = self.env.last().and_then(|scope| scope.get(name)).cloned() {
            let result = TypeAndOrigins {
                ty,
                origins: vec![origin],
            };
            if self.query_hit(loc) {
                self.gs
                    .error_queue
                    .push_query_response(QueryResponse::ident(result.clone()));
            }
            return result;
        }
        // Not a local: a bare identifier is a zero-argument send to self.
        let receiver = TypeAndOrigins::new(self.self_type(owner), loc);
        self.dispatch_send(&receiver, name, loc, 0, loc)
    }

    fn check_constant(&mut self, owner: SymbolRef, path: &ConstantPath) -> TypeAndOrigins {
        match self.gs.lookup_constant(owner, &path.parts) {
            Some(sym) if self.gs.symbol(sym).is_class_or_module() => {
                let result = TypeAndOrigins {
                    ty: Type::Singleton(sym),
                    origins: vec![self.gs.symbol(sym).definition_loc],
                };
                if self.query_hit(path.loc) {
                    self.gs
                        .error_queue
                        .push_query_response(QueryResponse::constant(result.clone()));
                }
                result
            }
            Some(sym) if self.gs.symbol(sym).is_static_field() => {
                let result = TypeAndOrigins {
                    ty: self
                        .gs
                        .symbol(sym)
                        .result_type
                        .clone()
                        .unwrap_or(Type::Untyped),
                    origins: vec![self.gs.symbol(sym).definition_loc],
                };
                if self.query_hit(path.loc) {
                    self.gs
                        .error_queue
                        .push_query_response(QueryResponse::constant(result.clone()));
                }
                result
            }
            _ => {
                self.gs.error_queue.push_error(PendingError::new(
                    path.loc,
                    classes::resolver::STUB_CONSTANT,
                    format!("Unable to resolve constant `{}`", path.show()),
                ));
                TypeAndOrigins::new(Type::Untyped, path.loc)
            }
        }
    }

    // === Sends ===

    fn check_send(
        &mut self,
        owner: SymbolRef,
        receiver: Option<&Expr>,
        name: &str,
        name_loc: Loc,
        args: &[Expr],
        loc: Loc,
    ) -> TypeAndOrigins {
        let receiver_type = match receiver {
            Some(expr) => self.check_expr(owner, expr),
            None => TypeAndOrigins::new(self.self_type(owner), loc),
        };
        for arg in args {
            self.check_expr(owner, arg);
        }
        self.dispatch_send(&receiver_type, name, name_loc, args.len(), loc)
    }

    fn dispatch_send(
        &mut self,
        receiver: &TypeAndOrigins,
        name: &str,
        name_loc: Loc,
        arg_count: usize,
        loc: Loc,
    ) -> TypeAndOrigins {
        let widened = receiver.ty.widen();
        let (component, ret_type) = match &widened {
            Type::Untyped => (None, Type::Untyped),

            // `Klass.new` constructs an instance, dispatching `initialize`
            // when one is declared.
            Type::Singleton(klass) if name == "new" => {
                let klass = *klass;
                let initialize = self
                    .gs
                    .find_name("initialize")
                    .and_then(|n| self.gs.find_method(klass, n));
                match initialize {
                    Some(method) => self.check_arity(method, name_loc, arg_count),
                    None => {
                        if arg_count > 0 {
                            self.gs.error_queue.push_error(PendingError::new(
                                name_loc,
                                classes::infer::TOO_MANY_ARGUMENTS,
                                format!(
                                    "Too many arguments provided for method `new`. Expected: 0, got: {}",
                                    arg_count
                                ),
                            ));
                        }
                    }
                }
                let instance = self.instance_of(klass);
                // With no `initialize`, jumping to the class itself is the
                // best definition we can offer.
                let component = DispatchComponent {
                    method: initialize.unwrap_or(klass),
                    receiver: receiver.ty.clone(),
                };
                (Some(component), instance)
            }

            Type::Instance(klass) => self.dispatch_on_class(receiver, *klass, &[], name, name_loc, arg_count),

            Type::Applied { klass, targs } => {
                let targs = targs.clone();
                self.dispatch_on_class(receiver, *klass, &targs, name, name_loc, arg_count)
            }

            // Class-level methods are outside the subset; report the miss.
            Type::Singleton(_) | Type::SelfType | Type::TypeVar(_) => {
                self.report_unknown_method(receiver, name, name_loc);
                (None, Type::Untyped)
            }

            Type::Literal(..) => unreachable!("literals widen before dispatch"),
        };

        let result = TypeAndOrigins::new(ret_type, loc);
        if self.query_hit(loc) {
            let components = component.into_iter().collect();
            self.gs.error_queue.push_query_response(QueryResponse::send(
                result.clone(),
                components,
                None,
            ));
        }
        result
    }

    fn dispatch_on_class(
        &mut self,
        receiver: &TypeAndOrigins,
        klass: SymbolRef,
        targs: &[Type],
        name: &str,
        name_loc: Loc,
        arg_count: usize,
    ) -> (Option<DispatchComponent>, Type) {
        let method = self
            .gs
            .find_name(name)
            .and_then(|n| self.gs.find_method(klass, n));
        let Some(method) = method else {
            self.report_unknown_method(receiver, name, name_loc);
            return (None, Type::Untyped);
        };

        self.check_arity(method, name_loc, arg_count);

        let mut ret_type = if targs.is_empty() {
            self.gs
                .symbol(method)
                .result_type
                .clone()
                .unwrap_or(Type::Untyped)
        } else {
            types::result_type_as_seen_from(self.gs, method, klass, targs)
        };
        ret_type = types::replace_self_type(self.gs, &ret_type, &receiver.ty.widen());

        let component = DispatchComponent {
            method,
            receiver: receiver.ty.widen(),
        };
        (Some(component), ret_type)
    }

    fn check_arity(&mut self, method: SymbolRef, name_loc: Loc, arg_count: usize) {
        let expected = self.gs.symbol(method).arguments.len();
        let method_name = self.gs.show_name(self.gs.symbol(method).name).to_string();
        if arg_count < expected {
            self.gs.error_queue.push_error(PendingError::new(
                name_loc,
                classes::infer::NOT_ENOUGH_ARGUMENTS,
                format!(
                    "Not enough arguments provided for method `{}`. Expected: {}, got: {}",
                    method_name, expected, arg_count
                ),
            ));
        } else if arg_count > expected {
            self.gs.error_queue.push_error(PendingError::new(
                name_loc,
                classes::infer::TOO_MANY_ARGUMENTS,
                format!(
                    "Too many arguments provided for method `{}`. Expected: {}, got: {}",
                    method_name, expected, arg_count
                ),
            ));
        }
    }

    fn report_unknown_method(&mut self, receiver: &TypeAndOrigins, name: &str, name_loc: Loc) {
        let shown = receiver.ty.show(self.gs);
        let mut error = PendingError::new(
            name_loc,
            classes::infer::UNKNOWN_METHOD,
            format!("Method `{}` does not exist on `{}`", name, shown),
        );
        let origin_lines: Vec<ErrorLine> = receiver
            .origins
            .iter()
            .filter(|o| o.exists())
            .map(|o| ErrorLine {
                loc: *o,
                formatted: String::new(),
            })
            .collect();
        if !origin_lines.is_empty() {
            error = error.with_section(ErrorSection {
                header: format!("Got `{}` originating from:", shown),
                messages: origin_lines,
            });
        }
        self.gs.error_queue.push_error(error);
    }

    fn instance_of(&self, klass: SymbolRef) -> Type {
        let members = self.gs.symbol(klass).type_members(self.gs);
        if members.is_empty() {
            Type::Instance(klass)
        } else {
            Type::Applied {
                klass,
                targs: vec![Type::Untyped; members.len()],
            }
        }
    }

    fn query_hit(&self, loc: Loc) -> bool {
        let query = self.gs.lsp_query_loc;
        !query.is_none() && loc.contains(&query)
    }
}
