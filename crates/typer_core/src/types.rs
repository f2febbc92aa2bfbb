//! Type representation and the substitution operations the query layer uses.

use rustc_hash::FxHashMap;

use crate::global_state::GlobalState;
use crate::symbols::SymbolRef;

/// Value carried by a literal type.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
}

/// The checker's types.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// The dynamic top type.
    Untyped,
    /// An instance of a class, e.g. `Integer`.
    Instance(SymbolRef),
    /// The class object itself, e.g. the type of the constant `A`.
    Singleton(SymbolRef),
    /// A literal-refined instance, e.g. `Integer(2)`.
    Literal(SymbolRef, LiteralValue),
    /// The receiver's own type inside a method signature.
    SelfType,
    /// A generic class applied to type arguments, e.g. `Box[Integer]`.
    Applied { klass: SymbolRef, targs: Vec<Type> },
    /// Reference to a type member or type argument symbol.
    TypeVar(SymbolRef),
}

/// Solutions for generic method type arguments, applied by `instantiate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeConstraint {
    solution: FxHashMap<SymbolRef, Type>,
}

impl TypeConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: SymbolRef, ty: Type) {
        self.solution.insert(var, ty);
    }

    pub fn lookup(&self, var: SymbolRef) -> Option<&Type> {
        self.solution.get(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.solution.is_empty()
    }
}

impl Type {
    /// Drop literal refinement: `Integer(2)` widens to `Integer`.
    pub fn widen(&self) -> Type {
        match self {
            Type::Literal(klass, _) => Type::Instance(*klass),
            other => other.clone(),
        }
    }

    /// Render the type the way diagnostics and hover show it.
    pub fn show(&self, gs: &GlobalState) -> String {
        match self {
            Type::Untyped => "T.untyped".to_string(),
            Type::Instance(klass) => gs.full_name(*klass),
            Type::Singleton(klass) => format!("T.class_of({})", gs.full_name(*klass)),
            Type::Literal(klass, value) => {
                let name = gs.full_name(*klass);
                match value {
                    LiteralValue::Integer(v) => format!("{}({})", name, v),
                    LiteralValue::Float(v) => format!("{}({})", name, v),
                    LiteralValue::String(v) => format!("{}({:?})", name, v),
                    LiteralValue::Symbol(v) => format!("{}(:{})", name, v),
                }
            }
            Type::SelfType => "T.self_type".to_string(),
            Type::Applied { klass, targs } => {
                let args: Vec<String> = targs.iter().map(|t| t.show(gs)).collect();
                format!("{}[{}]", gs.full_name(*klass), args.join(", "))
            }
            Type::TypeVar(sym) => gs.show_name(gs.symbol(*sym).name).to_string(),
        }
    }
}

/// `of_what`'s result type viewed through an application of `klass`:
/// substitutes `klass`'s type members with `targs` by position.
pub fn result_type_as_seen_from(
    gs: &GlobalState,
    of_what: SymbolRef,
    klass: SymbolRef,
    targs: &[Type],
) -> Type {
    let result = gs
        .symbol(of_what)
        .result_type
        .clone()
        .unwrap_or(Type::Untyped);
    let members = gs.symbol(klass).type_members(gs);
    substitute(&result, &|var| {
        members
            .iter()
            .position(|m| *m == var)
            .and_then(|i| targs.get(i))
            .cloned()
    })
}

/// Replace `T.self_type` with the receiver's type.
pub fn replace_self_type(_gs: &GlobalState, ty: &Type, receiver: &Type) -> Type {
    map_type(ty, &|t| match t {
        Type::SelfType => Some(receiver.clone()),
        _ => None,
    })
}

/// Apply a generic-method constraint's solutions.
pub fn instantiate(_gs: &GlobalState, ty: &Type, constr: &TypeConstraint) -> Type {
    substitute(ty, &|var| constr.lookup(var).cloned())
}

fn substitute(ty: &Type, lookup: &dyn Fn(SymbolRef) -> Option<Type>) -> Type {
    map_type(ty, &|t| match t {
        Type::TypeVar(var) => lookup(*var),
        _ => None,
    })
}

fn map_type(ty: &Type, f: &dyn Fn(&Type) -> Option<Type>) -> Type {
    if let Some(replaced) = f(ty) {
        return replaced;
    }
    match ty {
        Type::Applied { klass, targs } => Type::Applied {
            klass: *klass,
            targs: targs.iter().map(|t| map_type(t, f)).collect(),
        },
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
