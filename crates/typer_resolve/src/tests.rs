//! Namer + resolver tests.

use std::sync::Arc;

use typer_ast::SourceFile;
use typer_core::errors::classes;
use typer_core::{ErrorQueue, File, GlobalState, SourceType, SymbolRef, Type};
use typer_lexer::Lexer;
use typer_parser::Parser;

fn parse_into(gs: &mut GlobalState, path: &str, source: &str) -> SourceFile {
    let fref = gs.enter_file(Arc::new(File::new(path, source, SourceType::Normal)));
    let lex = Lexer::new(source).tokenize();
    let result = Parser::new(lex.tokens, fref).parse();
    assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
    result.ast
}

fn fresh_gs() -> GlobalState {
    GlobalState::new(Arc::new(ErrorQueue::default()))
}

fn lookup(gs: &GlobalState, path: &[&str]) -> SymbolRef {
    let parts: Vec<String> = path.iter().map(|s| s.to_string()).collect();
    gs.lookup_constant(SymbolRef::ROOT, &parts)
        .unwrap_or_else(|| panic!("missing symbol {:?}", path))
}

#[test]
fn test_enters_class_and_method() {
    let mut gs = fresh_gs();
    let tree = parse_into(&mut gs, "a.rb", "class A\n  def f(x)\n    x\n  end\nend\n");
    crate::resolve(&mut gs, &[&tree]);

    let a = lookup(&gs, &["A"]);
    assert!(gs.symbol(a).is_class());
    let f = gs.find_method(a, gs.find_name("f").unwrap()).unwrap();
    assert!(gs.symbol(f).is_method());
    assert_eq!(gs.symbol(f).arguments.len(), 1);
    assert!(gs.error_queue.drain_errors().is_empty());
}

#[test]
fn test_nested_and_qualified_names() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "module Outer\n  class Inner\n  end\nend\nclass Outer::Direct\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let outer = lookup(&gs, &["Outer"]);
    assert!(gs.symbol(outer).is_module());
    let inner = lookup(&gs, &["Outer", "Inner"]);
    assert_eq!(gs.full_name(inner), "Outer::Inner");
    let direct = lookup(&gs, &["Outer", "Direct"]);
    assert_eq!(gs.symbol(direct).owner, outer);
}

#[test]
fn test_method_redefinition_error() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class A\n  def f\n  end\n  def f\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let errors = gs.error_queue.drain_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::namer::REDEFINITION_OF_METHOD);
    assert!(errors[0].formatted.contains("A::f"));
}

#[test]
fn test_rerun_reports_redefinitions() {
    // Re-running the namer over a populated state re-reports every method —
    // the noise the interactive server silences.
    let mut gs = fresh_gs();
    let tree = parse_into(&mut gs, "a.rb", "class A\n  def f\n  end\nend\n");
    crate::resolve(&mut gs, &[&tree]);
    assert!(gs.error_queue.drain_errors().is_empty());

    crate::resolve(&mut gs, &[&tree]);
    let errors = gs.error_queue.drain_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::namer::REDEFINITION_OF_METHOD);
}

#[test]
fn test_duplicate_constant_error() {
    let mut gs = fresh_gs();
    let tree = parse_into(&mut gs, "a.rb", "class A\n  MAX = 1\n  MAX = 2\nend\n");
    crate::resolve(&mut gs, &[&tree]);

    let errors = gs.error_queue.drain_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].what,
        classes::resolver::DUPLICATE_VARIABLE_DECLARATION
    );
}

#[test]
fn test_superclass_resolution() {
    let mut gs = fresh_gs();
    let tree = parse_into(&mut gs, "a.rb", "class Base\nend\nclass Derived < Base\nend\n");
    crate::resolve(&mut gs, &[&tree]);

    let base = lookup(&gs, &["Base"]);
    let derived = lookup(&gs, &["Derived"]);
    assert_eq!(gs.symbol(derived).superclass, Some(base));
    assert!(gs.error_queue.drain_errors().is_empty());
}

#[test]
fn test_redefinition_of_parents() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class Base\nend\nclass Other\nend\nclass D < Base\nend\nclass D < Other\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let errors = gs.error_queue.drain_errors();
    assert!(errors
        .iter()
        .any(|e| e.what == classes::resolver::REDEFINITION_OF_PARENTS));
}

#[test]
fn test_unresolved_superclass() {
    let mut gs = fresh_gs();
    let tree = parse_into(&mut gs, "a.rb", "class D < Missing\nend\n");
    crate::resolve(&mut gs, &[&tree]);

    let errors = gs.error_queue.drain_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::resolver::STUB_CONSTANT);
    assert!(errors[0].formatted.contains("Missing"));
}

#[test]
fn test_sig_types_resolve() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class Integer\nend\nclass A\n  sig { params(x: Integer).returns(Integer) }\n  def f(x)\n    x\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let a = lookup(&gs, &["A"]);
    let integer = lookup(&gs, &["Integer"]);
    let f = gs.find_method(a, gs.find_name("f").unwrap()).unwrap();
    assert_eq!(gs.symbol(f).result_type, Some(Type::Instance(integer)));
    let arg = gs.symbol(f).arguments[0];
    assert_eq!(gs.symbol(arg).result_type, Some(Type::Instance(integer)));
}

#[test]
fn test_sig_self_type() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class A\n  sig { returns(self) }\n  def me\n    self\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let a = lookup(&gs, &["A"]);
    let me = gs.find_method(a, gs.find_name("me").unwrap()).unwrap();
    assert_eq!(gs.symbol(me).result_type, Some(Type::SelfType));
}

#[test]
fn test_sig_type_member_resolves_to_type_var() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class Box[T]\n  sig { returns(T) }\n  def get\n    @value\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let box_sym = lookup(&gs, &["Box"]);
    let t = lookup(&gs, &["Box", "T"]);
    assert!(gs.symbol(t).is_type_member());
    let get = gs.find_method(box_sym, gs.find_name("get").unwrap()).unwrap();
    assert_eq!(gs.symbol(get).result_type, Some(Type::TypeVar(t)));
}

#[test]
fn test_unresolved_sig_type() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class A\n  sig { returns(Nope) }\n  def f\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let errors = gs.error_queue.drain_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::resolver::STUB_CONSTANT);
    let a = lookup(&gs, &["A"]);
    let f = gs.find_method(a, gs.find_name("f").unwrap()).unwrap();
    assert_eq!(gs.symbol(f).result_type, Some(Type::Untyped));
}

#[test]
fn test_static_field_literal_type() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class Integer\nend\nclass A\n  MAX = 10\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let max = lookup(&gs, &["A", "MAX"]);
    let ty = gs.symbol(max).result_type.clone().unwrap();
    assert_eq!(ty.show(&gs), "Integer(10)");
}

#[test]
fn test_fields_entered_from_bodies() {
    let mut gs = fresh_gs();
    let tree = parse_into(
        &mut gs,
        "a.rb",
        "class A\n  def initialize(x)\n    @x = x\n  end\nend\n",
    );
    crate::resolve(&mut gs, &[&tree]);

    let a = lookup(&gs, &["A"]);
    let field = gs.find_member(a, gs.find_name("@x").unwrap()).unwrap();
    assert!(gs.symbol(field).is_field());
}
