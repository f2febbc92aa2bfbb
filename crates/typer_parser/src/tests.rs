//! Parser tests.

use typer_ast::*;
use typer_core::FileRef;
use typer_lexer::Lexer;

use crate::parser::{ParseResult, Parser};

fn parse(source: &str) -> ParseResult {
    let lex = Lexer::new(source).tokenize();
    assert!(lex.errors.is_empty(), "lex errors: {:?}", lex.errors);
    Parser::new(lex.tokens, FileRef::new(1)).parse()
}

fn parse_ok(source: &str) -> SourceFile {
    let result = parse(source);
    assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
    result.ast
}

#[test]
fn test_empty_file() {
    let ast = parse_ok("");
    assert!(ast.items.is_empty());
}

#[test]
fn test_class_with_method() {
    let ast = parse_ok("class A\n  def f\n    1\n  end\nend\n");
    assert_eq!(ast.items.len(), 1);
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        other => panic!("expected class, got {:?}", other),
    };
    assert_eq!(class.name.show(), "A");
    assert!(!class.is_module);
    assert!(class.superclass.is_none());
    assert_eq!(class.body.len(), 1);
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        other => panic!("expected method, got {:?}", other),
    };
    assert_eq!(method.name, "f");
    assert!(method.args.is_empty());
    assert_eq!(method.body.len(), 1);
    assert!(matches!(method.body[0], Expr::IntLit { value: 1, .. }));
}

#[test]
fn test_method_header_loc_spans_def_and_args() {
    let source = "class A\n  def f(x)\n    x\n  end\nend\n";
    let ast = parse_ok(source);
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        _ => unreachable!(),
    };
    let header = &source[method.header_loc.begin_pos as usize..method.header_loc.end_pos as usize];
    assert_eq!(header, "def f(x)");
}

#[test]
fn test_semicolon_separated_body() {
    let ast = parse_ok("class A\n  def f; 1; end\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    assert!(matches!(class.body[0], Item::MethodDef(_)));
}

#[test]
fn test_module_def() {
    let ast = parse_ok("module M\n  def helper\n  end\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    assert!(class.is_module);
    assert_eq!(class.name.show(), "M");
}

#[test]
fn test_superclass() {
    let ast = parse_ok("class B < A\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    assert_eq!(class.superclass.as_ref().unwrap().show(), "A");
}

#[test]
fn test_generic_class_type_members() {
    let ast = parse_ok("class Box[T, U]\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let names: Vec<_> = class.type_members.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["T", "U"]);
}

#[test]
fn test_send_chain() {
    let ast = parse_ok("A.new.f\n");
    let expr = match &ast.items[0] {
        Item::Expr(e) => e,
        _ => unreachable!(),
    };
    let (receiver, name) = match expr {
        Expr::Send { receiver, name, .. } => (receiver, name),
        other => panic!("expected send, got {:?}", other),
    };
    assert_eq!(name, "f");
    let inner = receiver.as_ref().unwrap();
    match inner.as_ref() {
        Expr::Send { receiver, name, .. } => {
            assert_eq!(name, "new");
            assert!(matches!(
                receiver.as_ref().unwrap().as_ref(),
                Expr::ConstantRef(_)
            ));
        }
        other => panic!("expected inner send, got {:?}", other),
    }
}

#[test]
fn test_send_with_args() {
    let ast = parse_ok("A.new.f(1, 2)\n");
    let expr = match &ast.items[0] {
        Item::Expr(e) => e,
        _ => unreachable!(),
    };
    match expr {
        Expr::Send { args, .. } => assert_eq!(args.len(), 2),
        other => panic!("expected send, got {:?}", other),
    }
}

#[test]
fn test_sig_params_and_returns() {
    let ast = parse_ok(
        "class A\n  sig { params(x: Integer, y: String).returns(Integer) }\n  def f(x, y)\n    x\n  end\nend\n",
    );
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        _ => unreachable!(),
    };
    let sig = method.sig.as_ref().unwrap();
    assert_eq!(sig.params.len(), 2);
    assert_eq!(sig.params[0].name, "x");
    assert_eq!(sig.params[0].ty.show(), "Integer");
    assert_eq!(sig.params[1].ty.show(), "String");
    assert_eq!(sig.returns.show(), "Integer");
}

#[test]
fn test_sig_returns_self() {
    let ast = parse_ok("class A\n  sig { returns(self) }\n  def me\n    self\n  end\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        _ => unreachable!(),
    };
    assert!(method.sig.as_ref().unwrap().returns.is_self());
}

#[test]
fn test_const_assign() {
    let ast = parse_ok("class A\n  MAX = 10\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let konst = match &class.body[0] {
        Item::ConstAssign(c) => c,
        other => panic!("expected const assign, got {:?}", other),
    };
    assert_eq!(konst.name, "MAX");
    assert!(matches!(konst.value, Expr::IntLit { value: 10, .. }));
}

#[test]
fn test_ivar_assign_in_method() {
    let ast = parse_ok("class A\n  def initialize(x)\n    @x = x\n  end\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        _ => unreachable!(),
    };
    match &method.body[0] {
        Expr::IvarAssign { name, .. } => assert_eq!(name, "@x"),
        other => panic!("expected ivar assign, got {:?}", other),
    }
}

#[test]
fn test_nested_modules() {
    let ast = parse_ok("module Outer\n  class Inner\n  end\nend\n");
    let outer = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    assert!(outer.is_module);
    let inner = match &outer.body[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    assert!(!inner.is_module);
    assert_eq!(inner.name.show(), "Inner");
}

#[test]
fn test_qualified_constant_ref() {
    let ast = parse_ok("Outer::Inner.new\n");
    let expr = match &ast.items[0] {
        Item::Expr(e) => e,
        _ => unreachable!(),
    };
    match expr {
        Expr::Send { receiver, name, .. } => {
            assert_eq!(name, "new");
            match receiver.as_ref().unwrap().as_ref() {
                Expr::ConstantRef(path) => assert_eq!(path.show(), "Outer::Inner"),
                other => panic!("expected constant, got {:?}", other),
            }
        }
        other => panic!("expected send, got {:?}", other),
    }
}

#[test]
fn test_error_recovery_keeps_later_items() {
    let result = parse("class A\n  def\nend\nclass B\nend\n");
    assert!(!result.errors.is_empty());
    // B still parses despite the broken method in A.
    let names: Vec<_> = result
        .ast
        .items
        .iter()
        .filter_map(|i| match i {
            Item::ClassDef(c) => Some(c.name.show()),
            _ => None,
        })
        .collect();
    assert!(names.contains(&"B".to_string()));
}

#[test]
fn test_missing_end_reports_error() {
    let result = parse("class A\n  def f\n    1\n  end\n");
    assert!(!result.errors.is_empty());
}

#[test]
fn test_local_assign_and_read() {
    let ast = parse_ok("class A\n  def f\n    x = 1\n    x\n  end\nend\n");
    let class = match &ast.items[0] {
        Item::ClassDef(c) => c,
        _ => unreachable!(),
    };
    let method = match &class.body[0] {
        Item::MethodDef(m) => m,
        _ => unreachable!(),
    };
    assert_eq!(method.body.len(), 2);
    assert!(matches!(method.body[0], Expr::LocalAssign { .. }));
    assert!(matches!(method.body[1], Expr::Ident { .. }));
}
