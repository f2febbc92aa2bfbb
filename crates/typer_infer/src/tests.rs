//! Checker tests.

use std::sync::Arc;

use typer_ast::SourceFile;
use typer_core::errors::classes;
use typer_core::{ErrorQueue, File, GlobalState, Loc, PendingError, QueryKind, SourceType};
use typer_lexer::Lexer;
use typer_parser::Parser;

const PRELUDE: &str = "class BasicObject\nend\nclass Object < BasicObject\nend\nclass Integer\nend\nclass Float\nend\nclass String\nend\nclass Symbol\nend\nclass NilClass\nend\nclass TrueClass\nend\nclass FalseClass\nend\n";

struct Fixture {
    gs: GlobalState,
    trees: Vec<SourceFile>,
}

fn build(files: &[(&str, &str)]) -> Fixture {
    let mut gs = GlobalState::new(Arc::new(ErrorQueue::default()));
    let mut trees = Vec::new();
    let mut all: Vec<(&str, &str)> = vec![("prelude.rbi", PRELUDE)];
    all.extend_from_slice(files);
    for (path, source) in all {
        let fref = gs.enter_file(Arc::new(File::new(path, source, SourceType::Normal)));
        let lex = Lexer::new(source).tokenize();
        let result = Parser::new(lex.tokens, fref).parse();
        assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
        trees.push(result.ast);
    }
    {
        let borrowed: Vec<&SourceFile> = trees.iter().collect();
        typer_resolve::resolve(&mut gs, &borrowed);
    }
    Fixture { gs, trees }
}

fn check_all(fixture: &Fixture) -> Vec<PendingError> {
    for tree in &fixture.trees {
        crate::check_tree(&fixture.gs, tree);
    }
    fixture.gs.error_queue.drain_errors()
}

#[test]
fn test_clean_program() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  def f\n    1\n  end\nend\nA.new.f\n",
    )]);
    let errors = check_all(&fixture);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_not_enough_arguments() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  def f(x)\n    x\n  end\nend\nA.new.f\n",
    )]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::NOT_ENOUGH_ARGUMENTS);
    assert!(errors[0].formatted.starts_with("Not enough arguments"));
}

#[test]
fn test_too_many_arguments() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  def f\n    1\n  end\nend\nA.new.f(2)\n",
    )]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::TOO_MANY_ARGUMENTS);
}

#[test]
fn test_unknown_method() {
    let fixture = build(&[("a.rb", "class A\nend\nA.new.missing\n")]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::UNKNOWN_METHOD);
    assert!(errors[0].formatted.contains("missing"));
    assert!(errors[0].formatted.contains("`A`"));
}

#[test]
fn test_new_dispatches_initialize_arity() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  def initialize(x)\n    @x = x\n  end\nend\nA.new\n",
    )]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::NOT_ENOUGH_ARGUMENTS);
}

#[test]
fn test_unresolved_constant_in_body() {
    let fixture = build(&[("a.rb", "Missing.new\n")]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::resolver::STUB_CONSTANT);
}

#[test]
fn test_method_chain_through_sig() {
    // `f` returns A (per sig), so chaining works and a bad chained call is
    // still caught.
    let fixture = build(&[(
        "a.rb",
        "class A\n  sig { returns(A) }\n  def chain\n    self\n  end\nend\nA.new.chain.chain.missing\n",
    )]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::UNKNOWN_METHOD);
}

#[test]
fn test_sig_self_return_chains() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  sig { returns(self) }\n  def me\n    self\n  end\n  def f\n    1\n  end\nend\nA.new.me.f\n",
    )]);
    let errors = check_all(&fixture);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_return_type_mismatch() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  sig { returns(String) }\n  def f\n    1\n  end\nend\n",
    )]);
    let errors = check_all(&fixture);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].what, classes::infer::RETURN_TYPE_MISMATCH);
    assert_eq!(errors[0].sections.len(), 1);
    assert!(errors[0].sections[0].header.contains("String"));
}

#[test]
fn test_untyped_method_returns_untyped() {
    // Without a sig the result is untyped, so downstream sends are not
    // flagged.
    let fixture = build(&[(
        "a.rb",
        "class A\n  def f\n    1\n  end\nend\nA.new.f.anything\n",
    )]);
    let errors = check_all(&fixture);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_local_variables_and_args() {
    let fixture = build(&[(
        "a.rb",
        "class A\n  sig { params(x: Integer).returns(Integer) }\n  def f(x)\n    y = x\n    y\n  end\nend\n",
    )]);
    let errors = check_all(&fixture);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_inherited_method_dispatch() {
    let fixture = build(&[(
        "a.rb",
        "class Base\n  def f\n    1\n  end\nend\nclass Derived < Base\nend\nDerived.new.f\n",
    )]);
    let errors = check_all(&fixture);
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

// === Query responses ===

fn query_at(source: &str, offset: u32) -> Vec<typer_core::QueryResponse> {
    let mut fixture = build(&[("a.rb", source)]);
    let fref = fixture.gs.find_file_by_path("a.rb");
    fixture.gs.lsp_query_loc = Loc::new(fref, offset, offset);
    for tree in &fixture.trees {
        crate::check_tree(&fixture.gs, tree);
    }
    fixture.gs.error_queue.drain_errors();
    fixture.gs.error_queue.drain_query_responses()
}

#[test]
fn test_query_on_literal() {
    let source = "class A\n  def f\n    2\n  end\nend\n";
    let offset = source.find("2").unwrap() as u32;
    let responses = query_at(source, offset);
    assert!(!responses.is_empty());
    let first = &responses[0];
    assert_eq!(first.kind, QueryKind::Literal);
}

#[test]
fn test_query_on_send() {
    let source = "class A\n  def f\n    1\n  end\nend\nA.new.f\n";
    let offset = source.rfind(".f").unwrap() as u32 + 1;
    let responses = query_at(source, offset);
    assert!(!responses.is_empty());
    let send = responses
        .iter()
        .find(|r| r.kind == QueryKind::Send)
        .expect("expected a SEND response");
    assert_eq!(send.dispatch_components.len(), 1);
}

#[test]
fn test_query_on_local() {
    let source = "class A\n  def f(x)\n    x\n  end\nend\n";
    let offset = source.rfind('x').unwrap() as u32;
    let responses = query_at(source, offset);
    assert!(!responses.is_empty());
    assert_eq!(responses[0].kind, QueryKind::Ident);
    assert!(!responses[0].ret_type.origins.is_empty());
}

#[test]
fn test_query_on_constant() {
    let source = "class A\nend\nA.new\n";
    let offset = source.rfind("A.new").unwrap() as u32;
    let responses = query_at(source, offset);
    assert!(!responses.is_empty());
    assert_eq!(responses[0].kind, QueryKind::Constant);
}

#[test]
fn test_no_query_when_loc_none() {
    let source = "class A\n  def f\n    2\n  end\nend\n";
    let fixture = build(&[("a.rb", source)]);
    for tree in &fixture.trees {
        crate::check_tree(&fixture.gs, tree);
    }
    assert!(fixture.gs.error_queue.drain_query_responses().is_empty());
}
