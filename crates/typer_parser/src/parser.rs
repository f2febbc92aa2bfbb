//! Core parser implementation.

use typer_ast::*;
use typer_core::{FileRef, Loc};
use typer_lexer::{Span, Token, TokenKind};

/// A parse error with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub loc: Loc,
}

/// The parsed tree plus any recoverable errors.
#[derive(Debug)]
pub struct ParseResult {
    pub ast: SourceFile,
    pub errors: Vec<ParseError>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    fref: FileRef,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, fref: FileRef) -> Self {
        Self {
            tokens,
            pos: 0,
            fref,
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let mut items = Vec::new();
        while !self.at_end() {
            self.skip_separators();
            if self.at_end() {
                break;
            }
            if let Some(item) = self.parse_item() {
                items.push(item);
            }
        }
        let end = self.current_span();
        ParseResult {
            ast: SourceFile {
                items,
                loc: self.loc(start.merge(end)),
            },
            errors: self.errors,
        }
    }

    // === Items ===

    fn parse_item(&mut self) -> Option<Item> {
        match self.peek_kind().clone() {
            TokenKind::Class => self.parse_class(false).map(Item::ClassDef),
            TokenKind::Module => self.parse_class(true).map(Item::ClassDef),
            TokenKind::Sig => {
                let sig = self.parse_sig();
                self.skip_separators();
                if matches!(self.peek_kind(), TokenKind::Def) {
                    self.parse_method(sig).map(Item::MethodDef)
                } else {
                    self.error_here("sig is not followed by a method definition");
                    self.synchronize();
                    None
                }
            }
            TokenKind::Def => self.parse_method(None).map(Item::MethodDef),
            TokenKind::Constant(_) if self.peek_next_is_eq() => {
                self.parse_const_assign().map(Item::ConstAssign)
            }
            TokenKind::End => {
                self.error_here("unexpected 'end'");
                self.advance();
                None
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_statement_end();
                Some(Item::Expr(expr))
            }
        }
    }

    fn parse_class(&mut self, is_module: bool) -> Option<ClassDef> {
        let keyword_span = self.advance().span;
        let name = self.parse_constant_path()?;

        let mut type_members = Vec::new();
        if self.eat(&TokenKind::LBracket) {
            loop {
                match self.peek_kind().clone() {
                    TokenKind::Constant(text) => {
                        let span = self.advance().span;
                        type_members.push((text, self.loc(span)));
                    }
                    _ => {
                        self.error_here("expected type member name");
                        break;
                    }
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            if !self.eat(&TokenKind::RBracket) {
                self.error_here("expected ']' after type members");
            }
        }

        let mut superclass = None;
        if !is_module && self.eat(&TokenKind::Lt) {
            superclass = self.parse_constant_path();
        }

        let header_end = self.previous_span();
        self.expect_statement_end();

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek_kind(), TokenKind::End) || self.at_end() {
                break;
            }
            if let Some(item) = self.parse_item() {
                body.push(item);
            }
        }
        let end_span = self.expect(&TokenKind::End, "expected 'end' to close definition");

        Some(ClassDef {
            name,
            is_module,
            type_members,
            superclass,
            body,
            loc: self.loc(keyword_span.merge(end_span)),
            header_loc: self.loc(keyword_span.merge(header_end)),
        })
    }

    fn parse_method(&mut self, sig: Option<Sig>) -> Option<MethodDef> {
        let def_span = self.advance().span;
        let (name, name_span) = match self.peek_kind().clone() {
            TokenKind::Ident(text) => {
                let span = self.advance().span;
                (text, span)
            }
            _ => {
                self.error_here("expected method name after 'def'");
                self.synchronize();
                return None;
            }
        };

        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                loop {
                    match self.peek_kind().clone() {
                        TokenKind::Ident(text) => {
                            let span = self.advance().span;
                            args.push(MethodArg {
                                name: text,
                                loc: self.loc(span),
                            });
                        }
                        _ => {
                            self.error_here("expected argument name");
                            break;
                        }
                    }
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            if !self.eat(&TokenKind::RParen) {
                self.error_here("expected ')' after method arguments");
            }
        }

        let header_end = self.previous_span();
        self.expect_statement_end();

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek_kind(), TokenKind::End) || self.at_end() {
                break;
            }
            match self.parse_expr() {
                Some(expr) => {
                    body.push(expr);
                    self.expect_statement_end();
                }
                None => break,
            }
        }
        let end_span = self.expect(&TokenKind::End, "expected 'end' to close method");

        Some(MethodDef {
            name,
            name_loc: self.loc(name_span),
            args,
            sig,
            body,
            loc: self.loc(def_span.merge(end_span)),
            header_loc: self.loc(def_span.merge(header_end)),
        })
    }

    /// `sig { params(x: T, ...).returns(T) }`. Returns `None` and records an
    /// error on malformed sigs; the following `def` still parses.
    fn parse_sig(&mut self) -> Option<Sig> {
        let sig_span = self.advance().span;
        if !self.eat(&TokenKind::LBrace) {
            self.error_here("expected '{' after 'sig'");
            return None;
        }

        let mut params = Vec::new();
        let mut returns = None;

        loop {
            match self.peek_kind().clone() {
                TokenKind::Ident(word) if word == "params" => {
                    self.advance();
                    if !self.eat(&TokenKind::LParen) {
                        self.error_here("expected '(' after 'params'");
                        break;
                    }
                    loop {
                        let (name, name_span) = match self.peek_kind().clone() {
                            TokenKind::Ident(text) => {
                                let span = self.advance().span;
                                (text, span)
                            }
                            _ => {
                                self.error_here("expected parameter name in sig");
                                break;
                            }
                        };
                        if !self.eat(&TokenKind::Colon) {
                            self.error_here("expected ':' after sig parameter name");
                            break;
                        }
                        match self.parse_sig_type() {
                            Some(ty) => {
                                let loc = self.loc(name_span).join(ty.loc);
                                params.push(SigParam { name, ty, loc });
                            }
                            None => break,
                        }
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    if !self.eat(&TokenKind::RParen) {
                        self.error_here("expected ')' after sig params");
                    }
                }
                TokenKind::Ident(word) if word == "returns" => {
                    self.advance();
                    if !self.eat(&TokenKind::LParen) {
                        self.error_here("expected '(' after 'returns'");
                        break;
                    }
                    returns = self.parse_sig_type();
                    if !self.eat(&TokenKind::RParen) {
                        self.error_here("expected ')' after return type");
                    }
                }
                _ => break,
            }
            if !self.eat(&TokenKind::Dot) {
                break;
            }
        }

        let closed = self.eat(&TokenKind::RBrace);
        if !closed {
            self.error_here("expected '}' to close sig");
            self.synchronize();
        }

        match returns {
            Some(returns) => {
                let end = self.previous_span();
                Some(Sig {
                    params,
                    returns,
                    loc: self.loc(sig_span.merge(end)),
                })
            }
            None => {
                self.errors.push(ParseError {
                    message: "sig must declare a return type".to_string(),
                    loc: self.loc(sig_span),
                });
                None
            }
        }
    }

    fn parse_sig_type(&mut self) -> Option<ConstantPath> {
        if matches!(self.peek_kind(), TokenKind::SelfKw) {
            let span = self.advance().span;
            return Some(ConstantPath {
                parts: vec!["self".to_string()],
                loc: self.loc(span),
            });
        }
        self.parse_constant_path()
    }

    fn parse_const_assign(&mut self) -> Option<ConstAssign> {
        let (name, name_span) = match self.peek_kind().clone() {
            TokenKind::Constant(text) => {
                let span = self.advance().span;
                (text, span)
            }
            _ => return None,
        };
        self.expect(&TokenKind::Eq, "expected '=' in constant assignment");
        let value = self.parse_expr()?;
        let loc = self.loc(name_span).join(value.loc());
        self.expect_statement_end();
        Some(ConstAssign {
            name,
            name_loc: self.loc(name_span),
            value,
            loc,
        })
    }

    // === Expressions ===

    fn parse_expr(&mut self) -> Option<Expr> {
        match (self.peek_kind().clone(), self.peek_next_is_eq()) {
            (TokenKind::Ident(name), true) => {
                let name_span = self.advance().span;
                self.advance(); // '='
                let value = self.parse_expr()?;
                let loc = self.loc(name_span).join(value.loc());
                Some(Expr::LocalAssign {
                    name,
                    name_loc: self.loc(name_span),
                    value: Box::new(value),
                    loc,
                })
            }
            (TokenKind::InstanceVar(name), true) => {
                let name_span = self.advance().span;
                self.advance(); // '='
                let value = self.parse_expr()?;
                let loc = self.loc(name_span).join(value.loc());
                Some(Expr::IvarAssign {
                    name,
                    name_loc: self.loc(name_span),
                    value: Box::new(value),
                    loc,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::Dot) {
            let (name, name_span) = match self.peek_kind().clone() {
                TokenKind::Ident(text) => {
                    let span = self.advance().span;
                    (text, span)
                }
                _ => {
                    self.error_here("expected method name after '.'");
                    return Some(expr);
                }
            };
            let args = self.parse_call_args();
            let loc = expr.loc().join(self.loc(self.previous_span()));
            expr = Expr::Send {
                receiver: Some(Box::new(expr)),
                name,
                name_loc: self.loc(name_span),
                args,
                loc,
            };
        }
        Some(expr)
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !matches!(self.peek_kind(), TokenKind::RParen) {
                loop {
                    match self.parse_expr() {
                        Some(arg) => args.push(arg),
                        None => break,
                    }
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            if !self.eat(&TokenKind::RParen) {
                self.error_here("expected ')' after call arguments");
            }
        }
        args
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let kind = self.peek_kind().clone();
        match kind {
            TokenKind::IntLiteral(value) => {
                let span = self.advance().span;
                Some(Expr::IntLit {
                    value,
                    loc: self.loc(span),
                })
            }
            TokenKind::FloatLiteral(value) => {
                let span = self.advance().span;
                Some(Expr::FloatLit {
                    value,
                    loc: self.loc(span),
                })
            }
            TokenKind::StringLiteral(value) => {
                let span = self.advance().span;
                Some(Expr::StringLit {
                    value,
                    loc: self.loc(span),
                })
            }
            TokenKind::SymbolLiteral(value) => {
                let span = self.advance().span;
                Some(Expr::SymbolLit {
                    value,
                    loc: self.loc(span),
                })
            }
            TokenKind::Nil => {
                let span = self.advance().span;
                Some(Expr::NilLit {
                    loc: self.loc(span),
                })
            }
            TokenKind::True => {
                let span = self.advance().span;
                Some(Expr::TrueLit {
                    loc: self.loc(span),
                })
            }
            TokenKind::False => {
                let span = self.advance().span;
                Some(Expr::FalseLit {
                    loc: self.loc(span),
                })
            }
            TokenKind::SelfKw => {
                let span = self.advance().span;
                Some(Expr::SelfExpr {
                    loc: self.loc(span),
                })
            }
            TokenKind::InstanceVar(name) => {
                let span = self.advance().span;
                Some(Expr::IvarRead {
                    name,
                    loc: self.loc(span),
                })
            }
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                if matches!(self.peek_kind(), TokenKind::LParen) {
                    let args = self.parse_call_args();
                    let loc = self.loc(span).join(self.loc(self.previous_span()));
                    Some(Expr::Send {
                        receiver: None,
                        name,
                        name_loc: self.loc(span),
                        args,
                        loc,
                    })
                } else {
                    Some(Expr::Ident {
                        name,
                        loc: self.loc(span),
                    })
                }
            }
            TokenKind::Constant(_) => self.parse_constant_path().map(Expr::ConstantRef),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr();
                if !self.eat(&TokenKind::RParen) {
                    self.error_here("expected ')'");
                }
                inner
            }
            _ => {
                self.error_here(format!("unexpected token '{}'", kind));
                self.synchronize();
                None
            }
        }
    }

    fn parse_constant_path(&mut self) -> Option<ConstantPath> {
        let (first, first_span) = match self.peek_kind().clone() {
            TokenKind::Constant(text) => {
                let span = self.advance().span;
                (text, span)
            }
            _ => {
                self.error_here("expected constant name");
                self.synchronize();
                return None;
            }
        };
        let mut parts = vec![first];
        let mut span = first_span;
        while self.eat(&TokenKind::ColonColon) {
            match self.peek_kind().clone() {
                TokenKind::Constant(text) => {
                    span = span.merge(self.advance().span);
                    parts.push(text);
                }
                _ => {
                    self.error_here("expected constant after '::'");
                    break;
                }
            }
        }
        Some(ConstantPath {
            parts,
            loc: self.loc(span),
        })
    }

    // === Token plumbing ===

    fn loc(&self, span: Span) -> Loc {
        Loc::new(self.fref, span.start, span.end)
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_next_is_eq(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind == TokenKind::Eq)
            .unwrap_or(false)
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Span {
        if self.peek_kind() == kind {
            self.advance().span
        } else {
            self.error_here(message);
            self.previous_span()
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semi) {
            self.advance();
        }
    }

    fn expect_statement_end(&mut self) {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Semi => {
                self.advance();
            }
            TokenKind::Eof | TokenKind::End => {}
            _ => {
                self.error_here("expected end of statement");
                self.synchronize();
            }
        }
    }

    /// Skip forward to the next statement boundary.
    fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::End | TokenKind::Def | TokenKind::Class | TokenKind::Module => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let loc = self.loc(self.current_span());
        self.errors.push(ParseError {
            message: message.into(),
            loc,
        });
    }
}
