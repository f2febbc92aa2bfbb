//! Core lexer implementation.
//!
//! Scans source text byte by byte, producing a stream of tokens. Handles:
//! identifiers, constants, instance variables, keywords, numbers, strings,
//! symbols, punctuation, significant newlines, and `#` comments.

use crate::token::*;

/// A lexing error with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Tokens plus any errors encountered.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, returning tokens and errors.
    pub fn tokenize(mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();

        loop {
            self.skip_horizontal_whitespace();
            self.skip_comment();

            if self.is_at_end() {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    Span::new(self.pos as u32, self.pos as u32),
                ));
                break;
            }

            let token = self.lex_token();

            // Newlines are significant only after a statement-ending token.
            if token.kind == TokenKind::Newline {
                if let Some(last) = tokens.last() {
                    if last.kind.ends_statement() {
                        tokens.push(token);
                    }
                }
            } else {
                tokens.push(token);
            }
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // === Character navigation ===

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.pos]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() {
            0
        } else {
            self.source[self.pos + 1]
        }
    }

    fn advance(&mut self) -> u8 {
        let b = self.source[self.pos];
        self.pos += 1;
        b
    }

    fn skip_horizontal_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        if self.peek() == b'#' {
            while !self.is_at_end() && self.peek() != b'\n' {
                self.pos += 1;
            }
        }
    }

    // === Token lexing ===

    fn lex_token(&mut self) -> Token {
        let start = self.pos as u32;
        let b = self.advance();

        let kind = match b {
            b'\n' => TokenKind::Newline,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'=' => TokenKind::Eq,
            b'<' => TokenKind::Lt,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b';' => TokenKind::Semi,
            b':' => {
                if self.peek() == b':' {
                    self.advance();
                    TokenKind::ColonColon
                } else if self.peek().is_ascii_alphabetic() || self.peek() == b'_' {
                    let name = self.take_word();
                    TokenKind::SymbolLiteral(name)
                } else {
                    TokenKind::Colon
                }
            }
            b'"' => self.lex_string(start),
            b'@' => {
                let name = self.take_word();
                if name.is_empty() {
                    self.error("expected identifier after '@'", start);
                    TokenKind::InstanceVar("@".to_string())
                } else {
                    TokenKind::InstanceVar(format!("@{}", name))
                }
            }
            b'-' if self.peek().is_ascii_digit() => self.lex_number(start, true),
            b'0'..=b'9' => self.lex_number(start, false),
            b'a'..=b'z' | b'_' => {
                self.pos -= 1;
                let word = self.take_word();
                keyword(&word).unwrap_or(TokenKind::Ident(word))
            }
            b'A'..=b'Z' => {
                self.pos -= 1;
                let word = self.take_word();
                TokenKind::Constant(word)
            }
            other => {
                self.error(format!("unexpected character '{}'", other as char), start);
                // Resync on the next token.
                return self.next_after_error();
            }
        };

        Token::new(kind, Span::new(start, self.pos as u32))
    }

    fn next_after_error(&mut self) -> Token {
        self.skip_horizontal_whitespace();
        self.skip_comment();
        if self.is_at_end() {
            Token::new(
                TokenKind::Eof,
                Span::new(self.pos as u32, self.pos as u32),
            )
        } else {
            self.lex_token()
        }
    }

    fn take_word(&mut self) -> String {
        let start = self.pos;
        while !self.is_at_end()
            && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_' || self.peek() == b'?')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn lex_number(&mut self, start: u32, negative: bool) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        let is_float = self.peek() == b'.' && self.peek_next().is_ascii_digit();
        if is_float {
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        let text = String::from_utf8_lossy(&self.source[start as usize..self.pos]).into_owned();
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => TokenKind::FloatLiteral(v),
                Err(_) => {
                    self.error(format!("malformed float literal '{}'", text), start);
                    TokenKind::FloatLiteral(0.0)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => TokenKind::IntLiteral(v),
                Err(_) => {
                    self.error(format!("integer literal '{}' out of range", text), start);
                    TokenKind::IntLiteral(if negative { i64::MIN } else { i64::MAX })
                }
            }
        }
    }

    fn lex_string(&mut self, start: u32) -> TokenKind {
        let mut value = String::new();
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                self.error("unterminated string literal", start);
                break;
            }
            let b = self.advance();
            match b {
                b'"' => break,
                b'\\' => {
                    let escaped = if self.is_at_end() { 0 } else { self.advance() };
                    match escaped {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'"' => value.push('"'),
                        b'\\' => value.push('\\'),
                        other => {
                            self.error(
                                format!("unknown escape '\\{}'", other as char),
                                self.pos as u32 - 2,
                            );
                        }
                    }
                }
                other => value.push(other as char),
            }
        }
        TokenKind::StringLiteral(value)
    }

    fn error(&mut self, message: impl Into<String>, start: u32) {
        self.errors.push(LexError {
            message: message.into(),
            span: Span::new(start, self.pos as u32),
        });
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    match word {
        "class" => Some(TokenKind::Class),
        "module" => Some(TokenKind::Module),
        "def" => Some(TokenKind::Def),
        "end" => Some(TokenKind::End),
        "self" => Some(TokenKind::SelfKw),
        "sig" => Some(TokenKind::Sig),
        "nil" => Some(TokenKind::Nil),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        _ => None,
    }
}
