//! Tokenizer and recursive-descent parser for box DSL sources.
//!
//! Grammar: `Element := Ident DataList? Body?`,
//! `DataList := '{' (Str (',' Str)*)? '}'`,
//! `Body := '(' (Property | Element)* ')'`, `Property := Ident '(' Str ')'`.
//! `;` and `,` are accepted as optional separators inside a body. An ident
//! followed by `(` whose next token is a string literal is a property;
//! anything else is a child element.
//!
//! Parse failures are fatal: a broken DSL source has no well-defined
//! partial output. This differs from plugin loading, which is best-effort.

use crate::error::CompileError;

use super::ast::Element;

/// Parse a source into its root elements. `max_depth` bounds element
/// nesting so pathological inputs fail predictably instead of overflowing
/// the stack.
pub fn parse_document(source: &str, max_depth: usize) -> Result<Vec<Element>, CompileError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        max_depth,
    };
    let mut elements = Vec::new();
    while parser.peek().is_some() {
        elements.push(parser.parse_element(0)?);
    }
    Ok(elements)
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Semi => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut column = 1;

    macro_rules! bump {
        () => {{
            let c = chars[pos];
            pos += 1;
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            c
        }};
    }

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            bump!();
            continue;
        }
        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && bump!() != '\n' {}
            continue;
        }

        let (tok_line, tok_column) = (line, column);
        let kind = match c {
            '(' => {
                bump!();
                TokenKind::LParen
            }
            ')' => {
                bump!();
                TokenKind::RParen
            }
            '{' => {
                bump!();
                TokenKind::LBrace
            }
            '}' => {
                bump!();
                TokenKind::RBrace
            }
            ';' => {
                bump!();
                TokenKind::Semi
            }
            ',' => {
                bump!();
                TokenKind::Comma
            }
            '"' => {
                bump!();
                let mut value = String::new();
                loop {
                    if pos >= chars.len() {
                        return Err(CompileError::syntax(
                            "unterminated string literal",
                            tok_line,
                            tok_column,
                        ));
                    }
                    match bump!() {
                        '"' => break,
                        '\\' => {
                            if pos >= chars.len() {
                                return Err(CompileError::syntax(
                                    "unterminated string literal",
                                    tok_line,
                                    tok_column,
                                ));
                            }
                            match bump!() {
                                'n' => value.push('\n'),
                                't' => value.push('\t'),
                                'r' => value.push('\r'),
                                '"' => value.push('"'),
                                '\\' => value.push('\\'),
                                other => {
                                    value.push('\\');
                                    value.push(other);
                                }
                            }
                        }
                        other => value.push(other),
                    }
                }
                TokenKind::Str(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while pos < chars.len() {
                    let c = chars[pos];
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        bump!();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            other => {
                return Err(CompileError::syntax(
                    format!("unexpected character '{other}'"),
                    tok_line,
                    tok_column,
                ))
            }
        };
        tokens.push(Token {
            kind,
            line: tok_line,
            column: tok_column,
        });
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        match self.peek().or_else(|| self.tokens.last()) {
            Some(token) => CompileError::syntax(message, token.line, token.column),
            None => CompileError::syntax(message, 1, 1),
        }
    }

    fn parse_element(&mut self, depth: usize) -> Result<Element, CompileError> {
        if depth >= self.max_depth {
            return Err(CompileError::MaxDepth(self.max_depth));
        }

        let name = match self.bump() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name.clone(),
            Some(token) => {
                let message = format!("expected tag name, found {}", token.kind.describe());
                return Err(CompileError::syntax(message, token.line, token.column));
            }
            None => return Err(self.error_here("expected tag name, found end of input")),
        };
        let mut element = Element::new(name);

        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBrace)) {
            self.bump();
            self.parse_data_list(&mut element)?;
        }

        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
            self.bump();
            self.parse_body(&mut element, depth)?;
        }

        Ok(element)
    }

    fn parse_data_list(&mut self, element: &mut Element) -> Result<(), CompileError> {
        loop {
            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::RBrace) => {
                    self.bump();
                    return Ok(());
                }
                Some(TokenKind::Str(value)) => {
                    self.bump();
                    element.data.push(value);
                }
                Some(TokenKind::Comma) => {
                    self.bump();
                }
                Some(kind) => {
                    return Err(self.error_here(format!(
                        "expected string literal or '}}' in data list, found {}",
                        kind.describe()
                    )))
                }
                None => return Err(self.error_here("unterminated data list")),
            }
        }
    }

    fn parse_body(&mut self, element: &mut Element, depth: usize) -> Result<(), CompileError> {
        loop {
            match self.peek().map(|t| t.kind.clone()) {
                Some(TokenKind::RParen) => {
                    self.bump();
                    return Ok(());
                }
                Some(TokenKind::Semi) | Some(TokenKind::Comma) => {
                    self.bump();
                }
                Some(TokenKind::Ident(_)) => {
                    if self.is_property() {
                        self.parse_property(element)?;
                    } else {
                        let child = self.parse_element(depth + 1)?;
                        element.children.push(child);
                    }
                }
                Some(kind) => {
                    return Err(
                        self.error_here(format!("unexpected {} in element body", kind.describe()))
                    )
                }
                None => return Err(self.error_here("unbalanced parentheses: element body not closed")),
            }
        }
    }

    /// Lookahead: `Ident '(' Str` is a property, anything else a child.
    fn is_property(&self) -> bool {
        matches!(self.peek_at(1).map(|t| &t.kind), Some(TokenKind::LParen))
            && matches!(self.peek_at(2).map(|t| &t.kind), Some(TokenKind::Str(_)))
    }

    fn parse_property(&mut self, element: &mut Element) -> Result<(), CompileError> {
        let key = match self.bump().map(|t| t.kind.clone()) {
            Some(TokenKind::Ident(key)) => key,
            _ => return Err(self.error_here("expected property name")),
        };
        self.bump(); // '(' checked by is_property()
        let value = match self.bump().map(|t| t.kind.clone()) {
            Some(TokenKind::Str(value)) => value,
            _ => return Err(self.error_here("expected property value")),
        };
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::RParen) => {
                self.bump();
            }
            Some(kind) => {
                return Err(self.error_here(format!(
                    "expected ')' after property value, found {}",
                    kind.describe()
                )))
            }
            None => return Err(self.error_here("expected ')' after property value")),
        }
        element.props.push((key, value));
        Ok(())
    }
}
