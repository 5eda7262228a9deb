//! Parser for declarative plugin definition files.
//!
//! The block syntax is a sequence of `define Name( field("value") ... )`
//! blocks, optionally preceded by top-level metadata calls
//! (`name("...")`, `author("...")`, `version("...")`, `description("...")`).
//! Quoted strings may span multiple lines, so CSS and script bodies can be
//! written inline. `//` line comments are skipped anywhere outside strings.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::PluginError;

use super::definition::{AllowList, PluginDefinition, PluginMetadata};
use super::loader::ParsedSource;

/// Parse one declarative source. A syntax error fails the whole source
/// (no partial definitions); unknown field names are diagnosed and ignored.
pub(crate) fn parse_source(
    label: &str,
    content: &str,
    diagnostics: &mut Diagnostics,
) -> Result<ParsedSource, PluginError> {
    let mut scanner = Scanner::new(content);
    let mut parsed = ParsedSource::default();
    let mut meta = PluginMetadata::default();
    let mut has_meta = false;

    loop {
        scanner.skip_trivia();
        if scanner.at_end() {
            break;
        }
        let ident = scanner
            .read_ident()
            .ok_or_else(|| scanner.error("expected identifier"))?;
        if ident == "define" {
            scanner.skip_trivia();
            let name = scanner
                .read_ident()
                .ok_or_else(|| scanner.error("expected plugin name after 'define'"))?;
            scanner.skip_trivia();
            scanner.expect('(')?;
            let definition = parse_define_body(&mut scanner, &name, label, diagnostics)?;
            parsed.definitions.push((name, definition));
        } else {
            scanner.skip_trivia();
            scanner.expect('(')?;
            scanner.skip_trivia();
            let value = scanner.read_string()?;
            scanner.skip_trivia();
            scanner.expect(')')?;
            match ident.as_str() {
                "name" => {
                    meta.name = value;
                    has_meta = true;
                }
                "author" => {
                    meta.author = value;
                    has_meta = true;
                }
                "version" => {
                    meta.version = value;
                    has_meta = true;
                }
                "description" => {
                    meta.description = value;
                    has_meta = true;
                }
                _ => diagnostics.push(
                    Diagnostic::warning(
                        "W101",
                        format!("unknown top-level field '{ident}'; ignored"),
                    )
                    .with_source(label)
                    .with_location(scanner.line, scanner.column),
                ),
            }
        }
    }

    if has_meta {
        parsed.metadata = Some(meta);
    }
    Ok(parsed)
}

fn parse_define_body(
    scanner: &mut Scanner,
    name: &str,
    label: &str,
    diagnostics: &mut Diagnostics,
) -> Result<PluginDefinition, PluginError> {
    let mut def = PluginDefinition::default();
    loop {
        scanner.skip_trivia();
        match scanner.peek() {
            None => return Err(scanner.error("unterminated define block")),
            Some(')') => {
                scanner.bump();
                break;
            }
            Some(';') | Some(',') => {
                scanner.bump();
                continue;
            }
            _ => {}
        }
        let field = scanner
            .read_ident()
            .ok_or_else(|| scanner.error("expected field name"))?;
        scanner.skip_trivia();
        scanner.expect('(')?;
        let args = parse_args(scanner)?;
        // Repeated scalar fields: last occurrence wins. Repeated attr()
        // calls accumulate.
        match field.as_str() {
            "tag" => def.tag = args.into_iter().next(),
            "content" => def.content = args.into_iter().next(),
            "selfclosing" => {
                def.selfclosing = args.first().map(|v| v == "true").unwrap_or(false)
            }
            "attr" => def.attrs.extend(args),
            "default_css" => def.default_css = args.into_iter().next(),
            "default_script" => def.default_script = args.into_iter().next(),
            "allow_children" => def.allow_children = Some(AllowList::from_names(args)),
            "allow_attrs" => def.allow_attrs = Some(AllowList::from_names(args)),
            "deny_attrs" => def.deny_attrs = args,
            _ => diagnostics.push(
                Diagnostic::warning(
                    "W101",
                    format!("unknown field '{field}' in define {name}; ignored"),
                )
                .with_source(label)
                .with_location(scanner.line, scanner.column),
            ),
        }
    }
    Ok(def)
}

/// Comma-separated quoted strings up to the closing `)`.
fn parse_args(scanner: &mut Scanner) -> Result<Vec<String>, PluginError> {
    let mut args = Vec::new();
    loop {
        scanner.skip_trivia();
        match scanner.peek() {
            Some(')') => {
                scanner.bump();
                return Ok(args);
            }
            Some('"') => args.push(scanner.read_string()?),
            Some(',') => {
                scanner.bump();
            }
            Some(c) => return Err(scanner.error(format!("unexpected character '{c}'"))),
            None => return Err(scanner.error("unterminated argument list")),
        }
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(content: &str) -> Self {
        Scanner {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Some(ident)
    }

    /// Reads a quoted string starting at `"`. Raw newlines are allowed;
    /// `\n`, `\t`, `\r`, `\"` and `\\` escapes are processed.
    fn read_string(&mut self) -> Result<String, PluginError> {
        match self.peek() {
            Some('"') => {
                self.bump();
            }
            _ => return Err(self.error("expected string literal")),
        }
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PluginError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> PluginError {
        PluginError::Parse(format!(
            "{} at line {}, column {}",
            message.into(),
            self.line,
            self.column
        ))
    }
}
