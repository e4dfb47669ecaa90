//! Reader and writer for `project.pbxproj` files.
//!
//! Xcode stores projects as an OpenStep-style property list: dictionaries
//! (`{ key = value; }`), arrays (`( a, b, )`), strings (bare or quoted) and
//! the odd `<hex>` data blob. Key order is preserved so that rewriting an
//! untouched project changes as little as possible.

use std::fmt::Write as _;

use indexmap::IndexMap;
use thiserror::Error;

/// A dictionary with preserved key order.
pub type PbxDict = IndexMap<String, PbxValue>;

/// A property list value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbxValue {
    String(String),
    Data(Vec<u8>),
    Array(Vec<PbxValue>),
    Dict(PbxDict),
}

impl PbxValue {
    pub fn string(s: impl Into<String>) -> Self {
        PbxValue::String(s.into())
    }

    /// An array of strings, typically object ids.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PbxValue::Array(items.into_iter().map(|s| PbxValue::String(s.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PbxValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PbxValue]> {
        match self {
            PbxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<PbxValue>> {
        match self {
            PbxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PbxDict> {
        match self {
            PbxValue::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut PbxDict> {
        match self {
            PbxValue::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<&str> for PbxValue {
    fn from(s: &str) -> Self {
        PbxValue::String(s.to_string())
    }
}

impl From<String> for PbxValue {
    fn from(s: String) -> Self {
        PbxValue::String(s)
    }
}

impl From<PbxDict> for PbxValue {
    fn from(dict: PbxDict) -> Self {
        PbxValue::Dict(dict)
    }
}

/// Error produced when a pbxproj file cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed project file at line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse a complete pbxproj document. The top-level value must be a
/// dictionary.
pub fn parse(input: &str) -> Result<PbxDict, ParseError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected content after the root dictionary"));
    }
    match value {
        PbxValue::Dict(dict) => Ok(dict),
        _ => Err(parser.error("the root value is not a dictionary")),
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_trivia()?;
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of file", expected))),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(self.error("unterminated comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<PbxValue, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_dict().map(PbxValue::Dict),
            Some('(') => self.parse_array().map(PbxValue::Array),
            Some('<') => self.parse_data().map(PbxValue::Data),
            Some('"') | Some('\'') => self.parse_quoted().map(PbxValue::String),
            Some(c) if is_bare_char(c) => Ok(PbxValue::String(self.parse_bare())),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn parse_dict(&mut self) -> Result<PbxDict, ParseError> {
        self.expect('{')?;
        let mut dict = PbxDict::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(dict);
            }
            let key = match self.parse_value()? {
                PbxValue::String(key) => key,
                _ => return Err(self.error("dictionary keys must be strings")),
            };
            self.expect('=')?;
            let value = self.parse_value()?;
            self.expect(';')?;
            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self) -> Result<Vec<PbxValue>, ParseError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.bump();
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                _ => return Err(self.error("expected `,` or `)` in array")),
            }
        }
    }

    fn parse_data(&mut self) -> Result<Vec<u8>, ParseError> {
        self.expect('<')?;
        let mut digits = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                Some(c) if c.is_whitespace() => {}
                Some(c) => return Err(self.error(format!("invalid character `{}` in data", c))),
                None => return Err(self.error("unterminated data")),
            }
        }
        hex::decode(&digits).map_err(|e| self.error(format!("invalid data: {}", e)))
    }

    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('U') => self.parse_unicode_escape()?,
                        Some(c) => c,
                        None => return Err(self.error("unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, ParseError> {
        let mut code = String::new();
        for _ in 0..4 {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => code.push(c),
                _ => return Err(self.error("invalid unicode escape")),
            }
        }
        u32::from_str_radix(&code, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn parse_bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !is_bare_char(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-')
}

/// Whether a string can be written without quotes.
fn can_write_bare(s: &str) -> bool {
    !s.is_empty()
        && !s.contains("//")
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.'))
}

fn write_string(out: &mut String, s: &str) {
    if can_write_bare(s) {
        out.push_str(s);
        return;
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_value(out: &mut String, value: &PbxValue, depth: usize, inline: bool) {
    match value {
        PbxValue::String(s) => write_string(out, s),
        PbxValue::Data(bytes) => {
            out.push('<');
            out.push_str(&hex::encode(bytes));
            out.push('>');
        }
        PbxValue::Array(items) if inline => {
            out.push('(');
            for item in items {
                write_value(out, item, depth, true);
                out.push_str(", ");
            }
            out.push(')');
        }
        PbxValue::Array(items) => {
            out.push_str("(\n");
            for item in items {
                indent(out, depth + 1);
                write_value(out, item, depth + 1, false);
                out.push_str(",\n");
            }
            indent(out, depth);
            out.push(')');
        }
        PbxValue::Dict(dict) if inline => {
            out.push('{');
            for (key, value) in dict {
                write_string(out, key);
                out.push_str(" = ");
                write_value(out, value, depth, true);
                out.push_str("; ");
            }
            out.push('}');
        }
        PbxValue::Dict(dict) => {
            out.push_str("{\n");
            for (key, value) in dict {
                indent(out, depth + 1);
                write_string(out, key);
                out.push_str(" = ");
                write_value(out, value, depth + 1, false);
                out.push_str(";\n");
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

/// Objects Xcode writes on a single line.
fn is_single_line_isa(isa: &str) -> bool {
    matches!(isa, "PBXBuildFile" | "PBXFileReference")
}

fn write_objects(out: &mut String, objects: &PbxDict) {
    let mut sorted: Vec<(&str, &str, &PbxValue)> = objects
        .iter()
        .map(|(id, object)| {
            let isa = object
                .as_dict()
                .and_then(|dict| dict.get("isa"))
                .and_then(PbxValue::as_str)
                .unwrap_or("");
            (isa, id.as_str(), object)
        })
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));

    out.push_str("{\n");
    let mut current: Option<&str> = None;
    for (isa, id, object) in sorted {
        if current != Some(isa) {
            if let Some(previous) = current {
                let _ = writeln!(out, "/* End {} section */", previous);
            }
            let _ = writeln!(out, "\n/* Begin {} section */", isa);
            current = Some(isa);
        }
        indent(out, 2);
        write_string(out, id);
        out.push_str(" = ");
        write_value(out, object, 2, is_single_line_isa(isa));
        out.push_str(";\n");
    }
    if let Some(previous) = current {
        let _ = writeln!(out, "/* End {} section */", previous);
    }
    indent(out, 1);
    out.push('}');
}

/// Serialize a pbxproj document the way Xcode lays it out.
pub fn write(root: &PbxDict) -> String {
    let mut out = String::from("// !$*UTF8*$!\n{\n");
    for (key, value) in root {
        indent(&mut out, 1);
        write_string(&mut out, key);
        out.push_str(" = ");
        match (key.as_str(), value) {
            ("objects", PbxValue::Dict(objects)) => write_objects(&mut out, objects),
            _ => write_value(&mut out, value, 1, false),
        }
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}
