//! The structured literal grammar used for values in text settings files.
//!
//! ```text
//! null  true  false  42  -7  1.5  2e-3  inf  inf_neg  nan  "escaped \"text\""
//! [1, "two", [3]]   {"deadzone": 0.5, "events": []}
//! Vector2(1.0, 2.0)  Vector2i(4, 5)  Vector3(0.0, 1.0, 0.0)  Color(1.0, 0.5, 0.0, 1.0)
//! PackedStringArray("a", "b")  PackedInt64Array(1, 2)  PackedFloat64Array(0.5)
//! PackedByteArray(0, 255)
//! ```
//!
//! Literals nest freely and may span several lines.

use crate::error::SettingsError;
use lattice_domain::{Color, Dictionary, Value, Vector2, Vector2i, Vector3};
use std::fmt::Write as _;

const MAX_DEPTH: usize = 128;

/// Parses a single literal; anything but trailing whitespace after it is an error.
///
/// # Errors
/// Returns [`SettingsError::CorruptData`] with the offending line and column.
///
/// # Example
///
/// ```rust
/// use lattice_domain::Value;
/// use lattice_settings::format::literal;
///
/// let value = literal::parse("[1, \"two\"]").unwrap();
/// assert_eq!(value, Value::Array(vec![Value::Int(1), Value::from("two")]));
/// ```
pub fn parse(src: &str) -> Result<Value, SettingsError> {
    let mut cursor = Cursor::new(src);
    let value = cursor.value().map_err(|e| e.into_error())?;
    cursor.skip_whitespace();
    if cursor.peek().is_some() {
        return Err(cursor.fail("unexpected trailing input").into_error());
    }
    Ok(value)
}

/// Renders a value in the literal grammar.
///
/// ```rust
/// use lattice_domain::{Value, Vector2};
/// use lattice_settings::format::literal;
///
/// assert_eq!(literal::to_string(&Value::Float(2.0)), "2.0");
/// assert_eq!(literal::to_string(&Vector2 { x: 1.0, y: -0.5 }.into()), "Vector2(1.0, -0.5)");
/// ```
#[must_use]
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub(crate) fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Nil => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        },
        Value::Float(f) => write_float(out, *f),
        Value::String(s) => write_string(out, s),
        Value::Vector2(v) => write_floats(out, "Vector2", &[v.x, v.y]),
        Value::Vector2i(v) => {
            let _ = write!(out, "Vector2i({}, {})", v.x, v.y);
        },
        Value::Vector3(v) => write_floats(out, "Vector3", &[v.x, v.y, v.z]),
        Value::Color(c) => write_floats(out, "Color", &[c.r, c.g, c.b, c.a]),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        },
        Value::Dictionary(dict) => {
            if dict.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, item)) in dict.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                write_value(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push_str("\n}");
        },
        Value::PackedStringArray(items) => {
            out.push_str("PackedStringArray(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, item);
            }
            out.push(')');
        },
        Value::PackedInt64Array(items) => write_list(out, "PackedInt64Array", items.as_slice()),
        Value::PackedFloat64Array(items) => write_floats(out, "PackedFloat64Array", items),
        Value::PackedByteArray(items) => write_list(out, "PackedByteArray", items.as_slice()),
    }
}

/// Writes a float so it always reads back as a float (`1.0`, never `1`).
pub(crate) fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("nan");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "inf" } else { "inf_neg" });
    } else {
        // Debug keeps the fraction on integral values and is the shortest exact repr.
        let _ = write!(out, "{f:?}");
    }
}

pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            },
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_floats(out: &mut String, name: &str, items: &[f64]) {
    out.push_str(name);
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_float(out, *item);
    }
    out.push(')');
}

fn write_list<T: std::fmt::Display>(out: &mut String, name: &str, items: &[T]) {
    out.push_str(name);
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{item}");
    }
    out.push(')');
}

/// Position-tracked failure, converted to [`SettingsError`] at the module boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseFailure {
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) message: String,
}

impl ParseFailure {
    pub(crate) fn into_error(self) -> SettingsError {
        let Self { line, column, message } = self;
        SettingsError::corrupt(format!("{message} at line {line}, column {column}"))
    }
}

/// A byte cursor over UTF-8 text, shared with the document parser.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1, line_start: 0 }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    pub(crate) const fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn fail(&self, message: impl Into<String>) -> ParseFailure {
        ParseFailure {
            line: self.line,
            column: self.src[self.line_start..self.pos].chars().count() + 1,
            message: message.into(),
        }
    }

    /// Skips spaces, tabs and newlines.
    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Skips spaces and tabs, stopping at a line break.
    pub(crate) fn skip_inline_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace() && c != '\n') {
            self.bump();
        }
    }

    /// Consumes everything up to and including the next line break.
    pub(crate) fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Consumes up to (not including) the first of `stops` or a line break.
    pub(crate) fn take_until(&mut self, stops: &[char]) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '\n' && !stops.contains(&c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn eat(&mut self, expected: char) -> Result<(), ParseFailure> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            },
            Some(c) => Err(self.fail(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.fail(format!("expected '{expected}', found end of input"))),
        }
    }

    pub(crate) fn value(&mut self) -> Result<Value, ParseFailure> {
        self.value_at(0)
    }

    fn value_at(&mut self, depth: usize) -> Result<Value, ParseFailure> {
        if depth > MAX_DEPTH {
            return Err(self.fail("literal nested too deeply"));
        }
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.fail("expected a value, found end of input")),
            Some('"') => self.string().map(Value::String),
            Some('[') => self.array(depth),
            Some('{') => self.dictionary(depth),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.word(depth),
            Some(c) => Err(self.fail(format!("unexpected character '{c}'"))),
        }
    }

    pub(crate) fn string(&mut self) -> Result<String, ParseFailure> {
        self.eat('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.fail("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, ParseFailure> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some(c @ ('"' | '\\' | '/')) => Ok(c),
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| self.fail("invalid \\u escape"))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(|| self.fail("escape is not a valid character"))
            },
            Some(c) => Err(self.fail(format!("unknown escape '\\{c}'"))),
            None => Err(self.fail("unterminated escape")),
        }
    }

    fn number(&mut self) -> Result<Value, ParseFailure> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {},
                '.' | 'e' | 'E' => is_float = true,
                '+' | '-' if matches!(self.src[..self.pos].chars().last(), Some('e' | 'E')) => {},
                _ => break,
            }
            self.bump();
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.fail(format!("invalid float '{text}'")))
        } else {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.fail(format!("invalid integer '{text}'")))
        }
    }

    fn word(&mut self, depth: usize) -> Result<Value, ParseFailure> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        match word {
            "null" => Ok(Value::Nil),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "inf" => Ok(Value::Float(f64::INFINITY)),
            "inf_neg" => Ok(Value::Float(f64::NEG_INFINITY)),
            "nan" => Ok(Value::Float(f64::NAN)),
            _ => self.constructor(word, depth),
        }
    }

    fn constructor(&mut self, name: &str, depth: usize) -> Result<Value, ParseFailure> {
        self.eat('(')?;
        let args = self.sequence(')', depth)?;
        match name {
            "Vector2" => {
                let [x, y] = self.floats_exact(name, &args)?;
                Ok(Value::Vector2(Vector2 { x, y }))
            },
            "Vector2i" => {
                let [x, y] = self.ints_exact(name, &args)?;
                Ok(Value::Vector2i(Vector2i { x, y }))
            },
            "Vector3" => {
                let [x, y, z] = self.floats_exact(name, &args)?;
                Ok(Value::Vector3(Vector3 { x, y, z }))
            },
            "Color" if args.len() == 3 => {
                let [r, g, b] = self.floats_exact(name, &args)?;
                Ok(Value::Color(Color { r, g, b, a: 1.0 }))
            },
            "Color" => {
                let [r, g, b, a] = self.floats_exact(name, &args)?;
                Ok(Value::Color(Color { r, g, b, a }))
            },
            "PackedStringArray" => args
                .into_iter()
                .map(|arg| match arg {
                    Value::String(s) => Ok(s),
                    other => {
                        Err(self.fail(format!("{name} expects strings, found {}", other.kind())))
                    },
                })
                .collect::<Result<_, _>>()
                .map(Value::PackedStringArray),
            "PackedInt64Array" => args
                .iter()
                .map(|arg| self.int_arg(name, arg))
                .collect::<Result<_, _>>()
                .map(Value::PackedInt64Array),
            "PackedFloat64Array" => args
                .iter()
                .map(|arg| self.float_arg(name, arg))
                .collect::<Result<_, _>>()
                .map(Value::PackedFloat64Array),
            "PackedByteArray" => args
                .iter()
                .map(|arg| {
                    let int = self.int_arg(name, arg)?;
                    u8::try_from(int)
                        .map_err(|_| self.fail(format!("{name} element {int} is out of range")))
                })
                .collect::<Result<_, _>>()
                .map(Value::PackedByteArray),
            _ => Err(self.fail(format!("unknown constructor '{name}'"))),
        }
    }

    fn array(&mut self, depth: usize) -> Result<Value, ParseFailure> {
        self.eat('[')?;
        self.sequence(']', depth).map(Value::Array)
    }

    /// Comma-separated values up to `close`; a trailing comma is accepted.
    fn sequence(&mut self, close: char, depth: usize) -> Result<Vec<Value>, ParseFailure> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value_at(depth + 1)?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                },
                Some(c) if c == close => {},
                _ => return Err(self.fail(format!("expected ',' or '{close}'"))),
            }
        }
    }

    fn dictionary(&mut self, depth: usize) -> Result<Value, ParseFailure> {
        self.eat('{')?;
        let mut dict = Dictionary::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Dictionary(dict));
            }
            let key = self.value_at(depth + 1)?;
            self.eat(':')?;
            let item = self.value_at(depth + 1)?;
            dict.insert(key, item);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                },
                Some('}') => {},
                _ => return Err(self.fail("expected ',' or '}'")),
            }
        }
    }

    fn floats_exact<const N: usize>(
        &self,
        name: &str,
        args: &[Value],
    ) -> Result<[f64; N], ParseFailure> {
        if args.len() != N {
            return Err(self.fail(format!("{name} takes {N} arguments, found {}", args.len())));
        }
        let mut out = [0.0; N];
        for (slot, arg) in out.iter_mut().zip(args) {
            *slot = self.float_arg(name, arg)?;
        }
        Ok(out)
    }

    fn ints_exact<const N: usize>(
        &self,
        name: &str,
        args: &[Value],
    ) -> Result<[i64; N], ParseFailure> {
        if args.len() != N {
            return Err(self.fail(format!("{name} takes {N} arguments, found {}", args.len())));
        }
        let mut out = [0; N];
        for (slot, arg) in out.iter_mut().zip(args) {
            *slot = self.int_arg(name, arg)?;
        }
        Ok(out)
    }

    fn float_arg(&self, name: &str, arg: &Value) -> Result<f64, ParseFailure> {
        arg.as_float()
            .ok_or_else(|| self.fail(format!("{name} expects numbers, found {}", arg.kind())))
    }

    fn int_arg(&self, name: &str, arg: &Value) -> Result<i64, ParseFailure> {
        arg.as_int()
            .ok_or_else(|| self.fail(format!("{name} expects integers, found {}", arg.kind())))
    }
}
