//! Field Paths
//!
//! A [`Path`] addresses one field from the schema root as a sequence of
//! property names and array indices. Lookup tables are keyed by the canonical
//! string form produced by [`encode`]; [`decode`] is its exact inverse.
//!
//! Canonical form:
//!
//! ```text
//! ["address", "city"]      ->  address.city
//! ["tags", 0]              ->  tags[0]
//! [0, "name"]              ->  [0].name
//! ["first name"]           ->  ["first name"]
//! ["0"]                    ->  ["0"]
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};

// =============================================================================
// Path Segment
// =============================================================================

/// A single addressing step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An array position
    Index(usize),
    /// A named property
    Key(String),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Key(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Key(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

// =============================================================================
// Path
// =============================================================================

/// Full address of a field from the schema root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path (the schema root)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// A new path one level deeper
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The enclosing path, `None` at the root
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Canonical string key
    pub fn encode(&self) -> String {
        encode(self)
    }

    /// Build a path from an already-split JSON array (`["a", 0, "b"]`)
    pub fn from_json_segments(values: &[Value]) -> Result<Self> {
        let mut segments = Vec::with_capacity(values.len());
        for value in values {
            let segment = match value {
                Value::String(name) => PathSegment::Key(name.clone()),
                Value::Number(n) => match n.as_u64() {
                    Some(index) => PathSegment::Index(index as usize),
                    None => {
                        return Err(SchemaError::invalid_path(
                            &Value::Array(values.to_vec()).to_string(),
                            format!("index {} is not a non-negative integer", n),
                        ))
                    }
                },
                other => {
                    return Err(SchemaError::invalid_path(
                        &Value::Array(values.to_vec()).to_string(),
                        format!("unsupported segment {}", other),
                    ))
                }
            };
            segments.push(segment);
        }
        Ok(Self(segments))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for Path {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

// =============================================================================
// Codec
// =============================================================================

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_identifier(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(&first) => is_ident_start(first) && bytes[1..].iter().all(|&b| is_ident_continue(b)),
        None => false,
    }
}

/// Encode a path into its canonical string key
pub fn encode(path: &Path) -> String {
    let mut out = String::new();
    for (i, segment) in path.segments().iter().enumerate() {
        match segment {
            PathSegment::Key(name) if is_identifier(name) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Key(name) => {
                out.push('[');
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(']');
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Decode a string key back into a path
pub fn decode(input: &str) -> Result<Path> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'[' => {
                let (segment, next) = decode_bracket(input, pos)?;
                segments.push(segment);
                pos = next;
            }
            b'.' if pos > 0 => {
                let (name, next) = read_identifier(input, pos + 1)?;
                segments.push(PathSegment::Key(name));
                pos = next;
            }
            b if pos == 0 && is_ident_start(b) => {
                let (name, next) = read_identifier(input, pos)?;
                segments.push(PathSegment::Key(name));
                pos = next;
            }
            _ => {
                return Err(SchemaError::invalid_path(
                    input,
                    format!("unexpected character at offset {}", pos),
                ))
            }
        }
    }

    Ok(Path(segments))
}

fn read_identifier(input: &str, start: usize) -> Result<(String, usize)> {
    let bytes = input.as_bytes();
    if start >= bytes.len() || !is_ident_start(bytes[start]) {
        return Err(SchemaError::invalid_path(
            input,
            format!("expected a property name at offset {}", start),
        ));
    }
    let mut end = start + 1;
    while end < bytes.len() && is_ident_continue(bytes[end]) {
        end += 1;
    }
    Ok((input[start..end].to_string(), end))
}

/// Decode `[0]`, `["name"]` or `['name']` starting at the opening bracket.
fn decode_bracket(input: &str, open: usize) -> Result<(PathSegment, usize)> {
    let bytes = input.as_bytes();
    let start = open + 1;
    let unterminated = || SchemaError::invalid_path(input, format!("unterminated bracket at offset {}", open));

    match bytes.get(start) {
        Some(b'"') => {
            let close = find_closing_quote(bytes, start, b'"').ok_or_else(unterminated)?;
            let name: String = serde_json::from_str(&input[start..=close])
                .map_err(|e| SchemaError::invalid_path(input, e.to_string()))?;
            expect_close(input, close + 1).map(|next| (PathSegment::Key(name), next))
        }
        Some(b'\'') => {
            let close = find_closing_quote(bytes, start, b'\'').ok_or_else(unterminated)?;
            let name = unescape_single_quoted(&input[start + 1..close]);
            expect_close(input, close + 1).map(|next| (PathSegment::Key(name), next))
        }
        Some(b) if b.is_ascii_digit() => {
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            let digits = &input[start..end];
            if digits.len() > 1 && digits.starts_with('0') {
                return Err(SchemaError::invalid_path(input, "index has a leading zero"));
            }
            let index = digits
                .parse::<usize>()
                .map_err(|e| SchemaError::invalid_path(input, e.to_string()))?;
            expect_close(input, end).map(|next| (PathSegment::Index(index), next))
        }
        Some(_) => Err(SchemaError::invalid_path(
            input,
            format!("expected an index or a quoted name at offset {}", start),
        )),
        None => Err(unterminated()),
    }
}

fn find_closing_quote(bytes: &[u8], open: usize, quote: u8) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn unescape_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn expect_close(input: &str, pos: usize) -> Result<usize> {
    match input.as_bytes().get(pos) {
        Some(b']') => Ok(pos + 1),
        _ => Err(SchemaError::invalid_path(
            input,
            format!("expected `]` at offset {}", pos),
        )),
    }
}

static ARRAY_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\]([A-Za-z_$])?").expect("array shorthand pattern is valid")
});

/// Rewrite `[]` into `[0]` so a key naming the array itself addresses its
/// first element.
pub fn normalize_shorthand(raw: &str) -> String {
    ARRAY_SHORTHAND
        .replace_all(raw, |caps: &Captures| match caps.get(1) {
            Some(next) => format!("[0].{}", next.as_str()),
            None => "[0]".to_string(),
        })
        .into_owned()
}
