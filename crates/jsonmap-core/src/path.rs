//! Path descriptors and resolution against nested JSON.
//!
//! A [`DataPath`] names a location inside a source document as a sequence of
//! segments. Three spellings are accepted:
//!
//! | Form | Example | Notes |
//! |------|---------|-------|
//! | dotted | `users.0.name` | `.` separates segments |
//! | bracketed | `users[0]["first.name"]` | quoted keys may contain `.` |
//! | JSON Pointer | `/users/0/name`, `#/users/0` | RFC 6901 escaping |
//!
//! Parsing is total: a malformed bracket is kept literally as part of a key.
//! During resolution a segment selects an object key, or an array index when
//! the container is an array and the segment is a canonical unsigned integer.
//! A path with no segments selects the whole source.
//!
//! Presence: a path resolves to nothing when a key is absent, an index is out
//! of range, or a step would descend into a scalar. JSON `null` is a present
//! value.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::pointer::{build_path, split_path, step};

/// A parsed path descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    raw: String,
    segments: Vec<String>,
}

impl DataPath {
    /// Parse a path descriptor. Never fails.
    ///
    /// ```
    /// use jsonmap_core::DataPath;
    /// assert_eq!(DataPath::parse("users[0].name").segments(), ["users", "0", "name"]);
    /// assert_eq!(DataPath::parse("/a~1b/0").segments(), ["a/b", "0"]);
    /// ```
    pub fn parse(raw: &str) -> Self {
        let segments = if raw.starts_with('/') || raw.starts_with('#') {
            split_path(raw)
        } else if raw.is_empty() {
            Vec::new()
        } else {
            parse_dotted(raw)
        };
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// Build a path from already-split segments. The textual form is the
    /// equivalent JSON Pointer, so it re-parses to the same segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        Self {
            raw: build_path("#", &refs),
            segments,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The descriptor as written by the caller.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for DataPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for DataPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl FromStr for DataPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Wire shapes accepted for a path in mapping files.
#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Text(String),
    Segments(Vec<SegmentRepr>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Key(String),
    Index(u64),
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PathRepr::deserialize(deserializer)? {
            PathRepr::Text(raw) => Self::parse(&raw),
            PathRepr::Segments(segments) => Self::from_segments(segments.into_iter().map(
                |s| match s {
                    SegmentRepr::Key(key) => key,
                    SegmentRepr::Index(idx) => idx.to_string(),
                },
            )),
        })
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a path against `source`, returning `None` when any segment is
/// missing.
pub fn resolve<'a>(source: &'a Value, path: &DataPath) -> Option<&'a Value> {
    let mut current = source;
    for segment in &path.segments {
        current = step(current, segment)?;
    }
    Some(current)
}

/// Resolve a path, substituting `default` when it does not resolve.
///
/// Returns `None` only when the path is missing and no default was supplied.
///
/// ```
/// use jsonmap_core::{get, DataPath};
/// use serde_json::json;
///
/// let source = json!({ "users": [{ "name": "Bob" }] });
/// let fallback = json!("NoName");
/// assert_eq!(get(&source, &"users.0.name".into(), Some(&fallback)), Some(json!("Bob")));
/// assert_eq!(get(&source, &"users.2.name".into(), Some(&fallback)), Some(json!("NoName")));
/// assert_eq!(get(&source, &DataPath::parse("users.2.name"), None), None);
/// ```
pub fn get(source: &Value, path: &DataPath, default: Option<&Value>) -> Option<Value> {
    resolve(source, path).or(default).cloned()
}

// ---------------------------------------------------------------------------
// Dotted / bracketed parsing
// ---------------------------------------------------------------------------

/// Split a dotted descriptor into segments.
///
/// `current` is `None` right after a bracket segment closes, so `a[0].b`
/// does not produce a phantom empty segment before `b`.
fn parse_dotted(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Option<String> = Some(String::new());
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '.' => {
                if let Some(seg) = current.take() {
                    segments.push(seg);
                }
                current = Some(String::new());
            }
            '[' => match bracket_segment(rest) {
                Some((seg, consumed)) => {
                    if let Some(prefix) = current.take() {
                        if !prefix.is_empty() {
                            segments.push(prefix);
                        }
                    }
                    segments.push(seg);
                    rest = &rest[consumed..];
                }
                None => current.get_or_insert_with(String::new).push('['),
            },
            other => current.get_or_insert_with(String::new).push(other),
        }
    }

    if let Some(seg) = current {
        segments.push(seg);
    }
    segments
}

/// Parse the inside of a bracket (`rest` starts just after `[`).
///
/// Returns the segment and the number of bytes consumed including the
/// closing `]`, or `None` when the bracket is malformed.
fn bracket_segment(rest: &str) -> Option<(String, usize)> {
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;

    if first == '"' || first == '\'' {
        let mut seg = String::new();
        let mut escaped = false;
        for (i, c) in chars {
            if escaped {
                seg.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == first {
                // Closing quote must be followed directly by `]`.
                let after = &rest[i + c.len_utf8()..];
                return after
                    .starts_with(']')
                    .then(|| (seg, i + c.len_utf8() + 1));
            } else {
                seg.push(c);
            }
        }
        return None;
    }

    let end = rest.find(']')?;
    let inner = &rest[..end];
    if inner.is_empty() || inner.contains('[') {
        return None;
    }
    Some((inner.trim().to_string(), end + 1))
}
