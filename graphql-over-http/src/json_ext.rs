//! JSON paths and the helpers shared by every module that walks a JSON-like tree.

use std::fmt;
use std::str::FromStr;

use displaydoc::Display;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
use thiserror::Error;

/// A JSON object.
pub type Object = Map<ByteString, serde_json_bytes::Value>;

/// One step of a [`Path`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// A position in a list.
    Index(usize),

    /// A key in an object.
    Key(String),
}

impl PathElement {
    /// The kind of container this element can step into.
    pub(crate) fn container_kind(&self) -> &'static str {
        match self {
            PathElement::Index(_) => "list",
            PathElement::Key(_) => "object",
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(index) => write!(f, "{index}"),
            PathElement::Key(key) => f.write_str(key),
        }
    }
}

/// A path into a JSON-like tree, written as dot separated segments: `variables.files.1`.
///
/// A segment made only of ASCII digits addresses a list index, anything else addresses an
/// object key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the first `len` elements, used to point at the segment where a walk stopped.
    pub(crate) fn prefix(&self, len: usize) -> String {
        Path(self.0[..len.min(self.0.len())].to_vec()).to_string()
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        path.split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathError::EmptySegment {
                        path: path.to_string(),
                    })
                } else if segment.bytes().all(|b| b.is_ascii_digit()) {
                    segment
                        .parse()
                        .map(PathElement::Index)
                        .map_err(|_| PathError::InvalidIndex {
                            segment: segment.to_string(),
                        })
                } else {
                    Ok(PathElement::Key(segment.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut elements = self.0.iter();
        if let Some(first) = elements.next() {
            write!(f, "{first}")?;
        }
        for element in elements {
            write!(f, ".{element}")?;
        }
        Ok(())
    }
}

/// Failure to parse a [`Path`] or to walk it through a tree.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum PathError {
    /// the path is empty
    Empty,

    /// path '{path}' contains an empty segment
    EmptySegment { path: String },

    /// list index '{segment}' is too large
    InvalidIndex { segment: String },

    /// nothing found at '{at}'
    NotFound { at: String },

    /// expected {expected} before '{at}', found {found}
    TypeMismatch {
        at: String,
        expected: &'static str,
        found: &'static str,
    },

    /// value at '{at}' must be null, found {found}
    NotNull { at: String, found: &'static str },
}
