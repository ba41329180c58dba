// src/asset/path.rs

//! Hierarchical asset paths
//!
//! An [`AssetPath`] is a list of segments that is interchangeable with its
//! `/`-joined string form. Two representations exist: a literal string with
//! the separator offsets recorded up front (no eager split), and a list of
//! owned segments. Both answer the same questions identically.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A path inside an asset source
#[derive(Debug, Clone)]
pub enum AssetPath {
    /// The original string; `separators` holds the byte offset of every `/`
    Literal { value: String, separators: Vec<usize> },
    /// Pre-split segments, joined with `/` when rendered
    Parts(Vec<String>),
}

impl AssetPath {
    /// Build a path from already separated segments
    pub fn of<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Parts(parts.into_iter().map(Into::into).collect())
    }

    /// Parse a path string.
    ///
    /// Both `/` and `\` separate segments. A single leading and a single
    /// trailing `/` are trimmed; empty segments elsewhere are kept. Paths
    /// that need neither trimming nor backslash handling stay literal. The
    /// empty string has no segments, like `/`.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::Parts(Vec::new());
        }

        let last = path.len().saturating_sub(1);
        let mut separators = Vec::new();
        let mut literal = true;
        let mut trim = false;

        for (i, c) in path.char_indices() {
            match c {
                '/' => {
                    if i == 0 || i == last {
                        literal = false;
                        trim = true;
                    }
                }
                '\\' => literal = false,
                _ => continue,
            }
            separators.push(i);
        }

        if literal {
            return Self::Literal {
                value: path.to_owned(),
                separators,
            };
        }

        let mut parts: Vec<String> = segments(path, &separators).map(str::to_owned).collect();
        if trim {
            if parts.first().is_some_and(String::is_empty) {
                parts.remove(0);
            }
            if parts.last().is_some_and(String::is_empty) {
                parts.pop();
            }
        }
        Self::Parts(parts)
    }

    /// The segments of this path
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Literal { value, separators } => segments(value, separators).collect(),
            Self::Parts(parts) => parts.iter().map(String::as_str).collect(),
        }
    }

    /// Length of the joined form, in characters
    pub fn len(&self) -> usize {
        match self {
            Self::Literal { value, .. } => value.chars().count(),
            Self::Parts(parts) => {
                let chars: usize = parts.iter().map(|p| p.chars().count()).sum();
                chars + parts.len().saturating_sub(1)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The character at `index` of the joined form
    pub fn char_at(&self, index: usize) -> Option<char> {
        match self {
            Self::Literal { value, .. } => value.chars().nth(index),
            Self::Parts(parts) => {
                let mut remaining = index;
                for (i, part) in parts.iter().enumerate() {
                    if i != 0 {
                        if remaining == 0 {
                            return Some('/');
                        }
                        remaining -= 1;
                    }
                    let len = part.chars().count();
                    if remaining < len {
                        return part.chars().nth(remaining);
                    }
                    remaining -= len;
                }
                None
            }
        }
    }

    /// True if this path is held as the original string
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }
}

fn segments<'a>(value: &'a str, separators: &'a [usize]) -> impl Iterator<Item = &'a str> + 'a {
    let mut start = 0;
    separators
        .iter()
        .map(Some)
        .chain(std::iter::once(None))
        .map(move |sep| match sep {
            Some(&end) => {
                let segment = &value[start..end];
                start = end + 1;
                segment
            }
            None => &value[start..],
        })
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, .. } => f.write_str(value),
            Self::Parts(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i != 0 {
                        f.write_str("/")?;
                    }
                    f.write_str(part)?;
                }
                Ok(())
            }
        }
    }
}

impl PartialEq for AssetPath {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for AssetPath {}

impl Hash for AssetPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl From<&str> for AssetPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for AssetPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}
