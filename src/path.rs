// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use crate::error::PathError;

const VALIDATION: &str = r"^(([a-zA-Z_][a-zA-Z0-9_\-]*|\*)?(\[(\d+|\*|\d*:\d*)\])*)(\.([a-zA-Z_][a-zA-Z0-9_\-]*|\*)(\[(\d+|\*|\d*:\d*)\])*)*$";
const TOKEN: &str = r"([a-zA-Z_][a-zA-Z0-9_\-]*|\*)|\[(\d+|\*|\d*:\d*)\]";

/// Location inside a compared value graph.
///
/// A path is immutable: descending into a child always builds a new path with
/// [`Path::append`]. The same type doubles as a pattern for rule lookups, in
/// which case it may hold wildcard and index range segments.
///
/// Equality and hashing go through [`Path::keys`], so an empty `Keys` list is
/// the root.
#[derive(Debug, Clone, Default)]
pub enum Path {
    #[default]
    Root,
    Keys(Vec<Key>),
}

/// One segment of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Record field name or map key rendered as a string.
    Field(String),
    /// Position inside a sequence or inside the iteration order of a set.
    Idx(usize),
    IdxRange(usize, usize),
    IdxRangeStart(usize),
    IdxRangeEnd(usize),
    /// Any field or map key.
    Wildcard,
    /// Any index.
    WildcardArray,
}

impl Key {
    /// Whether this (possibly wildcard) segment matches the concrete `other`.
    pub fn matches(&self, other: &Key) -> bool {
        if self == other {
            return true;
        }

        match (self, other) {
            (Key::Wildcard, Key::Field(_)) => true,
            (Key::WildcardArray, Key::Idx(_)) => true,
            (Key::IdxRange(a, b), Key::Idx(c)) => a <= c && c < b,
            (Key::IdxRangeStart(a), Key::Idx(b)) => a <= b,
            (Key::IdxRangeEnd(a), Key::Idx(b)) => b < a,
            _ => false,
        }
    }

    pub fn is_pattern(&self) -> bool {
        !matches!(self, Key::Field(_) | Key::Idx(_))
    }

    /// Whether some concrete segment is matched by both `self` and `other`.
    pub fn overlaps(&self, other: &Key) -> bool {
        match (self.index_bounds(), other.index_bounds()) {
            (Some((start, end)), Some((other_start, other_end))) => {
                start < other_end && other_start < end
            }
            _ => self.matches(other) || other.matches(self),
        }
    }

    /// Half-open range of indices matched by an index segment.
    fn index_bounds(&self) -> Option<(usize, usize)> {
        match self {
            Key::Idx(idx) => Some((*idx, idx.saturating_add(1))),
            Key::IdxRange(start, end) => Some((*start, *end)),
            Key::IdxRangeStart(start) => Some((*start, usize::MAX)),
            Key::IdxRangeEnd(end) => Some((0, *end)),
            Key::WildcardArray => Some((0, usize::MAX)),
            Key::Field(_) | Key::Wildcard => None,
        }
    }

    fn is_field_like(&self) -> bool {
        matches!(self, Key::Field(_) | Key::Wildcard)
    }

    fn parse_selector(path: &str, token: &str) -> Result<Key, PathError> {
        let index = |s: &str| {
            s.parse::<usize>().map_err(|_| PathError::Index {
                path: path.to_string(),
                index: s.to_string(),
            })
        };

        if token == "*" || token == ":" {
            return Ok(Key::WildcardArray);
        }

        match token.split_once(':') {
            Some(("", end)) => Ok(Key::IdxRangeEnd(index(end)?)),
            Some((start, "")) => Ok(Key::IdxRangeStart(index(start)?)),
            Some((start, end)) => Ok(Key::IdxRange(index(start)?, index(end)?)),
            None => Ok(Key::Idx(index(token)?)),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Field(key) => write!(f, "{}", key),
            Key::Idx(idx) => write!(f, "[{}]", idx),
            Key::IdxRange(start, end) => write!(f, "[{}:{}]", start, end),
            Key::IdxRangeStart(start) => write!(f, "[{}:]", start),
            Key::IdxRangeEnd(end) => write!(f, "[:{}]", end),
            Key::Wildcard => write!(f, "*"),
            Key::WildcardArray => write!(f, "[*]"),
        }
    }
}

impl Path {
    /// Builds a path from its segments; no segments means the root.
    pub fn from_keys(keys: Vec<Key>) -> Path {
        if keys.is_empty() {
            Path::Root
        } else {
            Path::Keys(keys)
        }
    }

    /// Shorthand for a single field path.
    pub fn field(name: impl Into<String>) -> Path {
        Path::Keys(vec![Key::Field(name.into())])
    }

    /// Returns a new path with `next` appended; the receiver is left untouched.
    pub fn append(&self, next: Key) -> Path {
        match self {
            Path::Root => Path::Keys(vec![next]),
            Path::Keys(list) => {
                let mut copy = list.clone();
                copy.push(next);
                Path::Keys(copy)
            }
        }
    }

    pub fn with_field(&self, name: impl Into<String>) -> Path {
        self.append(Key::Field(name.into()))
    }

    pub fn with_index(&self, idx: usize) -> Path {
        self.append(Key::Idx(idx))
    }

    pub fn keys(&self) -> &[Key] {
        match self {
            Path::Root => &[],
            Path::Keys(keys) => keys,
        }
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    pub fn is_root(&self) -> bool {
        self.keys().is_empty()
    }

    /// True for a path made of exactly one segment, e.g. `name` or `[0]`.
    pub fn is_top_level_field(&self) -> bool {
        self.len() == 1
    }

    /// Field names along the path, indices skipped.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys().iter().filter_map(|key| match key {
            Key::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Name of the closest field segment.
    pub fn last_field(&self) -> Option<&str> {
        self.keys().iter().rev().find_map(|key| match key {
            Key::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn parent(&self) -> Option<Path> {
        self.keys()
            .split_last()
            .map(|(_, parent)| Path::from_keys(parent.to_vec()))
    }

    pub fn is_pattern(&self) -> bool {
        self.keys().iter().any(Key::is_pattern)
    }

    /// Whether this concrete path is matched by `pattern`, segment by segment.
    pub fn matches(&self, pattern: &Path) -> bool {
        self.len() == pattern.len() && pattern.prefixes(self)
    }

    /// Whether some concrete path is matched by both patterns.
    pub fn overlaps(&self, other: &Path) -> bool {
        self.len() == other.len()
            && self
                .keys()
                .iter()
                .zip(other.keys())
                .all(|(key, other)| key.overlaps(other))
    }

    /// Whether this pattern matches the beginning of `other`.
    pub fn prefixes(&self, other: &Path) -> bool {
        let (pattern, concrete) = (self.keys(), other.keys());
        if pattern.len() > concrete.len() {
            return false;
        }

        pattern
            .iter()
            .zip(concrete.iter())
            .all(|(pattern, concrete)| pattern.matches(concrete))
    }

    /// Parses the textual form: `friends[*].name`, `$.a.b[0:2]`, `[1]`, `$`.
    pub fn parse(path: &str) -> Result<Path, PathError> {
        let syntax = || PathError::Syntax(path.to_string());

        let body = match path.strip_prefix('$') {
            Some("") => return Ok(Path::Root),
            Some(rest) => rest.strip_prefix('.').unwrap_or(rest),
            None => path,
        };

        if body.is_empty() {
            return Err(syntax());
        }

        let validation = Regex::new(VALIDATION).map_err(|_| syntax())?;
        if !validation.is_match(body) {
            return Err(syntax());
        }

        let token = Regex::new(TOKEN).map_err(|_| syntax())?;
        let mut keys = Vec::new();

        for captures in token.captures_iter(body) {
            if let Some(name) = captures.get(1) {
                keys.push(match name.as_str() {
                    "*" => Key::Wildcard,
                    name => Key::Field(name.to_string()),
                });
            } else if let Some(selector) = captures.get(2) {
                keys.push(Key::parse_selector(path, selector.as_str())?);
            }
        }

        Ok(Path::from_keys(keys))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Path) -> bool {
        self.keys() == other.keys()
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keys().hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return write!(f, "(root)");
        }

        for (idx, key) in self.keys().iter().enumerate() {
            if idx > 0 && key.is_field_like() {
                write!(f, ".")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
