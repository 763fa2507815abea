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

use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::fmt;

use crate::{
    misc::{size_of, Indent},
    path::Path,
    value::Value,
};

/// Why two locations were found different.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    ValueMismatch,
    TypeMismatch,
    SizeMismatch,
    /// Present in expected only.
    MissingKey,
    /// Present in actual only.
    ExtraKey,
    MissingElement,
    ExtraElement,
}

impl Reason {
    pub fn code(&self) -> &'static str {
        match self {
            Reason::ValueMismatch => "value-mismatch",
            Reason::TypeMismatch => "type-mismatch",
            Reason::SizeMismatch => "size-mismatch",
            Reason::MissingKey => "missing-key",
            Reason::ExtraKey => "extra-key",
            Reason::MissingElement => "missing-element",
            Reason::ExtraElement => "extra-element",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One mismatch found by the comparison.
///
/// `actual` or `expected` is `None` when the location does not exist on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub(crate) path: Path,
    pub(crate) actual: Option<Value>,
    pub(crate) expected: Option<Value>,
    pub(crate) reason: Reason,
}

impl Difference {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn actual(&self) -> Option<&Value> {
        self.actual.as_ref()
    }

    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".to_string(), ToString::to_string)
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let actual = self.actual.as_ref();
        let expected = self.expected.as_ref();

        match self.reason {
            Reason::ValueMismatch => {
                writeln!(f, "values at path \"{}\" are not equal:", self.path)?;
                writeln!(f, "    expected:")?;
                writeln!(f, "{}", render(expected).indent(8))?;
                writeln!(f, "    actual:")?;
                write!(f, "{}", render(actual).indent(8))?;
            }
            Reason::TypeMismatch => {
                let type_of = |v: Option<&Value>| {
                    v.map_or_else(|| "(absent)".to_string(), |v| v.type_name().into_owned())
                };
                writeln!(f, "values at path \"{}\" have different types:", self.path)?;
                writeln!(f, "    expected: {}", type_of(expected))?;
                write!(f, "    actual: {}", type_of(actual))?;
            }
            Reason::SizeMismatch => {
                let size = |v: Option<&Value>| v.and_then(size_of).unwrap_or_default();
                writeln!(
                    f,
                    "sizes at path \"{}\" differ, expected {} but was {}:",
                    self.path,
                    size(expected),
                    size(actual)
                )?;
                writeln!(f, "    expected:")?;
                writeln!(f, "{}", render(expected).indent(8))?;
                writeln!(f, "    actual:")?;
                write!(f, "{}", render(actual).indent(8))?;
            }
            Reason::MissingKey => {
                write!(
                    f,
                    "{} at path \"{}\" is missing from actual",
                    render(expected),
                    self.path
                )?;
            }
            Reason::ExtraKey => {
                write!(
                    f,
                    "{} at path \"{}\" is not expected",
                    render(actual),
                    self.path
                )?;
            }
            Reason::MissingElement => {
                write!(
                    f,
                    "expected element {} at path \"{}\" has no match in actual",
                    render(expected),
                    self.path
                )?;
            }
            Reason::ExtraElement => {
                write!(
                    f,
                    "actual element {} at path \"{}\" has no match in expected",
                    render(actual),
                    self.path
                )?;
            }
        }

        Ok(())
    }
}

impl Serialize for Difference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Difference", 4)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("reason", &self.reason)?;
        state.serialize_field("actual", &self.actual.as_ref().map(ToString::to_string))?;
        state.serialize_field("expected", &self.expected.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

/// Every difference found by one comparison run, in traversal order.
///
/// An empty report means the values are equal under the rules used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DifferenceReport {
    differences: Vec<Difference>,
}

impl DifferenceReport {
    pub(crate) fn new(differences: Vec<Difference>) -> Self {
        Self { differences }
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Difference> {
        self.differences.iter()
    }

    /// Paths of all differences, in report order.
    pub fn paths(&self) -> Vec<&Path> {
        self.differences.iter().map(Difference::path).collect()
    }

    pub fn reasons(&self) -> Vec<Reason> {
        self.differences.iter().map(Difference::reason).collect()
    }
}

impl<'a> IntoIterator for &'a DifferenceReport {
    type Item = &'a Difference;
    type IntoIter = std::slice::Iter<'a, Difference>;

    fn into_iter(self) -> Self::IntoIter {
        self.differences.iter()
    }
}

impl fmt::Display for DifferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.differences.is_empty() {
            return write!(f, "no differences");
        }

        writeln!(f, "{} difference(s) found:", self.differences.len())?;
        for (idx, difference) in self.differences.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", difference.indent(2))?;
        }
        Ok(())
    }
}
