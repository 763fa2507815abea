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
use std::{cmp::Ordering, collections::BTreeSet};
use tracing::debug;

use crate::{
    diff::{self, DifferenceReport},
    error::CompareError,
    path::Path,
    strategy::{ComparisonStrategy, ValueComparator, ValueEquals},
    value::Value,
};

/// How elements of unordered collections are paired up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UnorderedMatching {
    /// Candidates are matched by a nested recursive comparison honoring every
    /// rule, custom comparators for the element path or type included.
    #[default]
    Recursive,
    /// Candidates are matched with the global leaf strategy only.
    LeafStrategy,
}

/// Custom comparison registered for a path or a type.
#[derive(Debug, Clone)]
pub enum Override {
    Comparator(ValueComparator),
    Equals(ValueEquals),
}

impl Override {
    pub(crate) fn are_equal(
        &self,
        actual: &Value,
        expected: &Value,
        path: &Path,
    ) -> Result<bool, CompareError> {
        let outcome = match self {
            Override::Comparator(comparator) => comparator
                .compare(actual, expected)
                .map(|ordering| ordering == Ordering::Equal),
            Override::Equals(equals) => equals.equals(actual, expected),
        };
        outcome.map_err(|e| CompareError::user(path, e))
    }
}

/// Configuration of a recursive comparison.
///
/// Built once with the consuming builder methods, then only read while
/// comparing; a rule set can be shared by concurrent comparisons.
///
/// Precedence for a location: a comparator registered for its path wins over
/// one registered for its type, which wins over the leaf [`ComparisonStrategy`].
///
/// # Examples
///
/// ```
/// use recursive_compare::{RuleSet, Value, Record};
///
/// let rules = RuleSet::new()
///     .ignore_fields(["id"])
///     .with_strict_type_checking(true);
///
/// let actual = Value::from(Record::new("Hobbit").with_field("id", 1).with_field("name", "Sam"));
/// let expected = Value::from(Record::new("Hobbit").with_field("id", 2).with_field("name", "Sam"));
/// assert!(rules.compare(&actual, &expected).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    ignored_paths: Vec<Path>,
    ignored_fields: BTreeSet<String>,
    ignored_field_patterns: Vec<Regex>,
    ignored_types: BTreeSet<String>,
    path_overrides: Vec<(Path, Override)>,
    type_overrides: Vec<(String, Override)>,
    strict_type_checking: bool,
    compatible_types: Vec<(String, String)>,
    empty_optional_as_null: bool,
    ignore_actual_null_fields: bool,
    ignore_expected_null_fields: bool,
    ignore_collection_order: bool,
    unordered_paths: Vec<Path>,
    strategy: ComparisonStrategy,
    unordered_matching: UnorderedMatching,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores fields (and map keys) with the given names at any depth.
    pub fn ignore_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn ignore_field(self, name: impl Into<String>) -> Self {
        self.ignore_fields([name.into()])
    }

    /// Ignores every location whose runtime type name is one of `types`.
    pub fn ignore_fields_of_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Ignores the given locations and everything below them; patterns may use wildcards.
    pub fn ignore_paths(mut self, paths: impl IntoIterator<Item = Path>) -> Self {
        self.ignored_paths.extend(paths);
        self
    }

    pub fn ignore_path(self, path: Path) -> Self {
        self.ignore_paths([path])
    }

    /// Ignores every location whose rendered path (`a.b[0].c`) matches `regex`.
    pub fn ignore_fields_matching(mut self, regex: Regex) -> Self {
        self.ignored_field_patterns.push(regex);
        self
    }

    pub fn ignore_actual_null_fields(mut self, ignore: bool) -> Self {
        self.ignore_actual_null_fields = ignore;
        self
    }

    pub fn ignore_expected_null_fields(mut self, ignore: bool) -> Self {
        self.ignore_expected_null_fields = ignore;
        self
    }

    /// Compares every sequence as an unordered collection.
    pub fn ignore_collection_order(mut self, ignore: bool) -> Self {
        self.ignore_collection_order = ignore;
        self
    }

    /// Compares the sequences at (or below) the given paths as unordered collections.
    pub fn ignore_collection_order_in_paths(
        mut self,
        paths: impl IntoIterator<Item = Path>,
    ) -> Self {
        self.unordered_paths.extend(paths);
        self
    }

    pub fn with_comparator_for_path(mut self, path: Path, comparator: ValueComparator) -> Self {
        self.path_overrides.push((path, Override::Comparator(comparator)));
        self
    }

    pub fn with_equals_for_path(mut self, path: Path, equals: ValueEquals) -> Self {
        self.path_overrides.push((path, Override::Equals(equals)));
        self
    }

    pub fn with_comparator_for_type(
        mut self,
        type_name: impl Into<String>,
        comparator: ValueComparator,
    ) -> Self {
        self.type_overrides
            .push((type_name.into(), Override::Comparator(comparator)));
        self
    }

    pub fn with_equals_for_type(
        mut self,
        type_name: impl Into<String>,
        equals: ValueEquals,
    ) -> Self {
        self.type_overrides
            .push((type_name.into(), Override::Equals(equals)));
        self
    }

    /// Requires actual and expected to share the same runtime type at every location.
    pub fn with_strict_type_checking(mut self, strict: bool) -> Self {
        self.strict_type_checking = strict;
        self
    }

    /// Accepts the two runtime types as equal under strict type checking.
    pub fn with_compatible_types(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.compatible_types.push((a.into(), b.into()));
        self
    }

    /// Treats an empty optional as equal to null.
    pub fn with_empty_optional_as_null(mut self, enabled: bool) -> Self {
        self.empty_optional_as_null = enabled;
        self
    }

    /// Leaf policy used where no custom comparison applies.
    pub fn with_strategy(mut self, strategy: ComparisonStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_unordered_matching(mut self, matching: UnorderedMatching) -> Self {
        self.unordered_matching = matching;
        self
    }

    pub fn strict_type_checking(&self) -> bool {
        self.strict_type_checking
    }

    pub fn strategy(&self) -> &ComparisonStrategy {
        &self.strategy
    }

    pub fn unordered_matching(&self) -> UnorderedMatching {
        self.unordered_matching
    }

    pub fn empty_optional_as_null(&self) -> bool {
        self.empty_optional_as_null
    }

    pub fn ignores_actual_null_fields(&self) -> bool {
        self.ignore_actual_null_fields
    }

    pub fn ignores_expected_null_fields(&self) -> bool {
        self.ignore_expected_null_fields
    }

    /// Compares `actual` against `expected` under these rules.
    pub fn compare(
        &self,
        actual: &Value,
        expected: &Value,
    ) -> Result<DifferenceReport, CompareError> {
        diff::compare(actual, expected, self)
    }

    /// Rejects self-contradictory configuration.
    pub fn validate(&self) -> Result<(), CompareError> {
        for (idx, (path, _)) in self.path_overrides.iter().enumerate() {
            if let Some((other, _)) = self.path_overrides[..idx]
                .iter()
                .find(|(other, _)| other.overlaps(path))
            {
                return Err(invalid(format!(
                    "custom comparisons registered for paths {} and {} overlap",
                    other, path
                )));
            }

            if self.ignored_paths.iter().any(|ignored| ignored.prefixes(path))
                || path.fields().any(|field| self.ignored_fields.contains(field))
                || self
                    .ignored_field_patterns
                    .iter()
                    .any(|regex| regex.is_match(&path.to_string()))
            {
                return Err(invalid(format!(
                    "custom comparison registered for ignored path {} would never run",
                    path
                )));
            }
        }

        for (idx, (type_name, _)) in self.type_overrides.iter().enumerate() {
            if self.type_overrides[..idx].iter().any(|(other, _)| other == type_name) {
                return Err(invalid(format!(
                    "more than one custom comparison registered for type {}",
                    type_name
                )));
            }

            if self.ignored_types.contains(type_name) {
                return Err(invalid(format!(
                    "custom comparison registered for ignored type {} would never run",
                    type_name
                )));
            }
        }

        Ok(())
    }

    /// Whether the location is excluded from the comparison. Absent sides are `None`.
    pub(crate) fn is_ignored(
        &self,
        path: &Path,
        actual: Option<&Value>,
        expected: Option<&Value>,
    ) -> bool {
        if path.is_root() {
            return false;
        }

        if self.ignored_paths.iter().any(|ignored| ignored.prefixes(path)) {
            return true;
        }

        if path.fields().any(|field| self.ignored_fields.contains(field)) {
            return true;
        }

        if !self.ignored_field_patterns.is_empty() {
            let rendered = path.to_string();
            if self
                .ignored_field_patterns
                .iter()
                .any(|regex| regex.is_match(&rendered))
            {
                return true;
            }
        }

        if !self.ignored_types.is_empty() {
            let typed = match (actual, expected) {
                (Some(value), _) if !value.is_null() => Some(value),
                (_, Some(value)) if !value.is_null() => Some(value),
                _ => None,
            };
            if let Some(value) = typed {
                return self.ignored_types.contains(&*value.type_name());
            }
        }

        false
    }

    /// Custom comparison for the location: by path first, then by type.
    pub(crate) fn override_for(
        &self,
        path: &Path,
        actual: &Value,
        expected: &Value,
    ) -> Option<&Override> {
        if let Some((_, found)) = self
            .path_overrides
            .iter()
            .find(|(pattern, _)| path.matches(pattern))
        {
            return Some(found);
        }

        if self.type_overrides.is_empty() {
            return None;
        }

        let actual_type = actual.type_name();
        let expected_type = expected.type_name();
        self.type_overrides
            .iter()
            .find(|(type_name, _)| *type_name == actual_type)
            .or_else(|| {
                self.type_overrides
                    .iter()
                    .find(|(type_name, _)| *type_name == expected_type)
            })
            .map(|(_, found)| found)
    }

    pub(crate) fn types_compatible(&self, actual: &str, expected: &str) -> bool {
        actual == expected
            || self
                .compatible_types
                .iter()
                .any(|(a, b)| (a == actual && b == expected) || (a == expected && b == actual))
    }

    pub(crate) fn ignores_order_at(&self, path: &Path) -> bool {
        self.ignore_collection_order
            || self
                .unordered_paths
                .iter()
                .any(|pattern| pattern.prefixes(path))
    }
}

fn invalid(message: String) -> CompareError {
    debug!(%message, "rejecting rule set");
    CompareError::Configuration(message)
}
