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

mod node;
mod report;

pub use report::{Difference, DifferenceReport, Reason};

use node::NodeKind;
use std::cell::Ref;
use tracing::{debug, trace};

use crate::{
    error::CompareError,
    path::Path,
    rules::{RuleSet, UnorderedMatching},
    strategy::ComparisonStrategy,
    tracker::VisitedPairs,
    value::{Record, Shared, Value},
};

/// Walks `actual` and `expected` in lockstep and collects every difference.
///
/// The rule set is validated first; a self-contradictory one is rejected with
/// [`CompareError::Configuration`] before anything is compared. Errors raised
/// by custom comparators abort the run.
pub fn compare(
    actual: &Value,
    expected: &Value,
    rules: &RuleSet,
) -> Result<DifferenceReport, CompareError> {
    rules.validate()?;

    debug!(
        strict_types = rules.strict_type_checking(),
        standard_strategy = rules.strategy().is_standard(),
        "starting recursive comparison"
    );

    let mut folder = DiffFolder {
        rules,
        visited: VisitedPairs::new(),
        acc: vec![],
    };
    folder.fold(actual, expected, &Path::Root)?;

    debug!(differences = folder.acc.len(), "recursive comparison finished");
    Ok(DifferenceReport::new(folder.acc))
}

#[derive(Debug)]
struct DiffFolder<'r> {
    rules: &'r RuleSet,
    visited: VisitedPairs,
    acc: Vec<Difference>,
}

fn borrow<'s>(shared: &'s Shared, path: &Path) -> Result<Ref<'s, Value>, CompareError> {
    shared
        .try_get()
        .map_err(|_| CompareError::SharedNodeBorrowed { path: path.clone() })
}

fn key_name(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<'r> DiffFolder<'r> {
    fn push(
        &mut self,
        path: &Path,
        actual: Option<&Value>,
        expected: Option<&Value>,
        reason: Reason,
    ) {
        trace!(%path, %reason, "difference found");
        self.acc.push(Difference {
            path: path.clone(),
            actual: actual.cloned(),
            expected: expected.cloned(),
            reason,
        });
    }

    fn is_null(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Optional(None) => self.rules.empty_optional_as_null(),
            Value::Ref(shared) => shared.try_get().is_ok_and(|inner| self.is_null(&inner)),
            _ => false,
        }
    }

    /// Whether a key present on one side only stays out of the report.
    fn skips_one_sided(
        &self,
        path: &Path,
        actual: Option<&Value>,
        expected: Option<&Value>,
    ) -> bool {
        if self.rules.is_ignored(path, actual, expected) {
            return true;
        }

        let null = |value: Option<&Value>| value.is_some_and(|value| self.is_null(value));
        (null(actual) && self.rules.ignores_actual_null_fields())
            || (null(expected) && self.rules.ignores_expected_null_fields())
    }

    fn fold(&mut self, actual: &Value, expected: &Value, path: &Path) -> Result<(), CompareError> {
        if let Value::Ref(shared) = actual {
            let actual = borrow(shared, path)?;
            return self.fold(&actual, expected, path);
        }
        if let Value::Ref(shared) = expected {
            let expected = borrow(shared, path)?;
            return self.fold(actual, &expected, path);
        }

        if self.rules.is_ignored(path, Some(actual), Some(expected)) {
            trace!(%path, "location ignored");
            return Ok(());
        }

        let actual_null = self.is_null(actual);
        let expected_null = self.is_null(expected);
        if !path.is_root()
            && ((actual_null && self.rules.ignores_actual_null_fields())
                || (expected_null && self.rules.ignores_expected_null_fields()))
        {
            return Ok(());
        }
        match (actual_null, expected_null) {
            (true, true) => return Ok(()),
            (true, false) | (false, true) => {
                self.push(path, Some(actual), Some(expected), Reason::ValueMismatch);
                return Ok(());
            }
            (false, false) => {}
        }

        let ignore_order = self.rules.ignores_order_at(path);
        let actual_kind = NodeKind::of(actual, ignore_order);
        let expected_kind = NodeKind::of(expected, ignore_order);
        let composite = actual_kind.is_composite() && expected_kind.is_composite();

        if composite && self.visited.is_active(actual, expected) {
            trace!(%path, "cycle closed");
            return Ok(());
        }

        let rules = self.rules;
        if let Some(custom) = rules.override_for(path, actual, expected) {
            trace!(%path, "custom comparison");
            if !custom.are_equal(actual, expected, path)? {
                self.push(path, Some(actual), Some(expected), Reason::ValueMismatch);
            }
            return Ok(());
        }

        if self.rules.strict_type_checking()
            && !self
                .rules
                .types_compatible(&actual.type_name(), &expected.type_name())
        {
            self.push(path, Some(actual), Some(expected), Reason::TypeMismatch);
            return Ok(());
        }

        if !composite {
            return match (actual_kind, expected_kind) {
                (NodeKind::Scalar, NodeKind::Scalar) => self.on_scalar(actual, expected, path),
                _ => {
                    self.push(path, Some(actual), Some(expected), Reason::TypeMismatch);
                    Ok(())
                }
            };
        }

        if !self.visited.enter(actual, expected) {
            return Ok(());
        }
        let result = self.on_composite(actual_kind, expected_kind, actual, expected, path);
        self.visited.leave(actual, expected);
        result
    }

    fn on_composite(
        &mut self,
        actual_kind: NodeKind<'_>,
        expected_kind: NodeKind<'_>,
        actual: &Value,
        expected: &Value,
        path: &Path,
    ) -> Result<(), CompareError> {
        match (actual_kind, expected_kind) {
            (NodeKind::Sequence(a), NodeKind::Sequence(e)) => {
                self.on_sequence(a, e, actual, expected, path)
            }
            (NodeKind::Unordered(a), NodeKind::Unordered(e)) => self.on_unordered(a, e, path),
            (NodeKind::Map(a), NodeKind::Map(e)) => self.on_map(a, e, path),
            (NodeKind::Record(a), NodeKind::Record(e)) => self.on_record(a, e, path),
            (NodeKind::Optional(a), NodeKind::Optional(e)) => match (a, e) {
                (Some(a), Some(e)) => self.fold(a, e, path),
                (None, None) => Ok(()),
                _ => {
                    self.push(path, Some(actual), Some(expected), Reason::ValueMismatch);
                    Ok(())
                }
            },
            _ => {
                self.push(path, Some(actual), Some(expected), Reason::TypeMismatch);
                Ok(())
            }
        }
    }

    fn on_scalar(
        &mut self,
        actual: &Value,
        expected: &Value,
        path: &Path,
    ) -> Result<(), CompareError> {
        if !self.rules.strategy().equal_at(actual, expected, path)? {
            self.push(path, Some(actual), Some(expected), Reason::ValueMismatch);
        }
        Ok(())
    }

    fn on_sequence(
        &mut self,
        actual_items: &[Value],
        expected_items: &[Value],
        actual: &Value,
        expected: &Value,
        path: &Path,
    ) -> Result<(), CompareError> {
        if actual_items.len() != expected_items.len() {
            self.push(path, Some(actual), Some(expected), Reason::SizeMismatch);
        }

        for (idx, (actual, expected)) in actual_items.iter().zip(expected_items).enumerate() {
            self.fold(actual, expected, &path.with_index(idx))?;
        }
        Ok(())
    }

    /// Multiset comparison: every expected element consumes one matching actual element.
    fn on_unordered(
        &mut self,
        actual_items: &[Value],
        expected_items: &[Value],
        path: &Path,
    ) -> Result<(), CompareError> {
        let mut unmatched: Vec<usize> = (0..actual_items.len()).collect();
        let mut missing = vec![];

        for (expected_idx, expected) in expected_items.iter().enumerate() {
            let mut found = None;
            for (pos, &actual_idx) in unmatched.iter().enumerate() {
                let candidate = &actual_items[actual_idx];
                if self.elements_match(candidate, expected, &path.with_index(actual_idx))? {
                    found = Some(pos);
                    break;
                }
            }

            match found {
                Some(pos) => {
                    unmatched.remove(pos);
                }
                None => missing.push(expected_idx),
            }
        }

        for actual_idx in unmatched {
            let child = path.with_index(actual_idx);
            let actual = &actual_items[actual_idx];
            if !self.rules.is_ignored(&child, Some(actual), None) {
                self.push(&child, Some(actual), None, Reason::ExtraElement);
            }
        }

        for expected_idx in missing {
            let child = path.with_index(expected_idx);
            let expected = &expected_items[expected_idx];
            if !self.rules.is_ignored(&child, None, Some(expected)) {
                self.push(&child, None, Some(expected), Reason::MissingElement);
            }
        }

        Ok(())
    }

    fn elements_match(
        &mut self,
        actual: &Value,
        expected: &Value,
        path: &Path,
    ) -> Result<bool, CompareError> {
        match self.rules.unordered_matching() {
            UnorderedMatching::LeafStrategy => {
                self.rules.strategy().equal_at(actual, expected, path)
            }
            UnorderedMatching::Recursive => {
                let found = std::mem::take(&mut self.acc);
                let outcome = self.fold(actual, expected, path);
                let candidate = std::mem::replace(&mut self.acc, found);
                outcome.map(|()| candidate.is_empty())
            }
        }
    }

    fn on_map(
        &mut self,
        actual_entries: &[(Value, Value)],
        expected_entries: &[(Value, Value)],
        path: &Path,
    ) -> Result<(), CompareError> {
        let mut matched = vec![false; actual_entries.len()];
        let mut shared_keys = Vec::with_capacity(expected_entries.len());

        for (key, expected) in expected_entries {
            let mut found = None;
            for (idx, (candidate, _)) in actual_entries.iter().enumerate() {
                if !matched[idx] && ComparisonStrategy::Standard.equal_at(candidate, key, path)? {
                    found = Some(idx);
                    break;
                }
            }

            let child = path.with_field(key_name(key));
            match found {
                Some(idx) => {
                    matched[idx] = true;
                    shared_keys.push((idx, expected, child));
                }
                None => {
                    if !self.skips_one_sided(&child, None, Some(expected)) {
                        self.push(&child, None, Some(expected), Reason::MissingKey);
                    }
                }
            }
        }

        for (idx, (key, actual)) in actual_entries.iter().enumerate() {
            let child = path.with_field(key_name(key));
            if !matched[idx] && !self.skips_one_sided(&child, Some(actual), None) {
                self.push(&child, Some(actual), None, Reason::ExtraKey);
            }
        }

        for (idx, expected, child) in shared_keys {
            self.fold(&actual_entries[idx].1, expected, &child)?;
        }
        Ok(())
    }

    fn on_record(
        &mut self,
        actual: &Record,
        expected: &Record,
        path: &Path,
    ) -> Result<(), CompareError> {
        for (name, expected_field) in expected.fields() {
            let child = path.with_field(name.as_str());
            match actual.field(name) {
                Some(actual_field) => self.fold(actual_field, expected_field, &child)?,
                None => {
                    if !self.skips_one_sided(&child, None, Some(expected_field)) {
                        self.push(&child, None, Some(expected_field), Reason::MissingKey);
                    }
                }
            }
        }

        for (name, actual_field) in actual.fields() {
            if expected.field(name).is_some() {
                continue;
            }
            let child = path.with_field(name.as_str());
            if !self.skips_one_sided(&child, Some(actual_field), None) {
                self.push(&child, Some(actual_field), None, Reason::ExtraKey);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::strategy::{ValueComparator, ValueEquals};
    use serde_json::json;

    fn diff(
        actual: serde_json::Value,
        expected: serde_json::Value,
        rules: &RuleSet,
    ) -> DifferenceReport {
        compare(&Value::from(actual), &Value::from(expected), rules).unwrap()
    }

    fn path(text: &str) -> Path {
        text.parse().unwrap()
    }

    #[test]
    fn test_diffing_leaf_json() {
        let rules = RuleSet::new();
        assert!(diff(json!(null), json!(null), &rules).is_empty());
        assert!(diff(json!(false), json!(false), &rules).is_empty());
        assert!(diff(json!(true), json!(true), &rules).is_empty());
        assert_eq!(diff(json!(false), json!(true), &rules).len(), 1);
        assert!(diff(json!(1), json!(1), &rules).is_empty());
        assert_eq!(diff(json!(2), json!(1), &rules).len(), 1);
        assert!(diff(json!(1.0), json!(1.0), &rules).is_empty());
        assert_eq!(diff(json!(1), json!(1.0), &rules).len(), 1);
        assert_eq!(diff(json!("a"), json!(null), &rules).reasons(), vec![Reason::ValueMismatch]);
    }

    #[test]
    fn test_diffing_array() {
        let rules = RuleSet::new();
        assert!(diff(json!([]), json!([]), &rules).is_empty());
        assert!(diff(json!([1, 2]), json!([1, 2]), &rules).is_empty());

        let report = diff(json!([1]), json!([]), &rules);
        assert_eq!(report.reasons(), vec![Reason::SizeMismatch]);
        assert_eq!(report.paths(), vec![&Path::Root]);

        let report = diff(json!([1, 3]), json!([1, 2]), &rules);
        assert_eq!(report.paths(), vec![&path("[1]")]);

        let report = diff(json!(1), json!([1]), &rules);
        assert_eq!(report.reasons(), vec![Reason::TypeMismatch]);

        let report = diff(json!([1]), json!({ "a": 1 }), &rules);
        assert_eq!(report.reasons(), vec![Reason::TypeMismatch]);
    }

    #[test]
    fn test_array_size_and_prefix() {
        let rules = RuleSet::new();
        let report = diff(json!([1, 9, 3]), json!([1, 2]), &rules);
        assert_eq!(report.reasons(), vec![Reason::SizeMismatch, Reason::ValueMismatch]);
        assert_eq!(report.paths(), vec![&Path::Root, &path("[1]")]);
    }

    #[test]
    fn test_object() {
        let rules = RuleSet::new();
        assert!(diff(json!({}), json!({}), &rules).is_empty());
        assert!(diff(json!({ "a": 1 }), json!({ "a": 1 }), &rules).is_empty());

        let report = diff(json!({ "a": 1, "b": 123 }), json!({ "a": 1 }), &rules);
        assert_eq!(report.reasons(), vec![Reason::ExtraKey]);
        assert_eq!(report.paths(), vec![&path("b")]);

        let report = diff(json!({ "a": 1 }), json!({ "b": 1 }), &rules);
        assert_eq!(report.reasons(), vec![Reason::MissingKey, Reason::ExtraKey]);
        assert_eq!(report.paths(), vec![&path("b"), &path("a")]);

        let report = diff(json!({ "a": { "b": true } }), json!({ "a": {} }), &rules);
        assert_eq!(report.paths(), vec![&path("a.b")]);
    }

    #[test]
    fn test_object_deep_path() {
        let lhs = json!({ "a": { "b": [{"c": 0}, { "c": 1 }] } });
        let rhs = json!({ "a": { "b": [{"c": 0}, { "c": 2 }] } });
        let rules = RuleSet::new().ignore_path(path("a.b[*].c"));
        assert!(diff(lhs, rhs, &rules).is_empty());

        let lhs = json!({ "a": { "b": { "d": { "e": 3 } } } });
        let rhs = json!({ "a": { "b": { "d": { "e": 4 } } } });
        let rules = RuleSet::new().ignore_path(path("$.a.b.d.e"));
        assert!(diff(lhs, rhs, &rules).is_empty());

        let lhs = json!({ "a": { "b": [{ "d": [1, 2, 3] }] } });
        let rhs = json!({ "a": { "b": [{ "d": [1, 2, 4] }] } });
        let rules = RuleSet::new().ignore_path(path("a.b[*].d[*]"));
        assert!(diff(lhs, rhs, &rules).is_empty());

        let lhs = json!({ "a": { "x": 1, "y": 2, "z": 3 } });
        let rhs = json!({ "a": { "x": 2, "y": 3, "z": 3 } });
        let rules = RuleSet::new().ignore_paths([path("a.x"), path("a.y")]);
        assert!(diff(lhs, rhs, &rules).is_empty());

        let lhs = json!({ "a": { "b": 1, "c": 2 } });
        let rhs = json!({ "a": { "b": 1, "c": 3 } });
        let rules = RuleSet::new().ignore_path(path("a.d"));
        assert_eq!(diff(lhs, rhs, &rules).paths(), vec![&path("a.c")]);
    }

    #[test]
    fn test_ignored_missing_key() {
        let rules = RuleSet::new().ignore_field("b");
        assert!(diff(json!({ "a": 1 }), json!({ "a": 1, "b": 2 }), &rules).is_empty());
        assert!(diff(json!({ "a": 1, "b": 2 }), json!({ "a": 1 }), &rules).is_empty());
    }

    #[test]
    fn test_unordered_collections() {
        let rules = RuleSet::new();
        fn set(items: &[i64]) -> Value {
            Value::set(items.iter().copied())
        }

        let report = compare(&set(&[1, 2, 2]), &set(&[1, 2]), &rules).unwrap();
        assert_eq!(report.reasons(), vec![Reason::ExtraElement]);
        assert_eq!(report.paths(), vec![&path("[2]")]);

        let report = compare(&set(&[1, 2]), &set(&[1, 2, 2]), &rules).unwrap();
        assert_eq!(report.reasons(), vec![Reason::MissingElement]);
        assert_eq!(report.paths(), vec![&path("[2]")]);

        assert!(compare(&set(&[3, 1, 2]), &set(&[1, 2, 3]), &rules).unwrap().is_empty());
    }

    #[test]
    fn test_ignore_collection_order() {
        let rules = RuleSet::new().ignore_collection_order_in_paths([path("tags")]);
        let report = diff(
            json!({ "tags": ["b", "a"], "ids": [2, 1] }),
            json!({ "tags": ["a", "b"], "ids": [1, 2] }),
            &rules,
        );
        assert_eq!(report.paths(), vec![&path("ids[0]"), &path("ids[1]")]);

        let rules = RuleSet::new().ignore_collection_order(true);
        assert!(diff(json!([[2, 1], [3]]), json!([[3], [1, 2]]), &rules).is_empty());
    }

    #[test]
    fn test_custom_comparison_by_path_and_type() {
        let close_enough = ValueComparator::new(|a, b| match (a, b) {
            (Value::Float(a), Value::Float(b)) if (a - b).abs() < 0.01 => {
                Ok(std::cmp::Ordering::Equal)
            }
            (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            _ => Err("not a float".into()),
        });
        let rules = RuleSet::new().with_comparator_for_path(path("price"), close_enough);
        assert!(diff(json!({ "price": 1.001 }), json!({ "price": 1.0 }), &rules).is_empty());
        assert_eq!(
            diff(json!({ "price": 1.5 }), json!({ "price": 1.0 }), &rules).paths(),
            vec![&path("price")]
        );

        let rules =
            RuleSet::new().with_equals_for_type("String", ValueEquals::infallible(|_, _| true));
        assert!(diff(json!({ "name": "x" }), json!({ "name": "y" }), &rules).is_empty());
    }

    #[test]
    fn test_custom_comparison_failure_aborts() {
        let failing = ValueEquals::new(|_, _| Err("comparator exploded".into()));
        let rules = RuleSet::new().with_equals_for_path(path("a.b"), failing);
        let err = compare(
            &Value::from(json!({ "a": { "b": 1 } })),
            &Value::from(json!({ "a": { "b": 1 } })),
            &rules,
        )
        .unwrap_err();

        match err {
            CompareError::UserComparator { path: at, source } => {
                assert_eq!(at, path("a.b"));
                assert_eq!(source.to_string(), "comparator exploded");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_strict_type_checking() {
        let actual = Value::from(Record::new("Person").with_field("name", "Sam"));
        let expected = Value::from(Record::new("PersonDto").with_field("name", "Sam"));

        assert!(compare(&actual, &expected, &RuleSet::new()).unwrap().is_empty());

        let strict = RuleSet::new().with_strict_type_checking(true);
        let report = compare(&actual, &expected, &strict).unwrap();
        assert_eq!(report.reasons(), vec![Reason::TypeMismatch]);

        let compatible = strict.with_compatible_types("Person", "PersonDto");
        assert!(compare(&actual, &expected, &compatible).unwrap().is_empty());
    }

    #[test]
    fn test_optional_handling() {
        let rules = RuleSet::new();
        assert!(compare(&Value::some(1), &Value::some(1), &rules).unwrap().is_empty());
        assert!(compare(&Value::none(), &Value::none(), &rules).unwrap().is_empty());
        assert_eq!(
            compare(&Value::some(1), &Value::some(2), &rules).unwrap().reasons(),
            vec![Reason::ValueMismatch]
        );
        assert_eq!(
            compare(&Value::none(), &Value::some(2), &rules).unwrap().reasons(),
            vec![Reason::ValueMismatch]
        );
        assert_eq!(
            compare(&Value::none(), &Value::Null, &rules).unwrap().reasons(),
            vec![Reason::ValueMismatch]
        );

        let rules = RuleSet::new().with_empty_optional_as_null(true);
        assert!(compare(&Value::none(), &Value::Null, &rules).unwrap().is_empty());
    }

    #[test]
    fn test_null_fields_ignored() {
        let rules = RuleSet::new().ignore_actual_null_fields(true);
        assert!(diff(json!({ "a": null, "b": 1 }), json!({ "a": 5, "b": 1 }), &rules).is_empty());
        assert_eq!(diff(json!({ "a": 5 }), json!({ "a": null }), &rules).len(), 1);

        let rules = RuleSet::new().ignore_expected_null_fields(true);
        assert!(diff(json!({ "a": 5 }), json!({ "a": null }), &rules).is_empty());
    }

    #[test]
    fn test_null_fields_ignored_when_absent_on_other_side() {
        let short = Value::from(Record::new("R").with_field("a", 1));
        let long = Value::from(
            Record::new("R")
                .with_field("a", 1)
                .with_field("b", Value::Null),
        );

        let rules = RuleSet::new().ignore_expected_null_fields(true);
        assert!(compare(&short, &long, &rules).unwrap().is_empty());
        let report = compare(&long, &short, &rules).unwrap();
        assert_eq!(report.reasons(), vec![Reason::ExtraKey]);

        let rules = RuleSet::new().ignore_actual_null_fields(true);
        assert!(compare(&long, &short, &rules).unwrap().is_empty());
        let report = compare(&short, &long, &rules).unwrap();
        assert_eq!(report.reasons(), vec![Reason::MissingKey]);

        let rules = RuleSet::new().ignore_actual_null_fields(true);
        assert!(diff(json!({ "a": 1, "b": null }), json!({ "a": 1 }), &rules).is_empty());
        assert_eq!(
            diff(json!({ "a": 1, "b": 2 }), json!({ "a": 1 }), &rules).reasons(),
            vec![Reason::ExtraKey]
        );

        let rules = RuleSet::new().ignore_expected_null_fields(true);
        assert!(diff(json!({ "a": 1 }), json!({ "a": 1, "b": null }), &rules).is_empty());

        let rules = RuleSet::new()
            .ignore_expected_null_fields(true)
            .with_empty_optional_as_null(true);
        let with_none = Value::from(
            Record::new("R")
                .with_field("a", 1)
                .with_field("b", Value::none()),
        );
        assert!(compare(&short, &with_none, &rules).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_rule_set_rejected_before_traversal() {
        let rules = RuleSet::new()
            .ignore_path(path("a"))
            .with_equals_for_path(path("a"), ValueEquals::infallible(|_, _| true));
        let err = compare(&Value::Int(1), &Value::Int(1), &rules).unwrap_err();
        assert!(matches!(err, CompareError::Configuration(_)));
    }

    #[test]
    fn test_borrowed_shared_node() {
        let shared = Shared::new(Value::Int(1));
        let value = Value::Ref(shared.clone());
        let _guard = shared.get_mut();
        let err = compare(&value, &Value::Int(1), &RuleSet::new()).unwrap_err();
        assert!(matches!(err, CompareError::SharedNodeBorrowed { .. }));
    }
}
