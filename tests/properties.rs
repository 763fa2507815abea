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

//! Property tests for the comparison engine over small generated value trees.

use std::collections::BTreeMap;

use proptest::prelude::*;
use recursive_compare::{compare, Path, Reason, Record, RuleSet, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::Int),
        "[a-c]{0,2}".prop_map(Value::Str),
    ]
}

/// Ordered containers only; field and key names come from a tiny alphabet so
/// that generated trees share names.
fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(("[a-c]", inner.clone()), 0..4).prop_map(Value::map),
            prop::collection::vec(("[a-c]", inner), 0..4).prop_map(|fields| {
                fields
                    .into_iter()
                    .fold(Record::new("Node"), |record, (name, value)| {
                        record.with_field(name, value)
                    })
                    .into()
            }),
        ]
    })
}

proptest! {
    #[test]
    fn value_equals_its_clone(value in tree()) {
        let report = compare(&value, &value.clone(), &RuleSet::new()).unwrap();
        prop_assert!(report.is_empty(), "{}", report);
    }

    #[test]
    fn comparison_is_repeatable(actual in tree(), expected in tree()) {
        let rules = RuleSet::new();
        let first = compare(&actual, &expected, &rules).unwrap();
        let second = compare(&actual, &expected, &rules).unwrap();
        prop_assert_eq!(first.paths(), second.paths());
        prop_assert_eq!(first.reasons(), second.reasons());
    }

    #[test]
    fn equality_is_symmetric(actual in tree(), expected in tree()) {
        let rules = RuleSet::new();
        prop_assert_eq!(
            compare(&actual, &expected, &rules).unwrap().is_empty(),
            compare(&expected, &actual, &rules).unwrap().is_empty()
        );
    }

    #[test]
    fn ignoring_a_field_drops_exactly_its_differences(actual in tree(), expected in tree()) {
        let full = compare(&actual, &expected, &RuleSet::new()).unwrap();
        let ignored = compare(&actual, &expected, &RuleSet::new().ignore_field("a")).unwrap();

        let kept: Vec<&Path> = full
            .iter()
            .map(|difference| difference.path())
            .filter(|path| !path.fields().any(|field| field == "a"))
            .collect();
        prop_assert_eq!(ignored.paths(), kept);
    }

    #[test]
    fn single_changed_field_is_reported_alone(
        fields in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 1..8),
        pick in any::<prop::sample::Index>(),
        delta in 1i64..100,
    ) {
        let build = |fields: &BTreeMap<String, i64>| -> Value {
            fields
                .iter()
                .fold(Record::new("Row"), |record, (name, value)| {
                    record.with_field(name.as_str(), *value)
                })
                .into()
        };

        let mut changed = fields.clone();
        let name = pick.get(&fields.keys().cloned().collect::<Vec<_>>()).clone();
        if let Some(value) = changed.get_mut(&name) {
            *value = value.wrapping_add(delta);
        }

        let report = compare(&build(&changed), &build(&fields), &RuleSet::new()).unwrap();
        let expected = Path::field(name);
        prop_assert_eq!(report.paths(), vec![&expected]);
        prop_assert_eq!(report.reasons(), vec![Reason::ValueMismatch]);
    }
}
