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

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod diff;
mod error;
mod misc;
mod path;
mod rules;
mod strategy;
mod tracker;
mod value;

pub use crate::{
    diff::{compare, Difference, DifferenceReport, Reason},
    error::{BoxError, CompareError, PathError},
    path::{Key, Path},
    rules::{Override, RuleSet, UnorderedMatching},
    strategy::{ComparisonStrategy, ValueComparator, ValueEquals},
    tracker::VisitedPairs,
    value::{Record, Shared, Value},
};

/// Structural equality under the default rules.
///
/// Cyclic graphs terminate. A comparison that cannot complete counts as not
/// equal.
///
/// # Examples
///
/// ```
/// use recursive_compare::{are_equal, Record, Value};
///
/// let a = Value::from(Record::new("Point").with_field("x", 1).with_field("y", 2));
/// let b = Value::from(Record::new("Point").with_field("x", 1).with_field("y", 2));
/// assert!(are_equal(&a, &b));
/// assert!(!are_equal(&a, &Value::Int(1)));
/// ```
pub fn are_equal(actual: &Value, expected: &Value) -> bool {
    compare(actual, expected, &RuleSet::default())
        .map(|report| report.is_empty())
        .unwrap_or(false)
}
