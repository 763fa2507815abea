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

use std::{cmp::Ordering, fmt, sync::Arc};

use crate::{
    error::{BoxError, CompareError},
    path::Path,
    rules::RuleSet,
    value::Value,
};

type CompareFn = dyn Fn(&Value, &Value) -> Result<Ordering, BoxError> + Send + Sync;
type EqualsFn = dyn Fn(&Value, &Value) -> Result<bool, BoxError> + Send + Sync;

/// Caller-supplied three-way comparator.
///
/// # Examples
///
/// ```
/// use recursive_compare::{ValueComparator, Value};
/// use std::cmp::Ordering;
///
/// let by_length = ValueComparator::infallible(|a, b| {
///     a.to_string().len().cmp(&b.to_string().len())
/// });
/// assert_eq!(
///     by_length.compare(&Value::from("ab"), &Value::from("cd")).unwrap(),
///     Ordering::Equal
/// );
/// ```
#[derive(Clone)]
pub struct ValueComparator(Arc<CompareFn>);

impl ValueComparator {
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Ordering, BoxError> + Send + Sync + 'static,
    {
        ValueComparator(Arc::new(compare))
    }

    pub fn infallible<F>(compare: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        ValueComparator(Arc::new(move |a, b| Ok(compare(a, b))))
    }

    /// Orders strings ignoring case; any other operand is an error.
    pub fn case_insensitive() -> Self {
        ValueComparator::new(|a, b| match (a, b) {
            (Value::Str(a), Value::Str(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
            _ => Err(format!("case insensitive comparator cannot compare {} and {}", a, b).into()),
        })
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Result<Ordering, BoxError> {
        (self.0)(a, b)
    }
}

impl fmt::Debug for ValueComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueComparator")
    }
}

/// Caller-supplied equality function.
#[derive(Clone)]
pub struct ValueEquals(Arc<EqualsFn>);

impl ValueEquals {
    pub fn new<F>(equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        ValueEquals(Arc::new(equals))
    }

    pub fn infallible<F>(equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        ValueEquals(Arc::new(move |a, b| Ok(equals(a, b))))
    }

    pub fn equals(&self, a: &Value, b: &Value) -> Result<bool, BoxError> {
        (self.0)(a, b)
    }
}

impl fmt::Debug for ValueEquals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueEquals")
    }
}

/// Leaf-level equality and ordering policy.
///
/// `Standard` relies on the values themselves: scalars by value, composites
/// structurally. `Comparator` defines both equality and ordering through a
/// single caller-supplied comparator, equal meaning [`Ordering::Equal`].
#[derive(Debug, Clone, Default)]
pub enum ComparisonStrategy {
    #[default]
    Standard,
    Comparator(ValueComparator),
}

impl ComparisonStrategy {
    pub fn is_standard(&self) -> bool {
        matches!(self, ComparisonStrategy::Standard)
    }

    pub fn are_equal(&self, actual: &Value, other: &Value) -> Result<bool, CompareError> {
        self.equal_at(actual, other, &Path::Root)
    }

    pub(crate) fn equal_at(
        &self,
        actual: &Value,
        other: &Value,
        path: &Path,
    ) -> Result<bool, CompareError> {
        match self {
            ComparisonStrategy::Standard => standard_equal(actual, other),
            ComparisonStrategy::Comparator(comparator) => {
                match (actual.is_null(), other.is_null()) {
                    (true, true) => Ok(true),
                    (true, false) | (false, true) => Ok(false),
                    (false, false) => comparator
                        .compare(actual, other)
                        .map(|ordering| ordering == Ordering::Equal)
                        .map_err(|e| CompareError::user(path, e)),
                }
            }
        }
    }

    fn order(&self, actual: &Value, other: &Value) -> Result<Ordering, CompareError> {
        match self {
            ComparisonStrategy::Standard => natural_order(actual, other),
            ComparisonStrategy::Comparator(comparator) => comparator
                .compare(actual, other)
                .map_err(|e| CompareError::user(&Path::Root, e)),
        }
    }

    pub fn is_greater_than(&self, actual: &Value, other: &Value) -> Result<bool, CompareError> {
        Ok(self.order(actual, other)? == Ordering::Greater)
    }

    pub fn is_less_than(&self, actual: &Value, other: &Value) -> Result<bool, CompareError> {
        Ok(self.order(actual, other)? == Ordering::Less)
    }

    pub fn is_greater_than_or_equal_to(
        &self,
        actual: &Value,
        other: &Value,
    ) -> Result<bool, CompareError> {
        Ok(self.order(actual, other)? != Ordering::Less)
    }

    pub fn is_less_than_or_equal_to(
        &self,
        actual: &Value,
        other: &Value,
    ) -> Result<bool, CompareError> {
        Ok(self.order(actual, other)? != Ordering::Greater)
    }

    pub fn contains(&self, sequence: &[Value], value: &Value) -> Result<bool, CompareError> {
        for item in sequence {
            if self.are_equal(item, value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Removes the first element equal to `value`; returns whether one was found.
    pub fn remove_first_equal(
        &self,
        sequence: &mut Vec<Value>,
        value: &Value,
    ) -> Result<bool, CompareError> {
        for idx in 0..sequence.len() {
            if self.are_equal(&sequence[idx], value)? {
                sequence.remove(idx);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Removes every element equal to `value`; returns how many were removed.
    pub fn remove_all_equal(
        &self,
        sequence: &mut Vec<Value>,
        value: &Value,
    ) -> Result<usize, CompareError> {
        // the sequence is only touched once every comparison succeeded
        let keep = sequence
            .iter()
            .map(|item| self.are_equal(item, value).map(|equal| !equal))
            .collect::<Result<Vec<_>, _>>()?;

        let before = sequence.len();
        let mut keep = keep.into_iter();
        sequence.retain(|_| keep.next().unwrap_or(true));
        Ok(before - sequence.len())
    }

    /// Elements occurring more than once, each reported once, in order of first occurrence.
    pub fn duplicates(&self, sequence: &[Value]) -> Result<Vec<Value>, CompareError> {
        let mut duplicates: Vec<Value> = vec![];
        for (idx, item) in sequence.iter().enumerate() {
            if self.contains(&duplicates, item)? {
                continue;
            }
            if self.contains(&sequence[idx + 1..], item)? {
                duplicates.push(item.clone());
            }
        }
        Ok(duplicates)
    }

    pub fn string_starts_with(&self, string: &str, prefix: &str) -> Result<bool, CompareError> {
        match self {
            ComparisonStrategy::Standard => Ok(string.starts_with(prefix)),
            ComparisonStrategy::Comparator(_) => {
                let chars = string.chars().collect::<Vec<_>>();
                let len = prefix.chars().count();
                if len > chars.len() {
                    return Ok(false);
                }
                self.str_equal(&chars[..len], prefix)
            }
        }
    }

    pub fn string_ends_with(&self, string: &str, suffix: &str) -> Result<bool, CompareError> {
        match self {
            ComparisonStrategy::Standard => Ok(string.ends_with(suffix)),
            ComparisonStrategy::Comparator(_) => {
                let chars = string.chars().collect::<Vec<_>>();
                let len = suffix.chars().count();
                if len > chars.len() {
                    return Ok(false);
                }
                self.str_equal(&chars[chars.len() - len..], suffix)
            }
        }
    }

    pub fn string_contains(&self, string: &str, sequence: &str) -> Result<bool, CompareError> {
        match self {
            ComparisonStrategy::Standard => Ok(string.contains(sequence)),
            ComparisonStrategy::Comparator(_) => {
                let chars = string.chars().collect::<Vec<_>>();
                let len = sequence.chars().count();
                if len > chars.len() {
                    return Ok(false);
                }
                for window in chars.windows(len.max(1)) {
                    if self.str_equal(&window[..len], sequence)? {
                        return Ok(true);
                    }
                }
                Ok(len == 0)
            }
        }
    }

    fn str_equal(&self, chars: &[char], other: &str) -> Result<bool, CompareError> {
        let candidate = Value::Str(chars.iter().collect());
        self.are_equal(&candidate, &Value::Str(other.to_string()))
    }
}

/// Scalar equality of the standard strategy; `None` when either side is composite.
pub(crate) fn scalar_equal(actual: &Value, other: &Value) -> Option<bool> {
    match (actual, other) {
        (Value::Null, Value::Null) => Some(true),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::Int(a), Value::Int(b)) => Some(a == b),
        (Value::Float(a), Value::Float(b)) => Some(a == b || (a.is_nan() && b.is_nan())),
        (Value::Char(a), Value::Char(b)) => Some(a == b),
        (Value::Str(a), Value::Str(b)) => Some(a == b),
        (a, b) if is_scalar(a) && is_scalar(b) => Some(false),
        _ => None,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Char(_)
            | Value::Str(_)
    )
}

fn standard_equal(actual: &Value, other: &Value) -> Result<bool, CompareError> {
    match scalar_equal(actual, other) {
        Some(equal) => Ok(equal),
        None => crate::diff::compare(actual, other, &RuleSet::default()).map(|r| r.is_empty()),
    }
}

fn natural_order(actual: &Value, other: &Value) -> Result<Ordering, CompareError> {
    let unordered = |reason| CompareError::InvalidOperation {
        actual: actual.to_string(),
        other: other.to_string(),
        reason,
    };

    match (actual, other) {
        (Value::Ref(shared), _) => {
            let inner = shared.try_get().map_err(|_| unordered("value is borrowed"))?;
            natural_order(&inner, other)
        }
        (_, Value::Ref(shared)) => {
            let inner = shared.try_get().map_err(|_| unordered("value is borrowed"))?;
            natural_order(actual, &inner)
        }
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
        (Value::Char(a), Value::Char(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (a, b) if is_orderable(a) && is_orderable(b) => {
            Err(unordered("values of different types share no ordering"))
        }
        _ => Err(unordered("value has no natural ordering")),
    }
}

fn is_orderable(value: &Value) -> bool {
    matches!(
        value,
        Value::Int(_) | Value::Float(_) | Value::Char(_) | Value::Str(_) | Value::Bool(_)
    )
}
