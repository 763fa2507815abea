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

use crate::value::{Record, Value};

/// Shape of a node, inspected once before dispatching to a comparison algorithm.
#[derive(Debug, Copy, Clone)]
pub(crate) enum NodeKind<'v> {
    Scalar,
    Optional(Option<&'v Value>),
    Sequence(&'v [Value]),
    Unordered(&'v [Value]),
    Map(&'v [(Value, Value)]),
    Record(&'v Record),
}

impl<'v> NodeKind<'v> {
    /// Classifies an already dereferenced value. Sequences are reported as
    /// unordered collections when their order is ignored at this location.
    pub(crate) fn of(value: &'v Value, ignore_order: bool) -> NodeKind<'v> {
        match value {
            Value::Optional(inner) => NodeKind::Optional(inner.as_deref()),
            Value::List(items) if ignore_order => NodeKind::Unordered(items),
            Value::List(items) => NodeKind::Sequence(items),
            Value::Set(items) => NodeKind::Unordered(items),
            Value::Map(entries) => NodeKind::Map(entries),
            Value::Record(record) => NodeKind::Record(record),
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Char(_)
            | Value::Str(_)
            | Value::Ref(_) => NodeKind::Scalar,
        }
    }

    pub(crate) fn is_composite(&self) -> bool {
        !matches!(self, NodeKind::Scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(matches!(NodeKind::of(&Value::Int(1), false), NodeKind::Scalar));
        assert!(matches!(NodeKind::of(&Value::Null, false), NodeKind::Scalar));
        assert!(matches!(
            NodeKind::of(&Value::list([1]), false),
            NodeKind::Sequence(items) if items.len() == 1
        ));
        assert!(matches!(
            NodeKind::of(&Value::list([1]), true),
            NodeKind::Unordered(_)
        ));
        assert!(matches!(
            NodeKind::of(&Value::set([1]), false),
            NodeKind::Unordered(_)
        ));
        assert!(matches!(
            NodeKind::of(&Value::map([("a", 1)]), false),
            NodeKind::Map(_)
        ));
        assert!(matches!(
            NodeKind::of(&Value::some(1), false),
            NodeKind::Optional(Some(Value::Int(1)))
        ));
        assert!(NodeKind::of(&Value::from(Record::new("R")), false).is_composite());
        assert!(!NodeKind::of(&Value::from("s"), false).is_composite());
    }
}
