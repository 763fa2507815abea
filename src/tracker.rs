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

use std::collections::HashSet;

use crate::value::Value;

/// Identity of a node: the address it lives at while borrowed on the active
/// path, or the referent's address for a shared reference.
fn identity(value: &Value) -> usize {
    match value {
        Value::Ref(shared) => shared.identity(),
        _ => value as *const Value as usize,
    }
}

/// (actual, expected) node pairs currently being compared on the active path.
///
/// Membership is by identity, never by content. One tracker belongs to one
/// comparison run.
#[derive(Debug, Default)]
pub struct VisitedPairs {
    active: HashSet<(usize, usize)>,
}

impl VisitedPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pair; `false` means it is already active, i.e. a cycle.
    pub fn enter(&mut self, actual: &Value, expected: &Value) -> bool {
        self.active.insert((identity(actual), identity(expected)))
    }

    pub fn leave(&mut self, actual: &Value, expected: &Value) {
        self.active.remove(&(identity(actual), identity(expected)));
    }

    pub fn is_active(&self, actual: &Value, expected: &Value) -> bool {
        self.active.contains(&(identity(actual), identity(expected)))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
