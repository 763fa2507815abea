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

pub trait Indent {
    fn indent(&self, level: usize) -> String;
}

impl<T> Indent for T
where
    T: ToString,
{
    fn indent(&self, level: usize) -> String {
        let indent = " ".repeat(level);

        self.to_string()
            .lines()
            .map(|line| format!("{}{}", indent, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Number of elements of a sized value, entries for maps and fields for records.
pub fn size_of(value: &crate::value::Value) -> Option<usize> {
    use crate::value::Value;

    match value {
        Value::List(items) | Value::Set(items) => Some(items.len()),
        Value::Map(entries) => Some(entries.len()),
        Value::Record(record) => Some(record.fields().len()),
        Value::Ref(shared) => shared.try_get().ok().and_then(|inner| size_of(&inner)),
        _ => None,
    }
}
