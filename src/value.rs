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

use std::{
    borrow::Cow,
    cell::{BorrowError, Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

/// A node of a runtime value graph.
///
/// Graphs are trees of owned values, except where a [`Shared`] reference is
/// used: several parents may point at the same shared node and a shared node
/// may (indirectly) point back at itself.
///
/// # Examples
///
/// ```
/// use recursive_compare::{Record, Shared, Value};
///
/// let person = Shared::new(Value::Null);
/// person.set(
///     Record::new("Person")
///         .with_field("name", "Frodo")
///         .with_field("self", person.clone())
///         .into(),
/// );
/// assert_eq!(person.get().type_name(), "Person");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    /// Optional-like container, `Optional(None)` being the empty one.
    Optional(Option<Box<Value>>),
    /// Ordered, index addressable sequence.
    List(Vec<Value>),
    /// Unordered collection; duplicates are significant.
    Set(Vec<Value>),
    /// Entries in insertion order.
    Map(Vec<(Value, Value)>),
    Record(Record),
    Ref(Shared),
}

/// Structured value with named fields kept in declaration order.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: vec![],
        }
    }

    /// Adds a field, replacing the value of an existing one with the same name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Reference to a node that can be reached through several paths.
///
/// Identity, not content, distinguishes two shared nodes.
#[derive(Clone)]
pub struct Shared(Rc<RefCell<Value>>);

impl Shared {
    pub fn new(value: Value) -> Self {
        Shared(Rc::new(RefCell::new(value)))
    }

    /// Replaces the referenced value; used to close cycles after construction.
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    pub fn get(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    pub fn get_mut(&self) -> RefMut<'_, Value> {
        self.0.borrow_mut()
    }

    pub fn try_get(&self) -> Result<Ref<'_, Value>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn ptr_eq(&self, other: &Shared) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:#x})", self.identity())
    }
}

impl Value {
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn some(value: impl Into<Value>) -> Value {
        Value::Optional(Some(Box::new(value.into())))
    }

    pub fn none() -> Value {
        Value::Optional(None)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Ref(shared) => shared.try_get().map(|v| v.is_null()).unwrap_or(false),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Runtime type name used by strict type checking and per-type rules.
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(_) => Cow::Borrowed("bool"),
            Value::Int(_) => Cow::Borrowed("i64"),
            Value::Float(_) => Cow::Borrowed("f64"),
            Value::Char(_) => Cow::Borrowed("char"),
            Value::Str(_) => Cow::Borrowed("String"),
            Value::Optional(_) => Cow::Borrowed("Option"),
            Value::List(_) => Cow::Borrowed("List"),
            Value::Set(_) => Cow::Borrowed("Set"),
            Value::Map(_) => Cow::Borrowed("Map"),
            Value::Record(record) => Cow::Borrowed(record.type_name()),
            Value::Ref(shared) => match shared.try_get() {
                Ok(value) => Cow::Owned(value.type_name().into_owned()),
                Err(_) => Cow::Borrowed("Shared"),
            },
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, visiting: &mut Vec<usize>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Optional(None) => write!(f, "None"),
            Value::Optional(Some(inner)) => {
                write!(f, "Some(")?;
                inner.render(f, visiting)?;
                write!(f, ")")
            }
            Value::List(items) => render_items(f, "[", items, "]", visiting),
            Value::Set(items) => render_items(f, "{", items, "}", visiting),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    key.render(f, visiting)?;
                    write!(f, ": ")?;
                    value.render(f, visiting)?;
                }
                write!(f, "}}")
            }
            Value::Record(record) => {
                write!(f, "{} {{", record.type_name)?;
                for (idx, (name, value)) in record.fields.iter().enumerate() {
                    write!(f, "{}{}: ", if idx > 0 { ", " } else { " " }, name)?;
                    value.render(f, visiting)?;
                }
                if record.fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            Value::Ref(shared) => {
                let identity = shared.identity();
                if visiting.contains(&identity) {
                    return write!(f, "(cycle)");
                }
                let Ok(inner) = shared.try_get() else {
                    return write!(f, "(borrowed)");
                };
                visiting.push(identity);
                let result = inner.render(f, visiting);
                visiting.pop();
                result
            }
        }
    }
}

fn render_items(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: &[Value],
    close: &str,
    visiting: &mut Vec<usize>,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        item.render(f, visiting)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut vec![])
    }
}

/// Structural equality under the default rule set.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        crate::are_equal(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        Value::Optional(option.map(|v| Box::new(v.into())))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Shared> for Value {
    fn from(shared: Shared) -> Self {
        Value::Ref(shared)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        let value = Value::list(vec![
            Value::Int(1),
            Value::Float(1.0),
            Value::from("a"),
            Value::Char('c'),
            Value::none(),
            Value::some(true),
        ]);
        assert_eq!(value.to_string(), r#"[1, 1.0, "a", 'c', None, Some(true)]"#);

        let record = Record::new("Person")
            .with_field("name", "Sam")
            .with_field("tags", Value::set(["a"]));
        assert_eq!(
            Value::from(record).to_string(),
            r#"Person { name: "Sam", tags: {"a"} }"#
        );
        assert_eq!(Value::from(Record::new("Unit")).to_string(), "Unit {}");
        assert_eq!(Value::map([("k", 1)]).to_string(), r#"{"k": 1}"#);
    }

    #[test]
    fn test_display_cycle() {
        let node = Shared::new(Value::Null);
        node.set(Record::new("Node").with_field("next", node.clone()).into());
        assert_eq!(
            Value::Ref(node).to_string(),
            "Node { next: (cycle) }"
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Int(1).type_name(), "i64");
        assert_eq!(Value::from("x").type_name(), "String");
        assert_eq!(Value::from(Record::new("Hobbit")).type_name(), "Hobbit");
        let shared = Shared::new(Record::new("Elf").into());
        assert_eq!(Value::Ref(shared).type_name(), "Elf");
    }

    #[test]
    fn test_record_fields_keep_declaration_order() {
        let record = Record::new("R")
            .with_field("b", 1)
            .with_field("a", 2)
            .with_field("b", 3);
        let names = record
            .fields()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a"]);
        assert!(matches!(record.field("b"), Some(Value::Int(3))));
        assert!(record.field("c").is_none());
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({ "a": [1, 2.5, null], "b": "x" }));
        let Value::Map(entries) = &value else {
            panic!("expected a map, got {}", value);
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(value.to_string(), r#"{"a": [1, 2.5, null], "b": "x"}"#);
    }

    #[test]
    fn test_structural_eq() {
        assert_eq!(Value::list([1, 2]), Value::list([1, 2]));
        assert_ne!(Value::list([1, 2]), Value::list([2, 1]));
        assert_eq!(Value::set([1, 2]), Value::set([2, 1]));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }
}
