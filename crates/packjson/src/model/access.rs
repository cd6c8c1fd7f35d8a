//! Indexing, mutation, and restricted comparison of values.

use std::ops::{Index, IndexMut};

use crate::model::value::{Array, Map, NULL, Value};

impl Value {
    /// Looks up an object member without creating it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(members) => members.get(key),
            _ => None,
        }
    }

    /// Mutable counterpart of [`Value::get`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(members) => members.get_mut(key),
            _ => None,
        }
    }

    /// Looks up an array element without creating it.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// True if this is an object with a member named `key`.
    pub fn is_member(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Turns this value into an object unless it already is one.
    pub(crate) fn ensure_object(&mut self) -> &mut Map {
        if !self.is_object() {
            *self = Value::object();
        }
        match self {
            Value::Object(members) => members,
            _ => unreachable!("value was just made an object"),
        }
    }

    /// Turns this value into an array unless it already is one.
    pub(crate) fn ensure_array(&mut self) -> &mut Array {
        if !self.is_array() {
            *self = Value::array();
        }
        match self {
            Value::Array(items) => items,
            _ => unreachable!("value was just made an array"),
        }
    }

    /// Appends a deep copy of `value`, turning this value into an array first
    /// if needed.
    pub fn append(&mut self, value: &Value) {
        self.push(value.clone());
    }

    /// Prepends a deep copy of `value`, turning this value into an array first
    /// if needed.
    pub fn prepend(&mut self, value: &Value) {
        self.push_front(value.clone());
    }

    /// Moves `value` onto the end of this array.
    pub fn push(&mut self, value: Value) {
        self.ensure_array().push_back(value);
    }

    /// Moves `value` onto the front of this array.
    pub fn push_front(&mut self, value: Value) {
        self.ensure_array().push_front(value);
    }

    /// Keeps at most the first `len` array elements. No-op for non-arrays.
    pub fn shrink(&mut self, len: usize) {
        if let Value::Array(items) = self {
            items.truncate(len);
        }
    }

    /// Inserts or replaces an object member, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.ensure_object().insert(key.into(), value.into())
    }

    /// Removes an object member by key. Absent keys are ignored.
    pub fn remove_member(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Object(members) => members.remove(key),
            _ => None,
        }
    }

    /// Removes an array element by position. Out-of-range positions are ignored.
    pub fn remove_index(&mut self, index: usize) -> Option<Value> {
        match self {
            Value::Array(items) => items.remove(index),
            _ => None,
        }
    }

    /// Recursively drops every object member that is Null or the legacy
    /// null sentinel. Array elements are descended into but never removed.
    pub fn remove_null_members(&mut self) {
        match self {
            Value::Object(members) => {
                members.retain(|_, v| !v.is_null_or_legacy_sentinel());
                members.values_mut().for_each(Value::remove_null_members);
            }
            Value::Array(items) => items.iter_mut().for_each(Value::remove_null_members),
            _ => {}
        }
    }

    /// Equality that ignores the top-level object members named in `skip`.
    ///
    /// Nested values are compared with plain equality. When either side is
    /// not an object this is plain equality.
    pub fn compare_except(&self, other: &Value, skip: &[&str]) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                let relevant = |k: &String| !skip.contains(&k.as_str());
                members_equal(a, b, relevant)
            }
            _ => self == other,
        }
    }

    /// Equality restricted to the top-level object members named in `check`.
    ///
    /// A key counts as equal when it is absent on both sides or present with
    /// equal values on both sides.
    pub fn compare_only(&self, other: &Value, check: &[&str]) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                let relevant = |k: &String| check.contains(&k.as_str());
                members_equal(a, b, relevant)
            }
            _ => self == other,
        }
    }

    /// Replaces this value with a deep copy of `rhs`.
    ///
    /// When both are objects, members named in `skip` keep their current
    /// state in `self` (present with the old value, or absent) instead of
    /// taking `rhs`'s.
    pub fn assign_from(&mut self, rhs: &Value, skip: &[&str]) -> &mut Self {
        match (&mut *self, rhs) {
            (Value::Object(current), Value::Object(incoming)) => {
                let mut merged: Map = incoming
                    .iter()
                    .filter(|(k, _)| !skip.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                for key in skip {
                    if let Some(kept) = current.remove(*key) {
                        merged.insert((*key).to_string(), kept);
                    }
                }
                *current = merged;
            }
            _ => *self = rhs.clone(),
        }
        self
    }
}

fn members_equal(a: &Map, b: &Map, relevant: impl Fn(&String) -> bool) -> bool {
    let mut left = a.iter().filter(|(k, _)| relevant(k));
    let mut right = b.iter().filter(|(k, _)| relevant(k));
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l == r => {}
            _ => return false,
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Returns the member, or the shared Null when absent or not an object.
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl IndexMut<&str> for Value {
    /// Returns the member, creating a Null member if needed. A value that is
    /// not an object is replaced by an empty object first.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.ensure_object().entry(key.to_string()).or_default()
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Returns the element, or the shared Null when absent or not an array.
    fn index(&self, index: usize) -> &Value {
        self.get_index(index).unwrap_or(&NULL)
    }
}

impl IndexMut<usize> for Value {
    /// Returns the element, padding the array with Null up to `index`. A
    /// value that is not an array is replaced by an empty array first.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        let items = self.ensure_array();
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        &mut items[index]
    }
}
