//! Uniform iteration over arrays, objects, and scalars.
//!
//! A cursor walks the children of its root in order: array slots by
//! position, object members by ascending key. A scalar root is visited once
//! as its own only child; a Null root and empty containers are not visited
//! at all. This lets callers loop over a value without first checking its
//! shape.

use std::collections::{btree_map, vec_deque};
use std::ops::Bound;

use crate::model::value::Value;

/// What a cursor is walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Array,
    Object,
    /// A non-container root, visited once (or never, for Null).
    Scalar,
}

impl CursorKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => CursorKind::Array,
            Value::Object(_) => CursorKind::Object,
            _ => CursorKind::Scalar,
        }
    }
}

/// One visited child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry<'a> {
    /// Zero-based ordinal.
    pub num: usize,
    /// Member key when walking an object.
    pub key: Option<&'a str>,
    pub value: &'a Value,
}

#[derive(Debug, Clone)]
enum Walk<'a> {
    Array(vec_deque::Iter<'a, Value>),
    Object(btree_map::Iter<'a, String, Value>),
    Scalar(Option<&'a Value>),
}

impl<'a> Walk<'a> {
    fn next_entry(&mut self) -> Option<(Option<&'a str>, &'a Value)> {
        match self {
            Walk::Array(it) => it.next().map(|v| (None, v)),
            Walk::Object(it) => it.next().map(|(k, v)| (Some(k.as_str()), v)),
            Walk::Scalar(slot) => slot.take().map(|v| (None, v)),
        }
    }
}

/// Read-only cursor. Also an [`Iterator`] over [`Entry`] items.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    kind: CursorKind,
    walk: Walk<'a>,
    current: Option<(Option<&'a str>, &'a Value)>,
    num: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(root: &'a Value) -> Self {
        let mut walk = match root {
            Value::Array(items) => Walk::Array(items.iter()),
            Value::Object(members) => Walk::Object(members.iter()),
            Value::Null => Walk::Scalar(None),
            other => Walk::Scalar(Some(other)),
        };
        let current = walk.next_entry();
        Self {
            kind: CursorKind::of(root),
            walk,
            current,
            num: 0,
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    /// False once the cursor has moved past the last child.
    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    /// The current child (the root itself for scalar roots).
    pub fn get(&self) -> Option<&'a Value> {
        self.current.map(|(_, v)| v)
    }

    /// The current member key; `None` unless walking an object.
    pub fn key(&self) -> Option<&'a str> {
        self.current.and_then(|(k, _)| k)
    }

    /// Zero-based ordinal of the current child.
    pub fn num(&self) -> usize {
        self.num
    }

    /// Moves to the next child.
    pub fn advance(&mut self) {
        if self.current.is_some() {
            self.num += 1;
            self.current = self.walk.next_entry();
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        let (key, value) = self.current?;
        let entry = Entry {
            num: self.num,
            key,
            value,
        };
        self.advance();
        Some(entry)
    }
}

/// Mutable cursor with in-place removal.
///
/// Positions are tracked by index (arrays) or by key (objects) rather than
/// by borrowed container iterators, so [`CursorMut::remove`] can delete the
/// current child and carry on from the one after it.
#[derive(Debug)]
pub struct CursorMut<'a> {
    root: &'a mut Value,
    kind: CursorKind,
    index: usize,
    key: Option<String>,
    scalar_done: bool,
    num: usize,
}

impl<'a> CursorMut<'a> {
    pub fn new(root: &'a mut Value) -> Self {
        let kind = CursorKind::of(root);
        let key = root
            .as_object()
            .and_then(|members| members.keys().next().cloned());
        let scalar_done = root.is_null();
        Self {
            root,
            kind,
            index: 0,
            key,
            scalar_done,
            num: 0,
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    /// False once the cursor has moved past the last child.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            CursorKind::Array => self.index < self.root.as_array().map_or(0, |items| items.len()),
            CursorKind::Object => self.key.is_some(),
            CursorKind::Scalar => !self.scalar_done,
        }
    }

    /// The current member key; `None` unless walking an object.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Zero-based ordinal of the current child.
    pub fn num(&self) -> usize {
        self.num
    }

    /// The current child (the root itself for scalar roots).
    pub fn get(&self) -> Option<&Value> {
        match self.kind {
            CursorKind::Array => self.root.get_index(self.index),
            CursorKind::Object => self.key.as_deref().and_then(|k| self.root.get(k)),
            CursorKind::Scalar => (!self.scalar_done).then_some(&*self.root),
        }
    }

    /// Mutable access to the current child.
    pub fn get_mut(&mut self) -> Option<&mut Value> {
        match self.kind {
            CursorKind::Array => self
                .root
                .as_array_mut()
                .and_then(|items| items.get_mut(self.index)),
            CursorKind::Object => match self.key.as_deref() {
                Some(k) => self.root.get_mut(k),
                None => None,
            },
            CursorKind::Scalar => (!self.scalar_done).then_some(&mut *self.root),
        }
    }

    /// Moves to the next child.
    pub fn advance(&mut self) {
        if !self.is_valid() {
            return;
        }
        self.num += 1;
        match self.kind {
            CursorKind::Array => self.index += 1,
            CursorKind::Object => self.key = self.key_after_current(),
            CursorKind::Scalar => self.scalar_done = true,
        }
    }

    /// Removes the current child from the root and moves onto the child
    /// that followed it, which takes over the current ordinal.
    ///
    /// On a scalar root nothing is removed; the cursor is exhausted.
    pub fn remove(&mut self) -> Option<Value> {
        if !self.is_valid() {
            return None;
        }
        match self.kind {
            CursorKind::Array => self.root.remove_index(self.index),
            CursorKind::Object => {
                let next = self.key_after_current();
                let removed = self
                    .key
                    .take()
                    .and_then(|k| self.root.remove_member(&k));
                self.key = next;
                removed
            }
            CursorKind::Scalar => {
                self.scalar_done = true;
                None
            }
        }
    }

    fn key_after_current(&self) -> Option<String> {
        let current = self.key.as_deref()?;
        self.root.as_object().and_then(|members| {
            members
                .range::<str, _>((Bound::Excluded(current), Bound::Unbounded))
                .next()
                .map(|(k, _)| k.clone())
        })
    }
}

impl Value {
    /// Read-only cursor over this value's children.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    /// Mutable cursor over this value's children.
    pub fn cursor_mut(&mut self) -> CursorMut<'_> {
        CursorMut::new(self)
    }
}

impl<'a> IntoIterator for &'a Value {
    type Item = Entry<'a>;
    type IntoIter = Cursor<'a>;

    fn into_iter(self) -> Cursor<'a> {
        Cursor::new(self)
    }
}
