//! The in-memory value tree.
//!
//! - [`value`]: the [`Value`] enum, type predicates, and lenient coercions
//! - [`access`]: indexing, container mutation, and restricted comparison
//! - [`cursor`]: uniform iteration with in-place removal

pub mod access;
pub mod cursor;
pub mod value;

pub use cursor::{Cursor, CursorKind, CursorMut, Entry};
pub use value::{Array, Map, NULL, Value, ValueType};
