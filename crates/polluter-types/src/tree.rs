//! The parsed fixture document and its two traversal shapes.
//!
//! A [`Tree`] is the top-level object of a fixture. Engines walk it in one
//! of two ways:
//!
//! - [`Tree::entries`] -- every top-level named entry, whatever its shape
//!   (used by the key-value engine).
//! - [`Tree::collections`] -- only the entries holding an array of objects,
//!   each exposed as a [`Collection`] of rows (used by the relational engine).
//!
//! Both walks follow source order.

use serde::{Deserialize, Deserializer};

use crate::value::{Field, Record, Value};

/// A parsed fixture document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: Record,
}

impl Tree {
    /// Wrap a top-level record.
    pub const fn new(root: Record) -> Self {
        Self { root }
    }

    /// Iterate every top-level named entry in source order.
    pub fn entries(&self) -> std::slice::Iter<'_, Field> {
        self.root.iter()
    }

    /// Iterate the entries shaped as arrays of objects, in source order.
    ///
    /// Entries of any other shape are skipped.
    pub fn collections(&self) -> impl Iterator<Item = Collection<'_>> {
        self.root.iter().filter_map(Collection::from_field)
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Borrow the top-level record.
    pub const fn root(&self) -> &Record {
        &self.root
    }
}

impl From<Record> for Tree {
    fn from(root: Record) -> Self {
        Self { root }
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Record::deserialize(deserializer).map(Self::new)
    }
}

/// A named entry whose value is an array of objects: a table or collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<'a> {
    name: &'a str,
    records: Vec<&'a Record>,
}

impl<'a> Collection<'a> {
    /// View `field` as a collection if every array element is an object.
    ///
    /// An empty array is a collection with no records.
    pub fn from_field(field: &'a Field) -> Option<Self> {
        let Value::Array(values) = &field.value else {
            return None;
        };
        let records = values
            .iter()
            .map(Value::as_object)
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            name: &field.name,
            records,
        })
    }

    /// Table or collection name.
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Rows in source order.
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
