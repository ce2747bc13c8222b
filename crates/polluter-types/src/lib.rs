//! Shared fixture model for the polluter workspace.
//!
//! A fixture document (JSON or YAML) is decoded into a [`Tree`]: an
//! order-preserving structure of named [`Field`]s whose values are
//! [`Value`]s. Order is kept at every level -- top-level entries, the fields
//! of each row, and array elements -- because engines derive column lists,
//! placeholders and argument lists positionally from it.
//!
//! # Modules
//!
//! - [`value`] -- [`Value`], [`Field`] and [`Record`], with serde support
//! - [`tree`] -- [`Tree`] and the [`Collection`] view over array-of-object entries

pub mod tree;
pub mod value;

pub use tree::{Collection, Tree};
pub use value::{Field, Record, Value, exact_integer};
