//! The unit of work passed from an engine's build step to its exec step.

use bson::Document;
use polluter_types::Value;

use crate::error::ArgKind;

/// One argument of a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A fixture value bound to a SQL placeholder.
    Value(Value),
    /// A value encoded as compact JSON text, stored as-is under a key.
    Json(String),
    /// A document inserted into a collection.
    Document(Document),
}

impl Arg {
    /// The kind of this argument.
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::Value(_) => ArgKind::Value,
            Self::Json(_) => ArgKind::Json,
            Self::Document(_) => ArgKind::Document,
        }
    }
}

/// A ready-to-execute write: a target plus its ordered arguments.
///
/// For SQL engines the target is a complete statement whose placeholders
/// line up with `args`. For Redis it is the key, for MongoDB the
/// collection name. Commands are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    target: String,
    args: Vec<Arg>,
}

impl Command {
    /// Create a command.
    pub const fn new(target: String, args: Vec<Arg>) -> Self {
        Self { target, args }
    }

    /// Statement, key, or collection name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Arguments in order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}
