//! Document-store engine: one batched `insert_many` per collection.
//!
//! Every top-level entry holding a non-empty array is a collection; each
//! element must be an object and becomes a BSON document with its fields in
//! source order. Entries of any other shape are ignored.
//!
//! Numbers follow relaxed extended-JSON typing: integral values become
//! `Int32` when they fit and `Int64` otherwise, everything else `Double`.
//!
//! Each collection is inserted on its own. A failure on a later collection
//! does not undo the collections already inserted.

use bson::{Bson, Document};
use mongodb::{Client, Database};
use polluter_types::{Record, Tree, Value, exact_integer};

use crate::command::{Arg, Command};
use crate::error::EngineError;

/// Document-store engine over a shared database handle.
#[derive(Debug, Clone)]
pub struct MongoEngine {
    database: Database,
}

impl MongoEngine {
    /// Wrap a database handle.
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Connect to `MongoDB` and select `database`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MongoConnect`] if the URI is invalid or the
    /// client cannot be created.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, EngineError> {
        let client = Client::with_uri_str(uri).await?;
        tracing::info!(database, "Connected to MongoDB");
        Ok(Self {
            database: client.database(database),
        })
    }

    /// Return a reference to the underlying [`Database`].
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Convert every non-empty array entry into an insert command.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotADocument`] when an array element is not an
    /// object.
    pub fn build(tree: &Tree) -> Result<Vec<Command>, EngineError> {
        let mut commands = Vec::new();
        for field in tree.entries() {
            let Some(values) = field.value.as_array() else {
                continue;
            };
            if values.is_empty() {
                continue;
            }

            let documents = values
                .iter()
                .enumerate()
                .map(|(index, value)| match value {
                    Value::Object(record) => Ok(Arg::Document(to_document(record))),
                    other => Err(EngineError::NotADocument {
                        collection: field.name.clone(),
                        index,
                        kind: other.kind(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            commands.push(Command::new(field.name.clone(), documents));
        }
        Ok(commands)
    }

    /// Insert each command's documents into its collection, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Insert`] for the first rejected batch; earlier
    /// batches are kept. Returns [`EngineError::Argument`] if a command
    /// carries anything but documents.
    pub async fn exec(&self, commands: &[Command]) -> Result<(), EngineError> {
        for (index, command) in commands.iter().enumerate() {
            let documents = command
                .args()
                .iter()
                .map(|arg| match arg {
                    Arg::Document(document) => Ok(document),
                    other => Err(EngineError::Argument {
                        index,
                        target: command.target().to_owned(),
                        found: other.kind(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if documents.is_empty() {
                continue;
            }

            tracing::debug!(
                index,
                collection = command.target(),
                documents = documents.len(),
                "inserting"
            );
            self.database
                .collection::<Document>(command.target())
                .insert_many(documents)
                .await
                .map_err(|source| EngineError::Insert {
                    index,
                    collection: command.target().to_owned(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Convert a record into a document, keeping field order.
fn to_document(record: &Record) -> Document {
    let mut document = Document::new();
    for field in record {
        document.insert(field.name.clone(), to_bson(&field.value));
    }
    document
}

fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => match exact_integer(*n) {
            Some(integer) => i32::try_from(integer).map_or(Bson::Int64(integer), Bson::Int32),
            None => Bson::Double(*n),
        },
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(values) => Bson::Array(values.iter().map(to_bson).collect()),
        Value::Object(record) => Bson::Document(to_document(record)),
    }
}
