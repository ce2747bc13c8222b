//! Error types for parsing, building and executing fixtures.
//!
//! Each pipeline stage has its own error: [`ParseError`] for turning bytes
//! into a tree, [`EngineError`] for both the build and the exec step of a
//! backend. [`PolluteError`] wraps them with the stage that failed, so
//! callers can tell bad input from a rejected write by the message alone.

use std::fmt;

/// Failure to turn raw input into a fixture tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input stream could not be read.
    #[error("read input: {0}")]
    Read(#[from] std::io::Error),

    /// The input is not valid JSON, or not a JSON object.
    #[error("decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is not valid YAML, or not a YAML mapping.
    #[error("decode YAML: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// A YAML merge key (`<<`) refers to something other than mappings.
    #[error("YAML merge key: {0}")]
    Merge(&'static str),
}

/// Failure inside an engine, either while building commands or executing them.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No engine was configured on the [`Polluter`](crate::Polluter).
    #[error("database engine not specified: configure one with `Polluter::with_engine`")]
    NotSpecified,

    /// A connection setting could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connecting to a SQL database failed.
    #[error("SQL connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Connecting to Redis failed.
    #[error("Redis connection error: {0}")]
    RedisConnect(#[from] fred::error::Error),

    /// Connecting to MongoDB failed.
    #[error("MongoDB connection error: {0}")]
    MongoConnect(#[from] mongodb::error::Error),

    /// A value could not be encoded for the key-value store.
    #[error("encode value for key {key}: {source}")]
    Encode {
        /// Top-level key whose value failed to encode.
        key: String,
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// An array element could not be turned into a document.
    #[error("collection {collection}: element {index} is {kind}, expected an object")]
    NotADocument {
        /// Collection whose array held the element.
        collection: String,
        /// Zero-based position of the element in the array.
        index: usize,
        /// Shape of the offending element.
        kind: &'static str,
    },

    /// A command carried arguments this engine cannot execute.
    #[error("command {index} ({target}): unexpected {found} argument")]
    Argument {
        /// Zero-based position of the command.
        index: usize,
        /// Command target.
        target: String,
        /// Kind of argument found.
        found: ArgKind,
    },

    /// Opening the transaction failed.
    #[error("tx begin: {0}")]
    Begin(#[source] sqlx::Error),

    /// A statement failed and the transaction was rolled back.
    #[error("exec command {index}: {source}")]
    Statement {
        /// Zero-based position of the failing command.
        index: usize,
        /// The statement error.
        source: sqlx::Error,
    },

    /// A statement failed and rolling the transaction back failed as well.
    #[error("exec command {index}: {source}; rollback: {rollback}")]
    Rollback {
        /// Zero-based position of the failing command.
        index: usize,
        /// The statement error.
        source: sqlx::Error,
        /// The rollback error.
        rollback: sqlx::Error,
    },

    /// Committing the transaction failed.
    #[error("commit: {0}")]
    Commit(#[source] sqlx::Error),

    /// A `SET` was rejected. Earlier keys stay written.
    #[error("set command {index} (key {key}): {source}")]
    Set {
        /// Zero-based position of the failing command.
        index: usize,
        /// Key being written.
        key: String,
        /// The Redis error.
        source: fred::error::Error,
    },

    /// A batched insert was rejected. Earlier collections stay written.
    #[error("insert command {index} (collection {collection}): {source}")]
    Insert {
        /// Zero-based position of the failing command.
        index: usize,
        /// Collection being written.
        collection: String,
        /// The MongoDB error.
        source: mongodb::error::Error,
    },
}

/// A fixture value that cannot be sent as the parameter type the database
/// inferred for its placeholder.
///
/// Carried inside [`sqlx::Error::Encode`], so it surfaces as the source of
/// [`EngineError::Statement`].
#[derive(Debug, thiserror::Error)]
#[error("parameter ${position}: cannot bind {found} as {expected}: {reason}")]
pub struct BindError {
    /// 1-based placeholder position.
    pub position: usize,
    /// Shape of the fixture value.
    pub found: &'static str,
    /// Name of the inferred parameter type.
    pub expected: String,
    /// Why the conversion failed.
    pub reason: String,
}

/// Kind of a command argument, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A generic fixture value.
    Value,
    /// Encoded JSON text.
    Json,
    /// A BSON document.
    Document,
    /// A command with the wrong number of arguments.
    Count(usize),
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Json => f.write_str("JSON"),
            Self::Document => f.write_str("document"),
            Self::Count(count) => write!(f, "{count}-element"),
        }
    }
}

/// Pipeline stage of a [`Polluter`](crate::Polluter) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the input into a tree.
    Parsing,
    /// Translating the tree into commands.
    Building,
    /// Writing commands to the store.
    Executing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing => f.write_str("parse"),
            Self::Building => f.write_str("build"),
            Self::Executing => f.write_str("exec"),
        }
    }
}

/// Failure of a whole [`Polluter::pollute`](crate::Polluter::pollute) run.
#[derive(Debug, thiserror::Error)]
pub enum PolluteError {
    /// The input could not be parsed. Nothing was built or written.
    #[error("parse failed: {0}")]
    Parse(#[source] ParseError),

    /// The engine could not translate the tree. Nothing was written.
    #[error("build failed: {0}")]
    Build(#[source] EngineError),

    /// The store rejected the commands.
    #[error("exec failed: {0}")]
    Exec(#[source] EngineError),
}

impl PolluteError {
    /// The stage that failed.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Parse(_) => Stage::Parsing,
            Self::Build(_) => Stage::Building,
            Self::Exec(_) => Stage::Executing,
        }
    }

    /// Whether the run failed because no engine was configured.
    pub const fn is_engine_not_specified(&self) -> bool {
        matches!(
            self,
            Self::Build(EngineError::NotSpecified) | Self::Exec(EngineError::NotSpecified)
        )
    }
}
