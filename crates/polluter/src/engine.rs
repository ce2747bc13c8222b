//! Backend selection.
//!
//! The set of backends is closed, so engines are dispatched through an enum
//! rather than trait objects (async methods are not dyn-compatible). Every
//! variant exposes the same two steps: `build` a tree into commands, then
//! `exec` the commands against the store.

use polluter_types::Tree;
use sqlx::{MySqlPool, PgPool};

use crate::command::Command;
use crate::error::EngineError;
use crate::mongo::MongoEngine;
use crate::redis::RedisEngine;
use crate::sql::SqlEngine;

/// A configured backend.
#[derive(Debug, Clone, Default)]
pub enum Engine {
    /// No backend chosen. Both steps fail with [`EngineError::NotSpecified`].
    #[default]
    Unspecified,
    /// MySQL or `PostgreSQL`, one transaction per run.
    Relational(SqlEngine),
    /// Redis, one `SET` per top-level entry.
    KeyValue(RedisEngine),
    /// `MongoDB`, one `insert_many` per collection.
    Document(MongoEngine),
}

impl Engine {
    /// Relational engine over a MySQL pool.
    pub const fn mysql(pool: MySqlPool) -> Self {
        Self::Relational(SqlEngine::mysql(pool))
    }

    /// Relational engine over a `PostgreSQL` pool.
    pub const fn postgres(pool: PgPool) -> Self {
        Self::Relational(SqlEngine::postgres(pool))
    }

    /// Key-value engine over a Redis client.
    pub const fn redis(client: fred::prelude::Client) -> Self {
        Self::KeyValue(RedisEngine::new(client))
    }

    /// Document engine over a `MongoDB` database.
    pub const fn mongo(database: mongodb::Database) -> Self {
        Self::Document(MongoEngine::new(database))
    }

    /// Translate `tree` into commands, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotSpecified`] for [`Engine::Unspecified`],
    /// or the backend's build error.
    pub fn build(&self, tree: &Tree) -> Result<Vec<Command>, EngineError> {
        match self {
            Self::Unspecified => Err(EngineError::NotSpecified),
            Self::Relational(engine) => Ok(engine.build(tree)),
            Self::KeyValue(_) => RedisEngine::build(tree),
            Self::Document(_) => MongoEngine::build(tree),
        }
    }

    /// Execute `commands` against the store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotSpecified`] for [`Engine::Unspecified`],
    /// or the backend's exec error.
    pub async fn exec(&self, commands: &[Command]) -> Result<(), EngineError> {
        match self {
            Self::Unspecified => Err(EngineError::NotSpecified),
            Self::Relational(engine) => engine.exec(commands).await,
            Self::KeyValue(engine) => engine.exec(commands).await,
            Self::Document(engine) => engine.exec(commands).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Relational(engine) => match engine.dialect() {
                crate::sql::Dialect::Positional => "mysql",
                crate::sql::Dialect::Numbered => "postgres",
            },
            Self::KeyValue(_) => "redis",
            Self::Document(_) => "mongo",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parse::Parser;

    #[tokio::test]
    async fn unspecified_engine_fails_both_steps() {
        let engine = Engine::default();
        let tree = Parser::Json.parse(br#"{"users":[{"id":1}]}"#).unwrap();

        assert!(matches!(engine.build(&tree), Err(EngineError::NotSpecified)));
        assert!(matches!(
            engine.exec(&[]).await,
            Err(EngineError::NotSpecified)
        ));
        assert_eq!(engine.name(), "unspecified");
    }
}
