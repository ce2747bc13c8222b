//! Seed databases from ordered JSON/YAML fixtures.
//!
//! A fixture document names collections (or keys) and their rows. The
//! [`Polluter`] reads it, decodes it with a [`Parser`] into an
//! order-preserving tree, lets the configured [`Engine`] translate the
//! tree into [`Command`]s, and executes those against the store.
//!
//! # Pipeline
//!
//! ```text
//! bytes --Parser--> Tree --Engine::build--> [Command] --Engine::exec--> store
//!                                                   |
//!       MySQL / PostgreSQL: one INSERT per row, single transaction
//!       Redis:              one SET per top-level key, no rollback
//!       MongoDB:            one insert_many per collection, no rollback
//! ```
//!
//! # Modules
//!
//! - [`parse`] -- JSON and YAML decoding into a [`Tree`](polluter_types::Tree)
//! - [`command`] -- [`Command`] and [`Arg`], the build/exec hand-off
//! - [`engine`] -- [`Engine`], dispatch over the supported backends
//! - [`sql`] -- MySQL and `PostgreSQL` statement building and transactions;
//!   `PostgreSQL` parameters are encoded as the types the server infers
//! - [`redis`] -- Redis `SET` encoding and writes
//! - [`mongo`] -- `MongoDB` document conversion and batched inserts
//! - [`pool`] -- SQL connection pool configuration
//! - [`polluter`] -- the [`Polluter`] orchestrator
//! - [`error`] -- Per-stage error types

pub mod command;
pub mod engine;
pub mod error;
pub mod mongo;
pub mod parse;
mod pg;
pub mod polluter;
pub mod pool;
pub mod redis;
pub mod sql;

// Re-export primary types for convenience.
pub use command::{Arg, Command};
pub use engine::Engine;
pub use error::{ArgKind, BindError, EngineError, ParseError, PolluteError, Stage};
pub use mongo::MongoEngine;
pub use parse::Parser;
pub use polluter::Polluter;
pub use polluter_types::{Field, Record, Tree, Value};
pub use pool::PoolConfig;
pub use redis::RedisEngine;
pub use sql::{Dialect, SqlEngine, SqlPool};
