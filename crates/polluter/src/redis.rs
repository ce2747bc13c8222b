//! Key-value engine: one `SET` per top-level entry.
//!
//! Every top-level entry becomes a key, whatever the shape of its value,
//! except an empty array (an empty collection). The value is stored as
//! compact JSON text, encoded as a unit:
//!
//! | Fixture entry | Key | Stored value |
//! |---------------|-----|--------------|
//! | `"count": 1` | `count` | `1` |
//! | `"values": [1, 2]` | `values` | `[1,2]` |
//! | `"obj": {"key": "value"}` | `obj` | `{"key":"value"}` |
//!
//! Writes are not atomic as a group: when a `SET` fails, the keys written
//! before it stay in place and the remaining ones are not attempted.

use fred::prelude::*;
use polluter_types::Tree;

use crate::command::{Arg, Command};
use crate::error::{ArgKind, EngineError};

/// Key-value engine over a shared Redis client.
#[derive(Debug, Clone)]
pub struct RedisEngine {
    client: Client,
}

impl RedisEngine {
    /// Wrap an initialized client.
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect to Redis at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the URL cannot be parsed.
    /// Returns [`EngineError::RedisConnect`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let config = Config::from_url(url)
            .map_err(|e| EngineError::Config(format!("invalid Redis URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Redis");
        Ok(Self { client })
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Encode every top-level entry as a `SET` command.
    ///
    /// An entry holding an empty array is an empty collection and produces
    /// no command.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Encode`] if a value cannot be encoded.
    pub fn build(tree: &Tree) -> Result<Vec<Command>, EngineError> {
        tree.entries()
            .filter(|field| field.value.as_array().is_none_or(|values| !values.is_empty()))
            .map(|field| {
                let json = serde_json::to_string(&field.value).map_err(|source| {
                    EngineError::Encode {
                        key: field.name.clone(),
                        source,
                    }
                })?;
                Ok(Command::new(field.name.clone(), vec![Arg::Json(json)]))
            })
            .collect()
    }

    /// Issue one `SET` per command, in order, without expiry.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Set`] for the first rejected write; earlier
    /// writes are kept. Returns [`EngineError::Argument`] if a command does
    /// not carry exactly one JSON argument.
    pub async fn exec(&self, commands: &[Command]) -> Result<(), EngineError> {
        for (index, command) in commands.iter().enumerate() {
            let json = match command.args() {
                [Arg::Json(json)] => json,
                [other] => {
                    return Err(EngineError::Argument {
                        index,
                        target: command.target().to_owned(),
                        found: other.kind(),
                    });
                }
                args => {
                    return Err(EngineError::Argument {
                        index,
                        target: command.target().to_owned(),
                        found: ArgKind::Count(args.len()),
                    });
                }
            };

            tracing::debug!(index, key = command.target(), "setting");
            let _: () = self
                .client
                .set(command.target(), json.as_str(), None, None, false)
                .await
                .map_err(|source| EngineError::Set {
                    index,
                    key: command.target().to_owned(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use polluter_types::{Field, Record};

    use super::*;
    use crate::parse::Parser;

    fn json_command(key: &str, json: &str) -> Command {
        Command::new(key.to_owned(), vec![Arg::Json(json.to_owned())])
    }

    #[test]
    fn build_example_input() {
        let tree = Parser::Json
            .parse(br#"{"count":1,"values":[1,2],"obj":{"key":"value"}}"#)
            .unwrap();
        assert_eq!(
            RedisEngine::build(&tree).unwrap(),
            vec![
                json_command("count", "1"),
                json_command("values", "[1,2]"),
                json_command("obj", r#"{"key":"value"}"#),
            ]
        );
    }

    #[test]
    fn build_encodes_rows_as_a_unit() {
        let tree = Parser::Yaml
            .parse(b"users:\n- name: Roman\n  id: 1\nflag: true\nnothing: ~\n")
            .unwrap();
        assert_eq!(
            RedisEngine::build(&tree).unwrap(),
            vec![
                json_command("users", r#"[{"name":"Roman","id":1}]"#),
                json_command("flag", "true"),
                json_command("nothing", "null"),
            ]
        );
    }

    #[test]
    fn empty_collection_builds_nothing() {
        let tree = Parser::Json.parse(br#"{"users":[]}"#).unwrap();
        assert!(RedisEngine::build(&tree).unwrap().is_empty());

        let tree = Parser::Json.parse(br#"{"users":[],"tags":[[]]}"#).unwrap();
        assert_eq!(
            RedisEngine::build(&tree).unwrap(),
            vec![json_command("tags", "[[]]")]
        );
    }

    #[test]
    fn non_finite_number_is_an_encode_error() {
        let tree = Tree::from(Record::from(vec![
            Field::new("count", 1.0),
            Field::new("ratio", f64::NAN),
        ]));
        let err = RedisEngine::build(&tree).unwrap_err();
        assert!(
            matches!(err, EngineError::Encode { ref key, .. } if key == "ratio"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn malformed_command_fails_before_writing() {
        // Never initialized: any write would fail with a connection error.
        let engine = RedisEngine::new(Builder::default_centralized().build().unwrap());
        let commands = vec![Command::new("second".to_owned(), Vec::new())];
        let err = engine.exec(&commands).await.unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Argument {
                    index: 0,
                    found: ArgKind::Count(0),
                    ..
                }
            ),
            "{err}"
        );
    }
}
