//! Connect the configured store and apply fixture inputs in order.

use polluter::{Engine, MongoEngine, Polluter, RedisEngine};
use tokio::fs::File;
use tracing::info;

use crate::config::{EngineKind, SeedConfig};
use crate::error::SeedError;

/// Input name meaning standard input.
pub const STDIN: &str = "-";

/// Open a connection to the store named by `config`.
pub async fn connect(config: &SeedConfig) -> Result<Engine, SeedError> {
    let engine = match config.engine {
        EngineKind::MySql => Engine::mysql(config.pool_config().connect_mysql().await?),
        EngineKind::Postgres => Engine::postgres(config.pool_config().connect_postgres().await?),
        EngineKind::Redis => Engine::KeyValue(RedisEngine::connect(&config.url).await?),
        EngineKind::Mongo => {
            let database = config.database.as_deref().ok_or_else(|| {
                SeedError::Config("missing required env var POLLUTER_DATABASE".to_owned())
            })?;
            Engine::Document(MongoEngine::connect(&config.url, database).await?)
        }
    };
    info!(engine = engine.name(), "store connected");
    Ok(engine)
}

/// Inputs to apply: the given paths, or stdin when there are none.
pub fn inputs(args: Vec<String>) -> Vec<String> {
    if args.is_empty() {
        vec![STDIN.to_owned()]
    } else {
        args
    }
}

/// Pollute every input in order, stopping at the first failure.
pub async fn run(config: &SeedConfig, engine: Engine, inputs: &[String]) -> Result<(), SeedError> {
    let polluter = Polluter::new().with_engine(engine);
    for input in inputs {
        let polluter = polluter.clone().with_parser(config.parser_for(input));
        info!(input, parser = polluter.parser().name(), "seeding");

        let result = if input == STDIN {
            polluter.pollute(tokio::io::stdin()).await
        } else {
            let file = File::open(input).await.map_err(|source| SeedError::Open {
                path: input.clone(),
                source,
            })?;
            polluter.pollute(file).await
        };
        result.map_err(|source| SeedError::Pollute {
            input: input.clone(),
            source,
        })?;
    }
    info!(inputs = inputs.len(), "seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreachable)]
mod tests {
    use std::time::Duration;

    use polluter::Stage;

    use super::*;

    fn config() -> SeedConfig {
        SeedConfig {
            engine: EngineKind::Redis,
            url: "redis://localhost:6379".to_owned(),
            database: None,
            format: None,
            max_connections: 5,
            connect_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn no_arguments_reads_stdin() {
        assert_eq!(inputs(Vec::new()), vec!["-".to_owned()]);
        assert_eq!(
            inputs(vec!["a.yml".to_owned(), "b.json".to_owned()]),
            vec!["a.yml".to_owned(), "b.json".to_owned()]
        );
    }

    #[tokio::test]
    async fn missing_file_stops_the_run() {
        let inputs = vec!["/nonexistent/polluter/fixture.yml".to_owned()];
        let err = run(&config(), Engine::Unspecified, &inputs)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Open { ref path, .. } if path == "/nonexistent/polluter/fixture.yml"));
    }

    #[tokio::test]
    async fn pipeline_errors_name_the_input() {
        let path = std::env::temp_dir().join(format!("polluter-seed-{}.json", std::process::id()));
        tokio::fs::write(&path, br#"{"users":[{"id":1}]}"#)
            .await
            .unwrap();
        let input = path.to_string_lossy().into_owned();

        let err = run(&config(), Engine::Unspecified, &[input.clone()])
            .await
            .unwrap_err();
        tokio::fs::remove_file(&path).await.unwrap();

        let SeedError::Pollute { input: failed, source } = err else {
            unreachable!("expected a pollute error");
        };
        assert_eq!(failed, input);
        assert_eq!(source.stage(), Stage::Building);
        assert!(source.is_engine_not_specified());
    }

    #[tokio::test]
    async fn missing_mongo_database_is_a_config_error() {
        let config = SeedConfig {
            engine: EngineKind::Mongo,
            url: "mongodb://localhost:27017".to_owned(),
            ..config()
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, SeedError::Config(_)));
    }
}
