use anyhow::{Result, bail};
use std::path::PathBuf;

pub const DEFAULT_TABLE: &str = "Users";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    /// In-memory table, optionally seeded from a JSON file
    Memory { seed_file: Option<PathBuf> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Invoked through the Lambda runtime API
    Lambda,
    /// Plain HTTP server
    Server,
}

impl RuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Lambda => "lambda",
            RuntimeMode::Server => "server",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub table_name: String,
    pub backend: StoreBackend,
    pub dynamodb_endpoint: Option<String>,
    pub listen_addr: String,
    pub mode: RuntimeMode,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

pub fn load_config() -> Result<Config> {
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Build from any key lookup; `load_config` passes the process environment
    pub fn from_lookup<F>(get: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());

        let backend = match non_empty("USER_STORE").as_deref() {
            None | Some("dynamodb") => StoreBackend::DynamoDb,
            Some("memory") => StoreBackend::Memory {
                seed_file: non_empty("USER_STORE_SEED_FILE").map(PathBuf::from),
            },
            Some(other) => bail!("Unknown USER_STORE backend: {}", other),
        };

        let mode = if non_empty("AWS_LAMBDA_RUNTIME_API").is_some() {
            RuntimeMode::Lambda
        } else {
            RuntimeMode::Server
        };

        Ok(Config {
            table_name: non_empty("USERS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            backend,
            dynamodb_endpoint: non_empty("DYNAMODB_ENDPOINT_URL"),
            listen_addr: non_empty("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            mode,
            otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: non_empty("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| "user-lookup".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.table_name, "Users");
        assert_eq!(config.backend, StoreBackend::DynamoDb);
        assert_eq!(config.mode, RuntimeMode::Server);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.service_name, "user-lookup");
    }

    #[test]
    fn lambda_mode_when_runtime_api_present() {
        let config = config_from(&[("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001")]).unwrap();
        assert_eq!(config.mode, RuntimeMode::Lambda);
        assert_eq!(config.mode.as_str(), "lambda");
    }

    #[test]
    fn memory_backend_with_seed() {
        let config = config_from(&[
            ("USER_STORE", "memory"),
            ("USER_STORE_SEED_FILE", "data/users.json"),
            ("USERS_TABLE", "UsersDev"),
        ])
        .unwrap();
        assert_eq!(
            config.backend,
            StoreBackend::Memory {
                seed_file: Some(PathBuf::from("data/users.json"))
            }
        );
        assert_eq!(config.table_name, "UsersDev");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = config_from(&[("USERS_TABLE", ""), ("OTEL_EXPORTER_OTLP_ENDPOINT", "")])
            .unwrap();
        assert_eq!(config.table_name, "Users");
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = config_from(&[("USER_STORE", "redis")]).unwrap_err();
        assert!(err.to_string().contains("redis"));
    }
}
