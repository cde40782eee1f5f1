//! Fns to read variables from the environment more conveniently and help other functions figure
//! out what environment they're running in.

use std::{env, path::PathBuf, str::FromStr};

use tracing::{debug, warn};

use crate::{error::ConfigurationError, transfer::RelayConfig};

const SECRET_LOG_BLACKLIST: [&str; 2] = ["AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"];

const DEFAULT_LOCAL_STORE_ROOT: &str = "/tmp/";
const DEFAULT_PORT: u16 = 3003;

fn obfuscate_if_secret(blacklist: &[&str], key: &str, value: &str) -> String {
    if blacklist.contains(&key) {
        let mut last_four = value.to_string();
        last_four.drain(0..value.len().saturating_sub(4));
        format!("****{last_four}")
    } else {
        value.to_string()
    }
}

/// Get an environment variable, encoding found or missing as Option. Values that aren't unicode
/// are invalid.
pub fn get_env_var(key: &'static str) -> Result<Option<String>, ConfigurationError> {
    let var = match env::var(key) {
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(value)) => {
            return Err(ConfigurationError::Invalid {
                key,
                value: obfuscate_if_secret(
                    &SECRET_LOG_BLACKLIST,
                    key,
                    &value.to_string_lossy(),
                ),
            })
        }
        Ok(var) => Some(var),
    };

    if let Some(ref existing_var) = var {
        let output = obfuscate_if_secret(&SECRET_LOG_BLACKLIST, key, existing_var);
        debug!("env var {key}: {output}");
    } else {
        debug!("env var {key} requested but not found")
    };

    Ok(var)
}

/// Some things are different between environments. The address we listen on and the log format
/// we write. This enum is the main way to create these branches in our logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Prod,
    Stag,
}

impl FromStr for Env {
    type Err = ConfigurationError;

    fn from_str(str: &str) -> Result<Self, Self::Err> {
        match str {
            "dev" | "development" => Ok(Env::Dev),
            "stag" | "staging" => Ok(Env::Stag),
            "prod" | "production" => Ok(Env::Prod),
            _ => Err(ConfigurationError::Invalid {
                key: "ENV",
                value: str.to_string(),
            }),
        }
    }
}

/// Only the environment, no fallback warning. Used to set up logging before anything else.
pub fn get_env() -> Result<Env, ConfigurationError> {
    get_env_var("ENV")?.map_or(Ok(Env::Dev), |str| str.parse())
}

pub fn get_env_flag(key: &'static str) -> Result<bool, ConfigurationError> {
    parse_flag(key, get_env_var(key)?)
}

/// Flags are off unless set to "true", in any case.
fn parse_flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigurationError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ConfigurationError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}

/// Everything we read from the environment, read once at startup.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    pub aws_endpoint: Option<String>,
    pub bucket_name: String,
    pub env: Env,
    pub local_store_root: PathBuf,
    pub port: u16,
    pub pretty_print: bool,
    pub processed_prefix: String,
    pub source_prefix: String,
    pub use_local_store: bool,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(get_env_var)
    }

    /// Build the config from any key to value lookup. Lookup errors are passed on as is.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<Option<String>, ConfigurationError>,
    ) -> Result<Self, ConfigurationError> {
        let required = |key: &'static str| lookup(key)?.ok_or(ConfigurationError::Missing(key));

        let bucket_name = required("BUCKET_NAME")?;
        let source_prefix = required("SOURCE_PREFIX")?;
        let processed_prefix = required("PROCESSED_PREFIX")?;

        let env = match lookup("ENV")? {
            None => {
                warn!("no ENV in env, assuming Dev");
                Env::Dev
            }
            Some(str) => str.parse()?,
        };

        let port = match lookup("PORT")? {
            None => DEFAULT_PORT,
            Some(str) => str.parse().map_err(|_| ConfigurationError::Invalid {
                key: "PORT",
                value: str,
            })?,
        };

        Ok(Self {
            aws_endpoint: lookup("AWS_ENDPOINT")?,
            bucket_name,
            env,
            local_store_root: lookup("LOCAL_STORE_ROOT")?
                .unwrap_or_else(|| DEFAULT_LOCAL_STORE_ROOT.to_string())
                .into(),
            port,
            pretty_print: parse_flag("PRETTY_PRINT", lookup("PRETTY_PRINT")?)?,
            processed_prefix,
            source_prefix,
            use_local_store: parse_flag("USE_LOCAL_STORE", lookup("USE_LOCAL_STORE")?)?,
        })
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig::new(&self.source_prefix, &self.processed_prefix)
    }
}
