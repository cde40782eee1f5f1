use tracing::Subscriber;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    env::{self, Env},
    error::ConfigurationError,
};

/// Human readable logs in dev, or whenever PRETTY_PRINT is set. JSON everywhere else.
///
/// Reads only ENV and PRETTY_PRINT, so it can run first and the config lookups after it are
/// logged.
pub fn init() -> Result<(), ConfigurationError> {
    let env = env::get_env()?;
    let pretty_print = env::get_env_flag("PRETTY_PRINT")?;

    let env_filter = EnvFilter::from_default_env();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if pretty_print {
        Box::new(
            fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .finish(),
        )
    } else {
        match env {
            Env::Dev => Box::new(
                fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .finish(),
            ),
            Env::Stag | Env::Prod => Box::new(
                fmt::Subscriber::builder()
                    .json()
                    .with_env_filter(env_filter)
                    .finish(),
            ),
        }
    };

    tracing::subscriber::set_global_default(subscriber)
        .expect("expect to be able to set global default subscriber");

    Ok(())
}
