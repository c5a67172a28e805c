use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub use crate::provider::{DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL};

pub const ARG_PROJECT_ID: &str = "project-id";
pub const ARG_API_KEY: &str = "api-key";
pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_TOKEN_URL: &str = "token-url";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub project_id: String,
    pub api_key: SecretString,
    pub identity_url: String,
    pub token_url: String,
    pub request_timeout_seconds: u64,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // clap lets empty env values through
        let required = |id: &str| match matches.get_one::<String>(id) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(anyhow::anyhow!("missing required argument: --{id}")),
        };

        Ok(Self {
            project_id: required(ARG_PROJECT_ID)?,
            api_key: SecretString::from(required(ARG_API_KEY)?),
            identity_url: required(ARG_IDENTITY_URL)?,
            token_url: required(ARG_TOKEN_URL)?,
            request_timeout_seconds: matches
                .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROJECT_ID)
                .long(ARG_PROJECT_ID)
                .help("Identity provider project id")
                .long_help(
                    "Identity provider project id. Refreshed sessions that belong to another project are rejected.",
                )
                .env("SESAME_PROJECT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Identity provider web API key")
                .env("SESAME_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Base URL of the accounts endpoints")
                .env("SESAME_IDENTITY_URL")
                .default_value(DEFAULT_IDENTITY_URL),
        )
        .arg(
            Arg::new(ARG_TOKEN_URL)
                .long(ARG_TOKEN_URL)
                .help("Base URL of the token refresh endpoint")
                .env("SESAME_TOKEN_URL")
                .default_value(DEFAULT_TOKEN_URL),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long(ARG_REQUEST_TIMEOUT_SECONDS)
                .help("Timeout for each identity provider request in seconds")
                .env("SESAME_REQUEST_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::ExposeSecret;

    fn command() -> Command {
        with_args(Command::new("sesame"))
    }

    fn cleared<F: FnOnce() -> R, R>(f: F) -> R {
        temp_env::with_vars(
            [
                ("SESAME_PROJECT_ID", None::<&str>),
                ("SESAME_API_KEY", None::<&str>),
                ("SESAME_IDENTITY_URL", None::<&str>),
                ("SESAME_TOKEN_URL", None::<&str>),
                ("SESAME_REQUEST_TIMEOUT_SECONDS", None::<&str>),
            ],
            f,
        )
    }

    #[test]
    fn defaults() -> Result<()> {
        cleared(|| -> Result<()> {
            let matches = command().try_get_matches_from([
                "sesame",
                "--project-id",
                "demo-project",
                "--api-key",
                "key-123",
            ])?;
            let options = Options::parse(&matches)?;
            assert_eq!(options.project_id, "demo-project");
            assert_eq!(options.api_key.expose_secret(), "key-123");
            assert_eq!(options.identity_url, DEFAULT_IDENTITY_URL);
            assert_eq!(options.token_url, DEFAULT_TOKEN_URL);
            assert_eq!(options.request_timeout_seconds, 10);
            Ok(())
        })
    }

    #[test]
    fn blank_env_value_is_missing() -> Result<()> {
        temp_env::with_vars(
            [
                ("SESAME_PROJECT_ID", Some("  ")),
                ("SESAME_API_KEY", Some("key-123")),
            ],
            || -> Result<()> {
                let matches = command().try_get_matches_from(["sesame"])?;
                let err = Options::parse(&matches).err().map(|e| e.to_string());
                assert_eq!(
                    err.as_deref(),
                    Some("missing required argument: --project-id")
                );
                Ok(())
            },
        )
    }

    #[test]
    fn api_key_is_required() {
        cleared(|| {
            let result = command().try_get_matches_from(["sesame", "--project-id", "p"]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        cleared(|| {
            let result = command().try_get_matches_from([
                "sesame",
                "--project-id",
                "p",
                "--api-key",
                "k",
                "--request-timeout-seconds",
                "0",
            ]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::ValueValidation)
            );
        });
    }
}
