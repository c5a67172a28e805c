use crate::{
    cli::telemetry,
    provider::{IdentityToolkit, IdentityToolkitConfig},
    web::{self, AppState, CookieConfig},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub project_id: String,
    pub api_key: SecretString,
    pub identity_url: String,
    pub token_url: String,
    pub request_timeout_seconds: u64,
    pub remember_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Args {
    fn provider_config(&self) -> Result<IdentityToolkitConfig> {
        let config = IdentityToolkitConfig::new(self.project_id.clone(), self.api_key.clone())?
            .with_identity_url(&self.identity_url)
            .context("invalid identity url")?
            .with_token_url(&self.token_url)
            .context("invalid token url")?
            .with_request_timeout(Duration::from_secs(self.request_timeout_seconds));
        Ok(config)
    }

    fn cookie_config(&self) -> CookieConfig {
        CookieConfig::new()
            .with_remember_ttl_seconds(self.remember_ttl_seconds)
            .with_secure(self.secure_cookies)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the provider client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.provider_config()?;

    info!(
        project_id = config.project_id(),
        identity_url = %config.identity_url(),
        token_url = %config.token_url(),
        secure_cookies = args.secure_cookies,
        "Starting sesame"
    );

    let provider = IdentityToolkit::new(config)?;
    let state = AppState::new(provider, args.cookie_config());

    let result = web::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            port: 8080,
            project_id: "demo-project".to_string(),
            api_key: SecretString::from("key-123".to_string()),
            identity_url: "http://127.0.0.1:9099".to_string(),
            token_url: "http://127.0.0.1:9099/securetoken".to_string(),
            request_timeout_seconds: 5,
            remember_ttl_seconds: 120,
            secure_cookies: true,
        }
    }

    #[test]
    fn provider_config_from_args() -> Result<()> {
        let config = args().provider_config()?;
        assert_eq!(config.project_id(), "demo-project");
        assert_eq!(config.identity_url().as_str(), "http://127.0.0.1:9099/");
        assert_eq!(
            config.token_url().as_str(),
            "http://127.0.0.1:9099/securetoken/"
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn invalid_url_is_reported() {
        let mut args = args();
        args.identity_url = "not a url".to_string();
        let err = args.provider_config().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("invalid identity url"));
    }

    #[test]
    fn cookie_config_from_args() {
        let cookies = args().cookie_config();
        assert_eq!(cookies.remember_ttl_seconds(), 120);
        assert!(cookies.secure());
    }
}
