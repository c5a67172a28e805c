//! Firebase Authentication over its public REST surface.
//!
//! Sign-in goes to the Identity Toolkit, id token refresh to the Secure Token
//! service. Sign-out is local, as in the provider's browser SDK: the handle is
//! simply forgotten.

use super::{IdentityProvider, ProviderError, Session, SessionTokens, SignedIn};
use crate::APP_USER_AGENT;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct IdentityToolkitConfig {
    project_id: String,
    api_key: SecretString,
    identity_url: Url,
    token_url: Url,
    request_timeout: Duration,
}

impl IdentityToolkitConfig {
    /// # Errors
    /// Returns an error if the default endpoints cannot be parsed.
    pub fn new(project_id: String, api_key: SecretString) -> Result<Self, ProviderError> {
        Ok(Self {
            project_id,
            api_key,
            identity_url: base_url(DEFAULT_IDENTITY_URL)?,
            token_url: base_url(DEFAULT_TOKEN_URL)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// # Errors
    /// Returns an error if `url` is not an absolute URL.
    pub fn with_identity_url(mut self, url: &str) -> Result<Self, ProviderError> {
        self.identity_url = base_url(url)?;
        Ok(self)
    }

    /// # Errors
    /// Returns an error if `url` is not an absolute URL.
    pub fn with_token_url(mut self, url: &str) -> Result<Self, ProviderError> {
        self.token_url = base_url(url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn identity_url(&self) -> &Url {
        &self.identity_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

// `Url::join` replaces the last path segment unless the base ends with '/'.
fn base_url(raw: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Clone, Debug)]
pub struct IdentityToolkit {
    http: Client,
    config: Arc<IdentityToolkitConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    project_id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkit {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(ProviderError::transport)?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    fn endpoint(&self, base: &Url, path: &str) -> Result<Url, ProviderError> {
        let mut url = base.join(path)?;
        url.query_pairs_mut()
            .append_pair("key", self.config.api_key.expose_secret());
        Ok(url)
    }

    async fn post<B, R>(&self, url: Url, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ProviderError::transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ProviderError::transport)?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => Err(ProviderError::rejected(&envelope.error.message)),
            Err(_) => Err(ProviderError::Status(status.as_u16())),
        }
    }

    async fn account(&self, id_token: &str) -> Result<Session, ProviderError> {
        let url = self.endpoint(&self.config.identity_url, "v1/accounts:lookup")?;
        let response: LookupResponse = self.post(url, &LookupRequest { id_token }).await?;

        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::rejected("USER_NOT_FOUND"))?;

        let identifier = user.email.unwrap_or_else(|| user.local_id.clone());
        Ok(Session::new(user.local_id, identifier))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, ProviderError> {
        let url = self.endpoint(&self.config.token_url, "v1/token")?;
        let response: RefreshResponse = self
            .post(
                url,
                &RefreshRequest {
                    grant_type: "refresh_token",
                    refresh_token,
                },
            )
            .await?;

        if response.project_id != self.config.project_id {
            warn!(
                "Refreshed token belongs to project {}, expected {}",
                response.project_id, self.config.project_id
            );
            return Err(ProviderError::ProjectMismatch(response.project_id));
        }

        Ok(SessionTokens {
            id_token: response.id_token,
            refresh_token: response.refresh_token,
        })
    }
}

impl IdentityProvider for IdentityToolkit {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<SignedIn, ProviderError> {
        let url = self.endpoint(&self.config.identity_url, "v1/accounts:signInWithPassword")?;
        let response: SignInResponse = self
            .post(
                url,
                &SignInRequest {
                    email,
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;

        debug!("Provider accepted credentials for {}", response.local_id);

        Ok(SignedIn {
            session: Session::new(response.local_id, response.email),
            tokens: SessionTokens {
                id_token: response.id_token,
                refresh_token: response.refresh_token,
            },
        })
    }

    #[instrument(skip_all)]
    async fn lookup(&self, tokens: &SessionTokens) -> Result<SignedIn, ProviderError> {
        match self.account(&tokens.id_token).await {
            Ok(session) => Ok(SignedIn {
                session,
                tokens: tokens.clone(),
            }),
            Err(err) if err.is_stale_id_token() => {
                debug!("Id token is stale, refreshing");
                let tokens = self.refresh(&tokens.refresh_token).await?;
                let session = self.account(&tokens.id_token).await?;
                Ok(SignedIn { session, tokens })
            }
            Err(err) => Err(err),
        }
    }

    async fn sign_out(&self, _tokens: &SessionTokens) -> Result<(), ProviderError> {
        debug!("Discarding provider session handle");
        Ok(())
    }
}
