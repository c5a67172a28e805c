use thiserror::Error;

/// Provider codes that point at a specific credential field. They are never
/// shown to the user as-is.
const CREDENTIAL_CODES: &[&str] = &[
    "INVALID_LOGIN_CREDENTIALS",
    "EMAIL_NOT_FOUND",
    "INVALID_PASSWORD",
    "INVALID_EMAIL",
    "MISSING_EMAIL",
    "MISSING_PASSWORD",
];

/// Codes returned by the account lookup when the id token needs a refresh.
const STALE_ID_TOKEN_CODES: &[&str] = &["TOKEN_EXPIRED", "INVALID_ID_TOKEN"];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the request: {code}")]
    Rejected {
        code: String,
        detail: Option<String>,
    },
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("provider unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("session issued for another project: {0}")]
    ProjectMismatch(String),
    #[error("invalid provider endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("provider call did not complete")]
    Interrupted,
}

impl ProviderError {
    /// Build a rejection from the provider's error message, which has the
    /// shape `CODE` or `CODE : human readable detail`.
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        let (code, detail) = match message.split_once(':') {
            Some((code, detail)) => (code.trim(), Some(detail.trim())),
            None => (message.trim(), None),
        };
        Self::Rejected {
            code: code.to_string(),
            detail: detail.filter(|d| !d.is_empty()).map(str::to_string),
        }
    }

    /// Wrap a transport failure, dropping the request URL so the API key in the
    /// query string never reaches logs or notices.
    #[must_use]
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The provider looked at the handle or the credentials and said no, as
    /// opposed to being unreachable.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::ProjectMismatch(_))
    }

    #[must_use]
    pub fn is_stale_id_token(&self) -> bool {
        self.code()
            .is_some_and(|code| STALE_ID_TOKEN_CODES.contains(&code))
    }

    /// Whether the message would tell the user which field was wrong.
    #[must_use]
    pub fn reveals_field(&self) -> bool {
        self.code().is_some_and(|code| CREDENTIAL_CODES.contains(&code))
    }

    /// Message fit for a notice, or `None` when the caller should fall back to
    /// a generic one.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        if self.reveals_field() {
            return None;
        }
        match self {
            Self::Rejected { code, detail } => Some(detail.clone().unwrap_or_else(|| {
                match code.as_str() {
                    "USER_DISABLED" => "This account has been disabled.".to_string(),
                    "TOO_MANY_ATTEMPTS_TRY_LATER" => {
                        "Too many attempts. Please try again later.".to_string()
                    }
                    _ => code.clone(),
                }
            })),
            _ => None,
        }
    }
}
