use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::config::{AuthConfig, AuthMode};
use common::{Error, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub tenant_id: Option<String>,
}

#[derive(Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    /// A token without a known expiry is treated as always usable.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session and token source for Graph calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The signed-in account, if any.
    fn active_account(&self) -> Option<Account>;

    /// Returns a bearer token for `scopes`, refreshing it without user interaction when needed.
    async fn acquire_token_silent(&self, account: &Account, scopes: &[String])
    -> Result<AccessToken>;

    /// Reactivates the account. Fails when no credentials are available.
    async fn sign_in(&self) -> Result<Account>;

    fn sign_out(&self);
}

/// Serves a token that was acquired outside this process.
pub struct StaticTokenProvider {
    account: Account,
    token: Option<AccessToken>,
    signed_in: AtomicBool,
}

impl StaticTokenProvider {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account: Account {
                username: username.into(),
                tenant_id: None,
            },
            token: Some(AccessToken::new(token)),
            signed_in: AtomicBool::new(true),
        }
    }

    /// A provider with no token: every Graph call and every sign-in fails with `NotAuthenticated`.
    pub fn signed_out() -> Self {
        Self {
            account: Account {
                username: String::new(),
                tenant_id: None,
            },
            token: None,
            signed_in: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn active_account(&self) -> Option<Account> {
        self.signed_in
            .load(Ordering::SeqCst)
            .then(|| self.account.clone())
    }

    async fn acquire_token_silent(
        &self,
        _account: &Account,
        _scopes: &[String],
    ) -> Result<AccessToken> {
        if !self.signed_in.load(Ordering::SeqCst) {
            return Err(Error::NotAuthenticated);
        }
        self.token.clone().ok_or(Error::NotAuthenticated)
    }

    async fn sign_in(&self) -> Result<Account> {
        if self.token.is_none() {
            return Err(Error::NotAuthenticated);
        }
        self.signed_in.store(true, Ordering::SeqCst);
        Ok(self.account.clone())
    }

    fn sign_out(&self) {
        self.signed_in.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth2 client-credentials flow against the tenant's token endpoint.
///
/// The token is cached and re-requested shortly before it expires.
pub struct ClientCredentialsProvider {
    http: rquest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    account: Account,
    signed_in: AtomicBool,
    cache: Mutex<Option<AccessToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self> {
        let http = rquest::Client::builder().build()?;
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority.trim_end_matches('/'),
            tenant_id
        );
        url::Url::parse(&token_url)?;

        Ok(Self {
            http,
            token_url,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            account: Account {
                username: client_id.to_string(),
                tenant_id: Some(tenant_id.to_string()),
            },
            signed_in: AtomicBool::new(true),
            cache: Mutex::new(None),
        })
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", GRAPH_DEFAULT_SCOPE)
            .finish();

        let response = self
            .http
            .post(self.token_url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %error_text, "Token endpoint error");
            return Err(Error::TokenAcquisition(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        let token: TokenResponse = serde_json::from_slice(&bytes)?;
        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        info!(client_id = %self.client_id, ?expires_at, "Acquired Graph access token");

        Ok(AccessToken {
            secret: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    fn active_account(&self) -> Option<Account> {
        self.signed_in
            .load(Ordering::SeqCst)
            .then(|| self.account.clone())
    }

    async fn acquire_token_silent(
        &self,
        account: &Account,
        scopes: &[String],
    ) -> Result<AccessToken> {
        if !self.signed_in.load(Ordering::SeqCst) {
            return Err(Error::NotAuthenticated);
        }

        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.clone());
            }
            debug!(account = %account.username, "Cached token near expiry, refreshing");
        }

        // Application permissions are granted per app registration; the
        // delegated scope names only document what the caller needs.
        debug!(?scopes, "Requesting client-credentials token");
        let token = self.request_token().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Reactivates the account and requests a fresh token, so bad credentials surface here.
    async fn sign_in(&self) -> Result<Account> {
        let token = self.request_token().await?;
        *self.cache.lock().await = Some(token);
        self.signed_in.store(true, Ordering::SeqCst);
        Ok(self.account.clone())
    }

    fn sign_out(&self) {
        self.signed_in.store(false, Ordering::SeqCst);
        if let Ok(mut cache) = self.cache.try_lock() {
            *cache = None;
        }
    }
}

/// Builds the token source selected by `auth.mode`.
pub fn provider_from_config(config: &AuthConfig) -> Result<Arc<dyn TokenProvider>> {
    match config.mode {
        AuthMode::Static => match config.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                let username = config.account.as_deref().unwrap_or("static");
                Ok(Arc::new(StaticTokenProvider::new(username, token.trim())))
            }
            _ => {
                info!("No access token configured; Graph calls will require login");
                Ok(Arc::new(StaticTokenProvider::signed_out()))
            }
        },
        AuthMode::ClientCredentials => {
            let tenant_id = required(&config.tenant_id, "auth.tenant_id")?;
            let client_id = required(&config.client_id, "auth.client_id")?;
            let client_secret = required(&config.client_secret, "auth.client_secret")?;
            Ok(Arc::new(ClientCredentialsProvider::new(
                &config.authority,
                tenant_id,
                client_id,
                client_secret,
            )?))
        }
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("{} is required for client_credentials", key)))
}
