use crate::auth::TokenProvider;
use async_trait::async_trait;
use common::config::GraphConfig;
use common::{Error, Result};
use rquest::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Authorized access to the Graph JSON API.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Issues one call and returns the decoded JSON body.
    ///
    /// A successful response without a JSON content type yields an empty object.
    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        headers: &HashMap<String, String>,
    ) -> Result<Value>;
}

pub struct GraphClient {
    http: rquest::Client,
    base_url: String,
    scopes: Vec<String>,
    default_headers: HashMap<String, String>,
    auth: Arc<dyn TokenProvider>,
}

impl GraphClient {
    pub fn new(config: &GraphConfig, auth: Arc<dyn TokenProvider>) -> Result<Self> {
        url::Url::parse(&config.base_url)?;
        let http = rquest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scopes: config.scopes.clone(),
            default_headers: config.headers.clone(),
            auth,
        })
    }

    /// One value per header name: built-ins, then configured headers, then the caller's.
    /// Names are compared case-insensitively and the later layer wins.
    fn merge_headers(&self, token: &str, extra: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = HashMap::from([
            ("authorization".to_string(), format!("Bearer {}", token)),
            ("content-type".to_string(), "application/json".to_string()),
        ]);
        for (name, value) in self.default_headers.iter().chain(extra.iter()) {
            merged.insert(name.to_ascii_lowercase(), value.clone());
        }
        merged
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<url::Url> {
        let url = url::Url::parse(&format!("{}{}", self.base_url, endpoint))?;
        Ok(url)
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/json"))
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        headers: &HashMap<String, String>,
    ) -> Result<Value> {
        let account = self.auth.active_account().ok_or(Error::NotAuthenticated)?;
        let token = self.auth.acquire_token_silent(&account, &self.scopes).await?;
        let url = self.endpoint_url(endpoint)?;

        debug!(%method, %url, account = %account.username, "Calling Graph API");

        let mut request = self.http.request(method, url.as_str());
        for (name, value) in self.merge_headers(&token.secret, headers) {
            request = request.header(name, value);
        }

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %error_text, "Graph API error");
            return Err(Error::RemoteApi {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !is_json(content_type.as_deref()) {
            debug!(status = status.as_u16(), ?content_type, "Graph response has no JSON body");
            return Ok(Value::Object(Map::new()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
