//! HTTP client for an account endpoint that speaks the [`super::wire`] protocol.

use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::time::timeout;

use super::wire::{ActionReply, ActionRequest};
use super::{AccountView, AuthError, AuthService, Credentials, LevelUpdate};

/// Account capability reached over HTTP POST.
pub struct HttpAuth {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpAuth {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(timeout_seconds.max(1)),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, body: &ActionRequest) -> Result<AccountView, AuthError> {
        debug!("account request '{}' to {}", body.action, self.endpoint);
        let send = self.client.post(&self.endpoint).json(body).send();
        let response = timeout(self.timeout, send)
            .await
            .map_err(|_| {
                AuthError::Transport(format!(
                    "request timeout after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AuthError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let reply: ActionReply = response
            .json()
            .await
            .map_err(|e| AuthError::Transport(format!("failed to parse reply: {}", e)))?;
        reply.into_result(status)
    }
}

#[async_trait]
impl AuthService for HttpAuth {
    async fn register(&self, credentials: &Credentials) -> Result<AccountView, AuthError> {
        self.request(&ActionRequest::register(credentials)).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AccountView, AuthError> {
        self.request(&ActionRequest::login(credentials)).await
    }

    async fn update_level(&self, update: &LevelUpdate) -> Result<AccountView, AuthError> {
        self.request(&ActionRequest::update_level(update)).await
    }
}
