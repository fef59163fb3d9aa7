//! Gmail REST client: `users.messages.list` and `users.messages.get` over reqwest.
//!
//! Authorization is taken as given: the caller supplies a bearer access
//! token and this client never refreshes it. An expired token surfaces as
//! `ClientError::Unauthorized`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ListPage, ListQuery, MailClient, RemoteMessage};
use crate::error::ClientError;

/// Public Gmail API endpoint.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

/// Maximum number of response body bytes kept in a `ClientError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for [`GmailClient`].
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// Scheme and host (optionally a path prefix) of the API.
    pub base_url: String,
    /// Mailbox owner; `me` is the authorized user.
    pub user_id: String,
    pub access_token: SecretString,
    pub request_timeout: Duration,
}

impl GmailConfig {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            user_id: "me".to_string(),
            access_token,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Gmail implementation of [`MailClient`].
pub struct GmailClient {
    config: GmailConfig,
    client: reqwest::Client,
}

impl GmailClient {
    pub fn new(config: GmailConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                url: config.base_url.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    /// `{base}/gmail/v1/users/{user}/messages[/{extra}]`, each segment percent-encoded.
    fn messages_url(&self, extra: Option<&str>) -> Result<Url, ClientError> {
        let malformed = |reason: String| ClientError::Malformed {
            url: self.config.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| malformed(format!("invalid base URL: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| malformed("base URL cannot carry a path".into()))?;
            segments
                .pop_if_empty()
                .extend(["gmail", "v1", "users", self.config.user_id.as_str(), "messages"]);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .header("accept", "application/json")
            .query(params)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url_str.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClientError::Transport {
            url: url_str.clone(),
            reason: format!("reading body: {e}"),
        })?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Malformed {
            url: url_str,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MailClient for GmailClient {
    async fn list_page(
        &self,
        cursor: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListPage, ClientError> {
        let url = self.messages_url(None)?;
        let params = list_params(cursor, query);
        let page: ListPage = self.get_json(url, &params).await?;
        debug!(
            count = page.summaries.len(),
            has_next = page.next_page_token.is_some(),
            "Listed message page"
        );
        Ok(page)
    }

    async fn get_message(&self, id: &str) -> Result<RemoteMessage, ClientError> {
        let url = self.messages_url(Some(id))?;
        self.get_json(url, &[("format", "full".to_string())]).await
    }
}

/// Query string for one listing request.
fn list_params(cursor: Option<&str>, query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(token) = cursor {
        params.push(("pageToken", token.to_string()));
    }
    if let Some(q) = &query.query {
        params.push(("q", q.clone()));
    }
    for label in &query.label_ids {
        params.push(("labelIds", label.clone()));
    }
    if let Some(max) = query.max_results {
        params.push(("maxResults", max.to_string()));
    }
    if query.include_spam_trash {
        params.push(("includeSpamTrash", "true".to_string()));
    }
    params
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
