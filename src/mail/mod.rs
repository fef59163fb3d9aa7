//! Remote mail provider abstraction.
//!
//! The fetch loop only needs two calls: list one page of message ids and
//! fetch one message. The page token is returned explicitly and threaded
//! through by the caller; clients hold no listing state.

pub mod gmail;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub use gmail::{GmailClient, GmailConfig};

/// Minimal reference to a remote message, as returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl MessageSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread_id: None,
        }
    }
}

/// One page of a message listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Summaries on this page. Gmail omits the key entirely on an empty page.
    #[serde(default, rename = "messages")]
    pub summaries: Vec<MessageSummary>,
    /// Continuation token; `None` means this is the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u64>,
}

/// Filters applied to every listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Provider search expression (Gmail `q`).
    pub query: Option<String>,
    pub label_ids: Vec<String>,
    /// Page size hint.
    pub max_results: Option<u32>,
    pub include_spam_trash: bool,
}

/// A fully fetched message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub payload: MessagePayload,
}

/// Top-level MIME payload of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// One declared body part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub body: PartBody,
}

/// Body of a payload or part. `data` is base64url text when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl PartBody {
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            size: None,
        }
    }
}

/// A single message header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Remote listing/fetch collaborator.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Fetch one listing page. `cursor` is `None` for the first page.
    async fn list_page(
        &self,
        cursor: Option<&str>,
        query: &ListQuery,
    ) -> Result<ListPage, ClientError>;

    /// Fetch one message with its full payload.
    async fn get_message(&self, id: &str) -> Result<RemoteMessage, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_page_from_gmail_json() {
        let json = r#"{
            "messages": [
                {"id": "18c1", "threadId": "18c0"},
                {"id": "18c2", "threadId": "18c0"}
            ],
            "nextPageToken": "tok-2",
            "resultSizeEstimate": 201
        }"#;
        let page: ListPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.summaries.len(), 2);
        assert_eq!(page.summaries[0].id, "18c1");
        assert_eq!(page.summaries[1].thread_id.as_deref(), Some("18c0"));
        assert_eq!(page.next_page_token.as_deref(), Some("tok-2"));
        assert_eq!(page.result_size_estimate, Some(201));
    }

    #[test]
    fn empty_list_page_omits_messages() {
        let page: ListPage = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(page.summaries.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn multipart_message_from_gmail_json() {
        let json = r#"{
            "id": "abc",
            "threadId": "t1",
            "labelIds": ["INBOX"],
            "snippet": "ignored",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "alice@example.com"},
                    {"name": "Subject", "value": "Hi"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"partId": "0", "mimeType": "text/plain", "body": {"size": 2, "data": "SGk="}},
                    {"partId": "1", "mimeType": "application/pdf", "body": {"attachmentId": "x", "size": 9}}
                ]
            }
        }"#;
        let msg: RemoteMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "abc");
        assert!(msg.payload.body.data.is_none());
        assert_eq!(msg.payload.headers.len(), 2);
        assert_eq!(msg.payload.parts.len(), 2);
        assert_eq!(msg.payload.parts[0].body.data.as_deref(), Some("SGk="));
        assert!(msg.payload.parts[1].body.data.is_none());
    }

    #[test]
    fn message_without_payload_defaults() {
        let msg: RemoteMessage = serde_json::from_str(r#"{"id": "bare"}"#).unwrap();
        assert!(msg.payload.headers.is_empty());
        assert!(msg.payload.parts.is_empty());
        assert!(msg.payload.body.data.is_none());
    }
}
