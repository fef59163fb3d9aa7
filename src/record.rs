//! Message record: the persisted unit, and its assembly from a fetched message.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::extract::extract_text;
use crate::mail::{MessagePayload, RemoteMessage};

/// Header names copied into a record. Matching is case-sensitive.
pub const RECORDED_HEADERS: [&str; 3] = ["From", "Date", "Subject"];

/// One stored message: id, extracted body text, and the recorded headers.
///
/// Serialises with header fields under their header names, so a stored file
/// looks like `{"Date": …, "From": …, "Subject": …, "body": …, "id": …}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "From", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "Date", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl MessageRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the record stored under `id` from a fetched message.
    ///
    /// `id` is the listing id the message was requested by, so the record's
    /// id always matches its storage key. Fails only if a body payload is not
    /// valid base64url.
    pub fn from_remote(id: impl Into<String>, message: &RemoteMessage) -> Result<Self, ExtractError> {
        let mut record = Self::new(id).with_body(assemble_body(&message.payload)?);
        for header in &message.payload.headers {
            record.set_header(&header.name, &header.value);
        }
        Ok(record)
    }

    /// Set a recorded header. Names outside [`RECORDED_HEADERS`] are ignored.
    /// Returns whether the header was recorded.
    pub fn set_header(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "From" => &mut self.from,
            "Date" => &mut self.date,
            "Subject" => &mut self.subject,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    /// Look up a recorded header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        match name {
            "From" => self.from.as_deref(),
            "Date" => self.date.as_deref(),
            "Subject" => self.subject.as_deref(),
            _ => None,
        }
    }
}

/// Body text of a payload.
///
/// A top-level body with data wins; otherwise every top-level part that
/// carries data is extracted and concatenated in order. Nested parts are
/// not descended into.
fn assemble_body(payload: &MessagePayload) -> Result<String, ExtractError> {
    if let Some(data) = &payload.body.data {
        return extract_text(data);
    }

    let mut body = String::new();
    for data in payload.parts.iter().filter_map(|p| p.body.data.as_ref()) {
        body.push_str(&extract_text(data)?);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    use super::*;
    use crate::mail::{Header, MessagePart, PartBody};

    fn encoded(s: &str) -> String {
        URL_SAFE.encode(s)
    }

    fn part(data: Option<&str>) -> MessagePart {
        MessagePart {
            mime_type: Some("text/html".into()),
            body: PartBody {
                data: data.map(encoded),
                size: None,
            },
        }
    }

    #[test]
    fn single_payload_body() {
        let message = RemoteMessage {
            id: "m1".into(),
            payload: MessagePayload {
                body: PartBody::with_data(encoded("<html><body>Hello</body></html>")),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = MessageRecord::from_remote(&message.id, &message).unwrap();
        assert_eq!(record.id, "m1");
        assert_eq!(record.body, "Hello");
    }

    #[test]
    fn multipart_concatenates_in_order() {
        let message = RemoteMessage {
            id: "m2".into(),
            payload: MessagePayload {
                parts: vec![part(Some("<p>A</p>")), part(Some("<p>B</p>")), part(None)],
                ..Default::default()
            },
            ..Default::default()
        };
        let record = MessageRecord::from_remote(&message.id, &message).unwrap();
        assert_eq!(record.body, "AB");
    }

    #[test]
    fn top_level_data_ignores_parts() {
        let message = RemoteMessage {
            id: "m3".into(),
            payload: MessagePayload {
                body: PartBody::with_data(encoded("top")),
                parts: vec![part(Some("<p>part</p>"))],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(MessageRecord::from_remote(&message.id, &message).unwrap().body, "top");
    }

    #[test]
    fn no_payload_gives_empty_body() {
        let message = RemoteMessage {
            id: "m4".into(),
            ..Default::default()
        };
        let record = MessageRecord::from_remote(&message.id, &message).unwrap();
        assert_eq!(record.body, "");
    }

    #[test]
    fn headers_are_filtered_case_sensitively() {
        let message = RemoteMessage {
            id: "m5".into(),
            payload: MessagePayload {
                headers: vec![
                    Header::new("Subject", "Hi"),
                    Header::new("Cc", "x@y.com"),
                    Header::new("from", "lowercase@ignored.com"),
                    Header::new("Date", "Mon, 1 Jan 2024 10:00:00 +0000"),
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        let record = MessageRecord::from_remote(&message.id, &message).unwrap();
        assert_eq!(record.subject.as_deref(), Some("Hi"));
        assert_eq!(record.date.as_deref(), Some("Mon, 1 Jan 2024 10:00:00 +0000"));
        assert!(record.from.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Subject"], "Hi");
        assert!(json.get("Cc").is_none());
        assert!(json.get("From").is_none());
    }

    #[test]
    fn repeated_header_last_wins() {
        let mut record = MessageRecord::new("m6");
        assert!(record.set_header("Subject", "first"));
        assert!(record.set_header("Subject", "second"));
        assert!(!record.set_header("X-Mailer", "ignored"));
        assert_eq!(record.header("Subject"), Some("second"));
        assert_eq!(record.header("X-Mailer"), None);
    }

    #[test]
    fn bad_part_data_fails() {
        let message = RemoteMessage {
            id: "m7".into(),
            payload: MessagePayload {
                parts: vec![
                    part(Some("<p>fine</p>")),
                    MessagePart {
                        mime_type: None,
                        body: PartBody::with_data("%%%"),
                    },
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(MessageRecord::from_remote(&message.id, &message).is_err());
    }

    #[test]
    fn body_always_serialized() {
        let json = serde_json::to_value(MessageRecord::new("empty")).unwrap();
        assert_eq!(json["body"], "");
        assert_eq!(json["id"], "empty");
    }

    #[test]
    fn deserializes_without_optional_headers() {
        let record: MessageRecord =
            serde_json::from_str(r#"{"id": "x", "body": "text", "From": "a@b.c"}"#).unwrap();
        assert_eq!(record.from.as_deref(), Some("a@b.c"));
        assert!(record.subject.is_none());
    }
}
