//! Chat conversation types and the wire payloads of the AI chat endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single entry in a conversation.
///
/// Messages are never edited after they are appended to a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// ISO 8601 timestamp string.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Identifier of the case a conversation is about.
///
/// Opaque to the client: used verbatim as a path segment and as the
/// `case_id` field of summary requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for CaseId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

// ── Wire payloads ──

/// Body of the start-session and continue-session requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Body of the case-summary request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSummaryRequest {
    pub case_id: CaseId,
}

/// Assistant reply embedded in a chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Response of the start-session and continue-session endpoints.
///
/// `session_id` is only present on start responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<ReplyPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the case-summary endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseSummaryReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serialises_lowercase() {
        let msg = ChatMessage::user("Hello", "2026-03-01T09:00:00Z");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn start_reply_parses() {
        let json = r#"{
            "success": true,
            "session_id": "S1",
            "message": {"content": "Hi", "timestamp": "2026-03-01T09:00:01Z"}
        }"#;
        let reply: ChatReply = serde_json::from_str(json).unwrap();
        assert!(reply.success);
        assert_eq!(reply.session_id.as_deref(), Some("S1"));
        let message = reply.message.unwrap();
        assert_eq!(message.content, "Hi");
        assert_eq!(message.timestamp.as_deref(), Some("2026-03-01T09:00:01Z"));
    }

    #[test]
    fn failure_reply_without_payload() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"success": false, "error": "quota exceeded"}"#).unwrap();
        assert!(!reply.success);
        assert!(reply.message.is_none());
        assert_eq!(reply.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn missing_success_flag_is_failure() {
        let reply: CaseSummaryReply = serde_json::from_str(r#"{"summary": "x"}"#).unwrap();
        assert!(!reply.success);
    }

    #[test]
    fn summary_request_uses_snake_case_field() {
        let body = CaseSummaryRequest {
            case_id: CaseId::from(42u64),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"case_id":"42"}"#);
    }

    #[test]
    fn case_id_display_is_verbatim() {
        assert_eq!(CaseId::new("HC-2024-001").to_string(), "HC-2024-001");
    }
}
