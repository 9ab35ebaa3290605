use async_trait::async_trait;
use lexdesk_core::CaseId;
use lexdesk_core::chat::{CaseSummaryReply, ChatReply};

use crate::ClientError;

/// The three AI chat endpoints a [`ChatSession`](crate::ChatSession) talks to.
///
/// Implementations return `Ok` for any decodable reply, including
/// `success: false` ones; `Err` is reserved for transport failures.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a new conversation about `case_id` with its first message.
    async fn start_session(
        &self,
        case_id: &CaseId,
        message: &str,
    ) -> Result<ChatReply, ClientError>;

    /// Post a follow-up message to an existing conversation.
    async fn continue_session(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, ClientError>;

    /// Ask for a one-off summary of `case_id`.
    async fn case_summary(&self, case_id: &CaseId) -> Result<CaseSummaryReply, ClientError>;
}
