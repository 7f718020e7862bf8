//! Conversation log storage port

use crate::ports::backend_error::BackendError;
use async_trait::async_trait;
use bestself_domain::{ConversationMessage, ConversationRecord, NewConversation};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, conversation: &NewConversation)
    -> Result<ConversationRecord, BackendError>;

    async fn append_message(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), BackendError>;

    async fn complete(
        &self,
        conversation_id: &str,
        summary: &str,
        key_insights: &[String],
    ) -> Result<ConversationRecord, BackendError>;

    async fn add_tags(
        &self,
        conversation_id: &str,
        tags: &[String],
    ) -> Result<ConversationRecord, BackendError>;

    async fn search(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<ConversationRecord>, BackendError>;
}
