use async_trait::async_trait;

use crate::error::GatewayError;
use crate::message::Message;
use crate::model::ModelId;

/// The text-generation service a session talks to.
///
/// One call per turn: the full transcript goes in, the generated reply
/// comes back. Implementations own transport, auth and timeouts; callers
/// do not retry.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<String, GatewayError>;

    fn model(&self) -> &ModelId;
}
