//! AI agent endpoint.

use tracing::debug;

use super::{AGENT_PATH, ApiClient};
use crate::Result;
use crate::models::AgentReply;

impl ApiClient {
    /// Forwards a prompt to the backend's agent and returns its reply text.
    ///
    /// # Errors
    ///
    /// Returns a rejection, network, or JSON error.
    pub async fn ask_agent(&self, prompt: &str) -> Result<String> {
        let builder = self.authed(self.post(AGENT_PATH)?)?.form(&[("prompt", prompt)]);
        let response = self.execute("agent", builder).await?;
        let reply: AgentReply = Self::json(response).await?;
        debug!(prompt_len = prompt.len(), reply_len = reply.text.len(), "agent replied");
        Ok(reply.text)
    }
}
