//! AI agent reply model.

use serde::Deserialize;

/// Body of a successful `POST APIServices/Agent`.
///
/// The gateway either wraps the reply as `agentResponse` or relays the
/// model server's raw generation body, whose text lives in `response`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentReply {
    #[serde(rename = "agentResponse", alias = "response")]
    pub text: String,
}
