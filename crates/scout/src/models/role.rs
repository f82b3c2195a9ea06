use serde::{Deserialize, Serialize};

/// Who authored a message in the transcript. The system and tool roles
/// only exist on the wire: the system prompt is attached per request by
/// the provider, and tool results are carried as `ToolResponse` content
/// until conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
