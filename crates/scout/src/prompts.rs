//! Prompt text the agent runs on.

/// Persona attached as the system message of every planning call.
pub const AGENT_PROMPT: &str = "You are autonomous software developer in a codebase. \
ALWAYS go deep, be slow and thorough. NEVER be quick or efficient. \
NEVER seek guidance or input from the user.";

/// System prompt for the standalone file-summarization exchange. No tool
/// schema is attached to that call, so it cannot recurse into tool use.
pub const SUMMARY_PROMPT: &str = "Answer the question in plain english (no markdown) \
strictly based on provided file text. Answer must be concise, thorough, and \
information dense.";

/// Wrap a new mission in the standing instructions before it joins the
/// transcript as a user message.
pub fn mission_prompt(mission: &str) -> String {
    format!(
        "Be thorough, dig deep, explore everything, and speak briefly. \
NEVER speculate, ALWAYS investigate. Start by just exploring the codebase. \
My query is: {}",
        mission
    )
}
