use anyhow::Result;
use console::style;
use futures::StreamExt;
use rustyline::DefaultEditor;

use scout::agent::Agent;
use scout::models::message::{Message, MessageContent};
use scout::models::role::Role;
use scout::prompts;

/// Interactive mission loop. Owns the conversation transcript, which is
/// append-only and shared across missions for the life of the process.
pub struct Session {
    agent: Agent,
    mission: Option<String>,
}

impl Session {
    pub fn new(agent: Agent, mission: Option<String>) -> Self {
        Session { agent, mission }
    }

    pub async fn start(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        let mut messages: Vec<Message> = Vec::new();

        loop {
            // A mission passed on the command line bypasses the prompt once
            let mission = match self.mission.take() {
                Some(mission) => mission,
                None => {
                    let prompt = format!(
                        "{} {} ",
                        style("Enter new mission").blue(),
                        style("(blank to exit) >").dim()
                    );
                    match editor.readline(&prompt) {
                        Ok(line) if !line.trim().is_empty() => line,
                        _ => break,
                    }
                }
            };

            messages.push(Message::user().with_text(prompts::mission_prompt(mission.trim())));

            println!("{}", style("Planning...").blue());
            let mut stream = match self.agent.reply(&messages).await {
                Ok(stream) => stream,
                Err(e) => {
                    eprintln!("{} {}", style("Error:").red(), e);
                    continue;
                }
            };

            let mut failed = false;
            while let Some(response) = stream.next().await {
                match response {
                    Ok(message) => {
                        render_progress(&message);
                        messages.push(message);
                    }
                    Err(e) => {
                        eprintln!("{} {}", style("Error:").red(), e);
                        failed = true;
                        break;
                    }
                }
            }
            drop(stream);

            // The mission's answer is the last non-empty assistant text
            if !failed {
                let answer = messages
                    .iter()
                    .rev()
                    .filter(|message| message.role == Role::Assistant)
                    .map(|message| message.text())
                    .find(|text| !text.trim().is_empty());
                if let Some(answer) = answer {
                    println!("{}", style("=== Result ===").dim());
                    println!("{}", style(answer.trim()).green());
                    println!("{}", style("==============").dim());
                }
            }
        }

        Ok(())
    }
}

/// One progress line per tool request; final text is printed separately
/// once the mission settles.
fn render_progress(message: &Message) {
    for content in &message.content {
        if let MessageContent::ToolRequest(request) = content {
            match &request.tool_call {
                Ok(call) => println!(
                    "{} {}",
                    style(&call.name).magenta(),
                    style(call.arguments.to_string()).dim()
                ),
                Err(e) => println!("{} {}", style("Malformed tool call:").red(), e),
            }
        }
    }
}
