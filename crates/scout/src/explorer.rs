use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::prompts::SUMMARY_PROMPT;
use crate::providers::base::Provider;
use crate::systems::System;

/// Number of leading bytes inspected when deciding whether a file is text.
const CLASSIFY_HEADER_LEN: usize = 512;

/// Size of one `study_file_contents` page window, in bytes. Page N covers
/// byte offsets [N * PAGE_SIZE, N * PAGE_SIZE + PAGE_SIZE).
const PAGE_SIZE: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Binary,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Text => write!(f, "text"),
            FileKind::Binary => write!(f, "binary"),
        }
    }
}

/// Heuristic deciding whether a file may be forwarded to the model.
/// Pluggable so a stronger detector can replace the default without
/// touching the tool logic.
pub trait FileClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> AgentResult<FileKind>;
}

/// Default classifier: a file is text when its leading bytes are valid
/// UTF-8. A valid-looking binary prefix is an accepted false positive.
pub struct Utf8Classifier;

impl FileClassifier for Utf8Classifier {
    fn classify(&self, path: &Path) -> AgentResult<FileKind> {
        let mut file = File::open(path)
            .map_err(|e| AgentError::ExecutionError(format!("Error opening file: {}", e)))?;
        let mut header = [0u8; CLASSIFY_HEADER_LEN];
        let n = file
            .read(&mut header)
            .map_err(|e| AgentError::ExecutionError(format!("Error reading file header: {}", e)))?;

        match std::str::from_utf8(&header[..n]) {
            Ok(_) => Ok(FileKind::Text),
            // error_len() of None means the header ends inside a multi-byte
            // sequence, which still looks like text
            Err(e) if e.error_len().is_none() => Ok(FileKind::Text),
            Err(_) => Ok(FileKind::Binary),
        }
    }
}

/// A candidate path is admissible only if it is relative and never leaves
/// `root`, either lexically (traversal segments) or through a symlink.
/// Returns the joined path on success.
fn check_sandbox(root: &Path, candidate: &str) -> AgentResult<PathBuf> {
    let path = Path::new(candidate);
    if path.is_absolute() {
        return Err(AgentError::SandboxViolation(candidate.to_string()));
    }

    let mut depth: i64 = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(AgentError::SandboxViolation(candidate.to_string()));
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(AgentError::SandboxViolation(candidate.to_string()));
            }
        }
    }

    let joined = root.join(path);

    // A lexically contained path can still escape through a symlink
    if let Ok(resolved) = joined.canonicalize() {
        let root_resolved = root
            .canonicalize()
            .map_err(|e| AgentError::Internal(format!("cannot resolve working directory: {}", e)))?;
        if !resolved.starts_with(&root_resolved) {
            return Err(AgentError::SandboxViolation(candidate.to_string()));
        }
    }

    Ok(joined)
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> AgentResult<T> {
    serde_json::from_value(arguments).map_err(|e| AgentError::InvalidParameters(e.to_string()))
}

fn default_path() -> String {
    ".".to_string()
}

#[derive(Deserialize)]
struct BrowseArgs {
    #[serde(default = "default_path")]
    path: String,
}

#[derive(Deserialize)]
struct StudyArgs {
    path: String,
    question: String,
    #[serde(default)]
    page: u64,
}

/// Read-only filesystem access the agent can pilot. Both tools are
/// sandboxed to the root the system was created with; study delegates
/// the extracted window to the provider for summarization.
pub struct ExplorerSystem {
    tools: Vec<Tool>,
    root: PathBuf,
    provider: Arc<dyn Provider>,
    classifier: Box<dyn FileClassifier>,
}

impl ExplorerSystem {
    pub fn new(root: PathBuf, provider: Arc<dyn Provider>) -> Self {
        Self::with_classifier(root, provider, Box::new(Utf8Classifier))
    }

    pub fn with_classifier(
        root: PathBuf,
        provider: Arc<dyn Provider>,
        classifier: Box<dyn FileClassifier>,
    ) -> Self {
        let browse_tool = Tool::new(
            "browse_directory",
            "List immediate children of a target directory.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "default": ".",
                        "description": "Target directory relative to current working directory"
                    }
                },
                "required": ["path"]
            }),
        );

        let study_tool = Tool::new(
            "study_file_contents",
            "Study the contents of a text file to answer a question.",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Target file relative to current working directory"
                    },
                    "question": {
                        "type": "string",
                        "description": "What would you like to know about the file"
                    },
                    "page": {
                        "type": "integer",
                        "default": 0,
                        "description": "Zero-based 2000-byte page of the file to read"
                    }
                },
                "required": ["path", "question"]
            }),
        );

        Self {
            tools: vec![browse_tool, study_tool],
            root,
            provider,
            classifier,
        }
    }

    async fn browse_directory(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: BrowseArgs = parse_args(arguments)?;
        tracing::info!(path = %args.path, "analyzing directory");

        let dir = check_sandbox(&self.root, &args.path)?;
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| AgentError::ExecutionError(format!("Error reading directory: {}", e)))?;

        let mut text_files = Vec::new();
        let mut binary_files = Vec::new();
        let mut subdirectories = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| {
                AgentError::ExecutionError(format!("Error reading directory: {}", e))
            })?;
            let display = Path::new(&args.path).join(entry.file_name());
            let display = format!("`{}`", display.display());

            let file_type = entry.file_type().map_err(|e| {
                AgentError::ExecutionError(format!("Error reading directory: {}", e))
            })?;
            if file_type.is_dir() {
                subdirectories.push(display);
            } else {
                match self.classifier.classify(&entry.path())? {
                    FileKind::Text => text_files.push(display),
                    FileKind::Binary => binary_files.push(display),
                }
            }
        }

        let mut parts = Vec::new();
        for (label, mut group) in [
            ("text files", text_files),
            ("binary files", binary_files),
            ("subdirectories", subdirectories),
        ] {
            if group.is_empty() {
                continue;
            }
            group.sort();
            parts.push(format!("- {}: {}", label, group.join(", ")));
        }

        Ok(vec![Content::text(format!(
            "browse_directory `{}` results:\n{}",
            args.path,
            parts.join("\n")
        ))])
    }

    async fn study_file_contents(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: StudyArgs = parse_args(arguments)?;
        tracing::info!(path = %args.path, page = args.page, question = %args.question, "studying file");

        let file_path = check_sandbox(&self.root, &args.path)?;

        match self.classifier.classify(&file_path)? {
            FileKind::Text => {}
            other => return Err(AgentError::NotTextFile(other.to_string())),
        }

        let size = std::fs::metadata(&file_path)
            .map_err(|e| AgentError::ExecutionError(format!("Error getting file info: {}", e)))?
            .len();

        let offset = args
            .page
            .checked_mul(PAGE_SIZE)
            .ok_or_else(|| AgentError::InvalidParameters(format!("page {} is out of range", args.page)))?;
        if offset > 0 && offset >= size {
            return Err(AgentError::InvalidParameters(format!(
                "page {} is beyond the end of `{}` ({} bytes)",
                args.page, args.path, size
            )));
        }

        let mut file = File::open(&file_path)
            .map_err(|e| AgentError::ExecutionError(format!("Error opening file: {}", e)))?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| AgentError::ExecutionError(format!("Error reading file: {}", e)))?;
        let mut window = Vec::with_capacity(PAGE_SIZE as usize);
        file.take(PAGE_SIZE)
            .read_to_end(&mut window)
            .map_err(|e| AgentError::ExecutionError(format!("Error reading file: {}", e)))?;
        let read = window.len() as u64;
        // A page boundary may cut a multi-byte character in half
        let window = String::from_utf8_lossy(&window);

        let note = if size > PAGE_SIZE {
            format!(
                "\nTRUNCATED FILE. Bytes {} to {} of {}. Request another page to read a different section.",
                offset,
                offset + read,
                size
            )
        } else {
            String::new()
        };

        let exchange = vec![Message::user()
            .with_text(format!("{}\nThe question: {}", window, args.question))];
        let completion = self
            .provider
            .complete(SUMMARY_PROMPT, &exchange, &[])
            .await
            .map_err(|e| AgentError::ExecutionError(format!("Error analyzing file: {}", e)))?;

        Ok(vec![Content::text(format!(
            "study_file_contents `{}` results\nQuestion: {}\nAnswer: {}{}",
            args.path,
            args.question,
            completion.message.text().trim(),
            note
        ))])
    }
}

#[async_trait]
impl System for ExplorerSystem {
    fn name(&self) -> &str {
        "explorer"
    }

    fn description(&self) -> &str {
        "Read-only access to the files of the current project"
    }

    fn instructions(&self) -> &str {
        "You can browse directories and study text files inside the current \
working directory. All paths are relative to the project root; parent \
traversal and absolute paths are rejected. Files are read one 2000-byte \
page at a time."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "browse_directory" => self.browse_directory(tool_call.arguments).await,
            "study_file_contents" => self.study_file_contents(tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
