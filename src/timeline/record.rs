use serde::{Deserialize, Serialize};

/// One recorded agent action, with a variant-specific payload.
///
/// The set is closed; `Raw` is the in-memory escape hatch for payloads
/// outside the vocabulary, and renderers must show it as plain text
/// rather than drop it. On the tape path an unknown `type` tag is
/// rejected at parse time (it cannot fall through to `Raw`), so a tape
/// written by a newer vocabulary fails loading instead of degrading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Shell command execution with captured output lines
    Command {
        command: String,
        #[serde(default)]
        output: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },

    /// New file written with its initial content
    FileCreate { path: String, content: String },

    /// File rewritten; `content` is the full resulting snapshot
    FileEdit { path: String, content: String },

    /// Page navigation
    Browse { url: String },

    /// Agent opened a document or resource for reading
    View { target: String },

    /// Scrolled down in the current view
    ScrollDown,

    /// Jumped back to the top of the current view
    ScrollTop,

    /// High-level task boundary
    Task { description: String },

    /// Model reasoning pause, no payload
    Thinking,

    /// Message from the human operator
    UserMessage { text: String },

    /// Unknown action kind (for forward compatibility)
    Raw { data: serde_json::Value },
}

impl ActionKind {
    /// Get a human-readable kind name for display
    pub fn kind_name(&self) -> &'static str {
        match self {
            ActionKind::Command { .. } => "command",
            ActionKind::FileCreate { .. } => "file-create",
            ActionKind::FileEdit { .. } => "file-edit",
            ActionKind::Browse { .. } => "browse",
            ActionKind::View { .. } => "view",
            ActionKind::ScrollDown => "scroll-down",
            ActionKind::ScrollTop => "scroll-top",
            ActionKind::Task { .. } => "task",
            ActionKind::Thinking => "thinking",
            ActionKind::UserMessage { .. } => "user-message",
            ActionKind::Raw { .. } => "raw",
        }
    }

    /// Target path, for the file-backed variants.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            ActionKind::FileCreate { path, .. } | ActionKind::FileEdit { path, .. } => {
                Some(path.as_str())
            }
            _ => None,
        }
    }
}

/// Lifecycle state of a recorded action.
///
/// Transitions only move forward: `Pending → InProgress → {Completed, Failed}`.
/// Terminal states never regress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the forward-only order.
    /// Setting the same status again is allowed (idempotent updates).
    pub fn can_transition_to(self, next: ActionStatus) -> bool {
        use ActionStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Pending, InProgress) | (Pending, Completed) | (Pending, Failed) => true,
            (InProgress, Completed) | (InProgress, Failed) => true,
            _ => false,
        }
    }
}

/// One immutable unit of recorded agent history.
///
/// `seq` is assigned by the log at append time and is the sole ordering
/// key; `ts_ms` is wall-clock capture time, kept for display only.
/// `status` is the single field that may change after append, and only
/// forward along the `ActionStatus` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seq: u64,
    pub ts_ms: u64,
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub summary: String,
}

/// A not-yet-appended action: everything a producer supplies.
///
/// There is deliberately no `seq` field here, so live callers cannot
/// submit a conflicting sequence number.
#[derive(Debug, Clone)]
pub struct ActionDraft {
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub summary: String,
}

impl ActionDraft {
    pub fn new(kind: ActionKind, summary: impl Into<String>) -> Self {
        Self {
            kind,
            status: ActionStatus::Completed,
            summary: summary.into(),
        }
    }

    pub fn with_status(mut self, status: ActionStatus) -> Self {
        self.status = status;
        self
    }

    /// Shorthand for a completed command with captured output.
    pub fn command(command: impl Into<String>, output: Vec<String>) -> Self {
        let command = command.into();
        Self::new(
            ActionKind::Command {
                command: command.clone(),
                output,
                exit_code: Some(0),
            },
            format!("Executing command: {command}"),
        )
    }
}

pub(crate) fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
