//! The boundary by which an external agent reports actions into the log.
//!
//! Real producers (a shell executor, a browser driver, an editor bridge)
//! do their blocking work first and then call [`IngestionPort::submit`]
//! with the reported effect; the engine itself never blocks. The
//! [`ScriptedSource`] drives any port from a fixed action script, for
//! tests and the demo binary.

use std::time::Duration;

use crate::timeline::record::{ActionDraft, ActionStatus};
use crate::timeline::TimelineError;

/// Write side of the engine. `submit` cannot fail: the log owns sequence
/// assignment. `update_status` rejects unknown sequences and status
/// regressions, leaving the log unchanged.
pub trait IngestionPort: Send + Sync {
    fn submit(&self, draft: ActionDraft) -> u64;

    fn update_status(&self, seq: u64, status: ActionStatus) -> Result<(), TimelineError>;
}

/// Feeds a pre-configured action script into an ingestion port without
/// running anything for real. Each step is submitted in-progress, then
/// resolved to its scripted final status.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    steps: Vec<ScriptedStep>,
    /// Delay between steps (simulates streaming)
    step_delay: Duration,
}

#[derive(Clone)]
struct ScriptedStep {
    draft: ActionDraft,
    final_status: ActionStatus,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step; `draft.status` is taken as the final status it should
    /// resolve to once "executed".
    pub fn with_step(mut self, draft: ActionDraft) -> Self {
        let final_status = draft.status;
        self.steps.push(ScriptedStep {
            draft: draft.with_status(ActionStatus::InProgress),
            final_status,
        });
        self
    }

    pub fn with_steps(self, drafts: impl IntoIterator<Item = ActionDraft>) -> Self {
        drafts.into_iter().fold(self, Self::with_step)
    }

    /// Configure delay between steps (default: `Duration::ZERO`)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Play the script into `port`, in order. Returns the sequences issued.
    pub async fn run(&self, port: &dyn IngestionPort) -> Vec<u64> {
        let mut issued = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            let seq = port.submit(step.draft.clone());
            if let Err(err) = port.update_status(seq, step.final_status) {
                tracing::warn!(seq, error = %err, "scripted status resolution rejected");
            }
            issued.push(seq);
        }
        issued
    }
}

/// A small built-in script exercising every view: commands, file edits,
/// browsing, and a user message. Used by the demo binary and tests.
pub fn demo_script() -> ScriptedSource {
    use crate::timeline::record::ActionKind;

    ScriptedSource::new().with_steps([
        ActionDraft::new(
            ActionKind::Task {
                description: "Draft the project plan".into(),
            },
            "Draft the project plan",
        ),
        ActionDraft::new(ActionKind::Thinking, "Thinking"),
        ActionDraft::command("ls", vec!["Cargo.toml".into(), "src".into()]),
        ActionDraft::new(
            ActionKind::FileCreate {
                path: "plan.md".into(),
                content: "# Plan\n".into(),
            },
            "Creating file: plan.md",
        ),
        ActionDraft::new(
            ActionKind::Browse {
                url: "https://docs.rs/tokio".into(),
            },
            "Browsing: https://docs.rs/tokio",
        ),
        ActionDraft::new(ActionKind::ScrollDown, "Scrolling down"),
        ActionDraft::new(
            ActionKind::FileEdit {
                path: "plan.md".into(),
                content: "# Plan\n- [ ] survey APIs\n".into(),
            },
            "Editing file: plan.md",
        ),
        ActionDraft::new(
            ActionKind::UserMessage {
                text: "looks good, keep going".into(),
            },
            "User message",
        ),
    ])
}
