//! Pure projections from (log records, position) to per-view state.
//!
//! Nothing here owns or mutates state: each function folds over the
//! record prefix `seq <= position` and is idempotent, so the rendering
//! side can recompute views as often as it likes.

use serde::Serialize;

use crate::playback::controller::Mode;
use crate::timeline::record::{ActionKind, ActionRecord, ActionStatus};

/// One row of the activity feed: a record rendered through the
/// kind→presentation mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub seq: u64,
    pub status: ActionStatus,
    /// Short glyph for the kind column
    pub glyph: &'static str,
    /// Primary display line
    pub label: String,
    /// Extra lines shown under the label (command output, message text)
    pub detail: Vec<String>,
}

/// Render one record for the activity feed.
///
/// Total over the variant set: unknown kinds degrade to a text-only row
/// built from the record summary, they are never dropped.
pub fn feed_item(record: &ActionRecord) -> FeedItem {
    let (glyph, label, detail) = match &record.kind {
        ActionKind::Command { command, .. } => ("$", format!("Executing command: {command}"), vec![]),
        ActionKind::FileCreate { path, .. } => ("+", format!("Creating file: {path}"), vec![]),
        ActionKind::FileEdit { path, .. } => ("~", format!("Editing file: {path}"), vec![]),
        ActionKind::Browse { url } => ("@", format!("Browsing: {url}"), vec![]),
        ActionKind::View { target } => ("*", format!("Viewing: {target}"), vec![]),
        ActionKind::ScrollDown => ("v", "Scrolling down".to_string(), vec![]),
        ActionKind::ScrollTop => ("^", "Scrolling to top".to_string(), vec![]),
        ActionKind::Task { description } => ("#", description.clone(), vec![]),
        ActionKind::Thinking => ("…", "Thinking".to_string(), vec![]),
        ActionKind::UserMessage { text } => (">", "User".to_string(), vec![text.clone()]),
        // Fallback arm: text-only rendering for kinds this build predates.
        ActionKind::Raw { .. } => (" ", record.summary.clone(), vec![]),
    };
    FeedItem {
        seq: record.seq,
        status: record.status,
        glyph,
        label,
        detail,
    }
}

/// The activity feed at `position`: exactly the records with
/// `seq <= position`, in sequence order.
pub fn activity_feed(records: &[ActionRecord], position: u64) -> Vec<FeedItem> {
    records
        .iter()
        .filter(|r| r.seq <= position)
        .map(feed_item)
        .collect()
}

/// Content of `path` at `position`: the snapshot carried by the last
/// `file-create`/`file-edit` record for that path at or before the
/// position. Empty string if the file does not exist yet there.
pub fn file_content(records: &[ActionRecord], position: u64, path: &str) -> String {
    records
        .iter()
        .filter(|r| r.seq <= position)
        .rev()
        .find_map(|r| match &r.kind {
            ActionKind::FileCreate { path: p, content } | ActionKind::FileEdit { path: p, content }
                if p == path =>
            {
                Some(content.clone())
            }
            _ => None,
        })
        .unwrap_or_default()
}

/// The most recently touched file path at `position`, if any. This is
/// what the document pane shows by default.
pub fn active_path(records: &[ActionRecord], position: u64) -> Option<String> {
    records
        .iter()
        .filter(|r| r.seq <= position)
        .rev()
        .find_map(|r| r.kind.file_path().map(str::to_string))
}

/// The "active" record at `position`: the most recent in-progress one.
/// A newer in-progress record supersedes an older one without touching
/// the older record's status; superseded records simply stop being the
/// active one until their producer resolves them.
pub fn active_record(records: &[ActionRecord], position: u64) -> Option<&ActionRecord> {
    records
        .iter()
        .filter(|r| r.seq <= position)
        .rev()
        .find(|r| r.status == ActionStatus::InProgress)
}

/// Terminal transcript at `position`: one prompt line per command record,
/// followed by its captured output lines, in sequence order.
pub fn terminal_lines(records: &[ActionRecord], position: u64) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records.iter().filter(|r| r.seq <= position) {
        if let ActionKind::Command { command, output, .. } = &record.kind {
            lines.push(format!("$ {command}"));
            lines.extend(output.iter().cloned());
        }
    }
    lines
}

/// Read-only state pushed to every registered view whenever the log,
/// position, or mode changes. Consumers never write back except through
/// the ingestion port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub activity_feed: Vec<FeedItem>,
    /// Path shown in the document pane, when any file has been touched
    pub active_path: Option<String>,
    pub active_file_content: String,
    pub terminal_lines: Vec<String>,
    /// Scrub-bar ratio in `0.0..=1.0`
    pub progress: f64,
    pub mode: Mode,
    /// Records appended past the cursor while paused
    pub unseen: u64,
    /// A paused edit landed at the tip and awaits an explicit resume
    pub forked: bool,
}

impl RenderSnapshot {
    /// Project every view from one consistent (records, position) pair.
    ///
    /// `pinned_path` overrides the derived active path when the observer
    /// has a particular document open.
    pub fn project(
        records: &[ActionRecord],
        position: u64,
        mode: Mode,
        unseen: u64,
        forked: bool,
        pinned_path: Option<&str>,
    ) -> Self {
        let active_path = pinned_path
            .map(str::to_string)
            .or_else(|| active_path(records, position));
        let active_file_content = active_path
            .as_deref()
            .map(|p| file_content(records, position, p))
            .unwrap_or_default();
        Self {
            activity_feed: activity_feed(records, position),
            active_path,
            active_file_content,
            terminal_lines: terminal_lines(records, position),
            progress: position as f64 / (records.len() as u64).max(1) as f64,
            mode,
            unseen,
            forked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::record::ActionDraft;
    use crate::timeline::TimelineLog;

    fn sample_log() -> TimelineLog {
        let log = TimelineLog::new();
        log.append(ActionDraft::command("ls", vec!["Cargo.toml".into(), "src".into()]));
        log.append(ActionDraft::new(
            ActionKind::FileCreate {
                path: "todo.md".into(),
                content: "A".into(),
            },
            "Creating file: todo.md",
        ));
        log.append(ActionDraft::new(
            ActionKind::FileEdit {
                path: "todo.md".into(),
                content: "A\nB".into(),
            },
            "Editing file: todo.md",
        ));
        log
    }

    #[test]
    fn feed_is_the_prefix_up_to_position() {
        let records = sample_log().snapshot();
        assert_eq!(activity_feed(&records, 0).len(), 0);
        assert_eq!(activity_feed(&records, 2).len(), 2);
        let full = activity_feed(&records, 3);
        assert_eq!(full.len(), 3);
        assert!(full.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn file_content_folds_to_last_snapshot() {
        let records = sample_log().snapshot();
        assert_eq!(file_content(&records, 1, "todo.md"), "");
        assert_eq!(file_content(&records, 2, "todo.md"), "A");
        assert_eq!(file_content(&records, 3, "todo.md"), "A\nB");
        assert_eq!(file_content(&records, 3, "other.md"), "");
    }

    #[test]
    fn active_path_tracks_latest_touch() {
        let records = sample_log().snapshot();
        assert_eq!(active_path(&records, 1), None);
        assert_eq!(active_path(&records, 3).as_deref(), Some("todo.md"));
    }

    #[test]
    fn terminal_prompt_then_output() {
        let records = sample_log().snapshot();
        assert_eq!(
            terminal_lines(&records, 3),
            vec!["$ ls".to_string(), "Cargo.toml".to_string(), "src".to_string()]
        );
        assert!(terminal_lines(&records, 0).is_empty());
    }

    #[test]
    fn newest_in_progress_record_is_the_active_one() {
        let log = TimelineLog::new();
        log.append(ActionDraft::command("sleep 5", vec![]).with_status(ActionStatus::InProgress));
        log.append(ActionDraft::command("sleep 9", vec![]).with_status(ActionStatus::InProgress));

        let records = log.snapshot();
        assert_eq!(active_record(&records, 2).unwrap().seq, 2);
        // The superseded record keeps its own status untouched.
        assert_eq!(records[0].status, ActionStatus::InProgress);
        // Scrubbed back before the second record, the first is active again.
        assert_eq!(active_record(&records, 1).unwrap().seq, 1);

        log.update_status(2, ActionStatus::Completed).unwrap();
        let records = log.snapshot();
        assert_eq!(active_record(&records, 2).unwrap().seq, 1);
    }

    #[test]
    fn raw_kind_renders_as_text_fallback() {
        let log = TimelineLog::new();
        log.append(ActionDraft::new(
            ActionKind::Raw {
                data: serde_json::json!({"type": "teleport"}),
            },
            "Teleporting",
        ));
        let records = log.snapshot();
        let feed = activity_feed(&records, 1);
        assert_eq!(feed.len(), 1, "unknown kinds must not be dropped");
        assert_eq!(feed[0].label, "Teleporting");
    }

    #[test]
    fn projection_is_idempotent() {
        let records = sample_log().snapshot();
        let a = RenderSnapshot::project(&records, 2, Mode::Paused, 1, false, None);
        let b = RenderSnapshot::project(&records, 2, Mode::Paused, 1, false, None);
        assert_eq!(a, b);
    }
}
