use regex::Regex;

use crate::tape::Tape;
use crate::timeline::record::{ActionKind, ActionRecord};

/// Redacts secrets from a tape before it is shared.
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    patterns: Vec<Regex>,
}

impl RedactionConfig {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn default_patterns() -> Vec<Regex> {
        // Keep patterns simple: the Rust `regex` crate doesn't support look-behind.
        let raw = [
            r"sk-[A-Za-z0-9]{10,}",
            r"Bearer\s+[A-Za-z0-9._-]{10,}",
            r"(?i)anthropic[_-]?api[_-]?key\s*=\s*[A-Za-z0-9._-]{10,}",
            r"(?i)openai[_-]?api[_-]?key\s*=\s*[A-Za-z0-9._-]{10,}",
        ];
        raw.into_iter().filter_map(|p| Regex::new(p).ok()).collect()
    }

    pub fn default_shareable() -> Self {
        Self::new(Self::default_patterns())
    }

    pub fn redact_string(&self, input: &str) -> String {
        let mut out = input.to_string();
        for re in &self.patterns {
            out = re.replace_all(&out, "[REDACTED]").into_owned();
        }
        out
    }

    pub fn redact_tape(&self, tape: &mut Tape) {
        for record in &mut tape.records {
            self.redact_record(record);
        }
    }

    /// Best-effort: only the text-bearing payload fields are touched;
    /// structure, sequences, and statuses stay intact.
    fn redact_record(&self, record: &mut ActionRecord) {
        record.summary = self.redact_string(&record.summary);
        match &mut record.kind {
            ActionKind::Command {
                command, output, ..
            } => {
                *command = self.redact_string(command);
                for line in output.iter_mut() {
                    *line = self.redact_string(line);
                }
            }
            ActionKind::FileCreate { content, .. } | ActionKind::FileEdit { content, .. } => {
                *content = self.redact_string(content);
            }
            ActionKind::Browse { url } => {
                *url = self.redact_string(url);
            }
            ActionKind::UserMessage { text } => {
                *text = self.redact_string(text);
            }
            // Paths, scroll markers, task labels, and raw payloads are
            // left alone for now.
            _ => {}
        }
    }
}
