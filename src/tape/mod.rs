//! JSONL tape format: the natural on-disk representation of a timeline.
//!
//! First line is a header carrying the schema version, then one record
//! per line in sequence order, optionally followed by a control line
//! with the last-known playback position and mode. Replaying a tape
//! reapplies records through the log's validated append path, so a
//! corrupt or reordered tape is rejected rather than half-loaded.

pub mod redact;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::playback::controller::Mode;
use crate::timeline::record::{now_ms, ActionRecord};
use crate::timeline::{TimelineError, TimelineLog};

pub const TAPE_SCHEMA_VERSION: u32 = 1;

/// Last-known playback state, stored as the tape's trailing control line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapeControl {
    pub position: u64,
    pub mode: Mode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TapeJsonlLine {
    Header {
        schema_version: u32,
        created_at_ms: u64,
    },
    Record {
        record: ActionRecord,
    },
    Control {
        control: TapeControl,
    },
}

/// A fully loaded tape.
#[derive(Debug, Clone)]
pub struct Tape {
    pub schema_version: u32,
    pub created_at_ms: u64,
    pub records: Vec<ActionRecord>,
    pub control: Option<TapeControl>,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            records: Vec::new(),
            control: None,
        }
    }

    /// Snapshot a log (and optionally its playback state) into a tape.
    pub fn from_log(log: &TimelineLog, control: Option<TapeControl>) -> Self {
        Self {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            records: log.snapshot(),
            control,
        }
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = TapeJsonlLine::Header {
            schema_version: self.schema_version,
            created_at_ms: self.created_at_ms,
        };
        write_line(&mut writer, &header)?;
        for record in &self.records {
            write_line(
                &mut writer,
                &TapeJsonlLine::Record {
                    record: record.clone(),
                },
            )?;
        }
        if let Some(control) = self.control {
            write_line(&mut writer, &TapeJsonlLine::Control { control })?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Self, TimelineError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut schema_version: Option<u32> = None;
        let mut created_at_ms: Option<u64> = None;
        let mut records = Vec::new();
        let mut control = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: TapeJsonlLine = serde_json::from_str(&line)
                .map_err(|e| TimelineError::MalformedTape(format!("line {}: {e}", idx + 1)))?;
            match parsed {
                TapeJsonlLine::Header {
                    schema_version: v,
                    created_at_ms: t,
                } => {
                    if idx != 0 {
                        return Err(TimelineError::MalformedTape(
                            "header must be the first JSONL line".into(),
                        ));
                    }
                    schema_version = Some(v);
                    created_at_ms = Some(t);
                }
                TapeJsonlLine::Record { record } => records.push(record),
                TapeJsonlLine::Control { control: c } => control = Some(c),
            }
        }

        let schema_version = schema_version
            .ok_or_else(|| TimelineError::MalformedTape("missing tape header".into()))?;
        let created_at_ms = created_at_ms
            .ok_or_else(|| TimelineError::MalformedTape("missing tape header timestamp".into()))?;

        Ok(Self {
            schema_version,
            created_at_ms,
            records,
            control,
        })
    }

    /// Rebuild a log by reapplying records in sequence order. A tape whose
    /// sequences are not contiguous from 1 is rejected with the log left
    /// partial-free (a fresh log is only returned on full success).
    pub fn replay_into_log(&self) -> Result<Arc<TimelineLog>, TimelineError> {
        let log = Arc::new(TimelineLog::new());
        for record in &self.records {
            log.append_recorded(record.clone())?;
        }
        Ok(log)
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

fn write_line<W: Write>(writer: &mut W, line: &TapeJsonlLine) -> io::Result<()> {
    let json = serde_json::to_string(line).map_err(io::Error::other)?;
    writeln!(writer, "{json}")
}

/// Incremental tape writer: header on create, then one flushed line per
/// appended record. Share it behind an `Arc` next to the live log and
/// call [`TapeWriter::append`] from a log subscriber.
pub struct TapeWriter {
    created_at_ms: u64,
    writer: Mutex<BufWriter<File>>,
}

impl TapeWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let created_at_ms = now_ms();
        let header = TapeJsonlLine::Header {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms,
        };
        write_line(&mut writer, &header)?;
        writer.flush()?;
        Ok(Self {
            created_at_ms,
            writer: Mutex::new(writer),
        })
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn append(&self, record: &ActionRecord) -> io::Result<()> {
        let mut writer = self.writer.lock();
        write_line(
            &mut *writer,
            &TapeJsonlLine::Record {
                record: record.clone(),
            },
        )?;
        writer.flush()
    }

    /// Write the trailing control line. Call once, when closing out.
    pub fn finish(&self, control: TapeControl) -> io::Result<()> {
        let mut writer = self.writer.lock();
        write_line(&mut *writer, &TapeJsonlLine::Control { control })?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::record::{ActionDraft, ActionKind};
    use tempfile::tempdir;

    fn sample_log() -> TimelineLog {
        let log = TimelineLog::new();
        log.append(ActionDraft::command("ls", vec!["src".into()]));
        log.append(ActionDraft::new(
            ActionKind::FileCreate {
                path: "todo.md".into(),
                content: "A".into(),
            },
            "Creating file: todo.md",
        ));
        log
    }

    #[test]
    fn tape_jsonl_roundtrip_with_control() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.jsonl");

        let log = sample_log();
        let control = TapeControl {
            position: 1,
            mode: Mode::Paused,
        };
        let tape = Tape::from_log(&log, Some(control));
        tape.write_jsonl_to_path(&path).unwrap();

        let read = Tape::read_jsonl_from_path(&path).unwrap();
        assert_eq!(read.schema_version, TAPE_SCHEMA_VERSION);
        assert_eq!(read.records.len(), 2);
        assert_eq!(read.control, Some(control));

        let replayed = read.replay_into_log().unwrap();
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed.get(1).unwrap().kind.kind_name(), "command");
    }

    #[test]
    fn tape_writer_streams_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.jsonl");

        let log = sample_log();
        let writer = TapeWriter::create(&path).unwrap();
        for record in log.snapshot() {
            writer.append(&record).unwrap();
        }
        writer
            .finish(TapeControl {
                position: 2,
                mode: Mode::Live,
            })
            .unwrap();

        let read = Tape::read_jsonl_from_path(&path).unwrap();
        assert_eq!(read.records.len(), 2);
        assert_eq!(read.control.unwrap().position, 2);
    }

    #[test]
    fn missing_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.jsonl");
        std::fs::write(&path, "{\"type\":\"record\"}\n").unwrap();

        assert!(matches!(
            Tape::read_jsonl_from_path(&path),
            Err(TimelineError::MalformedTape(_))
        ));
    }

    #[test]
    fn reordered_tape_fails_replay() {
        let log = sample_log();
        let mut tape = Tape::from_log(&log, None);
        tape.records.swap(0, 1);

        assert!(matches!(
            tape.replay_into_log(),
            Err(TimelineError::InvalidRecord { .. })
        ));
    }
}
