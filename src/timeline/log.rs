use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::timeline::error::TimelineError;
use crate::timeline::record::{now_ms, ActionDraft, ActionRecord, ActionStatus};

/// Default capacity of the append-notification channel.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

/// Append-only ordered store of [`ActionRecord`]s; the system of record.
///
/// Sequence numbers form a contiguous run starting at 1 and are assigned
/// under the write lock, so concurrent producers can never receive the
/// same value. Records are immutable once appended except for their
/// forward-only `status`. Readers take point-in-time snapshots and never
/// observe a half-written record.
///
/// Every successful append broadcasts the new length to subscribers.
/// Delivery is at-least-once and ordered per observer; observers must
/// treat a repeated length as a no-op.
pub struct TimelineLog {
    records: RwLock<Vec<ActionRecord>>,
    notify: broadcast::Sender<u64>,
}

impl TimelineLog {
    pub fn new() -> Self {
        Self::with_notify_capacity(DEFAULT_NOTIFY_CAPACITY)
    }

    pub fn with_notify_capacity(capacity: usize) -> Self {
        let (notify, _) = broadcast::channel(capacity.max(1));
        Self {
            records: RwLock::new(Vec::new()),
            notify,
        }
    }

    /// Append a draft, assigning the next sequence number. Returns the
    /// assigned sequence. Never fails: the log owns sequence assignment,
    /// so live callers cannot produce a conflict.
    pub fn append(&self, draft: ActionDraft) -> u64 {
        let seq = {
            let mut records = self.records.write();
            let seq = records.len() as u64 + 1;
            records.push(ActionRecord {
                seq,
                ts_ms: now_ms(),
                kind: draft.kind,
                status: draft.status,
                summary: draft.summary,
            });
            seq
        };
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.notify.send(seq);
        seq
    }

    /// Append a record that already carries a sequence number (the tape
    /// replay path). Rejects anything that is not the next contiguous
    /// value, leaving the log unchanged.
    pub fn append_recorded(&self, record: ActionRecord) -> Result<u64, TimelineError> {
        let seq = {
            let mut records = self.records.write();
            let expected = records.len() as u64 + 1;
            if record.seq != expected {
                return Err(TimelineError::InvalidRecord {
                    expected,
                    got: record.seq,
                });
            }
            records.push(record);
            expected
        };
        let _ = self.notify.send(seq);
        Ok(seq)
    }

    /// Advance a record's status. Terminal states never regress; a
    /// rejected update leaves the record untouched.
    pub fn update_status(&self, seq: u64, status: ActionStatus) -> Result<(), TimelineError> {
        let mut records = self.records.write();
        let record = seq
            .checked_sub(1)
            .and_then(|i| records.get_mut(i as usize))
            .ok_or(TimelineError::UnknownSequence(seq))?;
        if !record.status.can_transition_to(status) {
            return Err(TimelineError::InvalidTransition {
                from: record.status,
                to: status,
            });
        }
        record.status = status;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.records.read().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Fetch one record by sequence number (1-based).
    pub fn get(&self, seq: u64) -> Option<ActionRecord> {
        let records = self.records.read();
        seq.checked_sub(1)
            .and_then(|i| records.get(i as usize))
            .cloned()
    }

    /// Records with `from <= seq <= to`, in sequence order. Bounds are
    /// clamped to the log, so out-of-range requests shrink rather than fail.
    pub fn slice(&self, from: u64, to: u64) -> Vec<ActionRecord> {
        let records = self.records.read();
        let len = records.len() as u64;
        let lo = from.max(1);
        let hi = to.min(len);
        if lo > hi {
            return Vec::new();
        }
        records[(lo - 1) as usize..hi as usize].to_vec()
    }

    /// Point-in-time copy of the whole log.
    pub fn snapshot(&self) -> Vec<ActionRecord> {
        self.records.read().clone()
    }

    /// Subscribe to append notifications. Each message is the log length
    /// after an append; lagged observers resubscribe and re-read `len()`.
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.notify.subscribe()
    }
}

impl Default for TimelineLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::record::ActionKind;

    fn draft(n: u32) -> ActionDraft {
        ActionDraft::new(ActionKind::Thinking, format!("step {n}"))
    }

    #[test]
    fn append_assigns_contiguous_sequences() {
        let log = TimelineLog::new();
        for n in 1..=5 {
            assert_eq!(log.append(draft(n)), n as u64);
        }
        assert_eq!(log.len(), 5);
        for seq in 1..=5u64 {
            assert_eq!(log.get(seq).unwrap().seq, seq);
        }
    }

    #[test]
    fn get_out_of_range_is_none() {
        let log = TimelineLog::new();
        log.append(draft(1));
        assert!(log.get(0).is_none());
        assert!(log.get(2).is_none());
    }

    #[test]
    fn slice_clamps_bounds() {
        let log = TimelineLog::new();
        for n in 1..=4 {
            log.append(draft(n));
        }
        let all = log.slice(0, 99);
        assert_eq!(all.len(), 4);
        assert_eq!(log.slice(2, 3).len(), 2);
        assert!(log.slice(3, 2).is_empty());
    }

    #[test]
    fn append_recorded_rejects_gap_and_duplicate() {
        let log = TimelineLog::new();
        let seq = log.append(draft(1));

        let mut rec = log.get(seq).unwrap();
        rec.seq = 1; // duplicate
        assert!(matches!(
            log.append_recorded(rec.clone()),
            Err(TimelineError::InvalidRecord {
                expected: 2,
                got: 1
            })
        ));

        rec.seq = 3; // gap
        assert!(matches!(
            log.append_recorded(rec.clone()),
            Err(TimelineError::InvalidRecord { .. })
        ));

        rec.seq = 2;
        assert_eq!(log.append_recorded(rec).unwrap(), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn update_status_enforces_forward_order() {
        let log = TimelineLog::new();
        let seq = log.append(draft(1).with_status(ActionStatus::Pending));

        log.update_status(seq, ActionStatus::InProgress).unwrap();
        log.update_status(seq, ActionStatus::Completed).unwrap();

        let err = log.update_status(seq, ActionStatus::Pending).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidTransition { .. }));
        assert_eq!(log.get(seq).unwrap().status, ActionStatus::Completed);
    }

    #[test]
    fn update_status_unknown_sequence() {
        let log = TimelineLog::new();
        assert!(matches!(
            log.update_status(7, ActionStatus::Completed),
            Err(TimelineError::UnknownSequence(7))
        ));
        assert!(matches!(
            log.update_status(0, ActionStatus::Completed),
            Err(TimelineError::UnknownSequence(0))
        ));
    }

    #[tokio::test]
    async fn subscribers_see_lengths_in_order() {
        let log = TimelineLog::new();
        let mut rx = log.subscribe();

        log.append(draft(1));
        log.append(draft(2));
        log.append(draft(3));

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
        assert_eq!(rx.recv().await.unwrap(), 3);
    }
}
