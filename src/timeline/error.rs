use crate::timeline::record::ActionStatus;

/// Error type for timeline log operations.
///
/// Every variant is local-recoverable: the offending operation is
/// rejected and the log is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Replayed record carried a sequence number that is not the next
    /// contiguous value for this log.
    #[error("invalid record: expected sequence {expected}, got {got}")]
    InvalidRecord { expected: u64, got: u64 },

    /// Status update referenced a sequence this log never issued.
    #[error("unknown sequence {0}")]
    UnknownSequence(u64),

    /// Status update attempted to regress a record's lifecycle.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ActionStatus,
        to: ActionStatus,
    },

    /// Tape could not be read or written.
    #[error("tape I/O error: {0}")]
    Tape(#[from] std::io::Error),

    /// Tape line was not valid JSON or violated the tape schema.
    #[error("malformed tape: {0}")]
    MalformedTape(String),
}
