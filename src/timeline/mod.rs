pub mod error;
pub mod log;
pub mod record;

pub use error::TimelineError;
pub use log::TimelineLog;
pub use record::{ActionDraft, ActionKind, ActionRecord, ActionStatus};
