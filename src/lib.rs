pub mod config;
pub mod ingest;
pub mod playback;
pub mod tape;
pub mod timeline;

pub use config::EngineConfig;
pub use ingest::{demo_script, IngestionPort, ScriptedSource};
pub use playback::{FeedItem, ForkPolicy, Mode, PlaybackController, Player, RenderSnapshot};
pub use tape::redact::RedactionConfig;
pub use tape::{Tape, TapeControl, TapeWriter};
pub use timeline::{
    ActionDraft, ActionKind, ActionRecord, ActionStatus, TimelineError, TimelineLog,
};
