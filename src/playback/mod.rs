pub mod controller;
pub mod player;
pub mod projector;

pub use controller::{ForkPolicy, Mode, PlaybackController};
pub use player::Player;
pub use projector::{FeedItem, RenderSnapshot};
