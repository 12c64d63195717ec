pub mod types;
pub mod traits;
pub mod config;
pub mod buffer;
pub mod merge;
pub mod composer;
pub mod sources;
pub mod events;

pub use types::*;
pub use traits::{ContentSource, EventSink};
pub use config::FeedConfig;
pub use buffer::ChunkBuffer;
pub use merge::{MergeEngine, MergeKey};
pub use composer::FeedComposer;
pub use sources::{MemorySource, PgContentSource};
pub use events::{FeedEvent, FeedEventBus};
