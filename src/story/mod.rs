//! Client side of the story-generation API behind the popup panels

pub mod client;
pub mod session;
pub mod types;
pub mod worker;

pub use client::{StoryApiError, StoryClient};
pub use session::{DefaultStoryState, InteractiveStory};
pub use worker::{StoryBackend, StoryReply, StoryRequest, StoryWorker};
