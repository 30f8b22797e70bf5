//! Off-thread story requests
//!
//! Each request runs on its own thread; replies come back over an unbounded
//! channel that the UI drains once per frame without blocking.

use std::{sync::Arc, thread};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use super::{
    client::{StoryApiError, StoryClient},
    session::{DefaultStoryState, InteractiveStory},
    types::{ContinueResponse, EndResponse, GenerationResult, StartResponse},
};

/// The four API operations, so tests can stand in for the HTTP client.
pub trait StoryBackend: Send + Sync + 'static {
    fn generate_default_story(&self, prompt: &str) -> Result<GenerationResult, StoryApiError>;
    fn start_interactive(&self, prompt: &str) -> Result<StartResponse, StoryApiError>;
    fn continue_interactive(
        &self,
        session_id: &str,
        choice_id: u32,
    ) -> Result<ContinueResponse, StoryApiError>;
    fn end_interactive(&self, session_id: &str) -> Result<EndResponse, StoryApiError>;
}

impl StoryBackend for StoryClient {
    fn generate_default_story(&self, prompt: &str) -> Result<GenerationResult, StoryApiError> {
        StoryClient::generate_default_story(self, prompt)
    }

    fn start_interactive(&self, prompt: &str) -> Result<StartResponse, StoryApiError> {
        StoryClient::start_interactive(self, prompt)
    }

    fn continue_interactive(
        &self,
        session_id: &str,
        choice_id: u32,
    ) -> Result<ContinueResponse, StoryApiError> {
        StoryClient::continue_interactive(self, session_id, choice_id)
    }

    fn end_interactive(&self, session_id: &str) -> Result<EndResponse, StoryApiError> {
        StoryClient::end_interactive(self, session_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryRequest {
    Generate { prompt: String },
    Start { prompt: String },
    Continue { session_id: String, choice_id: u32 },
    End { session_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoryReply {
    Generated(Result<GenerationResult, String>),
    Started(Result<StartResponse, String>),
    Continued(Result<ContinueResponse, String>),
    Ended(Result<EndResponse, String>),
}

impl StoryReply {
    /// Folds the reply into the panel state it belongs to.
    pub fn apply(self, story: &mut DefaultStoryState, interactive: &mut InteractiveStory) {
        match self {
            StoryReply::Generated(outcome) => story.finish_generate(outcome),
            StoryReply::Started(outcome) => interactive.finish_start(outcome),
            StoryReply::Continued(outcome) => interactive.finish_continue(outcome),
            StoryReply::Ended(outcome) => interactive.finish_end(outcome),
        }
    }
}

fn run(backend: &dyn StoryBackend, request: StoryRequest) -> StoryReply {
    let text = |e: StoryApiError| e.to_string();
    match request {
        StoryRequest::Generate { prompt } => {
            StoryReply::Generated(backend.generate_default_story(&prompt).map_err(text))
        }
        StoryRequest::Start { prompt } => {
            StoryReply::Started(backend.start_interactive(&prompt).map_err(text))
        }
        StoryRequest::Continue {
            session_id,
            choice_id,
        } => StoryReply::Continued(
            backend
                .continue_interactive(&session_id, choice_id)
                .map_err(text),
        ),
        StoryRequest::End { session_id } => {
            StoryReply::Ended(backend.end_interactive(&session_id).map_err(text))
        }
    }
}

pub struct StoryWorker {
    backend: Arc<dyn StoryBackend>,
    sender: UnboundedSender<StoryReply>,
    receiver: UnboundedReceiver<StoryReply>,
    in_flight: usize,
}

impl StoryWorker {
    pub fn new(backend: Arc<dyn StoryBackend>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            backend,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn submit(&mut self, request: StoryRequest) {
        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        log::debug!("submitting {:?}", request);

        let spawned = thread::Builder::new()
            .name("story-request".to_string())
            .spawn(move || {
                let reply = run(backend.as_ref(), request);
                if sender.unbounded_send(reply).is_err() {
                    log::warn!("story reply dropped: worker is gone");
                }
            });

        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => log::error!("failed to spawn story request thread: {}", e),
        }
    }

    /// Replies that arrived since the last call. Never blocks.
    pub fn poll(&mut self) -> Vec<StoryReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.receiver.try_recv() {
            replies.push(reply);
        }
        self.in_flight = self.in_flight.saturating_sub(replies.len());
        replies
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::types::GenerationSummary;
    use std::time::{Duration, Instant};

    struct FakeBackend;

    impl StoryBackend for FakeBackend {
        fn generate_default_story(&self, prompt: &str) -> Result<GenerationResult, StoryApiError> {
            Ok(GenerationResult {
                final_story: format!("A story about {prompt}"),
                generation_log: Vec::new(),
                summary: GenerationSummary {
                    initial_prompt: prompt.to_string(),
                    total_refinements: 0,
                    final_status: "accepted".to_string(),
                },
            })
        }

        fn start_interactive(&self, _prompt: &str) -> Result<StartResponse, StoryApiError> {
            Err(StoryApiError::Status {
                code: 503,
                message: "Model offline".to_string(),
            })
        }

        fn continue_interactive(
            &self,
            _session_id: &str,
            _choice_id: u32,
        ) -> Result<ContinueResponse, StoryApiError> {
            Err(StoryApiError::Transport("unreachable".to_string()))
        }

        fn end_interactive(&self, _session_id: &str) -> Result<EndResponse, StoryApiError> {
            Ok(EndResponse {
                is_final: true,
                final_analysis: None,
            })
        }
    }

    fn wait_for(worker: &mut StoryWorker, count: usize) -> Vec<StoryReply> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut replies = Vec::new();
        while replies.len() < count && Instant::now() < deadline {
            replies.extend(worker.poll());
            thread::sleep(Duration::from_millis(5));
        }
        replies
    }

    #[test]
    fn test_replies_flow_back_into_state() {
        let mut worker = StoryWorker::new(Arc::new(FakeBackend));
        let mut story = DefaultStoryState {
            prompt: "owls".to_string(),
            ..Default::default()
        };
        let mut interactive = InteractiveStory::default();

        let prompt = story.begin_generate().unwrap();
        worker.submit(StoryRequest::Generate { prompt });
        let topic = interactive.begin_start("owls").unwrap();
        worker.submit(StoryRequest::Start { prompt: topic });
        assert_eq!(worker.in_flight(), 2);

        for reply in wait_for(&mut worker, 2) {
            reply.apply(&mut story, &mut interactive);
        }

        assert_eq!(worker.in_flight(), 0);
        assert_eq!(
            story.result.as_ref().map(|r| r.final_story.as_str()),
            Some("A story about owls")
        );
        assert!(!story.is_loading);
        assert_eq!(interactive.error, "Model offline");
        assert!(!interactive.is_loading);
    }

    #[test]
    fn test_poll_without_requests_is_empty() {
        let mut worker = StoryWorker::new(Arc::new(FakeBackend));
        assert!(worker.poll().is_empty());
    }
}
