//! UI-side state of the two story panels
//!
//! These types decide what request to send and fold responses back in. They
//! never perform I/O; [`StoryWorker`](super::worker::StoryWorker) does.

use super::types::{Choice, ContinueResponse, EndResponse, FinalAnalysis, GenerationResult, StartResponse};

/// History length from which ending the story is offered.
pub const END_STORY_MIN_SEGMENTS: usize = 3;

pub const MSG_EMPTY_PROMPT: &str = "Please enter a prompt.";
pub const MSG_EMPTY_TOPIC: &str = "Please enter a topic to start the story.";
pub const MSG_NO_SESSION: &str = "No active story session found to end.";

/// One-shot story generator.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DefaultStoryState {
    pub prompt: String,
    pub result: Option<GenerationResult>,
    pub is_loading: bool,
    pub error: String,
}

impl DefaultStoryState {
    /// Validates the prompt and marks a request in flight. Returns the prompt
    /// to send, or `None` when there is nothing to send.
    pub fn begin_generate(&mut self) -> Option<String> {
        if self.is_loading {
            return None;
        }
        if self.prompt.is_empty() {
            self.error = MSG_EMPTY_PROMPT.to_string();
            return None;
        }
        self.is_loading = true;
        self.error.clear();
        self.result = None;
        Some(self.prompt.clone())
    }

    pub fn finish_generate(&mut self, outcome: Result<GenerationResult, String>) {
        self.is_loading = false;
        match outcome {
            Ok(result) => self.result = Some(result),
            Err(message) => {
                log::warn!("story generation failed: {}", message);
                self.error = message;
            }
        }
    }
}

/// Choose-your-path story bound to a server session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InteractiveStory {
    pub session_id: Option<String>,
    pub story_history: Vec<String>,
    pub decision_prompt: Option<String>,
    pub choices: Vec<Choice>,
    pub is_final: bool,
    pub final_analysis: Option<FinalAnalysis>,
    pub is_loading: bool,
    pub error: String,
}

impl InteractiveStory {
    pub fn begin_start(&mut self, prompt: &str) -> Option<String> {
        if prompt.is_empty() {
            self.error = MSG_EMPTY_TOPIC.to_string();
            return None;
        }
        *self = Self {
            is_loading: true,
            ..Self::default()
        };
        Some(prompt.to_string())
    }

    pub fn finish_start(&mut self, outcome: Result<StartResponse, String>) {
        self.is_loading = false;
        match outcome {
            Ok(data) => {
                self.session_id = Some(data.session_id);
                self.story_history = vec![data.story_segment];
                self.decision_prompt = data.decision_prompt;
                self.choices = data.choices;
                self.is_final = data.is_final;
                self.final_analysis = None;
            }
            Err(message) => self.fail(message),
        }
    }

    /// Returns the session to continue, or `None` when no session is active.
    pub fn begin_continue(&mut self) -> Option<String> {
        let session = self.session_id.clone()?;
        self.is_loading = true;
        self.error.clear();
        Some(session)
    }

    pub fn finish_continue(&mut self, outcome: Result<ContinueResponse, String>) {
        self.is_loading = false;
        match outcome {
            Ok(data) => {
                self.story_history.push(data.story_segment);
                self.decision_prompt = data.decision_prompt;
                self.choices = data.choices;
            }
            Err(message) => self.fail(message),
        }
    }

    pub fn begin_end(&mut self) -> Option<String> {
        let Some(session) = self.session_id.clone() else {
            self.error = MSG_NO_SESSION.to_string();
            return None;
        };
        self.is_loading = true;
        self.error.clear();
        Some(session)
    }

    pub fn finish_end(&mut self, outcome: Result<EndResponse, String>) {
        self.is_loading = false;
        match outcome {
            Ok(data) => {
                self.is_final = data.is_final;
                self.final_analysis = data.final_analysis;
                self.choices.clear();
                self.decision_prompt = None;
            }
            Err(message) => self.fail(message),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_started(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn can_end(&self) -> bool {
        !self.is_final && self.story_history.len() >= END_STORY_MIN_SEGMENTS
    }

    fn fail(&mut self, message: String) {
        log::warn!("interactive story request failed: {}", message);
        self.error = message;
    }
}
