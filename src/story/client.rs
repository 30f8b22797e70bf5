//! Blocking HTTP client for the story-generation API

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::types::{
    ContinueRequest, ContinueResponse, EndRequest, EndResponse, ErrorBody, GenerationResult,
    PromptRequest, StartResponse,
};

/// Story generation runs several model rounds server-side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, thiserror::Error)]
pub enum StoryApiError {
    /// The server answered with an error status. `message` is the server's
    /// `error` field when present.
    #[error("{message}")]
    Status { code: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(#[from] std::io::Error),
}

impl From<ureq::Error> for StoryApiError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, response) => {
                let status_text = response.status_text().to_string();
                let message = response
                    .into_json::<ErrorBody>()
                    .map(|body| body.error)
                    .unwrap_or_else(|_| format!("{} {}", code, status_text));
                StoryApiError::Status { code, message }
            }
            ureq::Error::Transport(transport) => StoryApiError::Transport(transport.to_string()),
        }
    }
}

pub struct StoryClient {
    agent: ureq::Agent,
    base_url: String,
}

impl StoryClient {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, StoryApiError> {
        let url = self.endpoint(path);
        log::debug!("POST {}", url);
        let response = self.agent.post(&url).send_json(body)?;
        Ok(response.into_json()?)
    }

    pub fn generate_default_story(&self, prompt: &str) -> Result<GenerationResult, StoryApiError> {
        self.post("generate_default_story", &PromptRequest { prompt })
    }

    pub fn start_interactive(&self, prompt: &str) -> Result<StartResponse, StoryApiError> {
        self.post("interactive_story/start", &PromptRequest { prompt })
    }

    pub fn continue_interactive(
        &self,
        session_id: &str,
        choice_id: u32,
    ) -> Result<ContinueResponse, StoryApiError> {
        self.post(
            "interactive_story/continue",
            &ContinueRequest {
                session_id,
                choice_id,
            },
        )
    }

    pub fn end_interactive(&self, session_id: &str) -> Result<EndResponse, StoryApiError> {
        self.post("interactive_story/end", &EndRequest { session_id })
    }
}
