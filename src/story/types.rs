//! Wire types of the story-generation API

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Acceptable,
    Unacceptable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub judge: String,
    pub verdict: Verdict,
    pub critique: String,
}

impl Judgement {
    pub fn is_acceptable(&self) -> bool {
        self.verdict == Verdict::Acceptable
    }
}

/// One draft/review cycle of the default story generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRound {
    pub round: u32,
    pub story_draft: String,
    #[serde(default)]
    pub judgements: Vec<Judgement>,
    #[serde(default)]
    pub aggregated_critique_for_refiner: Option<String>,
    pub is_accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub initial_prompt: String,
    pub total_refinements: u32,
    pub final_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub final_story: String,
    #[serde(default)]
    pub generation_log: Vec<GenerationRound>,
    pub summary: GenerationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: u32,
    pub text: String,
    #[serde(rename = "trait", default)]
    pub trait_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnalysis {
    pub summary: String,
    pub lessons_learned: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
    pub story_segment: String,
    #[serde(default)]
    pub decision_prompt: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueResponse {
    pub story_segment: String,
    #[serde(default)]
    pub decision_prompt: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndResponse {
    #[serde(default = "yes")]
    pub is_final: bool,
    #[serde(default)]
    pub final_analysis: Option<FinalAnalysis>,
}

fn yes() -> bool {
    true
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContinueRequest<'a> {
    pub session_id: &'a str,
    pub choice_id: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct EndRequest<'a> {
    pub session_id: &'a str,
}
