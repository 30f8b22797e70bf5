//! Popup panels drawn over the 3D view
//!
//! Panels only mutate UI state and queue [`StoryRequest`]s; the application
//! hands the queued requests to the story worker after the frame is built.

use imgui::{Condition, MouseButton, StyleColor, TreeNodeFlags, Ui, WindowFlags};
use std::collections::BTreeMap;

use super::popup::{is_compact, PopupOrchestrator, INTERACTIVE_STORY_PANEL, STORY_PANEL};
use crate::{
    config::InfoPanel,
    gfx::scene::LoadState,
    story::{
        types::{GenerationResult, Judgement, Verdict},
        DefaultStoryState, InteractiveStory, StoryReply, StoryRequest,
    },
};

pub const POPUP_MAX_WIDTH: f32 = 900.0;
pub const POPUP_HEIGHT_FRACTION: f32 = 0.9;

const BACKDROP: [f32; 4] = [0.0, 0.0, 0.0, 0.7];
const ACCENT: [f32; 4] = [0.17, 0.81, 0.81, 1.0];
const ERROR: [f32; 4] = [0.95, 0.35, 0.35, 1.0];
const CRITIQUE: [f32; 4] = [0.98, 0.85, 0.4, 1.0];
const ACCEPTABLE: [f32; 4] = [0.3, 0.85, 0.4, 1.0];
const UNACCEPTABLE: [f32; 4] = [0.9, 0.3, 0.3, 1.0];

/// Top-left corner and size of the centred popup for a display size.
pub fn popup_rect(display: [f32; 2]) -> ([f32; 2], [f32; 2]) {
    let width = (display[0] * 0.95).min(POPUP_MAX_WIDTH);
    let height = display[1] * POPUP_HEIGHT_FRACTION;
    let pos = [(display[0] - width) * 0.5, (display[1] - height) * 0.5];
    (pos, [width, height])
}

pub fn contains(rect: ([f32; 2], [f32; 2]), point: [f32; 2]) -> bool {
    let (pos, size) = rect;
    point[0] >= pos[0]
        && point[0] <= pos[0] + size[0]
        && point[1] >= pos[1]
        && point[1] <= pos[1] + size[1]
}

pub fn verdict_color(verdict: Verdict) -> [f32; 4] {
    match verdict {
        Verdict::Acceptable => ACCEPTABLE,
        Verdict::Unacceptable => UNACCEPTABLE,
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Acceptable => "Acceptable",
        Verdict::Unacceptable => "Unacceptable",
    }
}

fn wrapped_colored(ui: &Ui, color: [f32; 4], text: &str) {
    let _color = ui.push_style_color(StyleColor::Text, color);
    ui.text_wrapped(text);
}

fn error_box(ui: &Ui, message: &str) {
    if !message.is_empty() {
        ui.spacing();
        wrapped_colored(ui, ERROR, &format!("Error: {}", message));
    }
}

/// State behind every popup panel.
pub struct Panels {
    info_panels: BTreeMap<String, InfoPanel>,
    pub story: DefaultStoryState,
    pub interactive: InteractiveStory,
    topic: String,
}

impl Panels {
    pub fn new(info_panels: BTreeMap<String, InfoPanel>) -> Self {
        Self {
            info_panels,
            story: DefaultStoryState::default(),
            interactive: InteractiveStory::default(),
            topic: String::new(),
        }
    }

    pub fn apply(&mut self, reply: StoryReply) {
        reply.apply(&mut self.story, &mut self.interactive);
    }

    /// Builds this frame's overlay and returns the requests it queued.
    pub fn build(
        &mut self,
        ui: &Ui,
        popups: &mut PopupOrchestrator,
        load_state: &LoadState,
    ) -> Vec<StoryRequest> {
        let mut requests = Vec::new();
        let display = ui.io().display_size;
        if display[0] <= 0.0 || display[1] <= 0.0 {
            return requests;
        }

        if let LoadState::Failed(message) = load_state {
            load_failed_notice(ui, display, message);
        }

        match popups.active().map(str::to_string) {
            Some(panel) => self.popup(ui, display, popups, &panel, &mut requests),
            None if is_compact(display[0]) => compact_menu(ui, display, popups),
            None => {}
        }
        requests
    }

    fn popup(
        &mut self,
        ui: &Ui,
        display: [f32; 2],
        popups: &mut PopupOrchestrator,
        panel: &str,
        requests: &mut Vec<StoryRequest>,
    ) {
        let rect = popup_rect(display);
        ui.get_background_draw_list()
            .add_rect([0.0, 0.0], display, BACKDROP)
            .filled(true)
            .build();

        let title = match panel {
            STORY_PANEL => "Story Generator".to_string(),
            INTERACTIVE_STORY_PANEL => "Interactive Story".to_string(),
            other => self
                .info_panels
                .get(other)
                .map(|p| p.title.clone())
                .unwrap_or_else(|| other.to_string()),
        };

        let mut open = true;
        ui.window(format!("{}###popup", title))
            .position(rect.0, Condition::Always)
            .size(rect.1, Condition::Always)
            .flags(WindowFlags::NO_RESIZE | WindowFlags::NO_MOVE | WindowFlags::NO_COLLAPSE)
            .opened(&mut open)
            .build(|| match panel {
                STORY_PANEL => story_panel(ui, &mut self.story, requests),
                INTERACTIVE_STORY_PANEL => interactive_panel(
                    ui,
                    &mut self.interactive,
                    &mut self.topic,
                    requests,
                ),
                other => match self.info_panels.get(other) {
                    Some(info) => info_panel(ui, info),
                    None => ui.text_disabled("Nothing to show here yet."),
                },
            });

        let clicked_outside =
            ui.is_mouse_clicked(MouseButton::Left) && !contains(rect, ui.io().mouse_pos);
        if !open || clicked_outside {
            popups.close();
        }
    }
}

fn story_panel(ui: &Ui, story: &mut DefaultStoryState, requests: &mut Vec<StoryRequest>) {
    ui.text_wrapped("Enter a prompt below and our AI will generate a short story for you.");
    ui.spacing();

    let width = ui.content_region_avail()[0];
    ui.disabled(story.is_loading, || {
        ui.input_text_multiline("##prompt", &mut story.prompt, [width, 100.0])
            .build();
        let label = if story.is_loading {
            "Generating...###generate"
        } else {
            "Generate Story###generate"
        };
        if ui.button_with_size(label, [width, 0.0]) {
            if let Some(prompt) = story.begin_generate() {
                requests.push(StoryRequest::Generate { prompt });
            }
        }
    });

    if story.is_loading {
        ui.text_colored(ACCENT, "Loading...");
    }
    error_box(ui, &story.error);

    if let (Some(result), true) = (&story.result, story.error.is_empty()) {
        ui.separator();
        generation_log(ui, result);
    }
}

fn judgement_card(ui: &Ui, judgement: &Judgement) {
    ui.text(format!("{} Judge", judgement.judge));
    ui.same_line();
    ui.text_colored(
        verdict_color(judgement.verdict),
        verdict_label(judgement.verdict),
    );
    ui.indent();
    ui.text_wrapped(format!("\"{}\"", judgement.critique));
    ui.unindent();
}

/// Final story followed by every draft/review round that led to it.
fn generation_log(ui: &Ui, result: &GenerationResult) {
    ui.text_colored(ACCENT, "Final Story");
    ui.text_wrapped(&result.final_story);
    ui.spacing();

    if result.generation_log.is_empty() {
        return;
    }
    ui.text_colored(ACCENT, "Generation Process");
    for round in &result.generation_log {
        let status = if round.is_accepted {
            "Final Approved Version"
        } else {
            "Review & Refinement"
        };
        let header = format!("Round {}: {}###round{}", round.round, status, round.round);
        if !ui.collapsing_header(&header, TreeNodeFlags::empty()) {
            continue;
        }

        ui.text("Story Draft:");
        ui.indent();
        ui.text_wrapped(&round.story_draft);
        ui.unindent();

        if !round.judgements.is_empty() {
            ui.spacing();
            ui.text("Panel of Judges' Feedback:");
            for judgement in &round.judgements {
                judgement_card(ui, judgement);
            }
        }

        if let Some(critique) = &round.aggregated_critique_for_refiner {
            ui.spacing();
            ui.text("Instructions for Next Draft:");
            wrapped_colored(ui, CRITIQUE, critique);
        }
    }
}

fn interactive_panel(
    ui: &Ui,
    story: &mut InteractiveStory,
    topic: &mut String,
    requests: &mut Vec<StoryRequest>,
) {
    let width = ui.content_region_avail()[0];

    if !story.is_started() && !story.is_loading {
        ui.text_colored(ACCENT, "Interactive Storyteller");
        ui.text_wrapped(
            "What should the story be about? The AI will guide you through an adventure \
             where you make the choices!",
        );
        ui.spacing();
        ui.input_text_multiline("##topic", topic, [width, 80.0])
            .build();
        ui.disabled(topic.trim().is_empty(), || {
            if ui.button_with_size("Start My Adventure", [width, 0.0]) {
                if let Some(prompt) = story.begin_start(topic.trim()) {
                    requests.push(StoryRequest::Start { prompt });
                }
            }
        });
        error_box(ui, &story.error);
        return;
    }

    if story.is_loading && story.story_history.is_empty() {
        ui.text_colored(ACCENT, "Loading... your story is beginning.");
        return;
    }

    ui.text_colored(ACCENT, "Your Adventure");
    ui.spacing();
    for segment in &story.story_history {
        ui.text_wrapped(segment);
        ui.spacing();
    }

    if story.is_loading {
        ui.text_colored(ACCENT, "Loading... the storyteller is thinking.");
    }

    if let (true, Some(analysis)) = (story.is_final, &story.final_analysis) {
        ui.separator();
        ui.text_colored(ACCENT, "Your Journey's End");
        ui.text("Summary of Your Adventure");
        ui.text_wrapped(&analysis.summary);
        ui.spacing();
        ui.text("Lessons Along the Way");
        ui.text_wrapped(&analysis.lessons_learned);
    }

    if !story.is_final && !story.is_loading {
        ui.separator();
        if let Some(prompt) = &story.decision_prompt {
            ui.text_wrapped(prompt);
        }

        let mut picked = None;
        for choice in &story.choices {
            if ui.button(format!("{}##choice{}", choice.text, choice.id)) {
                picked = Some(choice.id);
            }
            if let Some(trait_name) = &choice.trait_name {
                ui.same_line();
                ui.text_colored(ACCENT, format!("[{}]", trait_name));
            }
        }
        if let Some(choice_id) = picked {
            if let Some(session_id) = story.begin_continue() {
                requests.push(StoryRequest::Continue {
                    session_id,
                    choice_id,
                });
            }
        }

        if story.can_end() {
            ui.spacing();
            if ui.button("End Story & See My Results") {
                if let Some(session_id) = story.begin_end() {
                    requests.push(StoryRequest::End { session_id });
                }
            }
        }
    }

    error_box(ui, &story.error);

    if story.is_final {
        ui.spacing();
        if ui.button_with_size("Start a New Adventure", [width, 0.0]) {
            story.reset();
            topic.clear();
        }
    }
}

fn info_panel(ui: &Ui, panel: &InfoPanel) {
    ui.text_colored(ACCENT, &panel.title);
    ui.separator();
    ui.text_wrapped(&panel.body);
}

/// Full-window list of panels for narrow windows.
fn compact_menu(ui: &Ui, display: [f32; 2], popups: &mut PopupOrchestrator) {
    let mut picked = None;
    ui.window("Welcome")
        .position([0.0, 0.0], Condition::Always)
        .size(display, Condition::Always)
        .flags(
            WindowFlags::NO_RESIZE
                | WindowFlags::NO_MOVE
                | WindowFlags::NO_COLLAPSE
                | WindowFlags::NO_TITLE_BAR,
        )
        .build(|| {
            ui.text_colored(ACCENT, "Welcome");
            ui.text_disabled("Select an experience to begin");
            ui.spacing();

            let width = ui.content_region_avail()[0];
            for entry in popups.menu() {
                if ui.button_with_size(&entry.title, [width, 0.0]) {
                    picked = Some(entry.id.clone());
                }
                if !entry.description.is_empty() {
                    ui.text_disabled(&entry.description);
                }
                ui.spacing();
            }
        });

    if let Some(id) = picked {
        popups.open(&id);
    }
}

fn load_failed_notice(ui: &Ui, display: [f32; 2], message: &str) {
    let size = [display[0].min(480.0), 0.0];
    ui.window("Model unavailable")
        .position(
            [(display[0] - size[0]) * 0.5, display[1] * 0.1],
            Condition::Always,
        )
        .size(size, Condition::Always)
        .flags(WindowFlags::NO_RESIZE | WindowFlags::NO_MOVE | WindowFlags::NO_COLLAPSE)
        .build(|| {
            ui.text_wrapped("The 3D model could not be loaded.");
            wrapped_colored(ui, ERROR, message);
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_is_capped_and_centred() {
        let (pos, size) = popup_rect([1600.0, 1000.0]);
        assert_eq!(size, [POPUP_MAX_WIDTH, 900.0]);
        assert_eq!(pos, [350.0, 50.0]);

        let (pos, size) = popup_rect([600.0, 400.0]);
        assert!((size[0] - 570.0).abs() < 1e-4);
        assert!((pos[0] - 15.0).abs() < 1e-4);
        assert!((size[1] - 360.0).abs() < 1e-4);
    }

    #[test]
    fn test_click_outside_detection() {
        let rect = popup_rect([1600.0, 1000.0]);
        assert!(contains(rect, [800.0, 500.0]));
        assert!(!contains(rect, [100.0, 500.0]));
        assert!(!contains(rect, [800.0, 980.0]));
    }

    #[test]
    fn test_verdict_colors_differ() {
        assert_ne!(
            verdict_color(Verdict::Acceptable),
            verdict_color(Verdict::Unacceptable)
        );
    }

    #[test]
    fn test_replies_land_in_panel_state() {
        let mut panels = Panels::new(BTreeMap::new());
        panels.story.prompt = "owls".to_string();
        panels.story.begin_generate();
        panels.apply(StoryReply::Generated(Err("Server busy".to_string())));
        assert_eq!(panels.story.error, "Server busy");
        assert!(!panels.story.is_loading);
    }
}
