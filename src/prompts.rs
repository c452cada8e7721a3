//! Prompt templates for the four extraction tasks.
//!
//! Each task has a fixed system instruction and a user template. User-supplied values only
//! ever land in the user part, so instruction text and caller data travel as separate roles.

use crate::models::{ExtractionTask, ImagePayload, NormalizedContent};

pub const LEAFLET_SYSTEM: &str = include_str!("../data/prompts/leaflet_system.txt");
pub const LEAFLET_USER: &str = include_str!("../data/prompts/leaflet_user.txt");
pub const INTERACTION_SYSTEM: &str = include_str!("../data/prompts/interaction_system.txt");
pub const INTERACTION_USER: &str = include_str!("../data/prompts/interaction_user.txt");
pub const SIDE_EFFECT_SYSTEM: &str = include_str!("../data/prompts/side_effect_system.txt");
pub const SIDE_EFFECT_USER: &str = include_str!("../data/prompts/side_effect_user.txt");
pub const PRESCRIPTION_SYSTEM: &str = include_str!("../data/prompts/prescription_system.txt");
pub const PRESCRIPTION_USER: &str = include_str!("../data/prompts/prescription_user.txt");

/// Field names the leaflet prompt asks the model to return.
pub const LEAFLET_FIELDS: [&str; 7] = [
    "etken_madde",
    "kullanim_amaci",
    "dozaj",
    "yan_etkiler",
    "kontrendikasyonlar",
    "hamilelik",
    "saklama",
];

/// Field names the prescription prompt asks the model to return.
pub const PRESCRIPTION_FIELDS: [&str; 4] =
    ["ilac_adi", "dozaj", "kullanim_sikligi", "kullanim_suresi"];

/// A fully built model request for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub task: ExtractionTask,
    /// Fixed instruction text, sent as the system instruction.
    pub instruction: String,
    /// Rendered user template carrying the caller's values.
    pub content: String,
    pub image: Option<ImagePayload>,
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass, so placeholders that appear inside substituted values
/// are left as-is. Unknown placeholders are kept verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let key = &after_open[..end];
                match vars.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}

/// Build the prompt for already-acquired content. Never fails.
pub fn build(content: NormalizedContent) -> Prompt {
    let task = content.task();

    match content {
        NormalizedContent::LeafletText(text) => Prompt {
            task,
            instruction: LEAFLET_SYSTEM.to_string(),
            content: render(LEAFLET_USER, &[("text", &text)]),
            image: None,
        },
        NormalizedContent::DrugPair { drug_a, drug_b } => Prompt {
            task,
            instruction: INTERACTION_SYSTEM.to_string(),
            content: render(
                INTERACTION_USER,
                &[("drug_a", &drug_a), ("drug_b", &drug_b)],
            ),
            image: None,
        },
        NormalizedContent::SideEffect { drug, side_effect } => Prompt {
            task,
            instruction: SIDE_EFFECT_SYSTEM.to_string(),
            content: render(
                SIDE_EFFECT_USER,
                &[("drug", &drug), ("side_effect", &side_effect)],
            ),
            image: None,
        },
        NormalizedContent::Image(payload) => Prompt {
            task,
            instruction: PRESCRIPTION_SYSTEM.to_string(),
            content: PRESCRIPTION_USER.to_string(),
            image: Some(payload),
        },
    }
}
