// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Effective prompt composition

use super::settings::Settings;

pub const LIGHTING_PHRASE: &str = "bright lighting, well-lit, natural lighting, warm atmosphere";

pub const COLOR_HARMONY_PHRASE: &str = "maintaining original color palette, color harmony";

pub const QUALITY_PHRASE: &str = "high quality, detailed, professional photography, 8k resolution";

/// Always sent alongside the positive prompt
pub const NEGATIVE_PROMPT: &str = "dark, dim, poorly lit, low quality, blurry, dark lighting, \
shadows, dark atmosphere, distorted, deformed";

/// Style keyword table, checked in order; first substring match wins
const STYLE_KEYWORDS: &[(&str, &str)] = &[
    ("modern", "clean lines, contemporary design, sleek furniture"),
    ("traditional", "classic design, elegant furniture, timeless style"),
    ("minimalist", "simple design, uncluttered space, minimal furniture"),
];

/// Keywords for a style label, matched case-insensitively by substring
pub fn style_keywords(style: &str) -> Option<&'static str> {
    let lower = style.to_lowercase();
    STYLE_KEYWORDS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|&(_, keywords)| keywords)
}

/// Base prompt used when the caller sent no prompt text
pub fn design_brief(settings: &Settings) -> String {
    format!(
        "{} style {} interior design",
        settings.style.trim(),
        settings.room_type.trim()
    )
}

/// Expand a user prompt into the prompt sent to the backend.
///
/// Pure function of its inputs: same prompt and settings, same output.
pub fn compose_prompt(prompt: &str, settings: &Settings) -> String {
    let base = prompt.trim();
    let mut parts: Vec<String> = vec![if base.is_empty() {
        design_brief(settings)
    } else {
        base.to_string()
    }];

    if settings.enhance_lighting {
        parts.push(LIGHTING_PHRASE.to_string());
    }
    if settings.preserve_colors {
        parts.push(COLOR_HARMONY_PHRASE.to_string());
    }
    parts.push(QUALITY_PHRASE.to_string());
    if let Some(keywords) = style_keywords(&settings.style) {
        parts.push(keywords.to_string());
    }

    parts.join(", ")
}
