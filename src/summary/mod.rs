//! Keyword-driven classification and summary rendering.
//!
//! Everything here is a pure function of the transcript: the same input
//! always yields the same category and the same text.

pub mod analysis;
pub mod keywords;
pub mod templates;
pub mod text;

use crate::message::Message;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Technical,
    Creative,
    General,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Technical => "technical",
            Category::Creative => "creative",
            Category::General => "general",
        })
    }
}

/// Which summary layout to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SummaryStyle {
    /// Category-specific template (technical, creative or general).
    #[default]
    Categorized,
    /// Hand-over brief with metrics and continuation instructions.
    Context,
    /// Opening question, topic bullets and the last four messages.
    Digest,
}

/// Strictly higher nonzero keyword score wins; ties and all-zero are general.
pub fn classify(transcript: &[Message]) -> Category {
    let text = analysis::all_text(transcript);
    let technical = keywords::TECHNICAL.hits(&text);
    let creative = keywords::CREATIVE.hits(&text);
    if technical > creative && technical > 0 {
        Category::Technical
    } else if creative > technical && creative > 0 {
        Category::Creative
    } else {
        Category::General
    }
}

/// Categorized summary. Empty transcripts produce an empty string.
pub fn summarize(transcript: &[Message]) -> String {
    summarize_with(SummaryStyle::Categorized, transcript)
}

pub fn summarize_with(style: SummaryStyle, transcript: &[Message]) -> String {
    if transcript.is_empty() {
        return String::new();
    }
    match style {
        SummaryStyle::Categorized => match classify(transcript) {
            Category::Technical => templates::technical(transcript),
            Category::Creative => templates::creative(transcript),
            Category::General => templates::general(transcript),
        },
        SummaryStyle::Context => templates::context(transcript),
        SummaryStyle::Digest => templates::digest(transcript),
    }
}
