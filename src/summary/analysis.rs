//! Heuristic feature extraction over a transcript.

use super::keywords::{self, KeywordSet};
use super::text::{clip, take_chars};
use crate::message::{Message, Role};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("fence pattern compiles"));

static FULL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").expect("name pattern compiles"));

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence pattern compiles"));

pub fn user_messages(transcript: &[Message]) -> impl Iterator<Item = &Message> {
    transcript.iter().filter(|m| m.role == Role::User)
}

pub fn first_user_content(transcript: &[Message]) -> &str {
    user_messages(transcript)
        .next()
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

/// Lower-cased contents joined by single spaces.
pub fn all_text(transcript: &[Message]) -> String {
    transcript
        .iter()
        .map(|m| m.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn average_length(transcript: &[Message]) -> f64 {
    if transcript.is_empty() {
        return 0.0;
    }
    let total: usize = transcript.iter().map(|m| m.content.chars().count()).sum();
    total as f64 / transcript.len() as f64
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Languages of fenced code blocks, first-seen order, untagged blocks
/// reported as "Code block".
pub fn code_languages(transcript: &[Message]) -> Vec<String> {
    let mut languages = Vec::new();
    for message in transcript {
        for block in FENCED_CODE.find_iter(&message.content) {
            let first_line = block.as_str().split('\n').next().unwrap_or_default();
            let language = first_line.replacen("```", "", 1);
            let language = language.trim();
            let label = if language.is_empty() {
                "Code block".to_string()
            } else {
                language.to_string()
            };
            push_unique(&mut languages, label);
        }
    }
    languages
}

/// Up to three quoted lines that mention an error or bug.
pub fn error_lines(transcript: &[Message]) -> Vec<String> {
    transcript
        .iter()
        .filter(|m| keywords::ERROR_MARKERS.matches(&m.content.to_lowercase()))
        .filter_map(|m| {
            m.content
                .split('\n')
                .find(|line| keywords::ERROR_LINE_MARKERS.matches(&line.to_lowercase()))
        })
        .map(|line| take_chars(line, 100).to_string())
        .take(3)
        .collect()
}

/// User messages stating what they want or need, up to three.
pub fn objectives(transcript: &[Message]) -> Vec<String> {
    user_messages(transcript)
        .filter(|m| keywords::OBJECTIVE_MARKERS.matches(&m.content.to_lowercase()))
        .map(|m| clip(&m.content, 100))
        .take(3)
        .collect()
}

/// Distinct user sentences longer than 20 characters, up to five.
pub fn topic_sentences(transcript: &[Message]) -> Vec<String> {
    let mut topics = Vec::new();
    for message in user_messages(transcript) {
        for sentence in SENTENCE_END.split(&message.content) {
            let sentence = sentence.trim();
            if sentence.chars().count() > 20 {
                push_unique(&mut topics, clip(sentence, 80));
            }
        }
    }
    topics.truncate(5);
    topics
}

/// "Firstname Lastname" shaped tokens, distinct, up to five.
pub fn character_names(transcript: &[Message]) -> Vec<String> {
    let mut names = Vec::new();
    for message in transcript {
        for found in FULL_NAME.find_iter(&message.content) {
            push_unique(&mut names, found.as_str().to_string());
        }
    }
    names.truncate(5);
    names
}

pub fn tech_focus(transcript: &[Message]) -> &'static str {
    keywords::first_match(keywords::TECH_FOCUS, &all_text(transcript))
        .unwrap_or("General Programming")
}

pub fn technical_complexity(transcript: &[Message]) -> &'static str {
    keywords::first_match(keywords::TECH_COMPLEXITY, &all_text(transcript)).unwrap_or("Medium")
}

pub fn creative_theme(transcript: &[Message]) -> &'static str {
    let first = first_user_content(transcript).to_lowercase();
    keywords::first_match(keywords::CREATIVE_THEME, &first).unwrap_or("Creative Project")
}

pub fn creative_style(transcript: &[Message]) -> &'static str {
    keywords::first_match(keywords::CREATIVE_STYLE, &all_text(transcript))
        .unwrap_or("General Creative")
}

pub fn creative_progress(transcript: &[Message]) -> &'static str {
    match transcript.len() {
        0..=3 => "Initial brainstorming",
        4..=7 => "Concept development",
        8..=11 => "Active creation",
        _ => "Refinement stage",
    }
}

pub fn discussion_depth(transcript: &[Message]) -> &'static str {
    let average = average_length(transcript);
    if average > 400.0 {
        "Deep, detailed discussion"
    } else if average > 150.0 {
        "Moderate depth"
    } else {
        "Brief exchanges"
    }
}

fn any_user(transcript: &[Message], set: &KeywordSet) -> bool {
    user_messages(transcript).any(|m| set.matches(&m.content.to_lowercase()))
}

fn user_asks_questions(transcript: &[Message]) -> bool {
    user_messages(transcript).any(|m| m.content.contains('?'))
}

pub fn interaction_style(transcript: &[Message]) -> &'static str {
    let questions = user_asks_questions(transcript);
    let polite = any_user(transcript, &keywords::POLITE_MARKERS);
    match (questions, polite) {
        (true, true) => "Collaborative and polite",
        (true, false) => "Inquisitive",
        (false, true) => "Polite and formal",
        (false, false) => "Direct and focused",
    }
}

/// Typed requests from user messages, up to five.
pub fn key_points(transcript: &[Message]) -> Vec<String> {
    user_messages(transcript)
        .filter_map(|m| {
            let lower = m.content.to_lowercase();
            let kind = if keywords::HOW_TO.matches(&lower) {
                "How-to request"
            } else if keywords::EXPLANATION.matches(&lower) {
                "Explanation needed"
            } else if keywords::PROBLEM.matches(&lower) {
                "Problem solving"
            } else {
                return None;
            };
            Some(format!("{}: {}", kind, clip(&m.content, 80)))
        })
        .take(5)
        .collect()
}

/// Short topic bullets for the digest summary, up to five.
pub fn digest_topics(transcript: &[Message]) -> Vec<String> {
    user_messages(transcript)
        .filter_map(|m| {
            let lower = m.content.to_lowercase();
            if keywords::HOW_TO.matches(&lower) {
                Some(format!("• How-to guidance: {}", clip(&m.content, 100)))
            } else if keywords::EXPLANATION.matches(&lower) {
                Some(format!("• Explanation request: {}", clip(&m.content, 100)))
            } else if keywords::CODING.matches(&lower) {
                Some("• Programming/coding assistance".to_string())
            } else if m.content.chars().count() > 20 {
                Some(format!("• {}", clip(&m.content, 100)))
            } else {
                None
            }
        })
        .take(5)
        .collect()
}

pub fn topic_domains(transcript: &[Message]) -> Vec<&'static str> {
    keywords::all_matches(keywords::TOPIC_DOMAINS, &all_text(transcript))
}

/// Qualitative band of the average message length.
pub fn length_complexity(transcript: &[Message]) -> &'static str {
    let average = average_length(transcript);
    if average > 500.0 {
        "High (detailed, technical)"
    } else if average > 200.0 {
        "Medium (moderate detail)"
    } else {
        "Low (brief exchanges)"
    }
}

pub fn conversation_style(transcript: &[Message]) -> String {
    let mut styles = Vec::new();
    if user_asks_questions(transcript) {
        styles.push("Inquisitive");
    }
    if any_user(transcript, &keywords::REQUEST_MARKERS) {
        styles.push("Collaborative");
    }
    if any_user(transcript, &keywords::CASUAL_MARKERS) {
        styles.push("Casual");
    }
    if styles.is_empty() {
        "Professional".to_string()
    } else {
        styles.join(", ")
    }
}

/// "ROLE: content" lines for the last `count` messages.
pub fn recent_lines(transcript: &[Message], count: usize, limit: Option<usize>) -> String {
    let start = transcript.len().saturating_sub(count);
    transcript[start..]
        .iter()
        .map(|m| {
            let content = match limit {
                Some(limit) => clip(&m.content, limit),
                None => m.content.clone(),
            };
            format!("{}: {}", m.role.shout(), content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
