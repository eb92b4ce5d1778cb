use super::analysis;
use super::text::{clip, clip_if_longer};
use crate::message::Message;

fn bullets(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        format!("• {}", empty)
    } else {
        items
            .iter()
            .map(|item| format!("• {}", item))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn bare_bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn last_content(transcript: &[Message]) -> &str {
    transcript
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

fn first_content(transcript: &[Message]) -> &str {
    transcript
        .first()
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

pub fn technical(transcript: &[Message]) -> String {
    let code = analysis::code_languages(transcript);
    let errors = analysis::error_lines(transcript);
    format!(
        "TECHNICAL CONVERSATION TRANSFER

🔧 PROJECT CONTEXT:
{context}

💻 CODE COMPONENTS:
{code}

🐛 ISSUES ADDRESSED:
{errors}

📊 TECHNICAL DETAILS:
• Total technical exchanges: {count}
• Implementation focus: {focus}
• Complexity level: {complexity}

🎯 CURRENT STATUS:
{status}

Please continue providing technical assistance where we left off.",
        context = clip(analysis::first_user_content(transcript), 200),
        code = bullets(&code, "No code blocks identified"),
        errors = bullets(&errors, "No specific errors mentioned"),
        count = transcript.len(),
        focus = analysis::tech_focus(transcript),
        complexity = analysis::technical_complexity(transcript),
        status = clip(last_content(transcript), 150),
    )
}

pub fn creative(transcript: &[Message]) -> String {
    let characters = analysis::character_names(transcript);
    format!(
        "CREATIVE PROJECT TRANSFER

🎨 CREATIVE CONTEXT:
{context}

🎭 PROJECT THEME:
{theme}

👥 CHARACTERS/ELEMENTS:
{characters}

📝 CREATIVE PROGRESS:
• Total creative exchanges: {count}
• Style/Genre: {style}
• Development stage: {stage}

🎯 CURRENT DIRECTION:
{direction}

Please continue the creative collaboration from this point.",
        context = clip(first_content(transcript), 200),
        theme = analysis::creative_theme(transcript),
        characters = bullets(&characters, "No specific characters identified"),
        count = transcript.len(),
        style = analysis::creative_style(transcript),
        stage = analysis::creative_progress(transcript),
        direction = clip(last_content(transcript), 150),
    )
}

pub fn general(transcript: &[Message]) -> String {
    format!(
        "CONVERSATION TRANSFER

🎯 MAIN DISCUSSION:
{context}

📋 KEY TOPICS:
{topics}

🎪 OBJECTIVES:
{objectives}

📊 CONVERSATION SUMMARY:
• Total messages: {count}
• Discussion depth: {depth}
• Interaction style: {style}

🎯 CURRENT CONTEXT:
{recent}

Please continue our discussion from where we left off.",
        context = clip(first_content(transcript), 200),
        topics = bare_bullets(&analysis::topic_sentences(transcript)),
        objectives = bare_bullets(&analysis::objectives(transcript)),
        count = transcript.len(),
        depth = analysis::discussion_depth(transcript),
        style = analysis::interaction_style(transcript),
        recent = analysis::recent_lines(transcript, 2, Some(100)),
    )
}

/// Hand-over brief that tells the next assistant how to pick up.
pub fn context(transcript: &[Message]) -> String {
    let user_queries = analysis::user_messages(transcript).count();
    format!(
        "CONVERSATION TRANSFER CONTEXT

🎯 PRIMARY OBJECTIVE:
{objective}

🔍 KEY DISCUSSION POINTS:
{points}

📊 CONVERSATION METRICS:
• Total exchanges: {count} messages
• User queries: {user_queries}
• Topics covered: {topics}
• Complexity level: {complexity}

🎭 CONVERSATION STYLE:
{style}

💡 CURRENT CONTEXT:
{recent}

📋 CONTINUATION INSTRUCTIONS:
Please continue this conversation maintaining the same level of detail and expertise. The user has reached their message limit on ChatGPT and is continuing here. Feel free to reference previous points discussed and build upon the established context.

READY TO CONTINUE FROM WHERE WE LEFT OFF.",
        objective = clip_if_longer(analysis::first_user_content(transcript), 100),
        points = bare_bullets(&analysis::key_points(transcript)),
        count = transcript.len(),
        topics = analysis::topic_domains(transcript).len(),
        complexity = analysis::length_complexity(transcript),
        style = analysis::conversation_style(transcript),
        recent = analysis::recent_lines(transcript, 2, Some(150)),
    )
}

/// Short digest: opening question, topic bullets and the last four messages.
pub fn digest(transcript: &[Message]) -> String {
    let topics = analysis::digest_topics(transcript);
    let main_areas = topics
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CONVERSATION TRANSFER - Continue this discussion:

ORIGINAL TOPIC: {topic}

KEY TOPICS DISCUSSED:
{topics}

RECENT CONTEXT:
{recent}

CURRENT STATUS:
- Total messages exchanged: {count}
- Main areas covered: {main_areas}
- Ready to continue discussion on these topics

Please continue helping with this conversation where we left off.",
        topic = analysis::first_user_content(transcript),
        topics = topics.join("\n"),
        recent = analysis::recent_lines(transcript, 4, None),
        count = transcript.len(),
    )
}
