//! Turns chat page markup into a [`Transcript`].
//!
//! Selectors are tried in a fixed order and the first one that matches
//! anything wins; results from different selectors are never merged. Roles
//! are a best-effort guess: an explicit author attribute, then class names,
//! then plain alternation by position. The positional fallback is wrong
//! whenever the markup does not strictly alternate, and there is no way to
//! tell from the page alone.

use crate::message::{Message, Role, Transcript};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Message selectors in priority order.
pub const MESSAGE_SELECTORS: [&str; 4] = [
    "[data-message-author-role]",
    ".message",
    "[class*=\"message\"]",
    ".conversation-turn",
];

const AUTHOR_ATTR: &str = "data-message-author-role";

static STRATEGIES: Lazy<Vec<Selector>> = Lazy::new(|| {
    MESSAGE_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("message selector is valid CSS"))
        .collect()
});

/// Interface chrome that never counts as message text.
static CHROME: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("button, .timestamp, [class*=\"button\"], svg")
        .expect("chrome selector is valid CSS")
});

static USER_MARKER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[class*=\"user\"]").expect("user selector is valid CSS"));

static ASSISTANT_MARKER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[class*=\"assistant\"]").expect("assistant selector is valid CSS")
});

static CODE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("code").expect("code selector is valid CSS"));

pub fn extract_from_html(html: &str) -> Transcript {
    extract_transcript(&Html::parse_document(html))
}

/// Extracts every non-empty message in document order. A page with no
/// recognisable messages yields an empty transcript.
pub fn extract_transcript(document: &Html) -> Transcript {
    let elements = matched_elements(document);
    let mut messages = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        let content = message_text(element);
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        messages.push(Message::new(infer_role(element, index), content));
    }
    messages
}

/// Elements of the first selector strategy that matches at least once.
pub fn matched_elements(document: &Html) -> Vec<ElementRef<'_>> {
    for (selector, source) in STRATEGIES.iter().zip(MESSAGE_SELECTORS) {
        let found: Vec<ElementRef<'_>> = document.select(selector).collect();
        if !found.is_empty() {
            log::debug!("{} message elements matched {}", found.len(), source);
            return found;
        }
    }
    Vec::new()
}

/// `index` is the position among all matched elements, including ones
/// later skipped for being empty.
pub fn infer_role(element: ElementRef<'_>, index: usize) -> Role {
    if let Some(author) = element.value().attr(AUTHOR_ATTR) {
        return if author == "user" {
            Role::User
        } else {
            Role::Assistant
        };
    }

    let classes = element
        .value()
        .attr("class")
        .unwrap_or_default()
        .to_lowercase();
    if classes.contains("user") || element.select(&USER_MARKER).next().is_some() {
        return Role::User;
    }
    if classes.contains("assistant") || element.select(&ASSISTANT_MARKER).next().is_some() {
        return Role::Assistant;
    }

    if index % 2 == 0 {
        Role::User
    } else {
        Role::Assistant
    }
}

/// Text content of a message with buttons, timestamps and icons removed.
/// `<pre>` blocks come out as fenced code so code detection can see them.
pub fn message_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if CHROME.matches(&child) {
                    continue;
                }
                if child.value().name() == "pre" {
                    push_fenced(child, out);
                } else {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn push_fenced(pre: ElementRef<'_>, out: &mut String) {
    let mut code = String::new();
    collect_text(pre, &mut code);
    let language = code_language(pre).unwrap_or_default();

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```");
    out.push_str(&language);
    out.push('\n');
    out.push_str(code.trim_end_matches('\n'));
    out.push_str("\n```\n");
}

/// Language from a `language-*` / `lang-*` class on the `pre` or its `code`.
fn code_language(pre: ElementRef<'_>) -> Option<String> {
    std::iter::once(pre)
        .chain(pre.select(&CODE))
        .flat_map(|el| el.value().classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_without_messages_is_empty() {
        let html = "<html><body><nav>Menu</nav><p>Welcome</p></body></html>";
        assert!(extract_from_html(html).is_empty());
    }

    #[test]
    fn author_attribute_wins() {
        let html = r#"
            <main>
              <div data-message-author-role="user">How do I sort a vec?</div>
              <div data-message-author-role="assistant" class="user-ish">Use sort().</div>
              <div data-message-author-role="system">Internal note</div>
            </main>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0], Message::user("How do I sort a vec?"));
        assert_eq!(transcript[1].role, Role::Assistant);
        // Anything other than "user" is treated as the assistant.
        assert_eq!(transcript[2].role, Role::Assistant);
    }

    #[test]
    fn first_matching_strategy_is_not_merged_with_later_ones() {
        let html = r#"
            <div data-message-author-role="user">Only me</div>
            <div class="message">Ignored because an earlier strategy matched</div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript, vec![Message::user("Only me")]);
    }

    #[test]
    fn class_names_decide_role_before_position() {
        let html = r#"
            <div class="conversation-turn assistant-turn">Hello there</div>
            <div class="conversation-turn UserTurn">My question</div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert_eq!(transcript[1].role, Role::User);
    }

    #[test]
    fn descendant_assistant_marker_is_recognised() {
        let html = r#"
            <div class="conversation-turn">Question</div>
            <div class="conversation-turn"><p>x</p></div>
            <div class="conversation-turn"><div class="assistant-body">Answer</div></div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].role, Role::Assistant);
    }

    #[test]
    fn positional_fallback_counts_skipped_elements() {
        let html = r#"
            <div class="conversation-turn">first</div>
            <div class="conversation-turn">   </div>
            <div class="conversation-turn">third</div>
            <div class="conversation-turn">fourth</div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(
            transcript,
            vec![
                Message::user("first"),
                Message::user("third"),
                Message::assistant("fourth"),
            ]
        );
    }

    #[test]
    fn chrome_is_stripped_before_reading_text() {
        let html = r#"
            <div data-message-author-role="assistant">
              <svg><text>icon</text></svg>
              <span class="timestamp">10:42</span>
              Here is the answer.
              <button>Copy</button>
              <div class="copy-button-row">Regenerate</div>
            </div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript[0].content, "Here is the answer.");
    }

    #[test]
    fn message_with_only_chrome_is_skipped() {
        let html = r#"
            <div data-message-author-role="user"><button>Edit</button></div>
            <div data-message-author-role="assistant">Real text</div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript, vec![Message::assistant("Real text")]);
    }

    #[test]
    fn pre_blocks_become_fenced_code() {
        let html = r#"
            <div data-message-author-role="assistant">Try this:<pre><button>Copy code</button><code class="hljs language-python">print("hi")
</code></pre>Done.</div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(
            transcript[0].content,
            "Try this:\n```python\nprint(\"hi\")\n```\nDone."
        );
    }

    #[test]
    fn untagged_pre_has_bare_fence() {
        let html = r#"<div class="message"><pre>ls -la</pre></div>"#;
        let transcript = extract_from_html(html);
        assert_eq!(transcript[0].content, "```\nls -la\n```");
    }
}
