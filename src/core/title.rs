//! Short conversation labels for the recent-sessions list.

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;

use crate::core::message::{ChatMessage, Sender};

const MAX_TITLE_CHARS: usize = 35;
const MAX_BOT_TITLE_CHARS: usize = 40;
const FALLBACK_WORDS: usize = 5;

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "whom", "whose", "which", "is", "are", "am",
    "was", "were", "can", "could", "should", "would", "will", "shall", "do", "does", "did", "may",
    "might", "has", "have", "had",
];

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static title regex")
}

static FENCE_MARKER: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^[ \t]*`{3,}.*$"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| regex(r"!\[([^\]]*)\]\([^)]*\)"));
static LINK: LazyLock<Regex> = LazyLock::new(|| regex(r"\[([^\]]*)\]\([^)]*\)"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^[ \t]{0,3}#{1,6}[ \t]*"));
static QUOTE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?m)^[ \t]*>[ \t]?"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?m)^[ \t]*(?:[-+*•·○◦]|\d{1,9}\.)[ \t]+"));
static MARKS: LazyLock<Regex> = LazyLock::new(|| regex(r"\*+|~~|`+"));
static UNDERSCORE_OPEN: LazyLock<Regex> = LazyLock::new(|| regex(r"(^|\s)_+"));
static UNDERSCORE_CLOSE: LazyLock<Regex> = LazyLock::new(|| regex(r"_+(\s|[.,!?;:]|$)"));

/// Remove Markdown syntax, keeping the words. Line structure is preserved.
fn strip_markdown(text: &str) -> String {
    let s = FENCE_MARKER.replace_all(text, "");
    let s = IMAGE.replace_all(&s, "${1}");
    let s = LINK.replace_all(&s, "${1}");
    let s = HEADING.replace_all(&s, "");
    let s = QUOTE.replace_all(&s, "");
    let s = LIST_MARKER.replace_all(&s, "");
    let s = MARKS.replace_all(&s, "");
    let s = UNDERSCORE_OPEN.replace_all(&s, "${1}");
    UNDERSCORE_CLOSE.replace_all(&s, "${1}").into_owned()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut to `max` characters, ending in `…` when anything was removed.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// Up to and including the first `.`, `!` or `?` that ends a sentence.
fn first_sentence(s: &str) -> Option<&str> {
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|&(_, next)| next.is_whitespace())
        {
            return Some(&s[..i + c.len_utf8()]);
        }
    }
    None
}

fn is_question(s: &str) -> bool {
    if s.ends_with('?') {
        return true;
    }
    let first = s
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .unwrap_or_default();
    QUESTION_WORDS.contains(&first.as_str())
}

fn title_from_user_text(stripped: &str) -> String {
    let candidate = match first_sentence(stripped) {
        Some(sentence) => sentence.to_string(),
        None => match stripped.split_once(',') {
            Some((clause, _)) if !clause.trim().is_empty() => clause.trim().to_string(),
            _ => stripped
                .split_whitespace()
                .take(FALLBACK_WORDS)
                .collect::<Vec<_>>()
                .join(" "),
        },
    };
    let candidate = candidate.trim_end_matches('.').trim_end();
    if is_question(candidate) {
        let core = candidate.trim_end_matches('?').trim_end();
        format!("{}?", truncate(core, MAX_TITLE_CHARS - 1))
    } else {
        truncate(candidate, MAX_TITLE_CHARS)
    }
}

fn title_from_bot_text(text: &str) -> Option<String> {
    let stripped = strip_markdown(text);
    let line = stripped
        .lines()
        .map(collapse_whitespace)
        .find(|l| !l.is_empty())?;
    Some(truncate(&line, MAX_BOT_TITLE_CHARS))
}

/// Label a conversation, using the current local time when there is nothing to summarize.
pub fn extract_title(messages: &[ChatMessage]) -> String {
    extract_title_at(messages, Local::now())
}

/// Label a conversation from its first user message.
///
/// Falls back to the first line of the first bot reply, then to a timestamped placeholder
/// built from `now`.
pub fn extract_title_at(messages: &[ChatMessage], now: DateTime<Local>) -> String {
    let first_user = messages
        .iter()
        .filter(|m| m.is_user())
        .map(|m| collapse_whitespace(&strip_markdown(&m.text)))
        .find(|s| !s.is_empty());
    if let Some(text) = first_user {
        return title_from_user_text(&text);
    }
    messages
        .iter()
        .filter(|m| m.sender == Sender::Bot && !m.is_loading && !m.is_error)
        .find_map(|m| title_from_bot_text(&m.text))
        .unwrap_or_else(|| format!("Conversation {}", now.format("%Y-%m-%d %H:%M")))
}
