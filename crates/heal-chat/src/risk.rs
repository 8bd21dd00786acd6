//! Keyword-based risk detection on user messages.
//!
//! Deliberately coarse: a match only ever raises an alert for a human to
//! review, it never changes what the responder is asked.
//!
//! Matching is on whole words. Text is lowercased, punctuation becomes a
//! space, and a phrase matches only between word boundaries, so `rape` does
//! not fire on "grape". Benign idioms are blanked out before the high-risk
//! phrases are checked.

use heal_store::AlertSeverity;

const CRITICAL: &[&str] = &[
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "hurt myself",
    "self harm",
    "selfharm",
];

const HIGH: &[&str] = &[
    "in danger",
    "being attacked",
    "attacked me",
    "attack me",
    "going to attack",
    "raped",
    "rape",
    "sexually assaulted",
    "assaulted me",
    "assault",
    "going to hurt me",
    "threatened to kill",
];

/// Phrases that contain a high-risk word but describe something else.
const BENIGN: &[&str] = &[
    "panic attack",
    "panic attacks",
    "anxiety attack",
    "anxiety attacks",
    "heart attack",
    "heart attacks",
    "not in danger",
    "no longer in danger",
    "out of danger",
];

const MEDIUM: &[&str] = &["hopeless", "no way out", "can't go on", "worthless"];

/// Lowercase `content` and reduce it to single-space separated words with
/// a leading and trailing space.
fn normalize(content: &str) -> String {
    let mapped: String = content
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\'' => '\'',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    let mut text = String::with_capacity(mapped.len() + 2);
    text.push(' ');
    for word in mapped.split_whitespace() {
        text.push_str(word);
        text.push(' ');
    }
    text
}

fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.contains(&format!(" {phrase} "))
}

fn blank_out(mut text: String, phrases: &[&str]) -> String {
    for phrase in phrases {
        text = text.replace(&format!(" {phrase} "), "   ");
    }
    text
}

/// Severity suggested by the wording of `content`, if any.
#[must_use]
pub fn assess(content: &str) -> Option<AlertSeverity> {
    let text = normalize(content);
    let hit = |text: &str, phrases: &[&str]| phrases.iter().any(|p| contains_phrase(text, p));

    if hit(&text, CRITICAL) {
        return Some(AlertSeverity::Critical);
    }
    if hit(&blank_out(text.clone(), BENIGN), HIGH) {
        return Some(AlertSeverity::High);
    }
    if hit(&text, MEDIUM) {
        return Some(AlertSeverity::Medium);
    }
    None
}

/// Whether a detected severity reaches the configured threshold.
#[must_use]
pub fn meets_threshold(detected: AlertSeverity, threshold: Option<AlertSeverity>) -> bool {
    threshold.is_some_and(|t| detected >= t)
}
