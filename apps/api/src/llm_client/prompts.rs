// Shared prompt fragments and prompt-building utilities.
// Each pipeline defines its own templates in pipeline/prompts.rs.
// This file contains the cross-cutting pieces: output contracts and the
// START/END section convention.

use once_cell::sync::Lazy;
use regex::Regex;

/// A run of three or more dashes followed by a section keyword, anywhere in a line.
static DELIMITER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-{3,}[ \t]*(START|END)\b").expect("delimiter pattern is valid")
});

/// Appended to every prompt that expects a structured answer.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with a single valid JSON object only. \
    Do NOT include explanations, apologies, or any text outside the JSON object. \
    Use exactly the key names shown above, with the value types shown.";

/// Appended to every prompt that expects free text back.
pub const PLAIN_TEXT_INSTRUCTION: &str = "Respond with the finished document text only. \
    Do NOT wrap it in code fences, do NOT add commentary before or after it, \
    and do NOT use placeholder brackets such as [Your Name].";

/// Wraps user content in START/END markers for the given section label.
///
/// The content is inserted as opaque text after `sanitize_user_text`, so
/// whatever the user typed can never close or open a section.
pub fn section(label: &str, content: &str) -> String {
    let body = sanitize_user_text(content);
    if body.is_empty() {
        format!("--- START {label} ---\n--- END {label} ---")
    } else {
        format!("--- START {label} ---\n{body}\n--- END {label} ---")
    }
}

/// Normalizes user-supplied text before it is embedded in a prompt.
///
/// - CRLF / CR become LF
/// - control characters other than `\n` and `\t` are dropped
/// - lines that would read as a section delimiter are defused
/// - surrounding blank space is trimmed
pub fn sanitize_user_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned: String = normalized
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    cleaned
        .lines()
        .map(defuse_delimiter)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn defuse_delimiter(line: &str) -> String {
    DELIMITER_TOKEN.replace_all(line, "- $1").into_owned()
}
