use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form used for every token comparison in the engine.
///
/// Lower-cases, decomposes (NFD) and drops combining marks, then collapses
/// whitespace runs to a single space and trims. Total: empty in, empty out.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text with punctuation turned into separators and padded with a
/// leading and trailing space, so whole words can be found with `contains_word`.
///
/// `+`, `#` and `.` survive inside tokens (c++, c#, node.js).
pub fn word_text(text: &str) -> String {
    let normalized = normalize(text);
    let spaced: String = normalized
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '+' | '#' | '.') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let tokens: Vec<&str> = spaced
        .split_whitespace()
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .collect();
    format!(" {} ", tokens.join(" "))
}

/// True when `phrase` (already normalized) occurs as whole words in `padded`,
/// a string produced by [`word_text`].
pub fn contains_word(padded: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    padded.contains(&format!(" {phrase} "))
}
