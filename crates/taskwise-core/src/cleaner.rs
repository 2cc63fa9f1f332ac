//! Task text cleaning.
//!
//! Stripping scheduling phrases ("in 3 hours", "asap") needs a language
//! model, so the local path leaves the text untouched. Text returned by the
//! AI analyzer goes through [`normalize_cleaned`] before it is used.

/// Local cleaning: returns the input unchanged.
pub fn clean(text: &str) -> String {
    text.to_string()
}

/// Accept AI-cleaned text, falling back to `raw` when the model returned
/// nothing usable. The result is never empty unless `raw` is.
pub fn normalize_cleaned(raw: &str, candidate: &str) -> String {
    let trimmed = candidate
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    if trimmed.is_empty() {
        raw.trim().to_string()
    } else {
        trimmed.to_string()
    }
}
