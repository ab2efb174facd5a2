//! Text-record rendering.
//!
//! Every line has the shape `<word> 1 TXT "<text>" ["<text>" ...]`.

use crate::dictionary::model::Entry;

const PENDING: &str = "word definition is being fetched. Try again in a few seconds.";
const NOT_FOUND: &str = "word definition was not found in our dictionary, please try other sources.";
const UNAVAILABLE: &str = "dictionary unavailable, try again later.";

/// Line returned while a first fetch for `word` is outstanding.
pub fn pending(word: &str) -> String {
    single(word, PENDING)
}

/// Lines for a cached entry.
pub fn entry(word: &str, entry: &Entry) -> Vec<String> {
    if !entry.valid {
        return vec![single(word, UNAVAILABLE)];
    }
    if !entry.found {
        return vec![single(word, NOT_FOUND)];
    }

    entry
        .meanings
        .iter()
        .map(|m| {
            format!(
                "{} 1 TXT \"{}:\" \"{}\"",
                word,
                escape(&m.part_of_speech),
                escape(&m.definition)
            )
        })
        .collect()
}

fn single(word: &str, text: &str) -> String {
    format!("{} 1 TXT \"{}\"", word, text)
}

/// Backslash-escapes the characters that would end a quoted TXT string.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::model::Meaning;
    use chrono::Utc;

    #[test]
    fn test_placeholder_lines() {
        let now = Utc::now();
        assert_eq!(
            pending("hello"),
            "hello 1 TXT \"word definition is being fetched. Try again in a few seconds.\""
        );
        assert_eq!(
            entry("hello", &Entry::failure("hello", now)),
            vec!["hello 1 TXT \"dictionary unavailable, try again later.\"".to_string()]
        );
        assert_eq!(
            entry("hello", &Entry::not_found("hello", now)),
            vec!["hello 1 TXT \"word definition was not found in our dictionary, please try other sources.\"".to_string()]
        );
    }

    #[test]
    fn test_one_line_per_meaning_in_order() {
        let cached = Entry::found(
            "run",
            vec![Meaning::new("verb", "To move swiftly."), Meaning::new("noun", "An act of running.")],
            Utc::now(),
        );

        assert_eq!(
            entry("run", &cached),
            vec![
                "run 1 TXT \"verb:\" \"To move swiftly.\"".to_string(),
                "run 1 TXT \"noun:\" \"An act of running.\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let cached = Entry::found("say", vec![Meaning::new("verb", r#"To utter "words" \ sounds."#)], Utc::now());
        assert_eq!(entry("say", &cached), vec![r#"say 1 TXT "verb:" "To utter \"words\" \\ sounds.""#.to_string()]);
    }

    #[test]
    fn test_found_without_meanings_renders_nothing() {
        assert!(entry("x", &Entry::found("x", Vec::new(), Utc::now())).is_empty());
    }
}
