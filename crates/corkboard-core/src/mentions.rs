// SPDX-License-Identifier: Apache-2.0

//! Mention extraction from comment content.
//!
//! Pure text scan: `@name` tokens become candidate names, in order of first
//! appearance, deduplicated. Resolving candidates against real workspace
//! membership is the caller's job and must not be skipped — only candidates
//! that resolve to a member of the task's workspace may be persisted or
//! notified.

use std::sync::OnceLock;

use regex::Regex;

fn mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"@(\w+)").unwrap_or_else(|_| unreachable!()))
}

/// Extract candidate mention names from free text.
#[must_use]
pub fn extract_mention_candidates(content: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in mention_pattern().captures_iter(content) {
        if let Some(name) = capture.get(1) {
            let name = name.as_str();
            if !seen.iter().any(|s: &String| s == name) {
                seen.push(name.to_string());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tokens_in_order() {
        assert_eq!(
            extract_mention_candidates("ping @alice and @bob_2 about this"),
            vec!["alice".to_string(), "bob_2".to_string()]
        );
    }

    #[test]
    fn deduplicates_repeated_mentions() {
        assert_eq!(
            extract_mention_candidates("@alice @alice @alice"),
            vec!["alice".to_string()]
        );
    }

    #[test]
    fn ignores_bare_at_signs_and_empty_content() {
        assert!(extract_mention_candidates("a @ b @@ c").is_empty());
        assert!(extract_mention_candidates("").is_empty());
    }

    #[test]
    fn stops_candidates_at_non_word_characters() {
        assert_eq!(
            extract_mention_candidates("thanks @carol!"),
            vec!["carol".to_string()]
        );
    }
}
