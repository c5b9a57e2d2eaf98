use regex::{Regex, RegexBuilder};
use std::ops::Range;

use super::MatchError;

/// Flag letters a regex literal may carry
pub(crate) const REGEX_FLAGS: &str = "gimsux";

/// Build a regex from a `/pattern/flags` literal.
///
/// Every occurrence is always searched for, so `g` is accepted whether or not
/// it was given. `u` is accepted too since matching is always Unicode-aware.
pub fn compile_regex(pattern: &str, flags: &str) -> Result<Regex, MatchError> {
    let mut builder = RegexBuilder::new(pattern);

    for flag in flags.chars() {
        match flag {
            'g' | 'u' => {}
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            other => return Err(MatchError::UnsupportedFlag(other)),
        }
    }

    builder
        .build()
        .map_err(|e| MatchError::InvalidPattern(e.to_string()))
}

/// The single best occurrence in `text`: longest wins, ties go to the
/// earliest. Offsets are character indices. Empty occurrences never count.
pub fn best_regex_match(text: &str, regex: &Regex) -> Option<Range<usize>> {
    let mut best: Option<Range<usize>> = None;
    let mut chars_before = 0;
    let mut byte_cursor = 0;

    for m in regex.find_iter(text) {
        chars_before += text[byte_cursor..m.start()].chars().count();
        byte_cursor = m.start();

        let len = m.as_str().chars().count();
        let longer = match &best {
            Some(current) => len > current.len(),
            None => len > 0,
        };
        if longer {
            best = Some(chars_before..chars_before + len);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best(text: &str, pattern: &str, flags: &str) -> Option<Range<usize>> {
        let regex = compile_regex(pattern, flags).unwrap();
        best_regex_match(text, &regex)
    }

    #[test]
    fn test_first_of_equal_length_occurrences() {
        assert_eq!(best("foofoo", "foo", ""), Some(0..3));
        assert_eq!(best("foofoo", "foo", "g"), Some(0..3));
    }

    #[test]
    fn test_longest_occurrence_wins() {
        assert_eq!(best("ab aaab aab", "a+b", ""), Some(3..7));
    }

    #[test]
    fn test_case_flag() {
        assert_eq!(best("RenderFrame", "frame", ""), None);
        assert_eq!(best("RenderFrame", "frame", "i"), Some(6..11));
    }

    #[test]
    fn test_char_offsets() {
        assert_eq!(best("ünïcode_fn", "code", ""), Some(3..7));
        assert_eq!(best("日本語 parse", "par.e", ""), Some(4..9));
    }

    #[test]
    fn test_empty_occurrences_are_not_matches() {
        assert_eq!(best("bbb", "a*", ""), None);
        assert_eq!(best("bab", "a*", ""), Some(1..2));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = compile_regex("[invalid", "");
        assert!(matches!(result, Err(MatchError::InvalidPattern(_))));
    }

    #[test]
    fn test_unsupported_flag() {
        let result = compile_regex("foo", "gq");
        assert!(matches!(result, Err(MatchError::UnsupportedFlag('q'))));
    }
}
