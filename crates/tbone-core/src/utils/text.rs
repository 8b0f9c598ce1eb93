//! String utility functions.
//!
//! Used to derive storage names (collection names) from model names.

use regex::Regex;
use std::sync::OnceLock;

/// Converts a `CamelCase` identifier to `snake_case`.
///
/// Runs of capitals are treated as one word, so acronyms stay together.
///
/// # Examples
///
/// ```
/// use tbone_core::utils::text::snake_case;
///
/// assert_eq!(snake_case("MovieReview"), "movie_review");
/// assert_eq!(snake_case("HTTPRequest"), "http_request");
/// assert_eq!(snake_case("already_snake"), "already_snake");
/// ```
pub fn snake_case(s: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static WORD: OnceLock<Regex> = OnceLock::new();

    let acronym = ACRONYM.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
    let word = WORD.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").unwrap());

    let s = acronym.replace_all(s, "${1}_${2}");
    let s = word.replace_all(&s, "${1}_${2}");
    s.to_lowercase()
}

/// Returns a naive English plural of a lowercase word.
///
/// # Examples
///
/// ```
/// use tbone_core::utils::text::pluralize;
///
/// assert_eq!(pluralize("movie"), "movies");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("box"), "boxes");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let ends_with_consonant_y = word.ends_with('y')
        && word
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));

    if ends_with_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── snake_case ───────────────────────────────────────────────────

    #[test]
    fn test_snake_case_single_word() {
        assert_eq!(snake_case("Movie"), "movie");
    }

    #[test]
    fn test_snake_case_two_words() {
        assert_eq!(snake_case("MovieReview"), "movie_review");
    }

    #[test]
    fn test_snake_case_acronym() {
        assert_eq!(snake_case("DBRefHolder"), "db_ref_holder");
    }

    #[test]
    fn test_snake_case_digits() {
        assert_eq!(snake_case("Top10List"), "top10_list");
    }

    #[test]
    fn test_snake_case_empty() {
        assert_eq!(snake_case(""), "");
    }

    // ── pluralize ────────────────────────────────────────────────────

    #[test]
    fn test_pluralize_regular() {
        assert_eq!(pluralize("person"), "persons");
    }

    #[test]
    fn test_pluralize_vowel_y() {
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn test_pluralize_sibilants() {
        assert_eq!(pluralize("class"), "classes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("dish"), "dishes");
    }

    #[test]
    fn test_pluralize_empty() {
        assert_eq!(pluralize(""), "");
    }
}
