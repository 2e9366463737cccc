//! Query parsing and hit ranking for user search
//!
//! A query fans out into three kinds of substring passes: one against
//! `username`, one against `email` and one per word against `name`. Every
//! pass returns the records it matched; a record's score is the number of
//! passes that returned it. This is a naive OR search meant for small
//! tables, not a full-text index.

use std::collections::HashMap;
use std::hash::Hash;

/// Terms derived from a raw search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    /// Query without its first character, matched against `username`
    pub username: String,

    /// Query with all whitespace removed, matched against `email`
    pub email: String,

    /// Words of the query (first character dropped), each matched against `name`
    pub name_tokens: Vec<String>,
}

impl SearchTerms {
    /// Splits a raw query into per-field terms
    ///
    /// The first character is treated as a sigil (`@minh`, `#minh`) and
    /// dropped for the username and name passes. The email pass keeps the
    /// whole query.
    pub fn parse(query: &str) -> Self {
        let mut chars = query.chars();
        chars.next();
        let stripped = chars.as_str();

        Self {
            username: stripped.to_string(),
            email: query.split_whitespace().collect(),
            name_tokens: stripped.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Passes to run, as `(column, term)` pairs
    ///
    /// The username and email passes always run. An empty term becomes the
    /// `%%` pattern and matches every row, so a one-character or blank query
    /// lists everyone.
    pub fn passes(&self) -> Vec<(SearchField, &str)> {
        let mut passes = Vec::with_capacity(2 + self.name_tokens.len());

        passes.push((SearchField::Username, self.username.as_str()));
        passes.push((SearchField::Email, self.email.as_str()));
        for token in &self.name_tokens {
            passes.push((SearchField::Name, token.as_str()));
        }

        passes
    }
}

/// Column targeted by a search pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Username,
    Email,
    Name,
}

impl SearchField {
    /// SQL expression compared against the pattern
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Username => "upper(username)",
            SearchField::Email => "upper(email::text)",
            SearchField::Name => "upper(name)",
        }
    }
}

/// Builds a `LIKE` pattern matching `term` anywhere, case-folded to upper case
///
/// `%`, `_` and `\` in the term are escaped so they match literally.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_uppercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Orders records by how many passes returned them, most hits first
///
/// `key` identifies a record across passes. Records with the same count
/// keep the order in which they were first seen.
pub fn rank_by_frequency<T, K, F>(hits: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut ranked: Vec<(T, usize)> = Vec::new();

    for hit in hits {
        let k = key(&hit);
        match slots.get(&k) {
            Some(&slot) => ranked[slot].1 += 1,
            None => {
                slots.insert(k, ranked.len());
                ranked.push((hit, 1));
            }
        }
    }

    // sort_by is stable: ties stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().map(|(hit, _)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_first_character() {
        let terms = SearchTerms::parse("@nguyen van an");

        assert_eq!(terms.username, "nguyen van an");
        assert_eq!(terms.email, "@nguyenvanan");
        assert_eq!(terms.name_tokens, vec!["nguyen", "van", "an"]);
    }

    #[test]
    fn test_parse_handles_multibyte_first_character() {
        let terms = SearchTerms::parse("Đức");
        assert_eq!(terms.username, "ức");
        assert_eq!(terms.name_tokens, vec!["ức"]);
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let terms = SearchTerms::parse(" a  b\tc ");
        assert_eq!(terms.email, "abc");
        assert_eq!(terms.name_tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_passes_keep_empty_terms() {
        let terms = SearchTerms::parse("Q");
        assert_eq!(
            terms.passes(),
            vec![(SearchField::Username, ""), (SearchField::Email, "Q")]
        );

        let blank = SearchTerms::parse(" ");
        assert_eq!(
            blank.passes(),
            vec![(SearchField::Username, ""), (SearchField::Email, "")]
        );
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_passes_cover_every_name_token() {
        let terms = SearchTerms::parse("xan binh");
        let fields: Vec<SearchField> = terms.passes().into_iter().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec![
                SearchField::Username,
                SearchField::Email,
                SearchField::Name,
                SearchField::Name
            ]
        );
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("an"), "%AN%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_OFF%");
        assert_eq!(contains_pattern("a\\b"), "%A\\\\B%");
    }

    #[test]
    fn test_rank_by_frequency_orders_descending() {
        // (id, label) pairs as returned by successive passes
        let hits = vec![(1, "a"), (2, "b"), (3, "c"), (2, "b"), (3, "c"), (3, "c")];
        let ranked = rank_by_frequency(hits, |h| h.0);
        let ids: Vec<i32> = ranked.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_rank_by_frequency_keeps_first_seen_order_on_ties() {
        let hits = vec![5, 7, 9, 7, 5];
        let ranked = rank_by_frequency(hits, |h| *h);
        assert_eq!(ranked, vec![5, 7, 9]);
    }

    #[test]
    fn test_rank_by_frequency_counts_are_non_increasing() {
        let hits = vec![4, 1, 4, 2, 1, 4, 3, 2, 1, 1];
        let counts = |id: i32| hits.iter().filter(|h| **h == id).count();
        let ranked = rank_by_frequency(hits.clone(), |h| *h);

        assert_eq!(ranked.len(), 4);
        for pair in ranked.windows(2) {
            assert!(counts(pair[0]) >= counts(pair[1]));
        }
    }
}
