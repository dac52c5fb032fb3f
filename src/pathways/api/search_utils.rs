use itertools::Itertools;
use regex::Regex;

use crate::constants::{QUERY_MAX_CHARS, QUERY_MAX_TOKENS};
use crate::types::Token;

lazy_static! {
    // characters with a special meaning in a Lucene query, plus whitespace
    static ref LUCENE_SPECIAL_RE: Regex = Regex::new(r#"([!*+\-&|()\[\]{}^~?:/\\"\s])"#).unwrap();
    static ref TOKEN_SEPARATOR_RE: Regex = Regex::new(r",?\s+").unwrap();
}

// Escape (with '\') the characters that would otherwise play a special
// role in a Lucene query string.
pub fn escape_lucene(s: &str) -> String {
    LUCENE_SPECIAL_RE.replace_all(s, "\\$1").into_owned()
}

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect::<String>()
}

pub fn sanitize_query(raw_query: &str, max_chars: usize) -> String {
    truncate_chars(raw_query.trim(), max_chars)
}

pub fn tokenize(raw_query: &str, max_tokens: usize) -> Vec<Token> {
    TOKEN_SEPARATOR_RE.split(raw_query)
        .filter(|token| !token.is_empty())
        .take(max_tokens)
        .map(String::from)
        .collect()
}

// tokens of a raw gene query, de-duplicated keeping the first occurrence
pub fn unique_query_tokens(raw_query: &str) -> Vec<Token> {
    let sanitized = sanitize_query(raw_query, QUERY_MAX_CHARS);
    tokenize(&sanitized, QUERY_MAX_TOKENS).into_iter().unique().collect()
}


#[test]
fn test_escape_lucene() {
    assert_eq!(escape_lucene("TP53"), "TP53");
    assert_eq!(escape_lucene("CHEBI:1234"), r"CHEBI\:1234");
    assert_eq!(escape_lucene("cell cycle"), r"cell\ cycle");
    assert_eq!(escape_lucene(r#"a*b?(c)"#), r#"a\*b\?\(c\)"#);
    assert_eq!(escape_lucene(r#"x/y\"z"#), r#"x\/y\\\"z"#);
    assert_eq!(escape_lucene("[a]{b}^~!+-&|"), r"\[a\]\{b\}\^\~\!\+\-\&\|");
}

#[test]
fn test_tokenize() {
    assert_eq!(tokenize("TP53, MDM2  ATM\tATR", 100), vec!["TP53", "MDM2", "ATM", "ATR"]);
    assert_eq!(tokenize("a b c d", 2), vec!["a", "b"]);
    assert!(tokenize("", 10).is_empty());
}

#[test]
fn test_unique_query_tokens() {
    assert_eq!(unique_query_tokens("  TP53 tp53 TP53 MDM2 "), vec!["TP53", "tp53", "MDM2"]);
}

#[test]
fn test_sanitize_query() {
    assert_eq!(sanitize_query("  cell cycle ", 4), "cell");
    assert_eq!(sanitize_query("Δ-delta", 1), "Δ");
}
