use deunicode::deunicode;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Za-z0-9 ]+").expect("valid regex");
    static ref SPACES: Regex = Regex::new(r" {2,}").expect("valid regex");
}

/// Normalize raw text into the shared token space of documents and queries.
///
/// Text is first transliterated to its closest ASCII spelling (`ø` -> `o`,
/// `ß` -> `ss`, `Æ` -> `AE`), every remaining non-alphanumeric character becomes
/// a space, runs of spaces collapse and the result is trimmed and uppercased.
/// The output of an empty or punctuation-only input is the empty string.
pub fn normalize(text: &str) -> String {
    let folded = deunicode(text);
    let spaced = NON_ALNUM.replace_all(&folded, " ");
    let collapsed = SPACES.replace_all(&spaced, " ");
    collapsed.trim().to_ascii_uppercase()
}

/// Split already-normalized text into tokens. Yields nothing for empty input.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

/// Normalize and split in one step, as both indexing and query paths do.
pub fn tokenize(text: &str) -> Vec<String> {
    tokens(&normalize(text)).map(str::to_owned).collect()
}

/// Whether a token may enter the vocabulary: purely alphabetic, at least two letters.
pub fn is_index_term(term: &str) -> bool {
    term.len() >= 2 && term.bytes().all(|b| b.is_ascii_alphabetic())
}
