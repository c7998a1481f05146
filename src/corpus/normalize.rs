use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters rewritten before whitespace is collapsed. Everything not listed
/// with a literal replacement becomes a space.
const SUBSTITUTIONS: &[(char, &str)] = &[
    ('&', " and "),
    ('-', " "),
    ('\u{2010}', " "), // hyphen
    ('\u{2013}', " "), // en dash
    ('\u{2014}', " "), // em dash
    ('[', " "),
    (']', " "),
    ('+', " "),
    ('%', " "),
    ('$', " "),
    ('>', " "),
    ('<', " "),
    ('/', " "),
    ('.', " "),
    (',', " "),
    ('\'', " "),
    ('λ', " "),
];

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Nonspacing marks (general category Mn) only. Spacing marks such as Indic
/// vowel signs carry meaning and are kept.
fn nonspacing_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{Mn}+").expect("static regex"))
}

/// Canonical form of a raw keyword token.
///
/// Lowercases, strips diacritics (canonical decomposition with nonspacing
/// marks dropped), applies the substitution table, collapses whitespace runs and
/// trims. May return an empty string. Applying it twice is the same as
/// applying it once.
pub fn normalize_keyword(raw: &str) -> String {
    let decomposed: String = raw.to_lowercase().nfd().collect();
    let stripped = nonspacing_marks().replace_all(&decomposed, "");

    let mut substituted = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => substituted.push_str(to),
            None => substituted.push(c),
        }
    }

    whitespace_run()
        .replace_all(&substituted, " ")
        .trim()
        .to_string()
}
