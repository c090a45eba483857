use super::*;

/// Document punctuation mapped to the ASCII written to output. Every
/// replacement is plain ASCII so sanitizing is idempotent.
const PUNCTUATION_MAP: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2012}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2015}', "-"),
    ('\u{2212}', "-"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201B}', "'"),
    ('\u{02BC}', "'"),
    ('\u{00B4}', "'"),
    ('\u{2032}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    ('\u{201F}', "\""),
    ('\u{2033}', "\""),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{2002}', " "),
    ('\u{2003}', " "),
    ('\u{2009}', " "),
    ('\u{202F}', " "),
    ('\u{2022}', "*"),
    ('\u{00AE}', "(R)"),
    ('\u{2122}', "(TM)"),
    ('\u{00A9}', "(C)"),
    ('\u{00B0}', "deg"),
    ('\u{200B}', ""),
    ('\u{FEFF}', ""),
];

pub fn sanitize_for_output(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());
    for ch in text.chars() {
        match PUNCTUATION_MAP.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => sanitized.push_str(to),
            None => sanitized.push(ch),
        }
    }
    sanitized
}

/// Replaces each run of CR/LF with one space so words on either side of a
/// line break stay apart.
pub fn strip_newlines(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_break = false;
    for ch in text.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                stripped.push(' ');
                in_break = true;
            }
        } else {
            stripped.push(ch);
            in_break = false;
        }
    }
    stripped
}

pub fn split_and_strip(text: &str, delimiter: &str) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_cell_text(text: &str) -> String {
    collapse_whitespace(&sanitize_for_output(&strip_newlines(text)))
}
