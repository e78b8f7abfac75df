// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Buttons File Tokenizer
/// Splits the line-oriented buttons file into section changes and `Token: value` pairs
///
/// Line grammar:
/// - blank lines and lines starting with '#' are skipped
/// - `[Name]` opens a section
/// - `Name: value` is a token (split at the first ':', both sides trimmed)
/// - anything else is reported as junk so the loader can flag it

use std::io::{self, BufRead};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Section(String),
    Token { name: String, value: String },
    Junk(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub item: Item,
}

pub struct Tokenizer<R: BufRead> {
    reader: R,
    number: usize,
    buf: String,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            number: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.number += 1;

            if let Some(item) = classify(&self.buf) {
                return Some(Ok(Line { number: self.number, item }));
            }
        }
    }
}

/// Classify one raw line; None for blank and comment lines
fn classify(raw: &str) -> Option<Item> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
        return Some(Item::Section(inner.trim().to_string()));
    }

    match line.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Some(Item::Token {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        }),
        _ => Some(Item::Junk(line.to_string())),
    }
}

// ============================================================================
// Format version: "n.nn" held as hundredths
// ============================================================================

/// Parse "n.nn" (one digit, a dot, two digits) into hundredths: "2.00" -> 200
pub fn parse_format(s: &str) -> Option<u32> {
    let bytes = s.trim().as_bytes();
    match bytes {
        [whole, b'.', tenths, hundredths]
            if whole.is_ascii_digit() && tenths.is_ascii_digit() && hundredths.is_ascii_digit() =>
        {
            let digit = |b: u8| u32::from(b - b'0');
            Some(digit(*whole) * 100 + digit(*tenths) * 10 + digit(*hundredths))
        }
        _ => None,
    }
}

/// Render hundredths back to "n.nn"
pub fn format_version(version: u32) -> String {
    format!("{}.{:02}", version / 100, version % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(text: &str) -> Vec<(usize, Item)> {
        Tokenizer::new(text.as_bytes())
            .map(|l| l.unwrap())
            .map(|l| (l.number, l.item))
            .collect()
    }

    #[test]
    fn test_skips_comments_and_blanks() {
        let got = items("# >Buttons\n#\n\n   \nFormat: 2.00\n");
        assert_eq!(
            got,
            vec![(5, Item::Token { name: "Format".into(), value: "2.00".into() })]
        );
    }

    #[test]
    fn test_sections_and_tokens() {
        let got = items("[Panels]\r\n@: Default\nRunPath: Filer_Run adfs::0.$.Apps\n");
        assert_eq!(got[0], (1, Item::Section("Panels".into())));
        assert_eq!(got[1], (2, Item::Token { name: "@".into(), value: "Default".into() }));
        // Only the first ':' splits
        assert_eq!(
            got[2],
            (3, Item::Token { name: "RunPath".into(), value: "Filer_Run adfs::0.$.Apps".into() })
        );
    }

    #[test]
    fn test_junk_lines_reported() {
        let got = items("just words\n: no name\n");
        assert_eq!(got[0].1, Item::Junk("just words".into()));
        assert_eq!(got[1].1, Item::Junk(": no name".into()));
    }

    #[test]
    fn test_empty_value_kept() {
        let got = items("Sprite:\n");
        assert_eq!(got[0].1, Item::Token { name: "Sprite".into(), value: String::new() });
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("2.00"), Some(200));
        assert_eq!(parse_format(" 1.05 "), Some(105));
        assert_eq!(parse_format("9.99"), Some(999));
        assert_eq!(parse_format("0.00"), Some(0));
        assert_eq!(parse_format("2.0"), None);
        assert_eq!(parse_format("10.00"), None);
        assert_eq!(parse_format("a.bc"), None);
        assert_eq!(format_version(200), "2.00");
        assert_eq!(format_version(5), "0.05");
    }
}
