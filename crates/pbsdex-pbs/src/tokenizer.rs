//! PBS block tokenizer.
//!
//! Splits a PBS text file into [`RawBlock`]s:
//!
//! ```text
//! # comment
//! [BULBASAUR]            <- header
//! Name = Bulbasaur       <- key/value
//! [BULBASAUR,1]          <- header with numeric suffix
//! [003] # Forested Cave  <- numeric header with a label
//! Land,21                <- sub-label with rate (opt-in)
//! 20,PIDGEY,2,4          <- row under the sub-label
//! ```
//!
//! Tokenizing never fails. Blank lines, comment lines and lines that match no
//! pattern are skipped; only the number of unrecognized lines is kept.

use crate::coerce::to_list;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[\s*([^\[\],#]+?)\s*(?:,\s*(\d+)\s*)?\]\s*(?:#\s*(.*?))?\s*$")
            .expect("header regex")
    })
}

fn sub_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9 _-]*?)\s*(?:,\s*(-?\d+))?$").expect("sub-label regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub comment_marker: char,
    /// Truncate non-header lines at the first comment marker.
    pub strip_inline_comments: bool,
    /// Treat bare `Label` / `Label,rate` lines as sub-blocks and other
    /// non key/value lines as rows of the open sub-block.
    pub sub_labels: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            comment_marker: '#',
            strip_inline_comments: true,
            sub_labels: false,
        }
    }
}

impl TokenizerOptions {
    pub fn with_sub_labels(mut self) -> Self {
        self.sub_labels = true;
        self
    }
}

/// A labelled group of rows inside a block (encounter methods and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBlock {
    pub label: String,
    pub rate: Option<i64>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawBlock {
    /// The bracketed token as written (`BULBASAUR`, `003`).
    pub header: String,
    /// `[NAME,n]` suffix, or the value of an all-digit header.
    pub index: Option<u32>,
    /// Free text after `] #`.
    pub label: Option<String>,
    /// Raw pairs; a repeated key overwrites in place.
    pub fields: IndexMap<String, String>,
    pub sections: Vec<SubBlock>,
}

impl RawBlock {
    /// The header as an identifier, unless it is purely numeric.
    pub fn name_token(&self) -> Option<&str> {
        let h = self.header.as_str();
        if h.is_empty() || h.bytes().all(|b| b.is_ascii_digit()) {
            None
        } else {
            Some(h)
        }
    }

    /// Case-insensitive raw field lookup.
    pub fn get_ci(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Comment,
    Header {
        token: String,
        index: Option<u32>,
        label: Option<String>,
    },
    Pair {
        key: String,
        value: String,
    },
    SubLabel {
        label: String,
        rate: Option<i64>,
    },
    Row(Vec<String>),
    Unrecognized,
}

pub fn classify_line(raw: &str, options: &TokenizerOptions) -> Line {
    let line = raw.trim_start_matches('\u{feff}').trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with(options.comment_marker) {
        return Line::Comment;
    }

    if let Some(caps) = header_re().captures(line) {
        let token = caps[1].to_string();
        let index = match caps.get(2) {
            Some(m) => m.as_str().parse().ok(),
            None if token.bytes().all(|b| b.is_ascii_digit()) => token.parse().ok(),
            None => None,
        };
        let label = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        return Line::Header {
            token,
            index,
            label,
        };
    }

    let line = if options.strip_inline_comments {
        match line.find(options.comment_marker) {
            Some(pos) => line[..pos].trim_end(),
            None => line,
        }
    } else {
        line
    };
    if line.is_empty() {
        return Line::Comment;
    }

    if let Some(pos) = find_unescaped_eq(line) {
        let key = line[..pos].trim().replace("\\=", "=");
        if key.is_empty() {
            return Line::Unrecognized;
        }
        let value = line[pos + 1..].trim().to_string();
        return Line::Pair { key, value };
    }

    if options.sub_labels {
        if let Some(caps) = sub_label_re().captures(line) {
            return Line::SubLabel {
                label: caps[1].trim().to_string(),
                rate: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            };
        }
        return Line::Row(to_list(line));
    }

    Line::Unrecognized
}

fn find_unescaped_eq(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    (0..bytes.len()).find(|&i| bytes[i] == b'=' && (i == 0 || bytes[i - 1] != b'\\'))
}

enum State {
    NoBlock,
    Open(RawBlock),
}

/// Lazy iterator of blocks in source order.
pub struct BlockTokenizer<'a> {
    lines: std::str::Lines<'a>,
    options: TokenizerOptions,
    state: State,
    unrecognized: usize,
}

impl<'a> BlockTokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, TokenizerOptions::default())
    }

    pub fn with_options(text: &'a str, options: TokenizerOptions) -> Self {
        Self {
            lines: text.lines(),
            options,
            state: State::NoBlock,
            unrecognized: 0,
        }
    }

    /// Lines skipped so far because they matched no pattern (or had no block
    /// or sub-block to attach to).
    pub fn unrecognized_lines(&self) -> usize {
        self.unrecognized
    }

    fn open_block(&mut self) -> Option<&mut RawBlock> {
        match &mut self.state {
            State::Open(block) => Some(block),
            State::NoBlock => None,
        }
    }
}

impl Iterator for BlockTokenizer<'_> {
    type Item = RawBlock;

    fn next(&mut self) -> Option<RawBlock> {
        loop {
            let Some(raw) = self.lines.next() else {
                return match std::mem::replace(&mut self.state, State::NoBlock) {
                    State::Open(block) => Some(block),
                    State::NoBlock => None,
                };
            };

            match classify_line(raw, &self.options) {
                Line::Blank | Line::Comment => {}
                Line::Header {
                    token,
                    index,
                    label,
                } => {
                    let block = RawBlock {
                        header: token,
                        index,
                        label,
                        ..RawBlock::default()
                    };
                    if let State::Open(prev) = std::mem::replace(&mut self.state, State::Open(block))
                    {
                        return Some(prev);
                    }
                }
                Line::Pair { key, value } => match self.open_block() {
                    Some(block) => {
                        block.fields.insert(key, value);
                    }
                    None => self.unrecognized += 1,
                },
                Line::SubLabel { label, rate } => match self.open_block() {
                    Some(block) => block.sections.push(SubBlock {
                        label,
                        rate,
                        rows: Vec::new(),
                    }),
                    None => self.unrecognized += 1,
                },
                Line::Row(row) => {
                    match self.open_block().and_then(|b| b.sections.last_mut()) {
                        Some(section) => section.rows.push(row),
                        None => self.unrecognized += 1,
                    }
                }
                Line::Unrecognized => self.unrecognized += 1,
            }
        }
    }
}

/// Tokenize the whole text with default options.
pub fn tokenize(text: &str) -> Vec<RawBlock> {
    BlockTokenizer::new(text).collect()
}
