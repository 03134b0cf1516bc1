//! Total string → value coercions.
//!
//! None of these functions fail. A value that does not parse falls back to
//! its raw text (numbers), to "absent" (booleans) or to a best-effort entry
//! (sequences), so one bad cell never costs the rest of the record.

use crate::value::{Evolution, FieldValue, LevelEntry};
use regex::Regex;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::OnceLock;

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)$").expect("decimal regex"))
}

/// Optional sign followed by ASCII digits, surrounding whitespace ignored.
pub fn parse_int(s: &str) -> Option<i64> {
    let t = s.trim();
    let digits = t.strip_prefix(['+', '-']).unwrap_or(t);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    t.parse().ok()
}

pub fn parse_float(s: &str) -> Option<f64> {
    let t = s.trim();
    if !decimal_re().is_match(t) {
        return None;
    }
    t.parse().ok()
}

/// Integer, or the raw text when it is not one.
pub fn to_int(s: &str) -> FieldValue {
    match parse_int(s) {
        Some(v) => FieldValue::Int(v),
        None => FieldValue::Text(s.to_string()),
    }
}

/// Decimal number, or the raw text when it is not one.
pub fn to_float(s: &str) -> FieldValue {
    match parse_float(s) {
        Some(v) => FieldValue::Float(v),
        None => FieldValue::Text(s.to_string()),
    }
}

/// `None` for anything outside the fixed truthy/falsy sets.
pub fn to_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

pub fn to_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `1,TACKLE,5,GROWL` → `[(1, TACKLE), (5, GROWL)]`.
///
/// A level that is not an integer is kept as level 0. A trailing token with
/// no partner is dropped.
pub fn to_paired_sequence(s: &str) -> Vec<LevelEntry> {
    let tokens = to_list(s);
    let pairs = tokens.chunks_exact(2);
    if !pairs.remainder().is_empty() {
        tracing::debug!(token = %pairs.remainder()[0], "dropping unpaired learnset token");
    }
    pairs
        .map(|pair| LevelEntry {
            level: parse_int(&pair[0]).unwrap_or(0),
            name: pair[1].clone(),
        })
        .collect()
}

/// `IVYSAUR,Level,16` → `[(IVYSAUR, Level, 16)]`; a short final group is
/// padded with empty strings.
pub fn to_triple_sequence(s: &str) -> Vec<Evolution> {
    to_list(s)
        .chunks(3)
        .map(|group| {
            let at = |i: usize| group.get(i).cloned().unwrap_or_default();
            Evolution {
                to: at(0),
                method: at(1),
                param: at(2),
            }
        })
        .collect()
}

/// Keep the first occurrence of every element, preserving relative order.
pub fn dedupe_keep_order<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Lowercase, runs outside `[a-z0-9]` collapsed to `-`, no `-` at either end.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut gap = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if gap && !out.is_empty() {
                out.push('-');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }
    out
}

/// `MR_MIME` → `Mr Mime`, `PORYGON2` → `Porygon2`.
pub fn title_from_internal(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
