//! PBS format converters.
//!
//! One module per PBS file kind. Each module owns the [`Schema`] for its file
//! and a `parse_*` entry point built on the shared `pbsdex-pbs` pipeline:
//!
//! - [`pokemon`]: `pokemon.txt` + `pokemon_forms.txt` → merged species/forms
//! - [`moves`], [`types`], [`items`], [`abilities`]: keyed record sets
//! - [`encounters`]: per-location encounter tables (sub-label rows)

use anyhow::{Context, Result};
use pbsdex_pbs::{BlockTokenizer, DuplicatePolicy, RecordAssembler, RecordSet, Schema, TokenizerOptions};
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub mod abilities;
pub mod encounters;
pub mod items;
pub mod moves;
pub mod pokemon;
pub mod types;

/// Counters collected while turning a file into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub blocks: usize,
    /// Blocks without a usable identifier.
    pub dropped: usize,
    pub unrecognized_lines: usize,
    pub duplicates: usize,
}

impl ParseReport {
    pub fn log(&self, format: &str) {
        tracing::debug!(
            schema = format,
            blocks = self.blocks,
            dropped = self.dropped,
            unrecognized_lines = self.unrecognized_lines,
            duplicates = self.duplicates,
            "parsed"
        );
    }
}

/// Tokenize `text` and assemble every block into a base record set.
pub fn collect_records(
    schema: &Schema,
    text: &str,
    options: TokenizerOptions,
    policy: DuplicatePolicy,
) -> (RecordSet, ParseReport) {
    let assembler = RecordAssembler::new(schema);
    let mut tokenizer = BlockTokenizer::with_options(text, options);
    let mut set = RecordSet::new(policy);
    let mut report = ParseReport::default();

    for (position, block) in tokenizer.by_ref().enumerate() {
        report.blocks += 1;
        match assembler.assemble(&block, position) {
            Some(record) => {
                set.insert(record);
            }
            None => report.dropped += 1,
        }
    }
    report.unrecognized_lines = tokenizer.unrecognized_lines();
    report.duplicates = set.duplicates();
    report.log(schema.name);
    (set, report)
}

/// Read a PBS file; invalid UTF-8 is replaced rather than rejected.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Input not found: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The keyed (non-merging) formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Moves,
    Types,
    Items,
    Abilities,
    Encounters,
}

impl Format {
    pub fn noun(self) -> &'static str {
        match self {
            Format::Moves => "moves",
            Format::Types => "types",
            Format::Items => "items",
            Format::Abilities => "abilities",
            Format::Encounters => "locations",
        }
    }

    /// Convert `text` to pretty JSON (field order preserved) and the number
    /// of top-level entries.
    pub fn convert(self, text: &str) -> Result<(String, usize)> {
        let (json, count) = match self {
            Format::Moves => {
                let set = moves::parse_moves(text);
                (serde_json::to_string_pretty(&set)?, set.len())
            }
            Format::Types => {
                let set = types::parse_types(text);
                (serde_json::to_string_pretty(&set)?, set.len())
            }
            Format::Items => {
                let set = items::parse_items(text);
                (serde_json::to_string_pretty(&set)?, set.len())
            }
            Format::Abilities => {
                let set = abilities::parse_abilities(text);
                (serde_json::to_string_pretty(&set)?, set.len())
            }
            Format::Encounters => {
                let tables = encounters::parse_encounters(text);
                (serde_json::to_string_pretty(&tables)?, tables.len())
            }
        };
        Ok((json, count))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Moves => "moves",
            Format::Types => "types",
            Format::Items => "items",
            Format::Abilities => "abilities",
            Format::Encounters => "encounters",
        };
        f.write_str(name)
    }
}
