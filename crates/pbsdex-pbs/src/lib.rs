//! PBS block parsing and form merging.
//!
//! PBS files are line-oriented: a bracketed header opens a block, `Key = Value`
//! lines fill it, and a later block may partially override an earlier one
//! (`[BULBASAUR,1]` refines `[BULBASAUR]`). This crate provides the reusable
//! pipeline behind every PBS format:
//!
//! - [`tokenizer`]: text → ordered [`RawBlock`]s (never fails).
//! - [`coerce`]: raw strings → typed values.
//! - [`schema`] + [`assemble`]: per-format alias tables and record assembly.
//! - [`merge`]: base records + overrides → fully materialized entities.
//!
//! Format-specific schemas live in `pbsdex-ingest`.

pub mod assemble;
pub mod coerce;
pub mod error;
pub mod merge;
pub mod record;
pub mod schema;
pub mod stats;
pub mod tokenizer;
pub mod value;

pub use assemble::{extract_types, RecordAssembler, TypeParts};
pub use error::{PbsError, Result};
pub use merge::{
    is_cosmetic_form, merge, CosmeticPolicy, CosmeticRule, FormInfo, MergeEngine, MergeOutcome,
    MergedEntity,
};
pub use record::{CanonicalRecord, DuplicatePolicy, OverrideBlock, RawFields, RecordSet};
pub use schema::{FieldDefault, FieldKind, FieldSpec, IdentitySource, Schema, TypeSlot};
pub use stats::{StatBlock, StatKey, StatOrder};
pub use tokenizer::{tokenize, BlockTokenizer, RawBlock, SubBlock, TokenizerOptions};
pub use value::{Evolution, FieldValue, Fields, LevelEntry};
