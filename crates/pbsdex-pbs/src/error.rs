//! Configuration errors.
//!
//! Data-quality problems in PBS input never surface here: malformed lines are
//! skipped and unparsable values fall back to their raw text. Only invalid
//! caller configuration is fatal, and it is reported before any parsing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PbsError {
    #[error("stat order must list exactly 6 stats (got {count}); expected a permutation of hp, atk, def, spa, spd, spe")]
    InvalidStatOrder { count: usize },

    #[error("unknown stat `{name}` in stat order; expected one of hp, atk, def, spa, spd, spe")]
    UnknownStat { name: String },

    #[error("stat `{name}` appears more than once in stat order")]
    DuplicateStat { name: String },

    #[error("unknown duplicate policy `{0}`; expected `last-wins` or `first-wins`")]
    UnknownDuplicatePolicy(String),
}

pub type Result<T> = std::result::Result<T, PbsError>;
