//! Canonical records and the base-record set.

use crate::error::PbsError;
use crate::value::Fields;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::str::FromStr;

pub type RawFields = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    /// Slug of `internal_id`; never empty.
    pub id: String,
    pub internal_id: String,
    /// Output key for `internal_id`, taken from the schema.
    pub identity_key: &'static str,
    pub display_name: String,
    pub index: Option<u32>,
    pub fields: Fields,
    pub extra: RawFields,
    pub raw: Option<RawFields>,
}

/// `id`, the identity key, `name`, `index`, then the fields in order, with
/// `extra` and `raw` last when present.
impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(self.identity_key, &self.internal_id)?;
        map.serialize_entry("name", &self.display_name)?;
        if let Some(index) = self.index {
            map.serialize_entry("index", &index)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if !self.extra.is_empty() {
            map.serialize_entry("extra", &self.extra)?;
        }
        if let Some(raw) = &self.raw {
            map.serialize_entry("raw", raw)?;
        }
        map.end()
    }
}

/// A sparse partial record that replaces fields of a named base record.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideBlock {
    pub base_internal_id: String,
    pub form_index: Option<u32>,
    pub form_name: Option<String>,
    /// Only the fields the block actually sets.
    pub fields: Fields,
    /// Keys the schema does not know.
    pub extra: RawFields,
    pub raw: RawFields,
}

/// What to do when two base blocks derive the same internal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The later block replaces the earlier one, keeping its position.
    #[default]
    LastWins,
    /// The earlier block is kept and the later one ignored.
    FirstWins,
}

impl FromStr for DuplicatePolicy {
    type Err = PbsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-wins" | "last" => Ok(DuplicatePolicy::LastWins),
            "first-wins" | "first" => Ok(DuplicatePolicy::FirstWins),
            other => Err(PbsError::UnknownDuplicatePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::LastWins => f.write_str("last-wins"),
            DuplicatePolicy::FirstWins => f.write_str("first-wins"),
        }
    }
}

/// Base records keyed by internal id, in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: IndexMap<String, CanonicalRecord>,
    policy: DuplicatePolicy,
    duplicates: usize,
}

impl RecordSet {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            records: IndexMap::new(),
            policy,
            duplicates: 0,
        }
    }

    /// Insert under the record's internal id. Returns `false` when the
    /// duplicate policy discarded `record`.
    pub fn insert(&mut self, record: CanonicalRecord) -> bool {
        let key = record.internal_id.clone();
        if let Some(slot) = self.records.get_mut(&key) {
            self.duplicates += 1;
            tracing::warn!(internal_id = %key, policy = %self.policy, "duplicate internal id");
            return match self.policy {
                DuplicatePolicy::LastWins => {
                    *slot = record;
                    true
                }
                DuplicatePolicy::FirstWins => false,
            };
        }
        self.records.insert(key, record);
        true
    }

    pub fn get(&self, internal_id: &str) -> Option<&CanonicalRecord> {
        self.records.get(internal_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> IndexMap<String, CanonicalRecord> {
        self.records
    }
}

impl Extend<CanonicalRecord> for RecordSet {
    fn extend<I: IntoIterator<Item = CanonicalRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

/// Serializes as an object keyed by internal id.
impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (key, record) in &self.records {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}
