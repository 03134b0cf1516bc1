//! Six-slot stat vectors (`BaseStats`, `EffortPoints`).
//!
//! PBS files store stats as a bare CSV of six integers whose meaning depends
//! on the file's generation: older files put speed before the special stats,
//! newer ones put it last. The caller therefore supplies a [`StatOrder`], and
//! an order that is not a permutation of the six canonical stats is rejected
//! up front; a wrong order would silently swap attributes in every record.

use crate::coerce::parse_int;
use crate::error::{PbsError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    Hp,
    Atk,
    Def,
    Spa,
    Spd,
    Spe,
}

impl StatKey {
    pub const ALL: [StatKey; 6] = [
        StatKey::Hp,
        StatKey::Atk,
        StatKey::Def,
        StatKey::Spa,
        StatKey::Spd,
        StatKey::Spe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::Hp => "hp",
            StatKey::Atk => "atk",
            StatKey::Def => "def",
            StatKey::Spa => "spa",
            StatKey::Spd => "spd",
            StatKey::Spe => "spe",
        }
    }

    /// Resolve a stat name, accepting the spellings found in old tooling
    /// (`SpAtk`, `Sp.A`, `Speed`, ...). Case-insensitive.
    pub fn from_name(name: &str) -> Option<StatKey> {
        let key = match name.trim().to_ascii_lowercase().as_str() {
            "hp" => StatKey::Hp,
            "atk" | "attack" => StatKey::Atk,
            "def" | "defense" | "defence" => StatKey::Def,
            "spa" | "spatk" | "spat" | "sp.a" | "spattack" => StatKey::Spa,
            "spd" | "spdef" | "spdf" | "sp.d" | "spdefense" | "spdefence" => StatKey::Spd,
            "spe" | "speed" => StatKey::Spe,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated permutation of the six stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatOrder([StatKey; 6]);

impl StatOrder {
    /// `hp, atk, def, spe, spa, spd`: the classic PBS `BaseStats` layout.
    pub const PBS: StatOrder = StatOrder([
        StatKey::Hp,
        StatKey::Atk,
        StatKey::Def,
        StatKey::Spe,
        StatKey::Spa,
        StatKey::Spd,
    ]);

    pub fn new(keys: [StatKey; 6]) -> Result<Self> {
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(PbsError::DuplicateStat {
                    name: key.as_str().to_string(),
                });
            }
        }
        Ok(Self(keys))
    }

    /// Parse a comma-separated order such as `hp,atk,def,spe,spa,spd`.
    pub fn parse(spec: &str) -> Result<Self> {
        let names: Vec<&str> = spec.split(',').map(str::trim).collect();
        if names.len() != 6 {
            return Err(PbsError::InvalidStatOrder { count: names.len() });
        }
        let mut keys = [StatKey::Hp; 6];
        for (slot, name) in keys.iter_mut().zip(&names) {
            *slot = StatKey::from_name(name).ok_or_else(|| PbsError::UnknownStat {
                name: name.to_string(),
            })?;
        }
        Self::new(keys)
    }

    pub fn keys(&self) -> &[StatKey; 6] {
        &self.0
    }

    /// Name each element of `values` by its position in this order.
    pub fn map_vector(&self, values: [i64; 6]) -> StatBlock {
        StatBlock {
            entries: self.0.iter().copied().zip(values).collect(),
        }
    }

    /// Inverse of [`StatOrder::map_vector`]; stats missing from `block` read as 0.
    pub fn map_back(&self, block: &StatBlock) -> [i64; 6] {
        let mut out = [0; 6];
        for (slot, key) in out.iter_mut().zip(self.0) {
            *slot = block.get(key).unwrap_or(0);
        }
        out
    }

    /// `BaseStats`: anything other than exactly six entries zero-fills the
    /// whole block; individual non-numeric entries read as 0.
    pub fn base_stats(&self, raw: &str) -> StatBlock {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 6 {
            return self.map_vector([0; 6]);
        }
        let mut values = [0; 6];
        for (slot, part) in values.iter_mut().zip(parts) {
            *slot = parse_int(part).unwrap_or(0);
        }
        self.map_vector(values)
    }

    /// `EffortPoints`: short vectors are padded with zeros, long ones truncated.
    pub fn effort_values(&self, raw: &str) -> StatBlock {
        let mut values = [0; 6];
        for (slot, part) in values.iter_mut().zip(raw.split(',')) {
            *slot = parse_int(part.trim()).unwrap_or(0);
        }
        self.map_vector(values)
    }
}

impl Default for StatOrder {
    fn default() -> Self {
        Self::PBS
    }
}

impl FromStr for StatOrder {
    type Err = PbsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for StatOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|k| k.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

/// Six named stats, kept in the order they were mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatBlock {
    entries: Vec<(StatKey, i64)>,
}

impl StatBlock {
    pub fn get(&self, key: StatKey) -> Option<i64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatKey, i64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

impl Serialize for StatBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}
