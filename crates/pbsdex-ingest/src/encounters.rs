//! `encounters.txt`
//!
//! ```text
//! [003] # Forested Cavern
//! Land,21
//! 20,PIDGEY,2,4
//! OldRod
//! 100,MAGIKARP,5
//! ```
//!
//! Blocks are keyed by their header text. Each sub-label becomes an encounter
//! method holding its rows; rows are `chance,species,min,max` or
//! `chance,species,level`. Method rates, when given, go in a sibling `rates`
//! map so `encounters` stays `{method: [[chance, species, min, max], ...]}`.

use indexmap::IndexMap;
use pbsdex_pbs::coerce::parse_int;
use pbsdex_pbs::{BlockTokenizer, RawBlock, TokenizerOptions};
use serde::ser::{Serialize, SerializeTuple, Serializer};

/// One wild slot, serialized as `[chance, species, min, max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterSlot {
    pub chance: i64,
    pub species: String,
    pub min_level: i64,
    pub max_level: i64,
}

impl EncounterSlot {
    /// `None` unless the row has three or four fields with numeric chance and
    /// levels and a non-empty species.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let (chance, species, min, max) = match row {
            [chance, species, level] => (chance, species, level, level),
            [chance, species, min, max] => (chance, species, min, max),
            _ => return None,
        };
        if species.is_empty() {
            return None;
        }
        Some(Self {
            chance: parse_int(chance)?,
            species: species.clone(),
            min_level: parse_int(min)?,
            max_level: parse_int(max)?,
        })
    }
}

impl Serialize for EncounterSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.chance)?;
        tuple.serialize_element(&self.species)?;
        tuple.serialize_element(&self.min_level)?;
        tuple.serialize_element(&self.max_level)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EncounterTable {
    pub id: String,
    pub name: String,
    pub encounters: IndexMap<String, Vec<EncounterSlot>>,
    /// First rate seen per method; methods without one are absent.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rates: IndexMap<String, i64>,
}

impl EncounterTable {
    pub fn from_block(block: &RawBlock) -> Self {
        let mut encounters: IndexMap<String, Vec<EncounterSlot>> = IndexMap::new();
        let mut rates: IndexMap<String, i64> = IndexMap::new();
        for section in &block.sections {
            if let Some(rate) = section.rate {
                rates.entry(section.label.clone()).or_insert(rate);
            }
            let slots = encounters.entry(section.label.clone()).or_default();
            for row in &section.rows {
                match EncounterSlot::from_row(row) {
                    Some(slot) => slots.push(slot),
                    None => tracing::debug!(
                        location = %block.header,
                        method = %section.label,
                        row = %row.join(","),
                        "skipping malformed encounter row"
                    ),
                }
            }
        }
        Self {
            id: block.header.clone(),
            name: block.label.clone().unwrap_or_default(),
            encounters,
            rates,
        }
    }
}

/// Encounter tables keyed by location header; a repeated header replaces the
/// earlier table.
pub fn parse_encounters(text: &str) -> IndexMap<String, EncounterTable> {
    let mut tables = IndexMap::new();
    for block in BlockTokenizer::with_options(text, TokenizerOptions::default().with_sub_labels()) {
        let table = EncounterTable::from_block(&block);
        if tables.insert(table.id.clone(), table).is_some() {
            tracing::warn!(location = %block.header, "duplicate encounter location");
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCOUNTERS: &str = "\
# See the documentation on the wiki to learn how to edit this file.
[003] # Forested Cavern
Land,21
20,PIDGEY,2,4
20,RATTATA,3
bogus,ROW,1
OldRod
100,MAGIKARP,5
Land,30
10,SENTRET,4,5
[004]
Water,2
";

    #[test]
    fn groups_rows_by_method() {
        let tables = parse_encounters(ENCOUNTERS);
        assert_eq!(tables.len(), 2);

        let cavern = &tables["003"];
        assert_eq!(cavern.id, "003");
        assert_eq!(cavern.name, "Forested Cavern");
        let methods: Vec<&str> = cavern.encounters.keys().map(String::as_str).collect();
        assert_eq!(methods, vec!["Land", "OldRod"]);

        let land = &cavern.encounters["Land"];
        assert_eq!(cavern.rates["Land"], 21);
        assert_eq!(land.len(), 3);
        assert_eq!(
            land[1],
            EncounterSlot {
                chance: 20,
                species: "RATTATA".into(),
                min_level: 3,
                max_level: 3,
            }
        );
        assert!(!cavern.rates.contains_key("OldRod"));

        let empty = &tables["004"];
        assert_eq!(empty.name, "");
        assert!(empty.encounters["Water"].is_empty());
    }

    #[test]
    fn serializes_slots_as_arrays() {
        let tables = parse_encounters("[001] # Route 1\nLand,21\n20,PIDGEY,2,4\n");
        let json = serde_json::to_value(&tables).unwrap();
        assert_eq!(
            json["001"]["encounters"],
            serde_json::json!({"Land": [[20, "PIDGEY", 2, 4]]})
        );
        assert_eq!(json["001"]["rates"], serde_json::json!({"Land": 21}));
        assert_eq!(json["001"]["name"], "Route 1");

        let no_rates = serde_json::to_value(parse_encounters("[002]\nOldRod\n100,MAGIKARP,5\n")).unwrap();
        assert!(no_rates["002"].get("rates").is_none());
        assert_eq!(no_rates["002"]["encounters"]["OldRod"], serde_json::json!([[100, "MAGIKARP", 5, 5]]));
    }
}
