//! Base + override (form) merging.
//!
//! Every base record comes out unchanged, followed by one materialized entity
//! per accepted override, in override input order. A form entity owns a full
//! copy of its fields: consumers never resolve inheritance themselves.

use crate::coerce::{contains_ignore_case, dedupe_keep_order, slug};
use crate::record::{CanonicalRecord, OverrideBlock, RawFields, RecordSet};
use crate::schema::Schema;
use crate::value::{FieldValue, Fields};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// A base whose forms are presentation-only, optionally restricted to form
/// names matching `pattern`.
#[derive(Debug, Clone)]
pub struct CosmeticRule {
    base: String,
    pattern: Option<Regex>,
}

impl CosmeticRule {
    /// Every form of `base` is cosmetic.
    pub fn all_forms(base: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            pattern: None,
        }
    }

    /// Forms of `base` whose name matches `pattern`.
    pub fn matching(base: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            base: base.to_uppercase(),
            pattern: Some(Regex::new(pattern)?),
        })
    }

    fn applies(&self, base_internal_id: &str, form_name: &str) -> bool {
        base_internal_id.to_uppercase() == self.base
            && self.pattern.as_ref().map_or(true, |re| re.is_match(form_name))
    }
}

#[derive(Debug, Clone)]
pub struct CosmeticPolicy {
    rules: Vec<CosmeticRule>,
}

impl CosmeticPolicy {
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: CosmeticRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_cosmetic(&self, base_internal_id: &str, form_name: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.applies(base_internal_id, form_name))
    }
}

impl Default for CosmeticPolicy {
    /// Unown letters and Pikachu's caps / cosplay outfits.
    fn default() -> Self {
        Self::none()
            .with_rule(CosmeticRule::all_forms("UNOWN"))
            .with_rule(CosmeticRule {
                base: "PIKACHU".to_string(),
                pattern: Some(Regex::new(r"(?i)\bcap\b|cosplay").expect("cosmetic regex")),
            })
    }
}

/// [`CosmeticPolicy::default`] as a free predicate.
pub fn is_cosmetic_form(base_internal_id: &str, form_name: &str) -> bool {
    CosmeticPolicy::default().is_cosmetic(base_internal_id, form_name)
}

/// Form metadata carried by merged form entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    #[serde(rename = "baseInternal")]
    pub base_internal_id: String,
    pub form_index: Option<u32>,
    pub form_name: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub raw_form_overrides: RawFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedEntity {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub is_form: bool,
    #[serde(flatten)]
    pub form: Option<FormInfo>,
}

impl MergedEntity {
    pub fn base(record: CanonicalRecord) -> Self {
        Self {
            record,
            is_form: false,
            form: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub entities: Vec<MergedEntity>,
    pub unknown_base: usize,
    pub cosmetic_skipped: usize,
}

pub struct MergeEngine<'s> {
    schema: &'s Schema,
    cosmetics: CosmeticPolicy,
    include_cosmetic: bool,
}

impl<'s> MergeEngine<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            cosmetics: CosmeticPolicy::default(),
            include_cosmetic: false,
        }
    }

    pub fn with_cosmetics(mut self, policy: CosmeticPolicy) -> Self {
        self.cosmetics = policy;
        self
    }

    pub fn include_cosmetic(mut self, include: bool) -> Self {
        self.include_cosmetic = include;
        self
    }

    pub fn merge(&self, base: &RecordSet, overrides: &[OverrideBlock]) -> MergeOutcome {
        let mut outcome = MergeOutcome {
            entities: base.iter().cloned().map(MergedEntity::base).collect(),
            ..MergeOutcome::default()
        };
        let mut taken: HashSet<String> = base.iter().map(|r| r.internal_id.clone()).collect();

        for ov in overrides {
            let Some(parent) = base.get(&ov.base_internal_id) else {
                tracing::debug!(base = %ov.base_internal_id, "skipping form of unknown base");
                outcome.unknown_base += 1;
                continue;
            };
            let form_name = form_name(ov);
            if !self.include_cosmetic && self.cosmetics.is_cosmetic(&parent.internal_id, &form_name) {
                tracing::debug!(base = %parent.internal_id, form = %form_name, "skipping cosmetic form");
                outcome.cosmetic_skipped += 1;
                continue;
            }

            let internal_id = form_internal_id(&parent.internal_id, ov.form_index, &form_name, &taken);
            taken.insert(internal_id.clone());

            let display_name = if contains_ignore_case(&form_name, &parent.display_name) {
                form_name.clone()
            } else {
                format!("{} ({})", parent.display_name, form_name)
            };

            let mut extra = parent.extra.clone();
            extra.extend(ov.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

            outcome.entities.push(MergedEntity {
                record: CanonicalRecord {
                    id: slug(&internal_id),
                    internal_id,
                    identity_key: parent.identity_key,
                    display_name,
                    index: parent.index,
                    fields: self.merge_fields(&parent.fields, &ov.fields),
                    extra,
                    raw: parent.raw.clone(),
                },
                is_form: true,
                form: Some(FormInfo {
                    base_internal_id: parent.internal_id.clone(),
                    form_index: ov.form_index,
                    form_name,
                    raw_form_overrides: ov.raw.clone(),
                }),
            });
        }
        outcome
    }

    /// Override value where present, base value otherwise. Groups merge
    /// member-wise. Deduplication and derived flags run on the result.
    fn merge_fields(&self, base: &Fields, overrides: &Fields) -> Fields {
        let mut merged = base.clone();
        for (key, value) in overrides {
            match (merged.get_mut(key), value) {
                (Some(FieldValue::Group(members)), FieldValue::Group(updates)) => {
                    members.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        for (key, value) in merged.iter_mut() {
            if let FieldValue::List(items) = value {
                if self.schema.is_deduped(key) {
                    *items = dedupe_keep_order(items);
                }
            }
        }
        self.schema.derive_flags(&mut merged);
        self.schema.arrange(merged)
    }
}

/// Convenience wrapper over [`MergeEngine`] with the default cosmetic rules.
pub fn merge(
    schema: &Schema,
    base: &RecordSet,
    overrides: &[OverrideBlock],
    include_cosmetic: bool,
) -> Vec<MergedEntity> {
    MergeEngine::new(schema)
        .include_cosmetic(include_cosmetic)
        .merge(base, overrides)
        .entities
}

/// Declared name, else `Form {index}`, else `Form`.
fn form_name(ov: &OverrideBlock) -> String {
    match (&ov.form_name, ov.form_index) {
        (Some(name), _) => name.clone(),
        (None, Some(index)) => format!("Form {index}"),
        (None, None) => "Form".to_string(),
    }
}

/// `{base}_{index}`, else `{base}_{slug(name)}`, else `{base}_form`. Name-based
/// ids already taken get `_2`, `_3`, ... appended.
fn form_internal_id(base: &str, index: Option<u32>, form_name: &str, taken: &HashSet<String>) -> String {
    if let Some(index) = index {
        return format!("{base}_{index}");
    }
    let tail = slug(form_name);
    let stem = if tail.is_empty() {
        format!("{base}_form")
    } else {
        format!("{base}_{tail}")
    };
    if !taken.contains(&stem) {
        return stem;
    }
    (2..)
        .map(|n| format!("{stem}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmetic_rules() {
        assert!(is_cosmetic_form("UNOWN", "B"));
        assert!(is_cosmetic_form("unown", ""));
        assert!(is_cosmetic_form("PIKACHU", "Original Cap"));
        assert!(is_cosmetic_form("PIKACHU", "KALOS CAP"));
        assert!(is_cosmetic_form("PIKACHU", "Pikachu Cosplay"));
        assert!(!is_cosmetic_form("PIKACHU", "Partner"));
        assert!(!is_cosmetic_form("PIKACHU", "Capacitor"));
        assert!(!is_cosmetic_form("RAICHU", "Cap"));
    }

    #[test]
    fn custom_cosmetic_policy() {
        let policy = CosmeticPolicy::none()
            .with_rule(CosmeticRule::matching("VIVILLON", "(?i)pattern").unwrap());
        assert!(policy.is_cosmetic("Vivillon", "Polar Pattern"));
        assert!(!policy.is_cosmetic("UNOWN", "A"));
    }

    #[test]
    fn form_ids() {
        let mut taken = HashSet::new();
        assert_eq!(form_internal_id("BULBASAUR", Some(1), "Alt", &taken), "BULBASAUR_1");
        assert_eq!(form_internal_id("RATTATA", None, "Alolan Form", &taken), "RATTATA_alolan-form");
        assert_eq!(form_internal_id("RATTATA", None, "!!", &taken), "RATTATA_form");

        taken.insert("RATTATA_alolan-form".to_string());
        taken.insert("RATTATA_alolan-form_2".to_string());
        assert_eq!(
            form_internal_id("RATTATA", None, "Alolan Form", &taken),
            "RATTATA_alolan-form_3"
        );
    }

    #[test]
    fn overrides_replace_fields_and_merge_groups() {
        use crate::assemble::RecordAssembler;
        use crate::record::DuplicatePolicy;
        use crate::schema::{FieldKind, FieldSpec};
        use crate::tokenizer::tokenize;

        let schema = Schema::new("species")
            .field(FieldSpec::new("name", FieldKind::DisplayName))
            .field(FieldSpec::new("formName", FieldKind::FormName))
            .field(FieldSpec::new("flags", FieldKind::DedupedList))
            .field(FieldSpec::new("playerX", FieldKind::Int).alias("BattlerPlayerX").grouped("battler"))
            .field(FieldSpec::new("playerY", FieldKind::Int).alias("BattlerPlayerY").grouped("battler"))
            .derived_flag("legendary", "flags", "Legendary");
        let asm = RecordAssembler::new(&schema);

        let mut base = RecordSet::new(DuplicatePolicy::LastWins);
        for (pos, block) in tokenize("[DEOXYS]\nName=Deoxys\nBattlerPlayerX=1\nBattlerPlayerY=2\nMood=calm\n")
            .iter()
            .enumerate()
        {
            base.insert(asm.assemble(block, pos).unwrap());
        }
        let overrides: Vec<_> = tokenize(
            "[DEOXYS,1]\nFormName=Attack Forme\nFlags=Legendary,Legendary\nBattlerPlayerY=9\nAura=red\n\
             [DEOXYS,2]\nFormName=Deoxys Defense\n",
        )
        .iter()
        .filter_map(|b| asm.assemble_override(b))
        .collect();

        let outcome = MergeEngine::new(&schema).merge(&base, &overrides);
        assert_eq!(outcome.entities.len(), 3);
        assert_eq!(outcome.entities[0].record, *base.get("DEOXYS").unwrap());

        let attack = &outcome.entities[1];
        assert_eq!(attack.record.display_name, "Deoxys (Attack Forme)");
        assert_eq!(attack.record.fields["flags"], FieldValue::List(vec!["Legendary".into()]));
        assert_eq!(attack.record.fields["legendary"], FieldValue::Bool(true));
        let battler = attack.record.fields["battler"].as_group().unwrap();
        assert_eq!(battler["playerX"], FieldValue::Int(1));
        assert_eq!(battler["playerY"], FieldValue::Int(9));
        assert_eq!(attack.record.extra["Mood"], "calm");
        assert_eq!(attack.record.extra["Aura"], "red");
        assert_eq!(attack.form.as_ref().unwrap().raw_form_overrides["Aura"], "red");

        let defense = &outcome.entities[2];
        assert_eq!(defense.record.display_name, "Deoxys Defense");
        assert_eq!(defense.record.internal_id, "DEOXYS_2");
        assert_eq!(defense.record.fields["legendary"], FieldValue::Bool(false));
    }

    #[test]
    fn default_form_names() {
        let mut ov = OverrideBlock {
            base_internal_id: "X".into(),
            form_index: Some(2),
            form_name: None,
            fields: Fields::new(),
            extra: RawFields::new(),
            raw: RawFields::new(),
        };
        assert_eq!(form_name(&ov), "Form 2");
        ov.form_index = None;
        assert_eq!(form_name(&ov), "Form");
        ov.form_name = Some("Mega".into());
        assert_eq!(form_name(&ov), "Mega");
    }
}
