//! RawBlock → CanonicalRecord / OverrideBlock.

use crate::coerce::{
    dedupe_keep_order, slug, title_from_internal, to_bool, to_float, to_int, to_list,
    to_paired_sequence, to_triple_sequence,
};
use crate::record::{CanonicalRecord, OverrideBlock, RawFields};
use crate::schema::{FieldKind, FieldSpec, IdentitySource, Schema, TypeSlot};
use crate::tokenizer::RawBlock;
use crate::value::{FieldValue, Fields};

/// Raw type inputs collected from one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeParts {
    pub first: Option<String>,
    pub second: Option<String>,
    pub combined: Option<String>,
}

impl TypeParts {
    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none() && self.combined.is_none()
    }
}

/// Explicit `Type1`/`Type2` win over a combined `Types` CSV. At most two
/// distinct types; a repeated second type collapses to one.
pub fn extract_types(parts: &TypeParts) -> Vec<String> {
    let clean = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let first = clean(&parts.first);
    let second = clean(&parts.second);
    if parts.first.is_some() || parts.second.is_some() {
        let mut out: Vec<String> = first.into_iter().collect();
        if let Some(t2) = second {
            if out.first() != Some(&t2) {
                out.push(t2);
            }
        }
        return out;
    }
    let listed = parts.combined.as_deref().map(to_list).unwrap_or_default();
    dedupe_keep_order(&listed).into_iter().take(2).collect()
}

/// Fields of one block after alias resolution and coercion.
#[derive(Debug, Default)]
struct Canonical {
    fields: Fields,
    extra: RawFields,
    internal_name: Option<String>,
    display_name: Option<String>,
    form_name: Option<String>,
    types: TypeParts,
    types_slot: Option<&'static str>,
    /// Fields present in the block whose value could not be coerced.
    unresolved: Vec<&'static str>,
}

pub struct RecordAssembler<'s> {
    schema: &'s Schema,
}

impl<'s> RecordAssembler<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Build a base record. `position` is the block's ordinal in its file and
    /// only matters for schemas with positional indexes. Returns `None` when
    /// the block has no usable identifier.
    pub fn assemble(&self, block: &RawBlock, position: usize) -> Option<CanonicalRecord> {
        let mut canon = self.canonicalize(block);
        let index = block
            .index
            .or_else(|| self.schema.positional_index.then(|| position as u32));

        let Some(internal_id) = self.derive_identity(block, &canon, index) else {
            tracing::debug!(
                schema = self.schema.name,
                header = %block.header,
                "dropping block without a usable identifier"
            );
            return None;
        };
        let display_name = canon
            .display_name
            .clone()
            .unwrap_or_else(|| title_from_internal(&internal_id));

        self.finish_types(&mut canon);
        self.schema.apply_fallbacks(&mut canon.fields);
        self.schema.apply_defaults(&mut canon.fields, &canon.unresolved);
        self.schema.derive_flags(&mut canon.fields);

        Some(CanonicalRecord {
            id: slug(&internal_id),
            internal_id,
            identity_key: self.schema.identity_key,
            display_name,
            index,
            fields: self.schema.arrange(canon.fields),
            extra: if self.schema.keep_extra {
                canon.extra
            } else {
                RawFields::new()
            },
            raw: self.schema.keep_raw.then(|| block.fields.clone()),
        })
    }

    /// Build an override (form) block. Only fields the block sets are kept;
    /// no defaults, fallbacks or derived flags are applied here.
    pub fn assemble_override(&self, block: &RawBlock) -> Option<OverrideBlock> {
        let Some(base) = block.name_token() else {
            tracing::debug!(
                schema = self.schema.name,
                header = %block.header,
                "dropping override without a base identifier"
            );
            return None;
        };
        let mut canon = self.canonicalize(block);
        self.finish_types(&mut canon);

        Some(OverrideBlock {
            base_internal_id: base.to_string(),
            form_index: block.index,
            form_name: canon.form_name,
            fields: canon.fields,
            extra: canon.extra,
            raw: block.fields.clone(),
        })
    }

    fn canonicalize(&self, block: &RawBlock) -> Canonical {
        let mut canon = Canonical::default();
        for (key, value) in &block.fields {
            let Some(spec) = self.schema.lookup(key) else {
                canon.extra.insert(key.clone(), value.clone());
                continue;
            };
            self.absorb(&mut canon, spec, key, value);
        }
        canon
    }

    fn absorb(&self, canon: &mut Canonical, spec: &FieldSpec, key: &str, value: &str) {
        let text = || Some(value.trim().to_string()).filter(|s| !s.is_empty());
        let coerced = match spec.kind {
            FieldKind::InternalName => {
                canon.internal_name = text();
                return;
            }
            FieldKind::DisplayName => {
                canon.display_name = text();
                return;
            }
            FieldKind::FormName => {
                canon.form_name = text();
                return;
            }
            FieldKind::Type(slot) => {
                let target = match slot {
                    TypeSlot::First => &mut canon.types.first,
                    TypeSlot::Second => &mut canon.types.second,
                    TypeSlot::Combined => &mut canon.types.combined,
                };
                *target = Some(value.to_string());
                if canon.types_slot.is_none() {
                    canon.types_slot = Some(spec.name);
                }
                return;
            }
            FieldKind::Text => FieldValue::Text(value.to_string()),
            FieldKind::OptionalName => {
                let v = value.trim();
                if v.is_empty() || v.eq_ignore_ascii_case("none") {
                    return;
                }
                FieldValue::Text(v.to_string())
            }
            FieldKind::Int => to_int(value),
            FieldKind::Float => to_float(value),
            FieldKind::Bool => match to_bool(value) {
                Some(b) => FieldValue::Bool(b),
                None => {
                    // Unrecognized token: keep the raw text, never guess `false`.
                    canon.extra.insert(key.to_string(), value.to_string());
                    canon.fields.shift_remove(spec.name);
                    canon.unresolved.push(spec.name);
                    return;
                }
            },
            FieldKind::List => FieldValue::List(to_list(value)),
            FieldKind::DedupedList => FieldValue::List(dedupe_keep_order(&to_list(value))),
            FieldKind::Learnset => FieldValue::Learnset(to_paired_sequence(value)),
            FieldKind::Evolutions => FieldValue::Evolutions(to_triple_sequence(value)),
            FieldKind::BaseStats => FieldValue::Stats(self.schema.stat_order.base_stats(value)),
            FieldKind::EffortValues => {
                FieldValue::Stats(self.schema.stat_order.effort_values(value))
            }
        };

        match spec.group {
            Some(group) => {
                let slot = canon
                    .fields
                    .entry(group.to_string())
                    .or_insert_with(|| FieldValue::Group(Fields::new()));
                if let FieldValue::Group(members) = slot {
                    members.insert(spec.name.to_string(), coerced);
                }
            }
            None => {
                canon.fields.insert(spec.name.to_string(), coerced);
            }
        }
    }

    fn finish_types(&self, canon: &mut Canonical) {
        let Some(slot) = canon.types_slot else { return };
        let types = extract_types(&canon.types);
        if !types.is_empty() {
            canon.fields.insert(slot.to_string(), FieldValue::List(types));
        }
    }

    fn derive_identity(&self, block: &RawBlock, canon: &Canonical, index: Option<u32>) -> Option<String> {
        self.schema.identity.iter().find_map(|source| {
            let candidate = match source {
                IdentitySource::InternalNameField => canon.internal_name.clone(),
                IdentitySource::Header => block.name_token().map(str::to_string),
                IdentitySource::UppercaseName => canon.display_name.as_ref().map(|n| n.to_uppercase()),
                IdentitySource::Index => index.map(|i| i.to_string()),
            };
            candidate.filter(|c| !slug(c).is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDefault;
    use crate::stats::{StatKey, StatOrder};
    use crate::tokenizer::tokenize;

    fn parts(first: Option<&str>, second: Option<&str>, combined: Option<&str>) -> TypeParts {
        TypeParts {
            first: first.map(str::to_string),
            second: second.map(str::to_string),
            combined: combined.map(str::to_string),
        }
    }

    fn schema() -> Schema {
        Schema::new("species")
            .with_stat_order(StatOrder::parse("hp,atk,def,spa,spd,spe").unwrap())
            .field(FieldSpec::new("internalName", FieldKind::InternalName))
            .field(FieldSpec::new("name", FieldKind::DisplayName))
            .field(FieldSpec::new("types", FieldKind::Type(TypeSlot::First)).alias("Type1"))
            .field(FieldSpec::new("types", FieldKind::Type(TypeSlot::Second)).alias("Type2"))
            .field(
                FieldSpec::new("types", FieldKind::Type(TypeSlot::Combined))
                    .alias("Type")
                    .default_to(FieldDefault::EmptyList),
            )
            .field(FieldSpec::new("stats", FieldKind::BaseStats).alias("BaseStats"))
            .field(FieldSpec::new("abilities", FieldKind::DedupedList))
            .field(FieldSpec::new("hiddenAbility", FieldKind::OptionalName))
            .field(FieldSpec::new("baby", FieldKind::Bool))
            .field(FieldSpec::new("formName", FieldKind::FormName))
    }

    #[test]
    fn type_extraction_cases() {
        assert_eq!(extract_types(&parts(Some("Fire"), None, None)), vec!["Fire"]);
        assert_eq!(extract_types(&parts(Some("Fire"), Some("Fire"), None)), vec!["Fire"]);
        assert_eq!(
            extract_types(&parts(None, None, Some("Fire,Flying"))),
            vec!["Fire", "Flying"]
        );
        assert_eq!(
            extract_types(&parts(None, None, Some("Fire,Fire,Flying,Water"))),
            vec!["Fire", "Flying"]
        );
        assert_eq!(
            extract_types(&parts(Some("Grass"), None, Some("Fire,Flying"))),
            vec!["Grass"]
        );
        assert_eq!(extract_types(&parts(None, Some("Dark"), None)), vec!["Dark"]);
        assert!(extract_types(&TypeParts::default()).is_empty());
    }

    #[test]
    fn assembles_a_species_block() {
        let s = schema();
        let blocks = tokenize(
            "[BULBASAUR]\nName=Bulbasaur\nType1=GRASS\nType2=POISON\nBaseStats=45,49,49,65,65,45\nAbilities=OVERGROW,OVERGROW,CHLOROPHYLL\nHiddenAbility=NONE\nColor=Green\n",
        );
        let rec = RecordAssembler::new(&s).assemble(&blocks[0], 0).unwrap();
        assert_eq!(rec.id, "bulbasaur");
        assert_eq!(rec.internal_id, "BULBASAUR");
        assert_eq!(rec.display_name, "Bulbasaur");
        assert_eq!(
            rec.fields["types"],
            FieldValue::List(vec!["GRASS".into(), "POISON".into()])
        );
        let stats = rec.fields["stats"].as_stats().unwrap();
        assert_eq!(stats.get(StatKey::Spa), Some(65));
        assert_eq!(
            rec.fields["abilities"].as_list().unwrap(),
            ["OVERGROW", "CHLOROPHYLL"]
        );
        assert!(!rec.fields.contains_key("hiddenAbility"));
        assert_eq!(rec.extra["Color"], "Green");
    }

    #[test]
    fn identity_precedence_and_drop() {
        let s = schema();
        let asm = RecordAssembler::new(&s);
        let blocks = tokenize("[HEADER]\nInternalName=REAL\n[OTHER]\n[7]\n[8]\nInternalName=___\n");

        assert_eq!(asm.assemble(&blocks[0], 0).unwrap().internal_id, "REAL");
        let other = asm.assemble(&blocks[1], 1).unwrap();
        assert_eq!(other.internal_id, "OTHER");
        assert_eq!(other.display_name, "Other");
        assert_eq!(asm.assemble(&blocks[2], 2).unwrap().internal_id, "7");
        assert_eq!(asm.assemble(&blocks[3], 3).unwrap().internal_id, "8");

        let no_index = Schema::new("bare").with_identity(vec![IdentitySource::Header]);
        let blocks = tokenize("[12]\nName=Nothing\n");
        assert!(RecordAssembler::new(&no_index).assemble(&blocks[0], 0).is_none());
    }

    #[test]
    fn unrecognized_bool_is_not_false() {
        let s = schema();
        let blocks = tokenize("[A]\nBaby=perhaps\n[B]\nBaby=yes\n");
        let asm = RecordAssembler::new(&s);
        let a = asm.assemble(&blocks[0], 0).unwrap();
        assert!(!a.fields.contains_key("baby"));
        assert_eq!(a.extra["Baby"], "perhaps");
        let b = asm.assemble(&blocks[1], 1).unwrap();
        assert_eq!(b.fields["baby"], FieldValue::Bool(true));

        let defaulted = schema().field(FieldSpec::new("baby", FieldKind::Bool).default_to(FieldDefault::False));
        let asm = RecordAssembler::new(&defaulted);
        assert!(!asm.assemble(&blocks[0], 0).unwrap().fields.contains_key("baby"));
        let blocks = tokenize("[C]\n");
        assert_eq!(asm.assemble(&blocks[0], 0).unwrap().fields["baby"], FieldValue::Bool(false));
    }

    #[test]
    fn default_type_list_when_absent() {
        let s = schema();
        let blocks = tokenize("[MISSINGNO]\n");
        let rec = RecordAssembler::new(&s).assemble(&blocks[0], 0).unwrap();
        assert_eq!(rec.fields["types"], FieldValue::List(vec![]));
    }

    #[test]
    fn override_is_sparse() {
        let s = schema();
        let blocks = tokenize("[BULBASAUR,1]\nFormName=Alt\nAbilities=Overgrow\nSparkle=yes\n");
        let ov = RecordAssembler::new(&s).assemble_override(&blocks[0]).unwrap();
        assert_eq!(ov.base_internal_id, "BULBASAUR");
        assert_eq!(ov.form_index, Some(1));
        assert_eq!(ov.form_name.as_deref(), Some("Alt"));
        let keys: Vec<_> = ov.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["abilities"]);
        assert_eq!(ov.extra["Sparkle"], "yes");
    }
}
