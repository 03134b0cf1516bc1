//! `pokemon.txt` + `pokemon_forms.txt`
//!
//! Species blocks become base records; form blocks (`[SPECIES,n]`) are sparse
//! overrides merged onto their species. The output is one flat list: every
//! species first, then every accepted form, each fully materialized.

use crate::{collect_records, ParseReport};
use pbsdex_pbs::{
    BlockTokenizer, DuplicatePolicy, FieldDefault, FieldKind, FieldSpec, MergeEngine, MergeOutcome,
    MergedEntity, OverrideBlock, RecordAssembler, Schema, StatOrder, TokenizerOptions, TypeSlot,
};

/// Fields kept by [`compact`] besides identity and form metadata.
pub const COMPACT_FIELDS: [&str; 5] = ["types", "stats", "abilities", "hiddenAbility", "pokedex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PokemonOptions {
    pub stat_order: StatOrder,
    pub include_cosmetic: bool,
    pub duplicates: DuplicatePolicy,
    pub compact: bool,
}

impl Default for PokemonOptions {
    fn default() -> Self {
        Self {
            stat_order: StatOrder::PBS,
            include_cosmetic: true,
            duplicates: DuplicatePolicy::LastWins,
            compact: false,
        }
    }
}

pub fn schema(stat_order: StatOrder) -> Schema {
    let int = |name| FieldSpec::new(name, FieldKind::Int);
    let text = |name| FieldSpec::new(name, FieldKind::Text);
    let moves = |name| FieldSpec::new(name, FieldKind::DedupedList);
    let battler = |name| FieldSpec::new(name, FieldKind::Int).grouped("battler");
    let wild = |name| FieldSpec::new(name, FieldKind::OptionalName).grouped("wildItems");

    Schema::new("species")
        .with_stat_order(stat_order)
        .with_identity_key("internalName")
        .with_raw()
        .field(FieldSpec::new("internalName", FieldKind::InternalName))
        .field(FieldSpec::new("name", FieldKind::DisplayName))
        .field(FieldSpec::new("formName", FieldKind::FormName))
        .field(FieldSpec::new("types", FieldKind::Type(TypeSlot::First)).alias("Type1"))
        .field(FieldSpec::new("types", FieldKind::Type(TypeSlot::Second)).alias("Type2"))
        .field(
            FieldSpec::new("types", FieldKind::Type(TypeSlot::Combined))
                .alias("Type")
                .default_to(FieldDefault::EmptyList),
        )
        .field(
            FieldSpec::new("stats", FieldKind::BaseStats)
                .alias("BaseStats")
                .default_to(FieldDefault::ZeroStats),
        )
        .field(
            FieldSpec::new("effortPoints", FieldKind::EffortValues)
                .alias("EVs")
                .default_to(FieldDefault::ZeroStats),
        )
        .field(text("genderRate").alias("GenderRatio"))
        .field(text("growthRate"))
        .field(int("baseExp").alias("BaseEXP"))
        .field(int("catchRate").alias("Rareness"))
        .field(int("happiness"))
        .field(FieldSpec::new("abilities", FieldKind::DedupedList))
        .field(FieldSpec::new("hiddenAbility", FieldKind::OptionalName).alias("HiddenAbilities"))
        .field(FieldSpec::new("moves", FieldKind::Learnset))
        .field(moves("tutorMoves"))
        .field(moves("eggMoves"))
        .field(moves("machineMoves").alias("TM"))
        .field(FieldSpec::new("compatibility", FieldKind::List).alias("EggGroups"))
        .field(int("stepsToHatch").alias("HatchSteps"))
        .field(FieldSpec::new("height", FieldKind::Float))
        .field(FieldSpec::new("weight", FieldKind::Float))
        .field(text("color"))
        .field(text("shape"))
        .field(text("habitat"))
        .field(text("kind").alias("Category"))
        .field(text("pokedex").alias("Summary").fallback("kind"))
        .field(int("generation"))
        .field(FieldSpec::new("evolutions", FieldKind::Evolutions))
        .field(text("megaStone"))
        .field(wild("common").alias("WildItemCommon"))
        .field(wild("uncommon").alias("WildItemUncommon"))
        .field(wild("rare").alias("WildItemRare"))
        .field(battler("playerX").alias("BattlerPlayerX"))
        .field(battler("playerY").alias("BattlerPlayerY"))
        .field(battler("enemyX").alias("BattlerEnemyX"))
        .field(battler("enemyY").alias("BattlerEnemyY"))
        .field(battler("shadowX").alias("BattlerShadowX"))
        .field(battler("shadowSize").alias("BattlerShadowSize"))
}

/// Parse `pokemon_forms.txt` into override blocks, in file order.
pub fn parse_forms(schema: &Schema, text: &str) -> Vec<OverrideBlock> {
    let assembler = RecordAssembler::new(schema);
    BlockTokenizer::new(text)
        .filter_map(|block| assembler.assemble_override(&block))
        .collect()
}

/// Species and optional forms → merged entities.
pub fn convert(species: &str, forms: Option<&str>, options: &PokemonOptions) -> (MergeOutcome, ParseReport) {
    let schema = schema(options.stat_order);
    let (base, report) = collect_records(&schema, species, TokenizerOptions::default(), options.duplicates);
    let overrides = forms.map(|text| parse_forms(&schema, text)).unwrap_or_default();

    let mut outcome = MergeEngine::new(&schema)
        .include_cosmetic(options.include_cosmetic)
        .merge(&base, &overrides);
    tracing::debug!(
        species = base.len(),
        forms = overrides.len(),
        unknown_base = outcome.unknown_base,
        cosmetic_skipped = outcome.cosmetic_skipped,
        "merged forms"
    );
    if options.compact {
        outcome.entities = outcome.entities.into_iter().map(compact).collect();
    }
    (outcome, report)
}

/// Keep identity, form metadata and [`COMPACT_FIELDS`] only.
pub fn compact(mut entity: MergedEntity) -> MergedEntity {
    entity
        .record
        .fields
        .retain(|key, _| COMPACT_FIELDS.contains(&key.as_str()));
    entity.record.index = None;
    entity.record.extra.clear();
    entity.record.raw = None;
    if let Some(form) = entity.form.as_mut() {
        form.raw_form_overrides.clear();
    }
    entity
}
