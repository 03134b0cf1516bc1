//! `types.txt`
//!
//! Blocks are usually numbered (`[0]`, `[1]`, ...) and identified by their
//! `InternalName`, or failing that by the uppercased `Name`.

use crate::collect_records;
use pbsdex_pbs::{
    DuplicatePolicy, FieldDefault, FieldKind, FieldSpec, IdentitySource, RecordSet, Schema,
    TokenizerOptions,
};

pub fn schema() -> Schema {
    let list = |name| FieldSpec::new(name, FieldKind::List).default_to(FieldDefault::EmptyList);
    let flag = |name| FieldSpec::new(name, FieldKind::Bool).default_to(FieldDefault::False);
    Schema::new("types")
        .with_identity(vec![
            IdentitySource::InternalNameField,
            IdentitySource::UppercaseName,
            IdentitySource::Header,
            IdentitySource::Index,
        ])
        .with_positional_index()
        .field(FieldSpec::new("internalName", FieldKind::InternalName))
        .field(FieldSpec::new("name", FieldKind::DisplayName))
        .field(list("weaknesses"))
        .field(list("resistances"))
        .field(list("immunities"))
        .field(flag("isSpecialType"))
        .field(flag("isPseudoType"))
}

pub fn parse_types(text: &str) -> RecordSet {
    collect_records(&schema(), text, TokenizerOptions::default(), DuplicatePolicy::LastWins).0
}
