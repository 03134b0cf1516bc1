//! `abilities.txt`

use crate::collect_records;
use pbsdex_pbs::{
    DuplicatePolicy, FieldDefault, FieldKind, FieldSpec, RecordSet, Schema, TokenizerOptions,
};

pub fn schema() -> Schema {
    Schema::new("abilities")
        .field(FieldSpec::new("internalName", FieldKind::InternalName))
        .field(FieldSpec::new("name", FieldKind::DisplayName))
        .field(FieldSpec::new("description", FieldKind::Text).default_to(FieldDefault::EmptyText))
}

pub fn parse_abilities(text: &str) -> RecordSet {
    collect_records(&schema(), text, TokenizerOptions::default(), DuplicatePolicy::LastWins).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbsdex_pbs::FieldValue;

    #[test]
    fn description_defaults_to_empty() {
        let abilities = parse_abilities(
            "[STENCH]\nName = Stench\nDescription = May cause a foe to flinch.\nFlags = Unused\n[AIRLOCK]\n",
        );
        let stench = abilities.get("STENCH").unwrap();
        assert_eq!(
            stench.fields["description"],
            FieldValue::Text("May cause a foe to flinch.".into())
        );
        assert_eq!(stench.extra["Flags"], "Unused");

        let air_lock = abilities.get("AIRLOCK").unwrap();
        assert_eq!(air_lock.display_name, "Airlock");
        assert_eq!(air_lock.fields["description"], FieldValue::Text(String::new()));
    }
}
