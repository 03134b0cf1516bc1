//! `moves.txt`

use crate::collect_records;
use pbsdex_pbs::{DuplicatePolicy, FieldDefault, FieldKind, FieldSpec, RecordSet, Schema, TokenizerOptions};

/// `(output flag, tag in Flags)`
pub const FLAG_TAGS: [(&str, &str); 10] = [
    ("makesContact", "Contact"),
    ("sound", "Sound"),
    ("punching", "Punching"),
    ("biting", "Biting"),
    ("beam", "Beam"),
    ("dance", "Dance"),
    ("recoilMove", "Recoil"),
    ("cannotMetronome", "CannotMetronome"),
    ("twice", "Twice"),
    ("tramplesMinimize", "TramplesMinimize"),
];

pub fn schema() -> Schema {
    let null = |spec: FieldSpec| spec.default_to(FieldDefault::Null);
    let mut schema = Schema::new("moves")
        .with_raw()
        .field(FieldSpec::new("internalName", FieldKind::InternalName))
        .field(FieldSpec::new("name", FieldKind::DisplayName))
        .field(null(FieldSpec::new("type", FieldKind::Text)))
        .field(null(FieldSpec::new("category", FieldKind::Text)))
        .field(null(FieldSpec::new("power", FieldKind::Int).alias("BasePower")))
        .field(null(FieldSpec::new("accuracy", FieldKind::Int)))
        .field(null(FieldSpec::new("pp", FieldKind::Int).alias("TotalPP")))
        .field(null(FieldSpec::new("target", FieldKind::Text)))
        .field(null(FieldSpec::new("functionCode", FieldKind::Text)))
        .field(FieldSpec::new("flags", FieldKind::List).default_to(FieldDefault::EmptyList))
        .field(null(FieldSpec::new("effectChance", FieldKind::Int)))
        .field(null(FieldSpec::new("priority", FieldKind::Int)))
        .field(null(FieldSpec::new("description", FieldKind::Text)))
        .field(null(FieldSpec::new("zMovePower", FieldKind::Int)))
        .field(null(FieldSpec::new("zMoveEffect", FieldKind::Text)))
        .field(null(FieldSpec::new("recoil", FieldKind::Text)))
        .field(null(FieldSpec::new("healing", FieldKind::Float)))
        .field(null(FieldSpec::new("criticalRate", FieldKind::Int)));
    for (flag, tag) in FLAG_TAGS {
        schema = schema.derived_flag(flag, "flags", tag);
    }
    schema
}

pub fn parse_moves(text: &str) -> RecordSet {
    collect_records(&schema(), text, TokenizerOptions::default(), DuplicatePolicy::LastWins).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbsdex_pbs::FieldValue;

    const MOVES: &str = "\
# See the documentation on the wiki to learn how to edit this file.
[TACKLE]
Name = Tackle
Type = NORMAL
Category = Physical
BasePower = 40
Accuracy = 100
TotalPP = 35
Target = NearOther
FunctionCode = None
Flags = Contact,CanProtect,CanMirrorMove
Description = A physical attack in which the user charges and slams into the target.
[HYPERVOICE]
Name = Hyper Voice
Power = ??
Flags = CanProtect, Sound
Healing = 0.5
";

    #[test]
    fn coerces_and_derives_flags() {
        let moves = parse_moves(MOVES);
        let tackle = moves.get("TACKLE").unwrap();
        assert_eq!(tackle.id, "tackle");
        assert_eq!(tackle.fields["power"], FieldValue::Int(40));
        assert_eq!(tackle.fields["pp"], FieldValue::Int(35));
        assert_eq!(tackle.fields["makesContact"], FieldValue::Bool(true));
        assert_eq!(tackle.fields["sound"], FieldValue::Bool(false));
        assert_eq!(tackle.fields["zMovePower"], FieldValue::Null);
        assert_eq!(tackle.raw.as_ref().unwrap()["BasePower"], "40");

        let voice = moves.get("HYPERVOICE").unwrap();
        assert_eq!(voice.display_name, "Hyper Voice");
        assert_eq!(voice.fields["power"], FieldValue::Text("??".into()));
        assert_eq!(voice.fields["sound"], FieldValue::Bool(true));
        assert_eq!(voice.fields["makesContact"], FieldValue::Bool(false));
        assert_eq!(voice.fields["healing"], FieldValue::Float(0.5));
        assert_eq!(voice.fields["accuracy"], FieldValue::Null);
    }

    #[test]
    fn prose_values_keep_their_commas() {
        let moves = parse_moves("[X]\nName=X\nDescription=Hits hard, then flinches.\nFlags = Contact , Sound\n");
        let x = moves.get("X").unwrap();
        assert_eq!(
            x.fields["description"],
            FieldValue::Text("Hits hard, then flinches.".into())
        );
        assert_eq!(x.fields["sound"], FieldValue::Bool(true));
        let json = serde_json::to_value(&moves).unwrap();
        assert_eq!(json["X"]["internalId"], "X");
        assert_eq!(json["X"]["description"], "Hits hard, then flinches.");
    }

    #[test]
    fn every_flag_is_emitted_after_the_declared_fields() {
        let moves = parse_moves("[SPLASH]\n");
        let keys: Vec<&str> = moves
            .get("SPLASH")
            .unwrap()
            .fields
            .keys()
            .map(String::as_str)
            .collect();
        let flags: Vec<&str> = FLAG_TAGS.iter().map(|(flag, _)| *flag).collect();
        assert_eq!(&keys[keys.len() - flags.len()..], flags.as_slice());
        assert_eq!(keys[0], "type");
    }
}
