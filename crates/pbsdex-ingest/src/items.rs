//! `items.txt`

use crate::collect_records;
use pbsdex_pbs::{DuplicatePolicy, FieldKind, FieldSpec, RecordSet, Schema, TokenizerOptions};

pub fn schema() -> Schema {
    Schema::new("items")
        .with_identity_key("internalName")
        .field(FieldSpec::new("internalName", FieldKind::InternalName))
        .field(FieldSpec::new("name", FieldKind::DisplayName))
        .field(FieldSpec::new("namePlural", FieldKind::Text))
        .field(FieldSpec::new("description", FieldKind::Text))
        .field(FieldSpec::new("pocket", FieldKind::Int))
        .field(FieldSpec::new("price", FieldKind::Int))
        .field(FieldSpec::new("sellPrice", FieldKind::Int))
        .field(FieldSpec::new("fieldUse", FieldKind::Text))
        .field(FieldSpec::new("battleUse", FieldKind::Text))
        .field(FieldSpec::new("consumable", FieldKind::Bool))
        .field(FieldSpec::new("flags", FieldKind::List))
}

pub fn parse_items(text: &str) -> RecordSet {
    collect_records(&schema(), text, TokenizerOptions::default(), DuplicatePolicy::LastWins).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbsdex_pbs::FieldValue;

    #[test]
    fn items_keep_unknown_keys_as_extra() {
        let items = parse_items(
            "[REPEL]\nName=Repel\nNamePlural=Repels\nPocket=1\nPrice=400\nConsumable=true\n\
             FieldUse=Direct\nFlags=Repel, Fling_30\nMove=NONE\n\
             [CHOICEBAND]\nName=Choice Band\nPrice=??\nConsumable=sometimes\n",
        );
        let repel = items.get("REPEL").unwrap();
        assert_eq!(repel.fields["pocket"], FieldValue::Int(1));
        assert_eq!(repel.fields["price"], FieldValue::Int(400));
        assert_eq!(repel.fields["consumable"], FieldValue::Bool(true));
        assert_eq!(
            repel.fields["flags"],
            FieldValue::List(vec!["Repel".into(), "Fling_30".into()])
        );
        assert_eq!(repel.extra["Move"], "NONE");
        assert!(!repel.fields.contains_key("sellPrice"));

        let band = items.get("CHOICEBAND").unwrap();
        assert_eq!(band.display_name, "Choice Band");
        assert_eq!(band.fields["price"], FieldValue::Text("??".into()));
        assert!(!band.fields.contains_key("consumable"));
        assert_eq!(band.extra["Consumable"], "sometimes");
    }

    #[test]
    fn items_serialize_with_internal_name() {
        let items = parse_items("[POTION]\nName=Potion\nDescription=Restores 20 HP, once.\n");
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json["POTION"]["internalName"], "POTION");
        assert_eq!(json["POTION"]["id"], "potion");
        assert_eq!(json["POTION"]["description"], "Restores 20 HP, once.");
        assert!(json["POTION"].get("internalId").is_none());
    }
}
