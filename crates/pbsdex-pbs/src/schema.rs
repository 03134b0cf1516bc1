//! Format schemas: which raw keys exist, what they are called canonically and
//! how their values are coerced.
//!
//! Each PBS file kind gets one [`Schema`]. Raw keys are matched through a
//! folded alias table (case and punctuation insensitive), so `BaseStats`,
//! `base_stats` and `Base Stats` all land on the same [`FieldSpec`].

use crate::stats::StatOrder;
use crate::value::{FieldValue, Fields};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text where an empty value or `NONE` means "not set".
    OptionalName,
    Int,
    Float,
    Bool,
    List,
    DedupedList,
    /// `level,move,level,move,...`
    Learnset,
    /// `target,method,param,...`
    Evolutions,
    BaseStats,
    EffortValues,
    /// Inputs to the compound type list.
    Type(TypeSlot),
    /// Identity keys; consumed by the assembler, never stored as fields.
    InternalName,
    DisplayName,
    FormName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSlot {
    First,
    Second,
    Combined,
}

/// Value filled in for a declared field the block never mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Absent,
    Null,
    EmptyList,
    EmptyText,
    False,
    /// All six stats at 0, in the schema's stat order.
    ZeroStats,
}

impl FieldDefault {
    fn value(self, order: StatOrder) -> Option<FieldValue> {
        match self {
            FieldDefault::Absent => None,
            FieldDefault::Null => Some(FieldValue::Null),
            FieldDefault::EmptyList => Some(FieldValue::List(Vec::new())),
            FieldDefault::EmptyText => Some(FieldValue::Text(String::new())),
            FieldDefault::False => Some(FieldValue::Bool(false)),
            FieldDefault::ZeroStats => Some(FieldValue::Stats(order.map_vector([0; 6]))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical output name.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Raw spellings besides `name` itself.
    pub aliases: Vec<&'static str>,
    /// Nest the value under this group field (e.g. `battler`).
    pub group: Option<&'static str>,
    pub default: FieldDefault,
    /// Copy this other canonical field when the block does not set one.
    pub fallback: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            aliases: Vec::new(),
            group: None,
            default: FieldDefault::Absent,
            fallback: None,
        }
    }

    pub fn alias(mut self, raw: &'static str) -> Self {
        self.aliases.push(raw);
        self
    }

    pub fn aliases(mut self, raws: &[&'static str]) -> Self {
        self.aliases.extend_from_slice(raws);
        self
    }

    pub fn grouped(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub fn default_to(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    pub fn fallback(mut self, other: &'static str) -> Self {
        self.fallback = Some(other);
        self
    }

    /// The top-level slot this field occupies in a record.
    pub fn slot(&self) -> &'static str {
        self.group.unwrap_or(self.name)
    }

    pub fn is_identity(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::InternalName | FieldKind::DisplayName | FieldKind::FormName
        )
    }
}

/// Where a record's internal identifier may come from, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// The `InternalName` field.
    InternalNameField,
    /// The bracketed header token, unless purely numeric.
    Header,
    /// The display name, uppercased.
    UppercaseName,
    /// The block's numeric index.
    Index,
}

/// A boolean projected from membership of `tag` in the list field `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFlag {
    pub name: &'static str,
    pub source: &'static str,
    pub tag: &'static str,
}

/// Lowercased alphanumerics only: `Base_Stats`, `Sp.A` and `basestats`
/// fold to `basestats`, `spa`, `basestats`.
pub fn fold_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub stat_order: StatOrder,
    pub identity: Vec<IdentitySource>,
    /// Output key carrying the internal id (`internalId`, `internalName`).
    pub identity_key: &'static str,
    /// Use the block's position when it has no explicit index.
    pub positional_index: bool,
    /// Keep every raw pair on the record.
    pub keep_raw: bool,
    /// Keep unrecognized raw pairs on the record.
    pub keep_extra: bool,
    fields: Vec<FieldSpec>,
    by_alias: HashMap<String, usize>,
    layout: Vec<&'static str>,
    derived: Vec<DerivedFlag>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stat_order: StatOrder::default(),
            identity: vec![
                IdentitySource::InternalNameField,
                IdentitySource::Header,
                IdentitySource::Index,
            ],
            identity_key: "internalId",
            positional_index: false,
            keep_raw: false,
            keep_extra: true,
            fields: Vec::new(),
            by_alias: HashMap::new(),
            layout: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// Register a field. A later field sharing a name or alias takes over that
    /// spelling, so declare the field that should own a shared name last.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        let idx = self.fields.len();
        for raw in std::iter::once(spec.name).chain(spec.aliases.iter().copied()) {
            self.by_alias.insert(fold_key(raw), idx);
        }
        if !spec.is_identity() && !self.layout.contains(&spec.slot()) {
            self.layout.push(spec.slot());
        }
        self.fields.push(spec);
        self
    }

    pub fn derived_flag(mut self, name: &'static str, source: &'static str, tag: &'static str) -> Self {
        self.derived.push(DerivedFlag { name, source, tag });
        self
    }

    pub fn with_stat_order(mut self, order: StatOrder) -> Self {
        self.stat_order = order;
        self
    }

    pub fn with_identity(mut self, sources: Vec<IdentitySource>) -> Self {
        self.identity = sources;
        self
    }

    pub fn with_identity_key(mut self, key: &'static str) -> Self {
        self.identity_key = key;
        self
    }

    pub fn with_positional_index(mut self) -> Self {
        self.positional_index = true;
        self
    }

    pub fn with_raw(mut self) -> Self {
        self.keep_raw = true;
        self
    }

    pub fn without_extra(mut self) -> Self {
        self.keep_extra = false;
        self
    }

    pub fn lookup(&self, raw_key: &str) -> Option<&FieldSpec> {
        self.by_alias.get(&fold_key(raw_key)).map(|&i| &self.fields[i])
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn derived_flags(&self) -> &[DerivedFlag] {
        &self.derived
    }

    /// List fields whose entries must stay unique.
    pub fn is_deduped(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|s| s.name == name && s.kind == FieldKind::DedupedList)
    }

    /// Recompute every derived flag from the current list fields.
    pub fn derive_flags(&self, fields: &mut Fields) {
        for flag in &self.derived {
            let set = fields
                .get(flag.source)
                .and_then(FieldValue::as_list)
                .is_some_and(|tags| tags.iter().any(|t| t.trim().eq_ignore_ascii_case(flag.tag)));
            fields.insert(flag.name.to_string(), FieldValue::Bool(set));
        }
    }

    /// Fill declared fields the block never set with their defaults. Names in
    /// `unresolved` were set to something unparsable and stay unset.
    pub fn apply_defaults(&self, fields: &mut Fields, unresolved: &[&str]) {
        for spec in &self.fields {
            if spec.group.is_some()
                || fields.contains_key(spec.name)
                || unresolved.contains(&spec.name)
            {
                continue;
            }
            if let Some(value) = spec.default.value(self.stat_order) {
                fields.insert(spec.name.to_string(), value);
            }
        }
    }

    /// Copy fallback sources into unset fields.
    pub fn apply_fallbacks(&self, fields: &mut Fields) {
        for spec in &self.fields {
            let Some(source) = spec.fallback else { continue };
            if fields.contains_key(spec.name) {
                continue;
            }
            if let Some(value) = fields.get(source).cloned() {
                fields.insert(spec.name.to_string(), value);
            }
        }
    }

    /// Reorder `fields` into schema declaration order (groups by their first
    /// member, members by declaration), derived flags last, then anything
    /// else in its existing order.
    pub fn arrange(&self, fields: Fields) -> Fields {
        let mut rest = fields;
        let mut out = Fields::with_capacity(rest.len());
        for slot in &self.layout {
            if let Some(value) = rest.shift_remove(*slot) {
                let value = match value {
                    FieldValue::Group(members) => FieldValue::Group(self.arrange_group(slot, members)),
                    other => other,
                };
                out.insert(slot.to_string(), value);
            }
        }
        for flag in &self.derived {
            if let Some(value) = rest.shift_remove(flag.name) {
                out.insert(flag.name.to_string(), value);
            }
        }
        out.extend(rest);
        out
    }

    fn arrange_group(&self, group: &str, members: Fields) -> Fields {
        let mut rest = members;
        let mut out = Fields::with_capacity(rest.len());
        for spec in self.fields.iter().filter(|s| s.group == Some(group)) {
            if let Some(value) = rest.shift_remove(spec.name) {
                out.insert(spec.name.to_string(), value);
            }
        }
        out.extend(rest);
        out
    }
}
