//! Field definitions, the path-keyed lookup table, and override entries

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::path::Path;
use crate::schema::SchemaNode;

/// The literal override entry that marks where unreferenced fields go
pub const WILDCARD: &str = "*";

// =============================================================================
// Field Definition
// =============================================================================

/// One resolved, renderable field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Address from the schema root; empty for keyless containers
    #[serde(default, skip_serializing_if = "Path::is_empty")]
    pub key: Path,

    /// Widget type picked by the rule chain
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Layout wrapper props (label, help, labelCol, wrapperCol, ...)
    #[serde(default)]
    pub form_item: Map<String, Value>,

    /// Widget props
    #[serde(default)]
    pub input: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<Value>,

    /// Field binding options handed to the form layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorator: Option<Vec<Value>>,

    /// Nested fields of fieldsets and lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<FieldDefinition>>,

    /// Source schema, kept only while a type may still be re-resolved
    #[serde(skip)]
    pub schema: Option<SchemaNode>,
}

impl FieldDefinition {
    pub fn new(key: Path) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Canonical lookup key of this field
    pub fn path_key(&self) -> String {
        self.key.encode()
    }

    pub fn field_type(&self) -> Option<&str> {
        self.type_.as_deref()
    }

    pub fn set_type(&mut self, type_: impl Into<String>) {
        self.type_ = Some(type_.into());
    }

    pub fn label(&self) -> Option<&Value> {
        self.form_item.get("label")
    }

    /// Number of fields in this subtree, this one included
    pub fn count(&self) -> usize {
        1 + self
            .items
            .as_ref()
            .map(|items| items.iter().map(FieldDefinition::count).sum())
            .unwrap_or(0)
    }
}

/// Drop the transient source schema from every field of `fields`, recursively
pub(crate) fn strip_schema(fields: &mut [FieldDefinition]) {
    for field in fields {
        field.schema = None;
        if let Some(items) = &mut field.items {
            strip_schema(items);
        }
    }
}

// =============================================================================
// Lookup Table
// =============================================================================

/// Generated definitions keyed by encoded path, in walk order
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: IndexMap<String, FieldDefinition>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its original position
    pub fn insert(&mut self, definition: FieldDefinition) {
        self.entries.insert(definition.path_key(), definition);
    }

    pub fn get(&self, key: &str) -> Option<&FieldDefinition> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry, marking it consumed. Missing keys are a no-op.
    pub fn consume(&mut self, key: &str) -> Option<FieldDefinition> {
        self.entries.shift_remove(key)
    }

    /// Remove and return the unconsumed direct children of `scope`, in walk order
    ///
    /// Descendants already consumed elsewhere are pruned from the returned
    /// fields' `items`, so each field is placed at most once.
    pub fn drain_children_of(&mut self, scope: &Path) -> Vec<FieldDefinition> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, def)| def.key.parent().as_ref() == Some(scope))
            .map(|(key, _)| key.clone())
            .collect();

        let mut drained: Vec<FieldDefinition> =
            keys.iter().filter_map(|key| self.entries.shift_remove(key)).collect();
        for def in &mut drained {
            self.prune_consumed(def);
        }
        drained
    }

    fn prune_consumed(&self, def: &mut FieldDefinition) {
        if let Some(items) = &mut def.items {
            items.retain(|child| child.key.is_empty() || self.entries.contains_key(&child.path_key()));
            for child in items.iter_mut() {
                self.prune_consumed(child);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// =============================================================================
// Override Entry
// =============================================================================

/// One entry of a hand-authored definition list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum OverrideEntry {
    /// `"*"`: place every field not mentioned here
    Wildcard,
    /// A bare field key
    Key(String),
    /// A canonical or legacy definition object
    Object(Map<String, Value>),
}

impl OverrideEntry {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, OverrideEntry::Wildcard)
    }

    /// Parse a JSON array of entries
    pub fn list_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(values) => values.into_iter().map(Self::try_from).collect(),
            other => Err(SchemaError::InvalidDefinition(format!(
                "expected an array of entries, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<Value> for OverrideEntry {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) if s == WILDCARD => Ok(OverrideEntry::Wildcard),
            Value::String(s) => Ok(OverrideEntry::Key(s)),
            Value::Object(map) => Ok(OverrideEntry::Object(map)),
            other => Err(SchemaError::InvalidDefinition(format!(
                "entry must be a key string or an object, got {}",
                other
            ))),
        }
    }
}

impl From<&str> for OverrideEntry {
    fn from(s: &str) -> Self {
        if s == WILDCARD {
            OverrideEntry::Wildcard
        } else {
            OverrideEntry::Key(s.to_string())
        }
    }
}

impl Serialize for OverrideEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OverrideEntry::Wildcard => serializer.serialize_str(WILDCARD),
            OverrideEntry::Key(key) => serializer.serialize_str(key),
            OverrideEntry::Object(map) => map.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_override_entries_from_json() {
        let entries = OverrideEntry::list_from_value(json!([
            "name",
            "*",
            { "key": "age", "type": "input-number" }
        ]))
        .unwrap();
        assert_eq!(entries[0], OverrideEntry::Key("name".into()));
        assert!(entries[1].is_wildcard());
        assert!(matches!(entries[2], OverrideEntry::Object(_)));
    }

    #[test]
    fn test_override_entry_rejects_scalars() {
        assert!(OverrideEntry::list_from_value(json!([42])).is_err());
        assert!(OverrideEntry::list_from_value(json!({ "key": "a" })).is_err());
    }

    #[test]
    fn test_lookup_consume_and_drain_keep_walk_order() {
        let mut lookup = LookupTable::new();
        for key in ["a", "b", "c"] {
            lookup.insert(FieldDefinition::new(Path::root().child(key)));
        }
        lookup.insert(FieldDefinition::new(Path::root().child("a").child("x")));

        assert!(lookup.consume("b").is_some());
        assert!(lookup.consume("b").is_none());

        let drained: Vec<String> = lookup
            .drain_children_of(&Path::root())
            .iter()
            .map(FieldDefinition::path_key)
            .collect();
        assert_eq!(drained, vec!["a", "c"]);
        assert_eq!(lookup.keys().collect::<Vec<_>>(), vec!["a.x"]);
    }

    #[test]
    fn test_drain_prunes_children_consumed_elsewhere() {
        let address = Path::root().child("address");
        let mut parent = FieldDefinition::new(address.clone());
        parent.items = Some(vec![
            FieldDefinition::new(address.child("street")),
            FieldDefinition::new(address.child("city")),
        ]);

        let mut lookup = LookupTable::new();
        lookup.insert(parent);
        for child in ["street", "city"] {
            lookup.insert(FieldDefinition::new(address.child(child)));
        }

        assert!(lookup.consume("address.city").is_some());
        let drained = lookup.drain_children_of(&Path::root());
        assert_eq!(drained.len(), 1);
        let children: Vec<String> = drained[0]
            .items
            .as_deref()
            .unwrap()
            .iter()
            .map(FieldDefinition::path_key)
            .collect();
        assert_eq!(children, vec!["address.street"]);
    }

    #[test]
    fn test_strip_schema_reaches_nested_items() {
        let schema = SchemaNode::from_value(json!({ "type": "string" })).unwrap();
        let mut child = FieldDefinition::new(Path::root().child("a").child("b"));
        child.schema = Some(schema.clone());
        let mut parent = FieldDefinition::new(Path::root().child("a"));
        parent.schema = Some(schema);
        parent.items = Some(vec![child]);

        let mut fields = vec![parent];
        strip_schema(&mut fields);
        assert!(fields[0].schema.is_none());
        assert!(fields[0].items.as_ref().unwrap()[0].schema.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut def = FieldDefinition::new(Path::root().child("tags").child(0usize));
        def.set_type("input");
        def.form_item.insert("label".into(), json!("Tag"));
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(
            value,
            json!({ "key": ["tags", 0], "type": "input", "formItem": { "label": "Tag" }, "input": {} })
        );
    }
}
