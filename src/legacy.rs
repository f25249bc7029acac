//! Legacy override shape
//!
//! Older definitions were flat: `title`, `description`, `tpl` and widget
//! props sat next to `key` and `type`. [`normalize_legacy`] folds either
//! shape into a [`CanonicalOverride`].

use serde_json::{Map, Value};

use crate::definition::OverrideEntry;
use crate::error::{Result, SchemaError};
use crate::path::{normalize_shorthand, Path};
use crate::value::deep_merge;

/// An override entry in canonical shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalOverride {
    pub type_: Option<String>,
    pub key: Option<Path>,
    pub col: Option<Value>,
    pub form_item: Map<String, Value>,
    pub input: Map<String, Value>,
    pub decorator: Option<Vec<Value>>,
    /// Nested overrides, not yet normalized
    pub items: Option<Vec<OverrideEntry>>,
}

impl CanonicalOverride {
    /// Override consisting of a key only
    pub fn for_key(key: &str) -> Result<Self> {
        Ok(Self {
            key: parse_key(Value::String(key.to_string()))?,
            ..Self::default()
        })
    }

    /// Canonical JSON form; normalizing it again yields the same override
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(type_) = &self.type_ {
            map.insert("type".into(), Value::String(type_.clone()));
        }
        if let Some(key) = &self.key {
            map.insert("key".into(), serde_json::to_value(key).unwrap_or(Value::Null));
        }
        if let Some(col) = &self.col {
            map.insert("col".into(), col.clone());
        }
        map.insert("formItem".into(), Value::Object(self.form_item.clone()));
        map.insert("input".into(), Value::Object(self.input.clone()));
        if let Some(decorator) = &self.decorator {
            map.insert("decorator".into(), Value::Array(decorator.clone()));
        }
        if let Some(items) = &self.items {
            map.insert(
                "items".into(),
                serde_json::to_value(items).unwrap_or_else(|_| Value::Array(Vec::new())),
            );
        }
        Value::Object(map)
    }
}

/// Normalize one override object
pub fn normalize_legacy(mut entry: Map<String, Value>) -> Result<CanonicalOverride> {
    let type_ = match entry.shift_remove("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(tag)) => Some(tag),
        Some(other) => return Err(invalid("type", &other)),
    };

    let key = match entry.shift_remove("key") {
        Some(value) => parse_key(value)?,
        None => None,
    };

    let mut form_item = Map::new();
    if let Some(title) = entry.shift_remove("title") {
        form_item.insert("label".into(), title);
    }
    if let Some(description) = entry.shift_remove("description") {
        if is_truthy(&description) {
            form_item.insert("help".into(), description);
        }
    }

    let col = entry.shift_remove("col").filter(|col| !col.is_null());

    let decorator = match entry.shift_remove("decorator") {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => Some(values),
        Some(other) => return Err(invalid("decorator", &other)),
    };

    let items = match entry.shift_remove("items") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Array(_)) => Some(OverrideEntry::list_from_value(value)?),
        Some(other) => return Err(invalid("items", &other)),
    };

    let explicit_form_item = take_object(&mut entry, "formItem")?;
    let explicit_input = take_object(&mut entry, "input")?;

    let html = entry.shift_remove("tpl");

    // Whatever is left are widget props
    let mut input = entry;
    if let Some(html) = html {
        input.insert("html".into(), html);
    }

    if let Some(explicit) = explicit_form_item {
        deep_merge(&mut form_item, &explicit);
    }
    if let Some(explicit) = explicit_input {
        deep_merge(&mut input, &explicit);
    }

    Ok(CanonicalOverride {
        type_,
        key,
        col,
        form_item,
        input,
        decorator,
        items,
    })
}

fn parse_key(value: Value) -> Result<Option<Path>> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) if raw.is_empty() => Ok(None),
        Value::String(raw) => normalize_shorthand(&raw).parse::<Path>().map(Some),
        Value::Array(segments) if segments.is_empty() => Ok(None),
        Value::Array(segments) => Path::from_json_segments(&segments).map(Some),
        other => Err(invalid("key", &other)),
    }
}

fn take_object(entry: &mut Map<String, Value>, field: &str) -> Result<Option<Map<String, Value>>> {
    match entry.shift_remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(invalid(field, &other)),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn invalid(field: &str, value: &Value) -> SchemaError {
    SchemaError::InvalidDefinition(format!("`{}` has unexpected value {}", field, value))
}
