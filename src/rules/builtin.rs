//! Built-in widget rules
//!
//! Every widget rule sets its own type unconditionally; selection between
//! widgets for a schema type happens through [`when`](super::when) guards in
//! the registry chains.

use serde_json::{json, Map, Value};

use super::{Rule, RuleContext};
use crate::definition::FieldDefinition;
use crate::schema::SchemaNode;

/// Widget type names
pub mod widget {
    pub const INPUT: &str = "input";
    pub const TEXTAREA: &str = "textarea";
    pub const INPUT_NUMBER: &str = "input-number";
    pub const SELECT: &str = "select";
    pub const SWITCH: &str = "switch";
    pub const DATE_PICKER: &str = "date-picker";
    pub const CHECKBOX_GROUP: &str = "checkbox-group";
    pub const FIELDSET: &str = "fieldset";
    pub const LIST: &str = "list";
    pub const IMAGE_UPLOAD: &str = "image-upload";

    pub const ALL: [&str; 10] = [
        INPUT,
        TEXTAREA,
        INPUT_NUMBER,
        SELECT,
        SWITCH,
        DATE_PICKER,
        CHECKBOX_GROUP,
        FIELDSET,
        LIST,
        IMAGE_UPLOAD,
    ];
}

// =============================================================================
// Predicates
// =============================================================================

pub fn has_enum(schema: &SchemaNode) -> bool {
    schema.enum_values().is_some()
}

pub fn is_date(schema: &SchemaNode) -> bool {
    matches!(schema.format(), Some("date") | Some("date-time"))
}

pub fn is_textarea(schema: &SchemaNode) -> bool {
    schema.format() == Some("textarea")
}

pub fn is_image(schema: &SchemaNode) -> bool {
    schema.format() == Some("image")
}

pub fn items_have_enum(schema: &SchemaNode) -> bool {
    schema
        .items
        .as_ref()
        .and_then(|items| items.first())
        .map(has_enum)
        .unwrap_or(false)
}

// =============================================================================
// Helpers
// =============================================================================

fn set_if_absent(map: &mut Map<String, Value>, key: &str, value: Value) {
    map.entry(key.to_string()).or_insert(value);
}

fn copy_keyword(def: &mut FieldDefinition, schema: Option<&SchemaNode>, keyword: &str, prop: &str) {
    if let Some(value) = schema.and_then(|s| s.keyword(keyword)) {
        def.input.insert(prop.to_string(), value.clone());
    }
}

/// `{label, value}` pairs from `enum`, labelled by `enumNames` when present
fn enum_options(schema: &SchemaNode) -> Option<Value> {
    let values = schema.enum_values()?;
    let names = schema.keyword("enumNames").and_then(Value::as_array);
    let options = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let label = names
                .and_then(|names| names.get(i))
                .cloned()
                .unwrap_or_else(|| match value {
                    Value::String(s) => Value::String(s.clone()),
                    other => Value::String(other.to_string()),
                });
            json!({ "label": label, "value": value })
        })
        .collect();
    Some(Value::Array(options))
}

fn set_options(def: &mut FieldDefinition, source: Option<&SchemaNode>) {
    match source.and_then(enum_options) {
        Some(options) => {
            def.input.insert("options".into(), options);
        }
        None => set_if_absent(&mut def.input, "options", Value::Array(Vec::new())),
    }
}

// =============================================================================
// Rules
// =============================================================================

pub struct Input;

impl Rule for Input {
    fn name(&self) -> &str {
        widget::INPUT
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::INPUT);
        copy_keyword(def, schema, "maxLength", "maxLength");
    }
}

pub struct Textarea;

impl Rule for Textarea {
    fn name(&self) -> &str {
        widget::TEXTAREA
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::TEXTAREA);
        set_if_absent(&mut def.input, "rows", json!(4));
        copy_keyword(def, schema, "maxLength", "maxLength");
    }
}

pub struct InputNumber;

impl Rule for InputNumber {
    fn name(&self) -> &str {
        widget::INPUT_NUMBER
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::INPUT_NUMBER);
        copy_keyword(def, schema, "minimum", "min");
        copy_keyword(def, schema, "maximum", "max");
        if schema.and_then(SchemaNode::primary_type) == Some("integer") {
            def.input.insert("precision".into(), json!(0));
        }
    }
}

pub struct Select;

impl Rule for Select {
    fn name(&self) -> &str {
        widget::SELECT
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::SELECT);
        set_options(def, schema);
    }
}

pub struct Switch;

impl Rule for Switch {
    fn name(&self) -> &str {
        widget::SWITCH
    }

    fn apply(&self, def: &mut FieldDefinition, _schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::SWITCH);
        let decorator = def.decorator.get_or_insert_with(Vec::new);
        if decorator.is_empty() {
            decorator.push(Value::Object(Map::new()));
        }
        if let Some(Value::Object(options)) = decorator.first_mut() {
            options.insert("valuePropName".into(), json!("checked"));
        }
    }
}

pub struct DatePicker;

impl Rule for DatePicker {
    fn name(&self) -> &str {
        widget::DATE_PICKER
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::DATE_PICKER);
        if schema.and_then(SchemaNode::format) == Some("date-time") {
            def.input.insert("format".into(), json!("YYYY-MM-DD HH:mm:ss"));
            def.input.insert("showTime".into(), json!(true));
        } else {
            def.input.insert("format".into(), json!("YYYY-MM-DD"));
        }
    }
}

pub struct CheckboxGroup;

impl Rule for CheckboxGroup {
    fn name(&self) -> &str {
        widget::CHECKBOX_GROUP
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::CHECKBOX_GROUP);
        let element = schema.and_then(|s| s.items.as_ref()).and_then(|items| items.first());
        set_options(def, element);
    }
}

pub struct ImageUpload;

impl Rule for ImageUpload {
    fn name(&self) -> &str {
        widget::IMAGE_UPLOAD
    }

    fn apply(&self, def: &mut FieldDefinition, _schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::IMAGE_UPLOAD);
        set_if_absent(&mut def.input, "accept", json!("image/*"));
    }
}

/// Object container; children are nested by the walker
pub struct Fieldset;

impl Rule for Fieldset {
    fn name(&self) -> &str {
        widget::FIELDSET
    }

    fn apply(&self, def: &mut FieldDefinition, _schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::FIELDSET);
        def.decorator = None;
    }
}

/// Array container; element fields are nested by the walker
pub struct List;

impl Rule for List {
    fn name(&self) -> &str {
        widget::LIST
    }

    fn apply(&self, def: &mut FieldDefinition, _schema: Option<&SchemaNode>, _ctx: &RuleContext<'_>) {
        def.set_type(widget::LIST);
        def.decorator = None;
    }
}
