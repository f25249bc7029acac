//! Field Rules
//!
//! A rule inspects a draft definition and the schema node it came from and may
//! set the draft's `type` together with widget config. Rules are grouped into
//! chains by type tag in the [`RuleRegistry`](crate::registry::RuleRegistry);
//! the first rule that sets a type ends its chain.

pub mod builtin;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::definition::FieldDefinition;
use crate::path::Path;
use crate::schema::SchemaNode;

/// Where the field being resolved sits
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub path: &'a Path,
    /// Listed in the parent object's `required`
    pub required: bool,
    /// Direct child of an array schema
    pub in_array: bool,
    pub form_item_defaults: &'a Map<String, Value>,
}

impl<'a> RuleContext<'a> {
    pub fn new(path: &'a Path, form_item_defaults: &'a Map<String, Value>) -> Self {
        Self {
            path,
            required: false,
            in_array: path.last().map(|s| s.is_index()).unwrap_or(false),
            form_item_defaults,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_in_array(mut self, in_array: bool) -> Self {
        self.in_array = in_array;
        self
    }
}

/// Resolves a draft to a concrete field type
///
/// `schema` is `None` when an override introduces a field the schema does not
/// describe; rules then fill structural defaults only.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, ctx: &RuleContext<'_>);
}

/// A rule backed by a closure
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&mut FieldDefinition, Option<&SchemaNode>, &RuleContext<'_>) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, ctx: &RuleContext<'_>) {
        (self.f)(def, schema, ctx)
    }
}

/// Wrap a closure as a rule
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnRule<F>
where
    F: Fn(&mut FieldDefinition, Option<&SchemaNode>, &RuleContext<'_>) + Send + Sync,
{
    FnRule { name: name.into(), f }
}

/// Runs `rule` only for schema nodes matching `predicate`
pub struct When {
    predicate: fn(&SchemaNode) -> bool,
    rule: Arc<dyn Rule>,
}

impl Rule for When {
    fn name(&self) -> &str {
        self.rule.name()
    }

    fn apply(&self, def: &mut FieldDefinition, schema: Option<&SchemaNode>, ctx: &RuleContext<'_>) {
        if schema.map(self.predicate).unwrap_or(false) {
            self.rule.apply(def, schema, ctx);
        }
    }
}

pub fn when(predicate: fn(&SchemaNode) -> bool, rule: impl Rule + 'static) -> When {
    When {
        predicate,
        rule: Arc::new(rule),
    }
}

/// Draft every rule chain starts from
///
/// The form-item defaults are copied in, `title` becomes the label (empty when
/// absent) and `description` the help text. The decorator carries the
/// `required` check and the schema `default` as initial value.
pub fn default_definition(schema: &SchemaNode, ctx: &RuleContext<'_>) -> FieldDefinition {
    let mut def = FieldDefinition::new(ctx.path.clone());

    def.form_item = ctx.form_item_defaults.clone();
    let label = schema.title.clone().unwrap_or_default();
    def.form_item.insert("label".into(), Value::String(label.clone()));
    if let Some(help) = &schema.description {
        def.form_item.insert("help".into(), Value::String(help.clone()));
    }

    let mut options = Map::new();
    if ctx.required && !ctx.in_array {
        let name = if label.is_empty() { ctx.path.encode() } else { label };
        let mut required = Map::new();
        required.insert("required".into(), Value::Bool(true));
        required.insert("message".into(), Value::String(format!("{} is required", name)));
        options.insert("rules".into(), Value::Array(vec![Value::Object(required)]));
    }
    if let Some(initial) = schema.default_value() {
        options.insert("initialValue".into(), initial.clone());
    }
    def.decorator = Some(vec![Value::Object(options)]);

    def.schema = Some(schema.clone());
    def
}
