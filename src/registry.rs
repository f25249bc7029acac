//! Rule Registry
//!
//! Holds, per type tag, an ordered chain of rules. Schema types (`string`,
//! `array`, ...) and widget types (`select`, `list`, ...) share one namespace,
//! which lets an override that declares a widget type be re-resolved through
//! the same registry.
//!
//! The registry is set up once and then lent to generators by shared
//! reference; registering a rule needs `&mut`, so it cannot race a parse.

use std::collections::HashMap;
use std::sync::Arc;

use crate::rules::builtin::{self, widget};
use crate::rules::{when, Rule};

/// Type tag → rule chain
#[derive(Clone, Default)]
pub struct RuleRegistry {
    chains: HashMap<String, Vec<Arc<dyn Rule>>>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in schema and widget chains
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.push_rule("string", when(builtin::is_image, builtin::ImageUpload));
        registry.push_rule("string", when(builtin::has_enum, builtin::Select));
        registry.push_rule("string", when(builtin::is_date, builtin::DatePicker));
        registry.push_rule("string", when(builtin::is_textarea, builtin::Textarea));
        registry.push_rule("string", builtin::Input);

        for tag in ["number", "integer"] {
            registry.push_rule(tag, when(builtin::has_enum, builtin::Select));
            registry.push_rule(tag, builtin::InputNumber);
        }

        registry.push_rule("boolean", builtin::Switch);
        registry.push_rule("object", builtin::Fieldset);

        registry.push_rule("array", when(builtin::items_have_enum, builtin::CheckboxGroup));
        registry.push_rule("array", builtin::List);

        registry.push_rule(widget::INPUT, builtin::Input);
        registry.push_rule(widget::TEXTAREA, builtin::Textarea);
        registry.push_rule(widget::INPUT_NUMBER, builtin::InputNumber);
        registry.push_rule(widget::SELECT, builtin::Select);
        registry.push_rule(widget::SWITCH, builtin::Switch);
        registry.push_rule(widget::DATE_PICKER, builtin::DatePicker);
        registry.push_rule(widget::CHECKBOX_GROUP, builtin::CheckboxGroup);
        registry.push_rule(widget::FIELDSET, builtin::Fieldset);
        registry.push_rule(widget::LIST, builtin::List);
        registry.push_rule(widget::IMAGE_UPLOAD, builtin::ImageUpload);

        registry
    }

    /// Insert `rule` into the chain for `type_tag` at `priority_index`
    ///
    /// Index 0 puts the rule in front of every existing rule; an index past
    /// the end appends. A missing chain is created.
    pub fn add_rule(&mut self, type_tag: impl Into<String>, rule: impl Rule + 'static, priority_index: usize) {
        let chain = self.chains.entry(type_tag.into()).or_default();
        let at = priority_index.min(chain.len());
        chain.insert(at, Arc::new(rule));
    }

    /// Append `rule` with the lowest priority
    pub fn push_rule(&mut self, type_tag: impl Into<String>, rule: impl Rule + 'static) {
        self.chains.entry(type_tag.into()).or_default().push(Arc::new(rule));
    }

    /// The chain for `type_tag`, empty when nothing is registered
    pub fn chain_for(&self, type_tag: &str) -> &[Arc<dyn Rule>] {
        self.chains.get(type_tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Highest-priority rule for `type_tag`
    pub fn first_rule(&self, type_tag: &str) -> Option<&Arc<dyn Rule>> {
        self.chain_for(type_tag).first()
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        !self.chain_for(type_tag).is_empty()
    }

    /// Registered tags, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for tag in self.types() {
            let names: Vec<&str> = self.chain_for(tag).iter().map(|r| r.name()).collect();
            map.entry(&tag, &names);
        }
        map.finish()
    }
}
