//! Generator
//!
//! Entry point for the form layer: walk the schema, then merge the
//! hand-authored definition over the result.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::definition::{strip_schema, FieldDefinition, OverrideEntry};
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::merge::Merger;
use crate::registry::RuleRegistry;
use crate::schema::SchemaNode;
use crate::walker::Walker;

/// What a field validator is told about the field being checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    /// Encoded path of the field
    pub full_field: String,
}

/// Caller-supplied validation hook, kept for the rendering layer
pub type FieldValidator =
    Arc<dyn Fn(&ValidationRule, &Value) -> std::result::Result<(), String> + Send + Sync>;

/// Fields produced by one parse, with everything worth telling the author
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub fields: Vec<FieldDefinition>,
    pub diagnostics: Diagnostics,
}

pub struct Generator<'r> {
    registry: &'r RuleRegistry,
    form_item_defaults: Map<String, Value>,
    validator: Option<FieldValidator>,
}

impl<'r> Generator<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            form_item_defaults: Map::new(),
            validator: None,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.registry
    }

    /// Form-item defaults of the last parse
    pub fn form_item_defaults(&self) -> &Map<String, Value> {
        &self.form_item_defaults
    }

    pub fn validator(&self) -> Option<&FieldValidator> {
        self.validator.as_ref()
    }

    /// Run the stored validator for `field`; passes when none is set
    pub fn validate(&self, field: &FieldDefinition, value: &Value) -> std::result::Result<(), String> {
        match &self.validator {
            Some(validator) => {
                let rule = ValidationRule {
                    full_field: field.path_key(),
                };
                validator(&rule, value)
            }
            None => Ok(()),
        }
    }

    /// Build the field tree, logging diagnostics
    pub fn parse(
        &mut self,
        schema: &SchemaNode,
        definition: Vec<OverrideEntry>,
        form_item_defaults: &Map<String, Value>,
        validator: Option<FieldValidator>,
    ) -> Result<Vec<FieldDefinition>> {
        let report = self.parse_report(schema, definition, form_item_defaults, validator)?;

        for item in &report.diagnostics {
            match item.severity() {
                Severity::Warning => warn!(field = %item.field, code = %item.code, "{}", item.message),
                Severity::Info => info!(field = %item.field, code = %item.code, "{}", item.message),
            }
        }

        Ok(report.fields)
    }

    /// Build the field tree and return diagnostics alongside it
    pub fn parse_report(
        &mut self,
        schema: &SchemaNode,
        definition: Vec<OverrideEntry>,
        form_item_defaults: &Map<String, Value>,
        validator: Option<FieldValidator>,
    ) -> Result<ParseReport> {
        schema.ensure_root()?;

        self.form_item_defaults = form_item_defaults.clone();
        self.validator = validator;

        let mut walker = Walker::new(self.registry, &self.form_item_defaults);
        let (mut tree, mut lookup) = walker.walk(schema)?;
        let mut diagnostics = walker.into_diagnostics();

        let fields = if definition.is_empty() {
            strip_schema(&mut tree);
            tree
        } else {
            let mut merger = Merger::new(self.registry, &self.form_item_defaults);
            let fields = merger.combine(definition, &tree, &mut lookup)?;
            diagnostics.merge(merger.into_diagnostics());
            fields
        };

        Ok(ParseReport { fields, diagnostics })
    }
}

impl fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("registry", self.registry)
            .field("form_item_defaults", &self.form_item_defaults)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
