//! Schema Walker
//!
//! Turns a schema into the default field tree plus a lookup table keyed by
//! encoded path. Every node is recorded, nested ones included, and a parent
//! always precedes its children in lookup order.

use serde_json::{Map, Value};
use tracing::debug;

use crate::definition::{FieldDefinition, LookupTable};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::path::Path;
use crate::registry::RuleRegistry;
use crate::rules::{default_definition, RuleContext};
use crate::schema::SchemaNode;

pub struct Walker<'a> {
    registry: &'a RuleRegistry,
    form_item_defaults: &'a Map<String, Value>,
    diagnostics: Diagnostics,
}

impl<'a> Walker<'a> {
    pub fn new(registry: &'a RuleRegistry, form_item_defaults: &'a Map<String, Value>) -> Self {
        Self {
            registry,
            form_item_defaults,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Walk a root schema
    ///
    /// Fails only when the root has neither `properties` nor `items`.
    pub fn walk(&mut self, schema: &SchemaNode) -> Result<(Vec<FieldDefinition>, LookupTable)> {
        schema.ensure_root()?;

        let mut lookup = LookupTable::new();
        let tree = self.walk_children(schema, &Path::root(), &mut lookup);

        debug!(fields = lookup.len(), "walked schema");
        Ok((tree, lookup))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn walk_children(
        &mut self,
        schema: &SchemaNode,
        parent: &Path,
        lookup: &mut LookupTable,
    ) -> Vec<FieldDefinition> {
        let defaults = self.form_item_defaults;

        if let Some(properties) = &schema.properties {
            properties
                .iter()
                .map(|(name, child)| {
                    let path = parent.child(name.as_str());
                    let ctx = RuleContext::new(&path, defaults)
                        .with_required(schema.is_required(name))
                        .with_in_array(false);
                    self.resolve_field(child, ctx, lookup)
                })
                .collect()
        } else if let Some(items) = &schema.items {
            items
                .iter()
                .map(|(index, child)| {
                    let path = parent.child(index);
                    let ctx = RuleContext::new(&path, defaults).with_in_array(true);
                    self.resolve_field(child, ctx, lookup)
                })
                .collect()
        } else {
            Vec::new()
        }
    }

    fn resolve_field(
        &mut self,
        schema: &SchemaNode,
        ctx: RuleContext<'_>,
        lookup: &mut LookupTable,
    ) -> FieldDefinition {
        let registry = self.registry;
        let mut draft = default_definition(schema, &ctx);

        let type_tag = schema.primary_type();
        let chain = type_tag.map(|tag| registry.chain_for(tag)).unwrap_or(&[]);
        if chain.is_empty() {
            self.diagnostics.unresolved_type(ctx.path.encode(), type_tag);
        }

        for rule in chain {
            rule.apply(&mut draft, Some(schema), &ctx);
            if draft.type_.is_some() {
                break;
            }
        }

        debug!(
            field = %ctx.path,
            schema_type = type_tag.unwrap_or("<none>"),
            resolved = draft.field_type().unwrap_or("<none>"),
            "resolved field"
        );

        if schema.has_children() {
            // Reserve the parent's slot so it stays ahead of its children
            lookup.insert(draft.clone());
            draft.items = Some(self.walk_children(schema, ctx.path, lookup));
        }

        lookup.insert(draft.clone());
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::error::SchemaError;
    use serde_json::json;

    fn walk(schema: Value) -> (Vec<FieldDefinition>, LookupTable, Diagnostics) {
        let registry = RuleRegistry::with_builtins();
        let defaults = Map::new();
        let schema = SchemaNode::from_value(schema).unwrap();
        let mut walker = Walker::new(&registry, &defaults);
        let (tree, lookup) = walker.walk(&schema).unwrap();
        (tree, lookup, walker.into_diagnostics())
    }

    #[test]
    fn test_properties_in_declaration_order() {
        let (tree, lookup, diags) = walk(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "title": "Name" },
                "age": { "type": "integer" },
                "gender": { "type": "string", "enum": ["m", "f"] }
            },
            "required": ["name"]
        }));

        let summary: Vec<_> = tree
            .iter()
            .map(|d| (d.path_key(), d.field_type().unwrap_or_default().to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("name".to_string(), "input".to_string()),
                ("age".to_string(), "input-number".to_string()),
                ("gender".to_string(), "select".to_string()),
            ]
        );
        assert_eq!(lookup.len(), 3);
        assert!(diags.is_empty());
        assert_eq!(
            tree[0].decorator,
            Some(vec![json!({ "rules": [{ "required": true, "message": "Name is required" }] })])
        );
    }

    #[test]
    fn test_nested_fields_are_recorded_after_parent() {
        let (tree, lookup, _) = walk(json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {
                        "city": { "type": "string" },
                        "zip": { "type": "string" }
                    }
                },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));

        assert_eq!(
            lookup.keys().collect::<Vec<_>>(),
            vec!["address", "address.city", "address.zip", "tags", "tags[0]"]
        );
        assert_eq!(tree[0].field_type(), Some("fieldset"));
        assert_eq!(tree[0].items.as_ref().map(Vec::len), Some(2));
        assert_eq!(lookup.get("address"), Some(&tree[0]));

        let element = &tree[1].items.as_ref().unwrap()[0];
        assert_eq!(element.key, Path::root().child("tags").child(0usize));
        assert_eq!(element.field_type(), Some("input"));
    }

    #[test]
    fn test_array_root_is_walked_by_index() {
        let (tree, lookup, _) = walk(json!({
            "type": "array",
            "items": [{ "type": "string" }, { "type": "boolean" }]
        }));
        assert_eq!(lookup.keys().collect::<Vec<_>>(), vec!["[0]", "[1]"]);
        assert_eq!(tree[1].field_type(), Some("switch"));
    }

    #[test]
    fn test_unknown_type_is_emitted_untyped() {
        let (tree, _, diags) = walk(json!({
            "properties": {
                "blob": { "type": "binary" },
                "free": {}
            }
        }));
        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|d| d.type_.is_none()));
        assert_eq!(diags.with_code(DiagnosticCode::UnresolvedType).count(), 2);
    }

    #[test]
    fn test_root_without_children_fails() {
        let registry = RuleRegistry::with_builtins();
        let defaults = Map::new();
        let schema = SchemaNode::from_value(json!({ "type": "object" })).unwrap();
        let err = Walker::new(&registry, &defaults).walk(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema(_)));
    }
}
