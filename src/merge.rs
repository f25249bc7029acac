//! Definition Merger
//!
//! Reconciles a hand-authored override list with the generated default tree.
//! Overrides are matched to generated fields through the lookup table by
//! encoded path; every match consumes its entry, so whatever is left after a
//! pass is the set of fields the author never mentioned. A `"*"` entry marks
//! where those leftovers go.
//!
//! Nested `items` are merged recursively. Leftovers are scoped: a wildcard
//! only pulls in unconsumed fields that are direct children of the tree its
//! list is merged against. That is the matched field for a nested list, and
//! the root when the list falls back to the top-level tree. Nested fields
//! travel inside their parent, minus any the author placed elsewhere.
//!
//! The output never carries the transient source schema.

use serde_json::{Map, Value};
use tracing::debug;

use crate::definition::{strip_schema, FieldDefinition, LookupTable, OverrideEntry};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::legacy::{normalize_legacy, CanonicalOverride};
use crate::path::Path;
use crate::registry::RuleRegistry;
use crate::rules::RuleContext;
use crate::value::{deep_merge, nested_i64};

pub struct Merger<'a> {
    registry: &'a RuleRegistry,
    form_item_defaults: &'a Map<String, Value>,
    diagnostics: Diagnostics,
}

impl<'a> Merger<'a> {
    pub fn new(registry: &'a RuleRegistry, form_item_defaults: &'a Map<String, Value>) -> Self {
        Self {
            registry,
            form_item_defaults,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Merge `entries` over the top-level `default_tree`
    ///
    /// `lookup` is drained as overrides consume generated fields.
    pub fn combine(
        &mut self,
        entries: Vec<OverrideEntry>,
        default_tree: &[FieldDefinition],
        lookup: &mut LookupTable,
    ) -> Result<Vec<FieldDefinition>> {
        let mut fields = self.combine_level(entries, default_tree, default_tree, lookup, &Path::root())?;
        strip_schema(&mut fields);
        Ok(fields)
    }

    fn combine_level(
        &mut self,
        mut entries: Vec<OverrideEntry>,
        level_defaults: &[FieldDefinition],
        top_tree: &[FieldDefinition],
        lookup: &mut LookupTable,
        scope: &Path,
    ) -> Result<Vec<FieldDefinition>> {
        let wildcard = entries.iter().position(OverrideEntry::is_wildcard);

        if wildcard == Some(0) {
            return Ok(level_defaults.to_vec());
        }
        // Only the first marker is positional; later ones are ignored
        entries.retain(|entry| !entry.is_wildcard());

        let mut output = Vec::with_capacity(entries.len());
        for entry in entries {
            let canonical = match entry {
                OverrideEntry::Key(key) => CanonicalOverride::for_key(&key)?,
                OverrideEntry::Object(map) => normalize_legacy(map)?,
                OverrideEntry::Wildcard => continue,
            };
            output.push(self.merge_entry(canonical, top_tree, lookup)?);
        }

        if let Some(idx) = wildcard {
            let unmentioned = lookup.drain_children_of(scope);
            if !unmentioned.is_empty() {
                debug!(scope = %scope, count = unmentioned.len(), "placing unmentioned fields");
                let at = idx.min(output.len());
                output.splice(at..at, unmentioned);
            }
        }

        Ok(output)
    }

    fn merge_entry(
        &mut self,
        mut entry: CanonicalOverride,
        top_tree: &[FieldDefinition],
        lookup: &mut LookupTable,
    ) -> Result<FieldDefinition> {
        let nested = entry.items.take();
        let matched = entry
            .key
            .as_ref()
            .and_then(|key| lookup.consume(&key.encode()));

        let mut merged = match (&matched, entry.key.clone()) {
            (Some(def), _) => {
                let mut merged = self.rebase(def, entry.type_.as_deref());
                apply_override(&mut merged, entry);
                self.correct_span(def, &mut merged);
                merged
            }
            (None, Some(key)) => {
                let mut merged = self.fresh(&key, entry.type_.as_deref());
                apply_override(&mut merged, entry);
                merged
            }
            (None, None) => {
                let mut merged = FieldDefinition {
                    type_: entry.type_.clone(),
                    ..FieldDefinition::default()
                };
                apply_override(&mut merged, entry);
                merged
            }
        };

        debug!(
            field = %merged.key,
            resolved = merged.field_type().unwrap_or("<none>"),
            matched = matched.is_some(),
            "merged override"
        );

        if let Some(items) = nested {
            let (level_defaults, child_scope) = match &matched {
                Some(def) => (def.items.as_deref().unwrap_or(&[]), def.key.clone()),
                // No generated counterpart: act as the top level
                None => (top_tree, Path::root()),
            };
            let children = self.combine_level(items, level_defaults, top_tree, lookup, &child_scope)?;
            merged.items = Some(children);
        }

        Ok(merged)
    }

    /// Base for an override that matched a generated field
    fn rebase(&mut self, def: &FieldDefinition, declared: Option<&str>) -> FieldDefinition {
        let declared = match declared {
            Some(declared) if def.field_type() != Some(declared) => declared,
            _ => return def.clone(),
        };

        let registry = self.registry;
        let field = def.path_key();
        let Some(rule) = registry.first_rule(declared) else {
            self.diagnostics.unregistered_type(&field, declared, def.field_type());
            let mut stale = def.clone();
            stale.set_type(declared);
            return stale;
        };

        // Keep the layout, drop everything the old type contributed
        let mut base = FieldDefinition {
            key: def.key.clone(),
            form_item: def.form_item.clone(),
            col: def.col.clone(),
            schema: def.schema.clone(),
            ..FieldDefinition::default()
        };
        let ctx = RuleContext::new(&def.key, self.form_item_defaults);
        rule.apply(&mut base, def.schema.as_ref(), &ctx);

        if base.type_.is_none() {
            self.diagnostics.untyped_override(&field, declared, rule.name());
            base.set_type(declared);
        }
        base
    }

    /// Base for a keyed override with no generated counterpart
    fn fresh(&mut self, key: &Path, declared: Option<&str>) -> FieldDefinition {
        let field = key.encode();
        self.diagnostics.unmatched_key(&field);

        let mut base = FieldDefinition::new(key.clone());
        let Some(declared) = declared else {
            return base;
        };

        let registry = self.registry;
        match registry.first_rule(declared) {
            Some(rule) => {
                base.form_item = self.form_item_defaults.clone();
                let ctx = RuleContext::new(key, self.form_item_defaults);
                rule.apply(&mut base, None, &ctx);
                if base.type_.is_none() {
                    self.diagnostics.untyped_override(&field, declared, rule.name());
                    base.set_type(declared);
                }
            }
            None => {
                self.diagnostics.unregistered_type(&field, declared, None);
                base.set_type(declared);
            }
        }
        base
    }

    /// Widen the input when a label disappears, narrow it when one appears
    fn correct_span(&mut self, generated: &FieldDefinition, merged: &mut FieldDefinition) {
        let (Some(before), Some(after)) = (generated.label(), merged.label()) else {
            return;
        };
        if before == after {
            return;
        }

        let sign = match (is_empty_label(before), is_empty_label(after)) {
            (true, false) => -1,
            (false, true) => 1,
            _ => return,
        };

        let label_width = nested_i64(&merged.form_item, "labelCol", "span")
            .unwrap_or(0)
            .checked_add(nested_i64(&merged.form_item, "labelCol", "offset").unwrap_or(0));

        let field = merged.path_key();
        let span = merged
            .form_item
            .get_mut("wrapperCol")
            .and_then(Value::as_object_mut)
            .and_then(|wrapper| wrapper.get_mut("span"))
            .filter(|span| span.is_i64());

        let Some(span) = span else {
            self.diagnostics.missing_wrapper_span(field);
            return;
        };

        let adjusted = label_width
            .and_then(|width| width.checked_mul(sign))
            .zip(span.as_i64())
            .and_then(|(delta, current)| current.checked_add(delta));
        match adjusted {
            Some(adjusted) => *span = Value::from(adjusted),
            None => self.diagnostics.span_overflow(field),
        }
    }
}

fn is_empty_label(label: &Value) -> bool {
    label.as_str() == Some("")
}

/// Lay an override over `base`; the override wins field by field
///
/// `type` is settled by the caller before this runs.
fn apply_override(base: &mut FieldDefinition, entry: CanonicalOverride) {
    if let Some(key) = entry.key {
        base.key = key;
    }
    if let Some(col) = entry.col {
        match (&mut base.col, col) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => deep_merge(existing, &incoming),
            (slot, col) => *slot = Some(col),
        }
    }
    deep_merge(&mut base.form_item, &entry.form_item);
    deep_merge(&mut base.input, &entry.input);
    if let Some(decorator) = entry.decorator {
        base.decorator = Some(decorator);
    }
    base.schema = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::schema::SchemaNode;
    use crate::walker::Walker;
    use serde_json::json;

    fn layout() -> Map<String, Value> {
        json!({
            "colon": true,
            "labelCol": { "span": 4, "offset": 0 },
            "wrapperCol": { "span": 20, "offset": 0 }
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn entries(value: Value) -> Vec<OverrideEntry> {
        OverrideEntry::list_from_value(value).unwrap()
    }

    fn keys(fields: &[FieldDefinition]) -> Vec<String> {
        fields.iter().map(FieldDefinition::path_key).collect()
    }

    struct Fixture {
        registry: RuleRegistry,
        defaults: Map<String, Value>,
        schema: SchemaNode,
    }

    impl Fixture {
        fn new(schema: Value) -> Self {
            Self {
                registry: RuleRegistry::with_builtins(),
                defaults: layout(),
                schema: SchemaNode::from_value(schema).unwrap(),
            }
        }

        fn run(&self, overrides: Value) -> (Vec<FieldDefinition>, Vec<FieldDefinition>, Diagnostics) {
            let (tree, mut lookup) = Walker::new(&self.registry, &self.defaults)
                .walk(&self.schema)
                .unwrap();
            let mut merger = Merger::new(&self.registry, &self.defaults);
            let fields = merger.combine(entries(overrides), &tree, &mut lookup).unwrap();
            (tree, fields, merger.into_diagnostics())
        }
    }

    fn abc() -> Fixture {
        Fixture::new(json!({
            "type": "object",
            "properties": {
                "a": { "type": "string", "title": "A" },
                "b": { "type": "string", "title": "B" },
                "c": { "type": "string", "title": "C" }
            }
        }))
    }

    fn stripped(fields: &[FieldDefinition]) -> Vec<FieldDefinition> {
        let mut fields = fields.to_vec();
        strip_schema(&mut fields);
        fields
    }

    fn has_schema(fields: &[FieldDefinition]) -> bool {
        fields
            .iter()
            .any(|f| f.schema.is_some() || f.items.as_deref().map(has_schema).unwrap_or(false))
    }

    #[test]
    fn test_leading_wildcard_returns_defaults() {
        let (tree, fields, diags) = abc().run(json!(["*", "c"]));
        assert_eq!(fields, stripped(&tree));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_output_carries_no_source_schema() {
        let fixture = nested();
        for overrides in [json!(["*"]), json!(["email", "*"]), json!([{ "key": "address", "items": ["*"] }])] {
            let (tree, fields, _) = fixture.run(overrides);
            assert!(has_schema(&tree));
            assert!(!has_schema(&fields));
        }
    }

    #[test]
    fn test_wildcard_reinserts_unmentioned_fields() {
        let (_, fields, _) = abc().run(json!(["b", "*"]));
        assert_eq!(keys(&fields), vec!["b", "a", "c"]);

        let (_, fields, _) = abc().run(json!(["c", "*", "a"]));
        assert_eq!(keys(&fields), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_without_wildcard_only_listed_fields_remain() {
        let (_, fields, _) = abc().run(json!(["c", "a"]));
        assert_eq!(keys(&fields), vec!["c", "a"]);
    }

    #[test]
    fn test_restating_a_default_is_idempotent() {
        let (tree, fields, diags) = abc().run(json!([{ "key": "b", "type": "input" }, "*"]));
        let mut expected = tree[1].clone();
        expected.schema = None;
        assert_eq!(fields[0], expected);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_override_merges_into_form_item_and_input() {
        let (_, fields, _) = abc().run(json!([{
            "key": "a",
            "formItem": { "extra": "x" },
            "placeholder": "type here"
        }]));
        let a = &fields[0];
        assert_eq!(a.field_type(), Some("input"));
        assert_eq!(a.form_item["label"], json!("A"));
        assert_eq!(a.form_item["extra"], json!("x"));
        assert_eq!(a.form_item["colon"], json!(true));
        assert_eq!(a.input["placeholder"], json!("type here"));
        assert!(a.schema.is_none());
    }

    #[test]
    fn test_span_round_trip() {
        let fixture = abc();
        let (_, fields, _) = fixture.run(json!([{ "key": "a", "title": "" }]));
        assert_eq!(fields[0].form_item["wrapperCol"]["span"], json!(24));

        // Feed the unlabeled field back in and restore the label
        let mut lookup = LookupTable::new();
        lookup.insert(fields[0].clone());
        let mut merger = Merger::new(&fixture.registry, &fixture.defaults);
        let restored = merger
            .combine(entries(json!([{ "key": "a", "title": "A" }])), &fields, &mut lookup)
            .unwrap();
        assert_eq!(restored[0].form_item["wrapperCol"]["span"], json!(20));
        assert_eq!(restored[0].form_item["labelCol"]["span"], json!(4));
    }

    #[test]
    fn test_span_correction_without_wrapper_span() {
        let mut fixture = abc();
        fixture.defaults = Map::new();
        let (_, fields, diags) = fixture.run(json!([{ "key": "a", "title": "" }]));
        assert_eq!(fields[0].form_item["label"], json!(""));
        assert_eq!(diags.with_code(DiagnosticCode::MissingWrapperSpan).count(), 1);
    }

    #[test]
    fn test_span_correction_overflow_leaves_span() {
        let mut fixture = abc();
        fixture.defaults = json!({
            "labelCol": { "span": i64::MAX, "offset": 0 },
            "wrapperCol": { "span": i64::MAX }
        })
        .as_object()
        .cloned()
        .unwrap();
        let (_, fields, diags) = fixture.run(json!([{ "key": "a", "title": "" }]));
        assert_eq!(fields[0].form_item["wrapperCol"]["span"], json!(i64::MAX));
        assert_eq!(diags.with_code(DiagnosticCode::MissingWrapperSpan).count(), 1);

        fixture.defaults = json!({
            "labelCol": { "span": i64::MAX, "offset": 1 },
            "wrapperCol": { "span": 0 }
        })
        .as_object()
        .cloned()
        .unwrap();
        let (_, fields, diags) = fixture.run(json!([{ "key": "a", "title": "" }]));
        assert_eq!(fields[0].form_item["wrapperCol"]["span"], json!(0));
        assert_eq!(diags.with_code(DiagnosticCode::MissingWrapperSpan).count(), 1);
    }

    #[test]
    fn test_type_mismatch_reresolves_with_first_rule() {
        let fixture = Fixture::new(json!({
            "properties": {
                "gender": {
                    "type": "string",
                    "title": "Gender",
                    "maxLength": 8,
                    "enum": ["m", "f"],
                    "enumNames": ["Male", "Female"]
                },
                "bio": { "type": "string", "maxLength": 200 }
            }
        }));

        let (tree, fields, diags) = fixture.run(json!([
            { "key": "gender", "type": "input", "placeholder": "free text" },
            { "key": "bio", "type": "textarea", "input": { "rows": 8 } }
        ]));

        assert_eq!(tree[0].field_type(), Some("select"));
        let gender = &fields[0];
        assert_eq!(gender.field_type(), Some("input"));
        assert!(gender.input.get("options").is_none());
        assert_eq!(gender.input["maxLength"], json!(8));
        assert_eq!(gender.input["placeholder"], json!("free text"));
        assert_eq!(gender.form_item["label"], json!("Gender"));
        // Old decorator is dropped with the old type
        assert_eq!(gender.decorator, None);

        let bio = &fields[1];
        assert_eq!(bio.field_type(), Some("textarea"));
        assert_eq!(bio.input["rows"], json!(8));
        assert_eq!(bio.input["maxLength"], json!(200));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_schema_type_override_takes_rule_type() {
        let fixture = Fixture::new(json!({
            "properties": { "age": { "type": "string" } }
        }));
        let (_, fields, _) = fixture.run(json!([{ "key": "age", "type": "number" }]));
        // The first `number` rule is guarded on `enum`, which a plain string lacks
        assert_eq!(fields[0].field_type(), Some("number"));

        let fixture = Fixture::new(json!({
            "properties": { "flag": { "type": "string" } }
        }));
        let (_, fields, diags) = fixture.run(json!([{ "key": "flag", "type": "boolean" }]));
        assert_eq!(fields[0].field_type(), Some("switch"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unregistered_override_type_keeps_stale_config() {
        let fixture = Fixture::new(json!({
            "properties": { "color": { "type": "string", "enum": ["red"] } }
        }));
        let (_, fields, diags) = fixture.run(json!([{ "key": "color", "type": "color-picker" }]));
        assert_eq!(fields[0].field_type(), Some("color-picker"));
        assert!(fields[0].input.contains_key("options"));
        assert_eq!(diags.with_code(DiagnosticCode::UnregisteredType).count(), 1);
    }

    #[test]
    fn test_unmatched_key_is_resolved_from_defaults() {
        let (_, fields, diags) = abc().run(json!([
            "a",
            { "key": "note", "type": "textarea", "title": "Note" },
            { "key": "ghost" }
        ]));
        assert_eq!(keys(&fields), vec!["a", "note", "ghost"]);

        let note = &fields[1];
        assert_eq!(note.field_type(), Some("textarea"));
        assert_eq!(note.input["rows"], json!(4));
        assert_eq!(note.form_item["label"], json!("Note"));
        assert_eq!(note.form_item["wrapperCol"]["span"], json!(20));

        assert_eq!(fields[2].type_, None);
        assert_eq!(diags.with_code(DiagnosticCode::UnmatchedKey).count(), 2);
    }

    #[test]
    fn test_keyless_entry_passes_through() {
        let (_, fields, _) = abc().run(json!([{ "type": "divider", "title": "Section" }, "*"]));
        assert_eq!(fields.len(), 4);
        assert!(fields[0].key.is_empty());
        assert_eq!(fields[0].field_type(), Some("divider"));
        assert_eq!(fields[0].form_item, json!({ "label": "Section" }).as_object().cloned().unwrap());
    }

    #[test]
    fn test_malformed_key_fails() {
        let fixture = abc();
        let (tree, mut lookup) = Walker::new(&fixture.registry, &fixture.defaults)
            .walk(&fixture.schema)
            .unwrap();
        let mut merger = Merger::new(&fixture.registry, &fixture.defaults);
        let result = merger.combine(entries(json!(["a..b"])), &tree, &mut lookup);
        assert!(matches!(result, Err(crate::error::SchemaError::InvalidPath { .. })));
    }

    fn nested() -> Fixture {
        Fixture::new(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "address": {
                    "type": "object",
                    "title": "Address",
                    "properties": {
                        "street": { "type": "string" },
                        "city": { "type": "string" },
                        "zip": { "type": "string" }
                    }
                },
                "email": { "type": "string" }
            }
        }))
    }

    #[test]
    fn test_nested_items_merge_with_matched_children() {
        let (_, fields, _) = nested().run(json!([
            { "key": "address", "items": ["address.zip", "*"] },
            "*"
        ]));
        assert_eq!(keys(&fields), vec!["address", "name", "email"]);
        let children = fields[0].items.as_ref().unwrap();
        assert_eq!(keys(children), vec!["address.zip", "address.street", "address.city"]);
    }

    #[test]
    fn test_root_wildcard_does_not_duplicate_nested_fields() {
        let (tree, fields, _) = nested().run(json!(["email", "*"]));
        assert_eq!(keys(&fields), vec!["email", "name", "address"]);
        assert_eq!(fields[2].items, stripped(&tree)[1].items);
        let total: usize = fields.iter().map(FieldDefinition::count).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_unmatched_container_falls_back_to_top_level_tree() {
        let (tree, fields, _) = nested().run(json!([
            { "key": "extra", "type": "fieldset", "items": ["*"] }
        ]));
        assert_eq!(fields[0].field_type(), Some("fieldset"));
        // Children come from the top-level default tree, not an empty scope
        assert_eq!(fields[0].items, Some(stripped(&tree)));
    }

    #[test]
    fn test_unmatched_container_wildcard_places_top_level_leftovers() {
        let (_, fields, _) = nested().run(json!([
            { "key": "extra", "type": "fieldset", "items": ["name", "*"] }
        ]));
        assert_eq!(keys(&fields), vec!["extra"]);
        let children = fields[0].items.as_deref().unwrap();
        assert_eq!(keys(children), vec!["name", "address", "email"]);
        let address = children[1].items.as_deref().unwrap();
        assert_eq!(keys(address), vec!["address.street", "address.city", "address.zip"]);
    }

    #[test]
    fn test_consumed_child_is_not_repeated_in_parent() {
        let (_, fields, _) = nested().run(json!(["address.city", "*"]));
        assert_eq!(keys(&fields), vec!["address.city", "name", "address", "email"]);
        let address = fields[2].items.as_deref().unwrap();
        assert_eq!(keys(address), vec!["address.street", "address.zip"]);
        let total: usize = fields.iter().map(FieldDefinition::count).sum();
        assert_eq!(total, 6);
    }
}
