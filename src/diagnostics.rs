//! Diagnostics
//!
//! Collects the non-fatal issues found while generating and merging field
//! definitions. Generation never fails on these; they are reported so a
//! caller can surface them next to the form.

use serde::Serialize;
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Schema node type has no rule chain; the field is emitted without a type
    UnresolvedType,
    /// Override declares a type with no rule chain; stale config is kept
    UnregisteredType,
    /// The first rule for an override type did not set a type
    UntypedOverride,
    /// Label changed but `wrapperCol.span` could not be corrected
    MissingWrapperSpan,
    /// Override key does not address any generated field
    UnmatchedKey,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedType => "W001",
            Self::UnregisteredType => "W002",
            Self::UntypedOverride => "W003",
            Self::MissingWrapperSpan => "W004",
            Self::UnmatchedKey => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedType
            | Self::UnregisteredType
            | Self::UntypedOverride
            | Self::MissingWrapperSpan => Severity::Warning,

            Self::UnmatchedKey => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticItem {
    /// Encoded path of the field concerned (empty for keyless entries)
    pub field: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(field: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "<keyless>" } else { self.field.as_str() };
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            field
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from one parse
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Schema node whose type has no rule chain
    pub fn unresolved_type(&mut self, field: impl Into<String>, type_tag: Option<&str>) {
        let message = match type_tag {
            Some(tag) => format!("no rule registered for schema type '{}'", tag),
            None => "schema node declares no type".to_string(),
        };
        self.push(DiagnosticItem::new(field, DiagnosticCode::UnresolvedType, message));
    }

    /// Override type with no rule chain
    pub fn unregistered_type(&mut self, field: impl Into<String>, declared: &str, previous: Option<&str>) {
        let mut item = DiagnosticItem::new(
            field,
            DiagnosticCode::UnregisteredType,
            format!("override type '{}' has no registered rule", declared),
        );
        if let Some(previous) = previous {
            item = item.with_context(format!("config generated for '{}' is kept", previous));
        }
        self.push(item);
    }

    /// First-priority rule left the type unset
    pub fn untyped_override(&mut self, field: impl Into<String>, declared: &str, rule: &str) {
        self.push(
            DiagnosticItem::new(
                field,
                DiagnosticCode::UntypedOverride,
                format!("rule '{}' did not resolve override type '{}'", rule, declared),
            )
            .with_context("declared type is kept"),
        );
    }

    /// Label added or removed without a wrapper span to adjust
    pub fn missing_wrapper_span(&mut self, field: impl Into<String>) {
        self.push(DiagnosticItem::new(
            field,
            DiagnosticCode::MissingWrapperSpan,
            "label changed but formItem.wrapperCol.span is not set",
        ));
    }

    /// Label width or corrected span does not fit in an integer
    pub fn span_overflow(&mut self, field: impl Into<String>) {
        self.push(
            DiagnosticItem::new(
                field,
                DiagnosticCode::MissingWrapperSpan,
                "formItem.wrapperCol.span correction overflows",
            )
            .with_context("span is left unchanged"),
        );
    }

    /// Override key with no generated counterpart
    pub fn unmatched_key(&mut self, field: impl Into<String>) {
        self.push(DiagnosticItem::new(
            field,
            DiagnosticCode::UnmatchedKey,
            "key does not match any generated field",
        ));
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items carrying `code`
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!(
                "\n{} warning(s), {} note(s)\n",
                self.warning_count(),
                self.items.len() - self.warning_count()
            ));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
