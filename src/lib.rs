//! Familiar Forms
//!
//! Turns a JSON-Schema-like description of data into an ordered tree of form
//! field definitions, then lets a hand-authored definition list override,
//! reorder, and extend that tree by field path.
//!
//! ## Features
//!
//! - **Rule Dispatch**: each schema type maps to an ordered chain of rules; the
//!   first rule that picks a widget type wins
//! - **Path Addressing**: one canonical codec between `["a", 0, "b"]` and `a[0].b`
//! - **Overrides**: deep merge by path, `"*"` to place unmentioned fields,
//!   legacy flat entries, type re-resolution and label span bookkeeping
//! - **Diagnostics**: unresolvable types and stray keys are reported, never fatal
//!
//! ## Pipeline
//!
//! ```text
//! schema ──▶ Walker ──▶ (default tree, lookup) ──▶ Merger ──▶ fields
//!                                                   ▲
//!                               override list ──────┘
//! ```

pub mod config;
pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod legacy;
pub mod merge;
pub mod path;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod value;
pub mod walker;

pub use config::FormConfig;
pub use definition::{FieldDefinition, LookupTable, OverrideEntry, WILDCARD};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use error::{Result, SchemaError};
pub use generator::{FieldValidator, Generator, ParseReport, ValidationRule};
pub use legacy::{normalize_legacy, CanonicalOverride};
pub use merge::Merger;
pub use path::{decode, encode, normalize_shorthand, Path, PathSegment};
pub use registry::RuleRegistry;
pub use rules::{Rule, RuleContext};
pub use schema::SchemaNode;
pub use walker::Walker;
