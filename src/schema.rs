//! Schema types and structures

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

/// The `type` keyword: a single tag or a JSON Schema union
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTag {
    One(String),
    Many(Vec<String>),
}

impl TypeTag {
    /// The tag used for rule dispatch: the first tag that is not `"null"`
    pub fn primary(&self) -> Option<&str> {
        match self {
            TypeTag::One(tag) => Some(tag.as_str()),
            TypeTag::Many(tags) => tags
                .iter()
                .map(String::as_str)
                .find(|tag| *tag != "null")
                .or_else(|| tags.first().map(String::as_str)),
        }
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        TypeTag::One(tag.to_string())
    }
}

/// Array children: positional (tuple) or one schema for every element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaItems {
    Tuple(Vec<SchemaNode>),
    Single(Box<SchemaNode>),
}

impl SchemaItems {
    /// Children in position order; a single item schema sits at index 0
    pub fn iter(&self) -> Box<dyn Iterator<Item = (usize, &SchemaNode)> + '_> {
        match self {
            SchemaItems::Tuple(nodes) => Box::new(nodes.iter().enumerate()),
            SchemaItems::Single(node) => Box::new(std::iter::once((0, node.as_ref()))),
        }
    }

    /// The schema describing element values (first position for tuples)
    pub fn first(&self) -> Option<&SchemaNode> {
        match self {
            SchemaItems::Tuple(nodes) => nodes.first(),
            SchemaItems::Single(node) => Some(node.as_ref()),
        }
    }
}

/// One node of the input schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeTag>,

    /// Object children, in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,

    /// Array children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaItems>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Every other keyword (`enum`, `format`, `default`, `minimum`, ...)
    #[serde(flatten)]
    pub keywords: Map<String, Value>,
}

impl SchemaNode {
    /// Parse a schema from JSON text
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Convert an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Tag used to pick a rule chain
    pub fn primary_type(&self) -> Option<&str> {
        self.type_.as_ref().and_then(TypeTag::primary)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn has_children(&self) -> bool {
        self.properties.is_some() || self.items.is_some()
    }

    /// A root must describe an object or an array of fields
    pub fn ensure_root(&self) -> Result<()> {
        if self.has_children() {
            Ok(())
        } else {
            Err(SchemaError::InvalidSchema(
                "schema has neither `properties` nor `items`".to_string(),
            ))
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }

    pub fn format(&self) -> Option<&str> {
        self.keyword("format").and_then(Value::as_str)
    }

    pub fn enum_values(&self) -> Option<&Vec<Value>> {
        self.keyword("enum").and_then(Value::as_array)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.keyword("default")
    }
}
