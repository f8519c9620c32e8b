//! Schema: attribute types and per-resource validation
//!
//! Providers define schemas for each resource type and for their own
//! configuration, enabling validation before any API call is made.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Unordered collection; duplicates collapse
    Set(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested configuration block: a list of maps following their own schema.
    /// A bare map is accepted as a single block.
    Block {
        attributes: Vec<AttributeSchema>,
        max_items: Option<usize>,
    },
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block { attributes, max_items }, value) => {
                let blocks = blocks_of(value).ok_or_else(|| TypeError::TypeMismatch {
                    expected: self.type_name(),
                    got: value.type_name(),
                })?;
                if let Some(max) = max_items
                    && blocks.len() > *max
                {
                    return Err(TypeError::TooManyBlocks {
                        max: *max,
                        got: blocks.len(),
                    });
                }
                let nested: HashMap<String, AttributeSchema> = attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.clone()))
                    .collect();
                for (i, block) in blocks.into_iter().enumerate() {
                    if let Err(mut errors) = validate_attributes(&nested, &[], block) {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(errors.remove(0)),
                        });
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    /// Compare two values under this type. Sets compare without regard to
    /// order or duplicates; everything else compares structurally.
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (self, a, b) {
            (AttributeType::Set(_), Value::List(x), Value::List(y)) => {
                x.iter().all(|v| y.contains(v)) && y.iter().all(|v| x.contains(v))
            }
            _ => a == b,
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block { .. } => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// View a block-typed value as its list of maps
pub fn blocks_of(value: &Value) -> Option<Vec<&HashMap<String, Value>>> {
    match value {
        Value::Map(map) => Some(vec![map]),
        Value::List(items) => items.iter().map(Value::as_map).collect(),
        _ => None,
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("'{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("Exactly one of {} must be set", names.join(", "))]
    ExactlyOneOf { names: Vec<String> },

    #[error("At most {max} block(s) allowed, got {got}")]
    TooManyBlocks { max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the provider, never by the operator
    pub computed: bool,
    /// Changing this attribute replaces the resource
    pub force_new: bool,
    /// Never shown in plan output
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub deprecated: Option<String>,
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: None,
            deprecated: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Groups of attributes of which exactly one must be set
    pub exactly_one_of: Vec<Vec<String>>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            exactly_one_of: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Attributes sorted by name, for stable display
    pub fn sorted_attributes(&self) -> Vec<&AttributeSchema> {
        let mut attrs: Vec<_> = self.attributes.values().collect();
        attrs.sort_by(|a, b| a.name.cmp(&b.name));
        attrs
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        validate_attributes(&self.attributes, &self.exactly_one_of, attributes)
    }

    /// Copy of `attributes` with schema defaults filled in for unset attributes
    pub fn with_defaults(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut out = attributes.clone();
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default {
                out.entry(name.clone()).or_insert_with(|| default.clone());
            }
        }
        out
    }

    /// Names of changed attributes that force replacement
    pub fn force_new_changes<'a>(&self, changed: &'a [String]) -> Vec<&'a String> {
        changed
            .iter()
            .filter(|name| self.attributes.get(*name).is_some_and(|a| a.force_new))
            .collect()
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    exactly_one_of: &[Vec<String>],
    attributes: &HashMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();
    let mut conflicts = BTreeSet::new();

    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    for (name, value) in attributes {
        let Some(schema) = schemas.get(name) else {
            errors.push(TypeError::UnknownAttribute { name: name.clone() });
            continue;
        };

        if schema.computed {
            errors.push(TypeError::ComputedAttribute { name: name.clone() });
            continue;
        }

        if let Err(e) = schema.attr_type.validate(value) {
            errors.push(TypeError::AttributeError {
                name: name.clone(),
                inner: Box::new(e),
            });
        }

        if let Some(message) = &schema.deprecated {
            log::warn!("Argument '{}' is deprecated: {}", name, message);
        }

        for other in &schema.conflicts_with {
            if attributes.contains_key(other) {
                let pair = if name < other {
                    (name.clone(), other.clone())
                } else {
                    (other.clone(), name.clone())
                };
                conflicts.insert(pair);
            }
        }
    }

    for (name, other) in conflicts {
        errors.push(TypeError::Conflict { name, other });
    }

    for group in exactly_one_of {
        let set = group.iter().filter(|n| attributes.contains_key(*n)).count();
        if set != 1 {
            errors.push(TypeError::ExactlyOneOf {
                names: group.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// String that must not be empty
    pub fn non_empty_string() -> AttributeType {
        AttributeType::Custom {
            name: "NonEmptyString".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if !s.is_empty() => Ok(()),
                _ => Err("Value must not be empty".to_string()),
            },
        }
    }

    /// String that must be valid JSON
    pub fn json_string() -> AttributeType {
        AttributeType::Custom {
            name: "Json".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
                    .map(|_| ())
                    .map_err(|e| format!("invalid JSON: {}", e)),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    pub fn string_set() -> AttributeType {
        AttributeType::Set(Box::new(AttributeType::String))
    }

    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    pub fn string_map() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }
}
