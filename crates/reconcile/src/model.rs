//! Resource models

use crate::attr::Attr;
use crate::descriptor::ResourceDescriptor;
use crate::error::{Error, Result};
use crate::value::{Value, decode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a single resource instance.
///
/// The model does not own its descriptor; operations take the descriptor
/// alongside the model so models stay plain data that serializes into the
/// caller's state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: BTreeMap<String, Attr<Value>>,
}

impl ResourceModel {
    /// A model with every attribute at its schema default: `Unknown` for
    /// computed attributes, `Null` for the rest.
    pub fn empty(desc: &ResourceDescriptor) -> Self {
        let attributes = desc
            .attributes
            .iter()
            .map(|a| {
                let value = if a.mode.is_computed() {
                    Attr::Unknown
                } else {
                    Attr::Null
                };
                (a.name.to_string(), value)
            })
            .collect();
        Self {
            resource_type: desc.type_name.to_string(),
            attributes,
        }
    }

    /// A model with every attribute `Null`, used to seed imports
    pub fn blank(desc: &ResourceDescriptor) -> Self {
        Self {
            resource_type: desc.type_name.to_string(),
            attributes: desc
                .attributes
                .iter()
                .map(|a| (a.name.to_string(), Attr::Null))
                .collect(),
        }
    }

    /// Build a desired model from declared configuration.
    ///
    /// Declared values are decoded against the descriptor; undeclared
    /// attributes keep their schema default. Declaring a computed-only or
    /// undeclared attribute is an error, as is omitting a required one.
    pub fn from_declared(
        desc: &ResourceDescriptor,
        declared: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let mut model = Self::empty(desc);
        for (name, raw) in declared {
            let attr = desc
                .attribute(name)
                .filter(|a| a.mode.is_settable())
                .ok_or_else(|| Error::UnknownAttribute {
                    resource: desc.type_name.to_string(),
                    name: name.clone(),
                })?;
            let value = decode(name, attr.kind, raw)?;
            model.attributes.insert(name.clone(), value);
        }
        for attr in desc.attributes {
            if attr.mode == crate::descriptor::Mode::Required && !declared.contains_key(attr.name)
            {
                return Err(Error::MissingAttribute {
                    resource: desc.type_name.to_string(),
                    name: attr.name.to_string(),
                });
            }
        }
        Ok(model)
    }

    pub fn get(&self, name: &str) -> &Attr<Value> {
        static NULL: Attr<Value> = Attr::Null;
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn set(&mut self, name: &str, value: Attr<Value>) {
        self.attributes.insert(name.to_string(), value);
    }

    /// Known string value of an attribute
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).known().and_then(Value::as_str)
    }

    pub fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, Attr::Known(Value::String(value.into())));
    }

    /// Known, non-empty string value of an attribute
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.get_str(name).filter(|s| !s.is_empty())
    }

    /// The composite identifier, if known
    pub fn id<'a>(&'a self, desc: &ResourceDescriptor) -> Option<&'a str> {
        self.non_empty_str(desc.id_attr)
    }

    /// Whether the model denotes a resource that was not found
    pub fn is_gone(&self, desc: &ResourceDescriptor) -> bool {
        self.get(desc.id_attr).is_null()
    }

    /// Replace every remaining `Unknown` with `Null`.
    ///
    /// Applied after the remote has answered: whatever it did not report
    /// is absent. Returns the names that were settled.
    pub fn settle_unknowns(&mut self) -> Vec<String> {
        let mut settled = Vec::new();
        for (name, value) in &mut self.attributes {
            if value.is_unknown() {
                *value = Attr::Null;
                settled.push(name.clone());
            }
        }
        settled
    }

    /// Structural identity of every attribute, treating `Unknown` as
    /// identical to `Unknown`.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.resource_type == other.resource_type
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(k, v)| other.attributes.get(k).is_some_and(|o| v.is_identical(o)))
    }
}
