//! Turns flat JSON objects into [`Resource`] instances, recursing into expanded objects.
//!
//! Keys are handled one at a time against the resource's [`Descriptor`]: embedded keys are
//! mapped with the embedded type's descriptor, plain attributes are copied verbatim and
//! everything else is dropped, so new fields on the API side never break decoding.

use crate::error::{Error, Result};
use crate::pagination::{Page, Pagination};
use crate::resources::{Descriptor, ID};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Value(Value),
    One(Box<Resource>),
    Many(Vec<Resource>),
}

impl AttributeValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            AttributeValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            AttributeValue::One(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_resources(&self) -> Option<&[Resource]> {
        match self {
            AttributeValue::Many(r) => Some(r),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::Value(v) => v.clone(),
            AttributeValue::One(r) => r.to_json(),
            AttributeValue::Many(rs) => Value::Array(rs.iter().map(Resource::to_json).collect()),
        }
    }
}

/// An instance of some resource type. Only attributes its descriptor recognizes can be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    descriptor: &'static Descriptor,
    attributes: BTreeMap<String, AttributeValue>,
    upload: Option<PathBuf>,
    deleted: bool,
}

impl Resource {
    pub fn new(descriptor: &'static Descriptor) -> Self {
        Self {
            descriptor,
            attributes: BTreeMap::new(),
            upload: None,
            deleted: false,
        }
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(AttributeValue::as_value)
    }

    pub fn embedded_one(&self, name: &str) -> Option<&Resource> {
        self.get(name).and_then(AttributeValue::as_resource)
    }

    pub fn embedded_many(&self, name: &str) -> Option<&[Resource]> {
        self.get(name).and_then(AttributeValue::as_resources)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn id(&self) -> Option<&Value> {
        self.value(ID).filter(|v| !v.is_null())
    }

    /// The id as it appears in an item path (`placements/{id}`).
    pub fn id_segment(&self) -> Option<String> {
        match self.id()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Set a plain attribute. Expanded objects are read-only; send their `*_id(s)` instead.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_live()?;
        if !self.descriptor.is_attribute(name) {
            return Err(Error::InvalidAttribute {
                resource: self.descriptor.name,
                attribute: name.to_string(),
            });
        }
        self.attributes
            .insert(name.to_string(), AttributeValue::Value(value.into()));
        Ok(())
    }

    /// Attach a file to send as the `file` part on the next save.
    pub fn set_upload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_live()?;
        if !self.descriptor.accepts_upload {
            return Err(Error::Unsupported {
                resource: self.descriptor.name,
                operation: "file uploads",
            });
        }
        self.upload = Some(path.as_ref().to_path_buf());
        Ok(())
    }

    pub fn upload(&self) -> Option<&Path> {
        self.upload.as_deref()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Body for a full save: every plain attribute currently set, never the expansions.
    pub fn save_body(&self) -> Map<String, Value> {
        let mut body: Map<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Some((k.clone(), v.as_value()?.clone())))
            .collect();
        if let Some(path) = &self.upload {
            body.insert(
                "file".to_string(),
                Value::String(path.to_string_lossy().into_owned()),
            );
        }
        body
    }

    /// Re-apply a fresh representation. Matched keys are overwritten; absent ones are left alone.
    pub fn update_from(&mut self, json: Value) -> Result<()> {
        self.ensure_live()?;
        let object = match json {
            Value::Object(object) => object,
            other => return Err(not_an_object(self.descriptor, &other)),
        };
        for (key, value) in object {
            if let Some(embedded) = self.descriptor.embedded(key.as_str()) {
                let mapped = map_embedded(embedded, value)?;
                self.attributes.insert(key, mapped);
            } else if self.descriptor.is_attribute(&key) {
                self.attributes.insert(key, AttributeValue::Value(value));
            }
        }
        Ok(())
    }

    /// Writes to a deleted instance are refused.
    fn ensure_live(&self) -> Result<()> {
        if self.deleted {
            return Err(Error::Deleted {
                resource: self.descriptor.name,
                id: self.id_segment().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Drop everything but the id and flag the instance as deleted.
    pub(crate) fn mark_deleted(&mut self) {
        self.attributes.retain(|k, _| k == ID);
        self.upload = None;
        self.deleted = true;
    }
}

fn not_an_object(descriptor: &Descriptor, json: &Value) -> Error {
    Error::UnexpectedShape(format!(
        "expected a JSON object for {}, got {}",
        descriptor.name,
        json_type(json)
    ))
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn map_embedded(descriptor: &'static Descriptor, value: Value) -> Result<AttributeValue> {
    match value {
        Value::Null => Ok(AttributeValue::Value(Value::Null)),
        list @ Value::Array(_) => Ok(AttributeValue::Many(map_many(descriptor, list)?)),
        object @ Value::Object(_) => Ok(AttributeValue::One(Box::new(map_one(
            descriptor, object,
        )?))),
        other => Err(not_an_object(descriptor, &other)),
    }
}

pub fn map_one(descriptor: &'static Descriptor, json: Value) -> Result<Resource> {
    let mut resource = Resource::new(descriptor);
    resource.update_from(json)?;
    Ok(resource)
}

pub fn map_many(descriptor: &'static Descriptor, json: Value) -> Result<Vec<Resource>> {
    let items = match json {
        Value::Array(items) => items,
        other => {
            return Err(Error::UnexpectedShape(format!(
                "expected a JSON array of {}, got {}",
                descriptor.path,
                json_type(&other)
            )))
        }
    };
    items
        .into_iter()
        .map(|item| map_one(descriptor, item))
        .collect()
}

/// Decode `{ data: [...], pagination: {...} }`.
pub fn map_page(descriptor: &'static Descriptor, json: Value) -> Result<Page> {
    let mut envelope = match json {
        Value::Object(envelope) => envelope,
        other => {
            return Err(Error::UnexpectedShape(format!(
                "expected a paginated {} list, got {}",
                descriptor.path,
                json_type(&other)
            )))
        }
    };
    let data = envelope
        .remove("data")
        .ok_or_else(|| Error::UnexpectedShape("list response without `data`".into()))?;
    let pagination = envelope
        .remove("pagination")
        .ok_or_else(|| Error::UnexpectedShape("list response without `pagination`".into()))?;
    let pagination: Pagination = serde_json::from_value(pagination)
        .map_err(|e| Error::UnexpectedShape(format!("bad pagination block: {}", e)))?;
    let items = map_many(descriptor, data)?;
    Ok(Page::new(items, pagination))
}
