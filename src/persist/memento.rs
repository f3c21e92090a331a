use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RestoreError;

/// Leaf value of a [`Memento`] attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

/// A nested key-value document: a type name, leaf attributes and an ordered
/// list of child documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Memento {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Memento>,
}

impl Memento {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key) {
            Some(Value::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attributes.get(key) {
            Some(Value::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    fn missing_or_invalid(&self, key: &'static str) -> RestoreError {
        if self.attributes.contains_key(key) {
            RestoreError::InvalidValue {
                element: self.kind.clone(),
                key,
            }
        } else {
            RestoreError::MissingKey {
                element: self.kind.clone(),
                key,
            }
        }
    }

    pub fn require_str(&self, key: &'static str) -> Result<&str, RestoreError> {
        self.get_str(key).ok_or_else(|| self.missing_or_invalid(key))
    }

    pub fn require_int(&self, key: &'static str) -> Result<i64, RestoreError> {
        self.get_int(key).ok_or_else(|| self.missing_or_invalid(key))
    }

    /// An integer attribute that must fit the target type.
    pub fn require_num<T: TryFrom<i64>>(&self, key: &'static str) -> Result<T, RestoreError> {
        let value = self.require_int(key)?;
        T::try_from(value).map_err(|_| RestoreError::InvalidValue {
            element: self.kind.clone(),
            key,
        })
    }

    pub fn add_child(&mut self, child: Memento) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn create_child(&mut self, kind: impl Into<String>) -> &mut Memento {
        self.children.push(Memento::new(kind));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn children(&self) -> &[Memento] {
        &self.children
    }

    pub fn children_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Memento> + 'a {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    pub fn child(&self, kind: &str) -> Option<&Memento> {
        self.children.iter().find(|child| child.kind == kind)
    }

    pub fn require_child(&self, kind: &'static str) -> Result<&Memento, RestoreError> {
        self.child(kind).ok_or_else(|| RestoreError::MissingChild {
            element: self.kind.clone(),
            child: kind,
        })
    }
}
