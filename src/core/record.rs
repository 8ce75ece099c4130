// Flat free-form entity records with identifier lookup and shallow merge.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accepts only JSON objects; everything else is a usage error because
    /// records are defined as flat key/value field sets.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("record must be a JSON object, got {}", type_name(&other)))
                .with_hint("Pass an object like {\"authorId\":\"a1\",\"name\":\"...\"}.")),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Returns the identifier under `field` when present and a string.
    pub fn id(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Key-presence check for the identifier field. The only schema
    /// validation records get; remaining fields stay free-form.
    pub fn require_id(&self, field: &str) -> Result<&str, Error> {
        match self.0.get(field) {
            Some(Value::String(id)) => Ok(id),
            Some(_) => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("field {field} must be a string"))),
            None => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("record is missing required field {field}"))),
        }
    }

    /// Shallow merge: keys in `partial` overwrite, all other keys are
    /// untouched. Absent keys are never cleared.
    pub fn merge(&mut self, partial: Record) {
        for (field, value) in partial.0 {
            self.0.insert(field, value);
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
