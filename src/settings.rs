//! Host-style source settings
//!
//! A JSON object of user values layered over a JSON object of defaults,
//! matching how the host application stores per-source data.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Result, SettingsError};

/// Key/value settings with a defaults layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse user values from a JSON object
    pub fn from_json(json: &str) -> std::result::Result<Self, SettingsError> {
        match serde_json::from_str(json)? {
            Value::Object(values) => Ok(Self {
                values,
                defaults: Map::new(),
            }),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    /// Serialize user values (defaults are not persisted)
    pub fn to_json(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }

    /// Load user values from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&contents)?)
    }

    /// Write user values to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json())?;
        Ok(())
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.lookup(key).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.lookup(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Read a string list.
    ///
    /// Items are either plain strings or editable-list objects carrying the
    /// entry under `"value"`. Anything else is skipped.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        let Some(Value::Array(items)) = self.lookup(key) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("value").and_then(Value::as_str).map(str::to_owned),
                _ => None,
            })
            .collect()
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_owned(), Value::from(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_owned(), Value::from(value));
    }

    pub fn set_string_list<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = items.into_iter().map(|s| Value::String(s.into())).collect();
        self.values.insert(key.to_owned(), Value::Array(list));
    }

    pub fn set_default_int(&mut self, key: &str, value: i64) {
        self.defaults.insert(key.to_owned(), Value::from(value));
    }

    pub fn set_default_bool(&mut self, key: &str, value: bool) {
        self.defaults.insert(key.to_owned(), Value::from(value));
    }

    /// Whether the user set `key` (ignores defaults)
    pub fn has_user_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Drop a user value so the default shows through again
    pub fn erase(&mut self, key: &str) {
        self.values.remove(key);
    }
}
