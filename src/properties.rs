//! Property panel model
//!
//! Declarative description of the editors the host shows for a source.
//! Each property carries a visibility flag and an optional modified-callback
//! the host runs when the user edits that property.

use std::fmt;

use crate::settings::Settings;

/// Runs when a property is edited. Returns `true` when the panel must be
/// refreshed.
pub type ModifiedCallback = fn(&mut Properties, &Settings) -> bool;

/// Editor kind
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Int { min: i64, max: i64, step: i64 },
    Bool,
    StringList,
}

/// A single editor in the property panel
#[derive(Clone)]
pub struct Property {
    name: String,
    description: String,
    kind: PropertyKind,
    visible: bool,
    modified: Option<ModifiedCallback>,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("visible", &self.visible)
            .field("has_modified_callback", &self.modified.is_some())
            .finish()
    }
}

impl Property {
    fn new(name: &str, description: &str, kind: PropertyKind) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            kind,
            visible: true,
            modified: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_modified_callback(&mut self, callback: ModifiedCallback) {
        self.modified = Some(callback);
    }
}

/// Ordered collection of properties
#[derive(Debug, Clone, Default)]
pub struct Properties {
    props: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_int(&mut self, name: &str, description: &str, min: i64, max: i64, step: i64) -> &mut Property {
        self.add(Property::new(name, description, PropertyKind::Int { min, max, step }))
    }

    pub fn add_bool(&mut self, name: &str, description: &str) -> &mut Property {
        self.add(Property::new(name, description, PropertyKind::Bool))
    }

    pub fn add_string_list(&mut self, name: &str, description: &str) -> &mut Property {
        self.add(Property::new(name, description, PropertyKind::StringList))
    }

    /// Names are unique; adding an existing name returns the existing entry
    fn add(&mut self, property: Property) -> &mut Property {
        let index = match self.props.iter().position(|p| p.name == property.name) {
            Some(index) => {
                tracing::warn!(name = %property.name, "property already exists");
                index
            }
            None => {
                self.props.push(property);
                self.props.len() - 1
            }
        };
        &mut self.props[index]
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.props.iter_mut().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.props.iter()
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Run the modified-callback of `name`, if it has one.
    ///
    /// Returns whether the panel needs a refresh.
    pub fn property_modified(&mut self, name: &str, settings: &Settings) -> bool {
        match self.get(name).and_then(|p| p.modified) {
            Some(callback) => callback(self, settings),
            None => false,
        }
    }
}
