//! Decoder and writer settings.

use crate::model::CimName;

/// Limits applied while decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Most `KEYBINDING` elements accepted in one `INSTANCENAME`.
    pub max_keybindings: usize,
    /// Most levels of embedded objects inside embedded objects.
    pub max_embedded_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_keybindings: 1000,
            max_embedded_depth: 32,
        }
    }
}

impl DecodeOptions {
    /// Set the keybinding limit.
    #[must_use]
    pub fn with_max_keybindings(mut self, max: usize) -> Self {
        self.max_keybindings = max;
        self
    }

    /// Set the embedded object depth limit.
    #[must_use]
    pub fn with_max_embedded_depth(mut self, max: usize) -> Self {
        self.max_embedded_depth = max;
        self
    }
}

/// What to include when encoding classes and instances, and when building
/// instances from classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Emit qualifiers.
    pub include_qualifiers: bool,
    /// Emit `CLASSORIGIN` attributes.
    pub include_class_origin: bool,
    /// Restrict properties to these names. `None` keeps all.
    pub property_list: Option<Vec<CimName>>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            include_qualifiers: true,
            include_class_origin: true,
            property_list: None,
        }
    }
}

impl WriteOptions {
    /// Set whether qualifiers are included.
    #[must_use]
    pub fn with_qualifiers(mut self, include: bool) -> Self {
        self.include_qualifiers = include;
        self
    }

    /// Set whether class origins are included.
    #[must_use]
    pub fn with_class_origin(mut self, include: bool) -> Self {
        self.include_class_origin = include;
        self
    }

    /// Restrict the properties written.
    #[must_use]
    pub fn with_property_list(mut self, names: Vec<CimName>) -> Self {
        self.property_list = Some(names);
        self
    }

    /// Check whether a property passes the property list.
    #[must_use]
    pub fn includes_property(&self, name: &CimName) -> bool {
        self.property_list
            .as_ref()
            .map_or(true, |names| names.contains(name))
    }
}
