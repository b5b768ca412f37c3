//! Device models

use serde::{Deserialize, Serialize};

/// Attribute holding the user-chosen display name of a device
pub const DISPLAY_NAME_ATTRIBUTE: &str = "shared/nickname";

/// Id prefix of devices
pub const DEVICE_PREFIX: &str = "urn:infai:ses:device:";

/// Key/value attribute of a device or device type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: String,
    /// Who set the attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Attribute {
    /// Create an attribute without origin
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            origin: None,
        }
    }
}

/// A physical device, an instance of a device type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier (may be a composite id for narrowed variants)
    pub id: String,
    /// Identifier used on the device side
    #[serde(default)]
    pub local_id: String,
    /// Name given at registration
    pub name: String,
    /// Free-form attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Device type (may be a composite id)
    pub device_type_id: String,
}

impl Device {
    /// Create a device
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        device_type_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            local_id: id.clone(),
            id,
            name: name.into(),
            attributes: Vec::new(),
            device_type_id: device_type_id.into(),
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up an attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Nickname if set, otherwise the registered name
    pub fn display_name(&self) -> &str {
        self.attribute(DISPLAY_NAME_ATTRIBUTE)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        let device = Device::new("d1", "Plug 0815", "dt1");
        assert_eq!(device.display_name(), "Plug 0815");

        let device = device.with_attribute(Attribute::new(DISPLAY_NAME_ATTRIBUTE, "Kitchen"));
        assert_eq!(device.display_name(), "Kitchen");
    }
}
