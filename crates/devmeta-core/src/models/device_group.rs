//! Device group models

use serde::{Deserialize, Serialize};

use super::criteria::DeviceGroupFilterCriteria;
use super::device_type::Interaction;

/// Id prefix of device groups
pub const DEVICE_GROUP_PREFIX: &str = "urn:infai:ses:device-group:";

/// Services of one device chosen for a criteria row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    /// Selected device (may be a composite id)
    pub device_id: String,
    /// Services of that device used for the row
    #[serde(default)]
    pub service_ids: Vec<String>,
}

/// A criteria row of a manually authored group and the devices serving it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroupMapping {
    /// Criteria row
    pub criteria: DeviceGroupFilterCriteria,
    /// Devices and services selected for the row
    #[serde(default)]
    pub selection: Vec<DeviceSelection>,
}

/// A set of devices addressed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Member devices
    #[serde(default)]
    pub device_ids: Vec<String>,
    /// Criteria every member satisfies
    #[serde(default)]
    pub criteria: Vec<DeviceGroupFilterCriteria>,
    /// Interaction members must not be used with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_interaction: Option<Interaction>,
    /// Manual device/service selection per criteria row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceGroupMapping>,
    /// Set iff the group was generated for a single device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generated_by_device: Option<String>,
}

impl DeviceGroup {
    /// Whether this group was generated for a single device
    pub fn is_generated(&self) -> bool {
        self.auto_generated_by_device
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }
}

/// Id of the group generated for a device.
///
/// ```
/// # use devmeta_core::generated_device_group_id;
/// assert_eq!(
///     generated_device_group_id("urn:infai:ses:device:4711"),
///     "urn:infai:ses:device-group:4711"
/// );
/// assert_eq!(generated_device_group_id("plain"), "urn:infai:ses:device-group:plain");
/// ```
pub fn generated_device_group_id(device_id: &str) -> String {
    let suffix = device_id
        .strip_prefix(super::device::DEVICE_PREFIX)
        .unwrap_or(device_id);
    format!("{}{}", DEVICE_GROUP_PREFIX, suffix)
}
