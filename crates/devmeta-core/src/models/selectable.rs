//! Criteria matching results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aspect::AspectNode;
use super::device_type::{Interaction, Service};

/// Another annotated input a caller may set alongside a controlling function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configurable {
    /// Path of the input within the request payload
    pub path: String,
    /// Characteristic of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristic_id: Option<String>,
    /// Aspect of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_node: Option<AspectNode>,
    /// Function of the input
    pub function_id: String,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Value type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<super::content::VariableType>,
}

/// One concrete payload location satisfying a criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePathOption {
    /// Service the path belongs to
    pub service_id: String,
    /// Location of the matched variable within the payload
    pub path: String,
    /// Characteristic of the matched variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristic_id: Option<String>,
    /// Closure snapshot of the matched variable's aspect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_node: Option<AspectNode>,
    /// Matched function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_id: Option<String>,
    /// Interaction of the service
    pub interaction: Interaction,
    /// Whether the matched function is a controlling function
    pub is_controlling_function: bool,
    /// Whether the matched variable carries no payload
    pub is_void: bool,
    /// Other inputs that may be set alongside
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurables: Vec<Configurable>,
}

/// Result of matching criteria against one device type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTypeSelectable {
    /// Device type id (composite for narrowed variants)
    pub device_type_id: String,
    /// Selected services, in device type order
    pub services: Vec<Service>,
    /// Matched payload locations per service id
    #[serde(default)]
    pub service_path_options: BTreeMap<String, Vec<ServicePathOption>>,
}

impl DeviceTypeSelectable {
    /// Ids of the selected services
    pub fn service_ids(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.id.as_str()).collect()
    }

    /// Total number of path options over all services
    pub fn path_option_count(&self) -> usize {
        self.service_path_options.values().map(Vec::len).sum()
    }
}
