//! Capability query models

use serde::{Deserialize, Serialize};

use super::device_type::Interaction;
use super::non_empty;

/// One atomic capability query: function × aspect × device class × interaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Required function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_id: Option<String>,
    /// Required aspect (ancestors and descendants also match)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_id: Option<String>,
    /// Required device class (controlling functions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class_id: Option<String>,
    /// Required interaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
}

impl FilterCriteria {
    /// Criteria for a measuring function on an aspect
    pub fn measuring(function_id: impl Into<String>, aspect_id: impl Into<String>) -> Self {
        Self {
            function_id: Some(function_id.into()),
            aspect_id: Some(aspect_id.into()),
            ..Default::default()
        }
    }

    /// Criteria for a controlling function on a device class
    pub fn controlling(function_id: impl Into<String>, device_class_id: impl Into<String>) -> Self {
        Self {
            function_id: Some(function_id.into()),
            device_class_id: Some(device_class_id.into()),
            ..Default::default()
        }
    }

    /// Criteria selecting every service of a device class
    pub fn device_class(device_class_id: impl Into<String>) -> Self {
        Self {
            device_class_id: Some(device_class_id.into()),
            ..Default::default()
        }
    }

    /// Restrict to an interaction
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }

    /// Function, ignoring empty strings
    pub fn function(&self) -> Option<&str> {
        non_empty(&self.function_id)
    }

    /// Aspect, ignoring empty strings
    pub fn aspect(&self) -> Option<&str> {
        non_empty(&self.aspect_id)
    }

    /// Device class, ignoring empty strings
    pub fn class(&self) -> Option<&str> {
        non_empty(&self.device_class_id)
    }
}

/// Criteria row of a device group. Unlike [`FilterCriteria`] the
/// interaction is always set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceGroupFilterCriteria {
    /// Required interaction
    pub interaction: Interaction,
    /// Required function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_id: Option<String>,
    /// Required aspect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_id: Option<String>,
    /// Required device class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class_id: Option<String>,
}

impl DeviceGroupFilterCriteria {
    /// Identity used to deduplicate criteria sets:
    /// `function_aspect_class_interaction`.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            non_empty(&self.function_id).unwrap_or_default(),
            non_empty(&self.aspect_id).unwrap_or_default(),
            non_empty(&self.device_class_id).unwrap_or_default(),
            self.interaction
        )
    }

    /// The same query as a [`FilterCriteria`]
    pub fn to_filter_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            function_id: self.function_id.clone(),
            aspect_id: self.aspect_id.clone(),
            device_class_id: self.device_class_id.clone(),
            interaction: Some(self.interaction),
        }
    }

    /// Function, ignoring empty strings
    pub fn function(&self) -> Option<&str> {
        non_empty(&self.function_id)
    }

    /// Aspect, ignoring empty strings
    pub fn aspect(&self) -> Option<&str> {
        non_empty(&self.aspect_id)
    }

    /// Device class, ignoring empty strings
    pub fn class(&self) -> Option<&str> {
        non_empty(&self.device_class_id)
    }
}
