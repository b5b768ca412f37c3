//! Device type and service models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::content::{Content, Direction, ServiceVariable};
use super::device::Attribute;
use super::non_empty;

/// How a service communicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    /// Device pushes events
    Event,
    /// Device answers requests
    Request,
    /// Both
    #[serde(alias = "event+request")]
    EventAndRequest,
}

impl Interaction {
    /// The plain interactions this one provides.
    ///
    /// `event_and_request` provides both `event` and `request`.
    pub fn expand(self) -> &'static [Interaction] {
        match self {
            Interaction::Event => &[Interaction::Event],
            Interaction::Request => &[Interaction::Request],
            Interaction::EventAndRequest => &[Interaction::Event, Interaction::Request],
        }
    }

    /// Whether a service with this interaction can serve `wanted`.
    ///
    /// ```
    /// # use devmeta_core::Interaction;
    /// assert!(Interaction::EventAndRequest.satisfies(Interaction::Request));
    /// assert!(Interaction::EventAndRequest.satisfies(Interaction::EventAndRequest));
    /// assert!(!Interaction::Event.satisfies(Interaction::Request));
    /// assert!(!Interaction::Event.satisfies(Interaction::EventAndRequest));
    /// ```
    pub fn satisfies(self, wanted: Interaction) -> bool {
        self == wanted
            || (self == Interaction::EventAndRequest
                && matches!(wanted, Interaction::Event | Interaction::Request))
    }

    /// Whether a service with this interaction passes an interaction filter.
    /// An empty filter accepts everything.
    pub fn passes(self, filter: &[Interaction]) -> bool {
        filter.is_empty() || filter.iter().any(|wanted| self.satisfies(*wanted))
    }
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Interaction::Event => "event",
            Interaction::Request => "request",
            Interaction::EventAndRequest => "event_and_request",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Interaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(Interaction::Event),
            "request" => Ok(Interaction::Request),
            "event_and_request" | "event+request" => Ok(Interaction::EventAndRequest),
            _ => Err(format!("Unknown interaction: '{}'", s)),
        }
    }
}

/// Named subset of a device type's services (e.g. one socket of a plug strip)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    /// Key referenced by `Service::service_group_key`
    pub key: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceGroup {
    /// Create a service group
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// One addressable operation of a device type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Unique identifier
    pub id: String,
    /// Identifier used on the device side
    #[serde(default)]
    pub local_id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Event, request or both
    pub interaction: Interaction,
    /// Request payloads
    #[serde(default)]
    pub inputs: Vec<Content>,
    /// Response / event payloads
    #[serde(default)]
    pub outputs: Vec<Content>,
    /// Service group this service belongs to (none = ungrouped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_group_key: Option<String>,
}

impl Service {
    /// Create a service without payloads
    pub fn new(id: impl Into<String>, name: impl Into<String>, interaction: Interaction) -> Self {
        let id = id.into();
        Self {
            local_id: id.clone(),
            id,
            name: name.into(),
            description: None,
            interaction,
            inputs: Vec::new(),
            outputs: Vec::new(),
            service_group_key: None,
        }
    }

    /// Add a request payload
    pub fn with_input(mut self, content: Content) -> Self {
        self.inputs.push(content);
        self
    }

    /// Add a response / event payload
    pub fn with_output(mut self, content: Content) -> Self {
        self.outputs.push(content);
        self
    }

    /// Put the service into a service group
    pub fn in_group(mut self, key: impl Into<String>) -> Self {
        self.service_group_key = Some(key.into());
        self
    }

    /// Service group key, ignoring empty strings
    pub fn group_key(&self) -> Option<&str> {
        non_empty(&self.service_group_key)
    }

    /// Every content variable of inputs then outputs, in document order,
    /// with paths prefixed by `prefix`.
    pub fn variables(&self, prefix: &str) -> Vec<ServiceVariable<'_>> {
        let inputs = self.inputs.iter().map(|c| (Direction::Input, c));
        let outputs = self.outputs.iter().map(|c| (Direction::Output, c));
        inputs
            .chain(outputs)
            .flat_map(|(direction, content)| {
                content
                    .content_variable
                    .flatten(prefix)
                    .into_iter()
                    .map(move |flat| ServiceVariable { direction, flat })
            })
            .collect()
    }

    /// Functions referenced anywhere in this service's payloads
    pub fn function_ids(&self) -> BTreeSet<&str> {
        self.variables("")
            .iter()
            .filter_map(|v| v.variable().function())
            .collect()
    }

    /// Aspects referenced anywhere in this service's payloads
    pub fn aspect_ids(&self) -> BTreeSet<&str> {
        self.variables("")
            .iter()
            .filter_map(|v| v.variable().aspect())
            .collect()
    }
}

/// A kind of device and the services it offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    /// Unique identifier (may be a composite id for narrowed variants)
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Device class (e.g. thermostat, lamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class_id: Option<String>,
    /// Declared service groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_groups: Vec<ServiceGroup>,
    /// Services, owned by this device type
    #[serde(default)]
    pub services: Vec<Service>,
    /// Free-form attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl DeviceType {
    /// Create a device type without services
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            device_class_id: None,
            service_groups: Vec::new(),
            services: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Set the device class
    pub fn with_device_class(mut self, device_class_id: impl Into<String>) -> Self {
        self.device_class_id = Some(device_class_id.into());
        self
    }

    /// Declare a service group
    pub fn with_service_group(mut self, group: ServiceGroup) -> Self {
        self.service_groups.push(group);
        self
    }

    /// Add a service
    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Device class, ignoring empty strings
    pub fn device_class(&self) -> Option<&str> {
        non_empty(&self.device_class_id)
    }

    /// Look up a service by id
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == service_id)
    }

    /// Look up a declared service group by key
    pub fn service_group(&self, key: &str) -> Option<&ServiceGroup> {
        self.service_groups.iter().find(|g| g.key == key)
    }

    /// Distinct service group keys used by services, in order of first use
    pub fn used_service_group_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for key in self.services.iter().filter_map(Service::group_key) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}
