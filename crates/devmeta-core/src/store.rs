//! MetadataStore trait - the read-model boundary of the registry
//!
//! The matching engine never talks to a database directly. Whatever
//! persists device metadata implements this trait; `devmeta-store` provides
//! an in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RegistryResult;
use crate::models::{AspectNode, Device, DeviceGroup, DeviceType, FilterCriteria, Function};

/// Sort order of device type listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTypeSort {
    /// By name, ascending
    #[default]
    NameAsc,
    /// By name, descending
    NameDesc,
    /// By id, ascending
    IdAsc,
    /// By id, descending
    IdDesc,
}

impl std::str::FromStr for DeviceTypeSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "name.asc" => Ok(DeviceTypeSort::NameAsc),
            "name.desc" => Ok(DeviceTypeSort::NameDesc),
            "id" | "id.asc" => Ok(DeviceTypeSort::IdAsc),
            "id.desc" => Ok(DeviceTypeSort::IdDesc),
            _ => Err(format!("Unknown sort: '{}'", s)),
        }
    }
}

/// Coarse device type listing request.
///
/// Stores only pre-filter: a device type is a candidate when any criteria
/// could possibly match it (its services reference the criteria function,
/// or its device class matches a class-only criteria). Fine matching is the
/// engine's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTypeQuery {
    /// Criteria to pre-filter by; empty lists everything
    pub criteria: Vec<FilterCriteria>,
    /// Sort order
    pub sort: DeviceTypeSort,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Results to skip
    pub offset: usize,
}

/// The read/write interface the engine consumes.
///
/// Reads return `Ok(None)` for unknown ids; translating that into a
/// not-found error is up to the caller.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    // =========================================================================
    // Aspect index
    // =========================================================================

    /// Get one aspect node
    async fn get_aspect_node(&self, id: &str) -> RegistryResult<Option<AspectNode>>;

    /// Get the aspect nodes for the given ids; unknown ids are skipped
    async fn list_aspect_nodes_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>>;

    /// List every aspect node
    async fn list_aspect_nodes(&self) -> RegistryResult<Vec<AspectNode>>;

    /// Aspects used together with a measuring function by any device type
    async fn measuring_aspect_ids(&self) -> RegistryResult<Vec<String>>;

    /// Insert or replace an aspect node
    async fn set_aspect_node(&self, node: AspectNode) -> RegistryResult<()>;

    /// Remove every node belonging to the tree rooted at `root_id`
    async fn remove_aspect_nodes_by_root_id(&self, root_id: &str) -> RegistryResult<()>;

    // =========================================================================
    // Functions
    // =========================================================================

    /// Get one function
    async fn get_function(&self, id: &str) -> RegistryResult<Option<Function>>;

    /// Get the functions for the given ids; unknown ids are skipped
    async fn list_functions_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<Function>>;

    // =========================================================================
    // Device types and devices
    // =========================================================================

    /// Get one device type by its pure id
    async fn get_device_type(&self, id: &str) -> RegistryResult<Option<DeviceType>>;

    /// List candidate device types
    async fn list_device_types(&self, query: &DeviceTypeQuery) -> RegistryResult<Vec<DeviceType>>;

    /// Get one device by its pure id
    async fn get_device(&self, id: &str) -> RegistryResult<Option<Device>>;

    /// Get one device group
    async fn get_device_group(&self, id: &str) -> RegistryResult<Option<DeviceGroup>>;
}
