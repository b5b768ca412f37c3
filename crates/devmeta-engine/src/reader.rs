//! Deadline-bounded access to the metadata store
//!
//! Every store call made by the engine goes through a [`Reader`], which
//! bounds it by the configured read timeout and turns missing entities into
//! not-found errors where the engine requires them to exist.

use std::future::Future;
use std::time::Duration;

use devmeta_core::{
    AspectNode, Device, DeviceGroup, DeviceType, DeviceTypeQuery, Function, MetadataStore,
    RegistryError, RegistryResult,
};

/// Store handle bounding each call by a timeout
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    store: &'a dyn MetadataStore,
    timeout: Duration,
}

impl<'a> Reader<'a> {
    /// Wrap a store
    pub fn new(store: &'a dyn MetadataStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = RegistryResult<T>>) -> RegistryResult<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| RegistryError::Timeout)?
    }

    /// Get an aspect node if it exists
    pub async fn aspect_node(&self, id: &str) -> RegistryResult<Option<AspectNode>> {
        self.bounded(self.store.get_aspect_node(id)).await
    }

    /// Get the aspect nodes that exist for `ids`
    pub async fn aspect_nodes(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.bounded(self.store.list_aspect_nodes_by_ids(ids)).await
    }

    /// Every aspect node
    pub async fn all_aspect_nodes(&self) -> RegistryResult<Vec<AspectNode>> {
        self.bounded(self.store.list_aspect_nodes()).await
    }

    /// Aspects used with measuring functions
    pub async fn measuring_aspect_ids(&self) -> RegistryResult<Vec<String>> {
        self.bounded(self.store.measuring_aspect_ids()).await
    }

    /// Write an aspect node
    pub async fn set_aspect_node(&self, node: AspectNode) -> RegistryResult<()> {
        self.bounded(self.store.set_aspect_node(node)).await
    }

    /// Remove the nodes of one aspect tree
    pub async fn remove_aspect_nodes_by_root_id(&self, root_id: &str) -> RegistryResult<()> {
        self.bounded(self.store.remove_aspect_nodes_by_root_id(root_id))
            .await
    }

    /// Get a function
    pub async fn function(&self, id: &str) -> RegistryResult<Function> {
        self.bounded(self.store.get_function(id))
            .await?
            .ok_or_else(|| RegistryError::FunctionNotFound(id.to_string()))
    }

    /// Get the functions that exist for `ids`
    pub async fn functions(&self, ids: &[String]) -> RegistryResult<Vec<Function>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.bounded(self.store.list_functions_by_ids(ids)).await
    }

    /// Get a device type by pure id
    pub async fn device_type(&self, id: &str) -> RegistryResult<DeviceType> {
        self.bounded(self.store.get_device_type(id))
            .await?
            .ok_or_else(|| RegistryError::DeviceTypeNotFound(id.to_string()))
    }

    /// List candidate device types
    pub async fn device_types(&self, query: &DeviceTypeQuery) -> RegistryResult<Vec<DeviceType>> {
        self.bounded(self.store.list_device_types(query)).await
    }

    /// Get a device by pure id
    pub async fn device(&self, id: &str) -> RegistryResult<Device> {
        self.bounded(self.store.get_device(id))
            .await?
            .ok_or_else(|| RegistryError::DeviceNotFound(id.to_string()))
    }

    /// Get a device group
    pub async fn device_group(&self, id: &str) -> RegistryResult<DeviceGroup> {
        self.bounded(self.store.get_device_group(id))
            .await?
            .ok_or_else(|| RegistryError::DeviceGroupNotFound(id.to_string()))
    }
}
