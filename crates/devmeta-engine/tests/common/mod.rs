//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devmeta_core::{
    AspectNode, Device, DeviceGroup, DeviceType, DeviceTypeQuery, Function, MetadataStore,
    RegistryError, RegistryResult,
};
use devmeta_engine::{EngineConfig, Registry};
use devmeta_store::MemoryStore;
use parking_lot::Mutex;

pub const CATALOG: &str = include_str!("../../../../demos/catalog.yaml");

pub const TEMPERATURE: &str = "urn:infai:ses:measuring-function:temperature";
pub const ENERGY: &str = "urn:infai:ses:measuring-function:energy";
pub const SET_TEMPERATURE: &str = "urn:infai:ses:controlling-function:set-temperature";
pub const ON: &str = "urn:infai:ses:controlling-function:on";

pub const THERMOSTAT_DEVICE: &str = "urn:infai:ses:device:thermostat-1";
pub const THERMOMETER_DEVICE: &str = "urn:infai:ses:device:thermometer-1";
pub const LAMP_DEVICE: &str = "urn:infai:ses:device:lamp-1";
pub const PLUG_STRIP_DEVICE: &str = "urn:infai:ses:device:plug-strip-1";

/// Demo catalog with every aspect tree indexed
pub async fn demo_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::from_yaml(CATALOG).unwrap());
    let registry = Registry::new(store.clone(), EngineConfig::default());
    for root in store.aspect_roots() {
        registry.rebuild_aspect_subtree(&root).await.unwrap();
    }
    store
}

pub async fn demo_registry() -> Registry {
    demo_registry_with(EngineConfig::default()).await
}

pub async fn demo_registry_with(config: EngineConfig) -> Registry {
    Registry::new(demo_store().await, config)
}

/// Store wrapper injecting failures and delays
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    /// Successful aspect node writes left before writes start failing
    writes_left: Mutex<Option<usize>>,
    /// Delay added to device type reads
    read_delay: Option<Duration>,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            writes_left: Mutex::new(None),
            read_delay: None,
        }
    }

    pub fn fail_after_writes(self, writes: usize) -> Self {
        *self.writes_left.lock() = Some(writes);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn heal(&self) {
        *self.writes_left.lock() = None;
    }
}

#[async_trait]
impl MetadataStore for FaultyStore {
    async fn get_aspect_node(&self, id: &str) -> RegistryResult<Option<AspectNode>> {
        self.inner.get_aspect_node(id).await
    }

    async fn list_aspect_nodes_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>> {
        self.inner.list_aspect_nodes_by_ids(ids).await
    }

    async fn list_aspect_nodes(&self) -> RegistryResult<Vec<AspectNode>> {
        self.inner.list_aspect_nodes().await
    }

    async fn measuring_aspect_ids(&self) -> RegistryResult<Vec<String>> {
        self.inner.measuring_aspect_ids().await
    }

    async fn set_aspect_node(&self, node: AspectNode) -> RegistryResult<()> {
        {
            let mut writes_left = self.writes_left.lock();
            match writes_left.as_mut() {
                Some(0) => return Err(RegistryError::Storage("disk full".to_string())),
                Some(n) => *n -= 1,
                None => {}
            }
        }
        self.inner.set_aspect_node(node).await
    }

    async fn remove_aspect_nodes_by_root_id(&self, root_id: &str) -> RegistryResult<()> {
        self.inner.remove_aspect_nodes_by_root_id(root_id).await
    }

    async fn get_function(&self, id: &str) -> RegistryResult<Option<Function>> {
        self.inner.get_function(id).await
    }

    async fn list_functions_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<Function>> {
        self.inner.list_functions_by_ids(ids).await
    }

    async fn get_device_type(&self, id: &str) -> RegistryResult<Option<DeviceType>> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_device_type(id).await
    }

    async fn list_device_types(&self, query: &DeviceTypeQuery) -> RegistryResult<Vec<DeviceType>> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.list_device_types(query).await
    }

    async fn get_device(&self, id: &str) -> RegistryResult<Option<Device>> {
        self.inner.get_device(id).await
    }

    async fn get_device_group(&self, id: &str) -> RegistryResult<Option<DeviceGroup>> {
        self.inner.get_device_group(id).await
    }
}
