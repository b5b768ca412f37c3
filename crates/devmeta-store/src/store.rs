//! Memory store - the in-memory read model
//!
//! Holds the catalog entities and the materialized aspect index, and
//! answers the coarse device type pre-filter.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use devmeta_core::{
    Aspect, AspectNode, Device, DeviceGroup, DeviceType, DeviceTypeQuery, DeviceTypeSort,
    FilterCriteria, Function, FunctionKind, MetadataStore, RegistryResult,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Metadata about a catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMeta {
    /// Name of the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Version string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Catalog metadata
    #[serde(default)]
    pub meta: Option<CatalogMeta>,
    /// Aspect trees (roots)
    #[serde(default)]
    pub aspects: Vec<Aspect>,
    /// Functions
    #[serde(default)]
    pub functions: Vec<Function>,
    /// Device types
    #[serde(default)]
    pub device_types: Vec<DeviceType>,
    /// Devices
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Device groups
    #[serde(default)]
    pub device_groups: Vec<DeviceGroup>,
}

/// Thread-safe in-memory store for device metadata
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Aspect trees by root id
    aspects: RwLock<BTreeMap<String, Aspect>>,
    /// Materialized aspect index by aspect id
    aspect_nodes: RwLock<HashMap<String, AspectNode>>,
    /// Functions by id, classified on insert
    functions: RwLock<HashMap<String, Function>>,
    /// Device types by id
    device_types: RwLock<HashMap<String, DeviceType>>,
    /// Devices by id
    devices: RwLock<HashMap<String, Device>>,
    /// Device groups by id
    device_groups: RwLock<HashMap<String, DeviceGroup>>,
    /// Metadata about the loaded catalog
    meta: RwLock<CatalogMeta>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog file; `.yaml`/`.yml` and `.json` are supported
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(StoreError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Load a catalog from a YAML string
    pub fn from_yaml(yaml: &str) -> StoreResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::from_catalog(file)
    }

    /// Load a catalog from a JSON string
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_catalog(file)
    }

    /// Build a store from a parsed catalog, rejecting duplicate ids
    pub fn from_catalog(file: CatalogFile) -> StoreResult<Self> {
        let store = Self::new();
        if let Some(meta) = file.meta {
            *store.meta.write() = meta;
        }

        ensure_unique("aspect", file.aspects.iter().map(|a| a.id.as_str()))?;
        ensure_unique("function", file.functions.iter().map(|f| f.id.as_str()))?;
        ensure_unique("device type", file.device_types.iter().map(|d| d.id.as_str()))?;
        ensure_unique("device", file.devices.iter().map(|d| d.id.as_str()))?;
        ensure_unique("device group", file.device_groups.iter().map(|g| g.id.as_str()))?;

        for aspect in file.aspects {
            store.register_aspect(aspect);
        }
        for function in file.functions {
            store.register_function(function);
        }
        for device_type in file.device_types {
            store.register_device_type(device_type);
        }
        for device in file.devices {
            store.register_device(device);
        }
        for group in file.device_groups {
            store.register_device_group(group);
        }

        debug!(
            aspects = store.aspects.read().len(),
            device_types = store.device_types.read().len(),
            devices = store.devices.read().len(),
            "Loaded catalog"
        );
        Ok(store)
    }

    /// Catalog metadata
    pub fn meta(&self) -> CatalogMeta {
        self.meta.read().clone()
    }

    /// Insert or replace an aspect tree. The aspect index is not touched;
    /// rebuild it afterwards.
    pub fn register_aspect(&self, aspect: Aspect) {
        self.aspects.write().insert(aspect.id.clone(), aspect);
    }

    /// Insert or replace a function, classifying it as measuring or
    /// controlling
    pub fn register_function(&self, function: Function) {
        let function = function.classified();
        self.functions.write().insert(function.id.clone(), function);
    }

    /// Insert or replace a device type
    pub fn register_device_type(&self, device_type: DeviceType) {
        self.device_types
            .write()
            .insert(device_type.id.clone(), device_type);
    }

    /// Insert or replace a device
    pub fn register_device(&self, device: Device) {
        self.devices.write().insert(device.id.clone(), device);
    }

    /// Insert or replace a device group
    pub fn register_device_group(&self, group: DeviceGroup) {
        self.device_groups.write().insert(group.id.clone(), group);
    }

    /// Aspect trees, ordered by root id
    pub fn aspect_roots(&self) -> Vec<Aspect> {
        self.aspects.read().values().cloned().collect()
    }

    /// Number of device types
    pub fn device_type_count(&self) -> usize {
        self.device_types.read().len()
    }

    /// Number of materialized aspect nodes
    pub fn aspect_node_count(&self) -> usize {
        self.aspect_nodes.read().len()
    }

    fn function_kind(&self, function_id: &str) -> Option<FunctionKind> {
        self.functions
            .read()
            .get(function_id)
            .and_then(Function::kind)
            .or_else(|| FunctionKind::from_id(function_id))
    }
}

fn ensure_unique<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> StoreResult<()> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Whether a device type could match any of the criteria
fn is_candidate(device_type: &DeviceType, criteria: &[FilterCriteria]) -> bool {
    if criteria.is_empty() {
        return true;
    }
    let function_ids: BTreeSet<&str> = device_type
        .services
        .iter()
        .flat_map(|s| s.function_ids())
        .collect();
    criteria.iter().any(|c| match (c.function(), c.class()) {
        (Some(function_id), _) => function_ids.contains(function_id),
        (None, Some(class)) => device_type.device_class() == Some(class),
        (None, None) => false,
    })
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn get_aspect_node(&self, id: &str) -> RegistryResult<Option<AspectNode>> {
        Ok(self.aspect_nodes.read().get(id).cloned())
    }

    async fn list_aspect_nodes_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>> {
        let nodes = self.aspect_nodes.read();
        Ok(ids.iter().filter_map(|id| nodes.get(id).cloned()).collect())
    }

    async fn list_aspect_nodes(&self) -> RegistryResult<Vec<AspectNode>> {
        let mut nodes: Vec<AspectNode> = self.aspect_nodes.read().values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(nodes)
    }

    async fn measuring_aspect_ids(&self) -> RegistryResult<Vec<String>> {
        let device_types = self.device_types.read();
        let mut ids = BTreeSet::new();
        for service in device_types.values().flat_map(|dt| dt.services.iter()) {
            for variable in service.variables("") {
                let variable = variable.variable();
                if let (Some(function_id), Some(aspect_id)) = (variable.function(), variable.aspect())
                {
                    if self.function_kind(function_id) == Some(FunctionKind::Measuring) {
                        ids.insert(aspect_id.to_string());
                    }
                }
            }
        }
        Ok(ids.into_iter().collect())
    }

    async fn set_aspect_node(&self, node: AspectNode) -> RegistryResult<()> {
        self.aspect_nodes.write().insert(node.id.clone(), node);
        Ok(())
    }

    async fn remove_aspect_nodes_by_root_id(&self, root_id: &str) -> RegistryResult<()> {
        self.aspect_nodes
            .write()
            .retain(|_, node| node.root_id != root_id);
        Ok(())
    }

    async fn get_function(&self, id: &str) -> RegistryResult<Option<Function>> {
        Ok(self.functions.read().get(id).cloned())
    }

    async fn list_functions_by_ids(&self, ids: &[String]) -> RegistryResult<Vec<Function>> {
        let functions = self.functions.read();
        Ok(ids
            .iter()
            .filter_map(|id| functions.get(id).cloned())
            .collect())
    }

    async fn get_device_type(&self, id: &str) -> RegistryResult<Option<DeviceType>> {
        Ok(self.device_types.read().get(id).cloned())
    }

    async fn list_device_types(&self, query: &DeviceTypeQuery) -> RegistryResult<Vec<DeviceType>> {
        let mut result: Vec<DeviceType> = self
            .device_types
            .read()
            .values()
            .filter(|dt| is_candidate(dt, &query.criteria))
            .cloned()
            .collect();

        match query.sort {
            DeviceTypeSort::NameAsc => result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
            DeviceTypeSort::NameDesc => result.sort_by(|a, b| b.name.cmp(&a.name).then(b.id.cmp(&a.id))),
            DeviceTypeSort::IdAsc => result.sort_by(|a, b| a.id.cmp(&b.id)),
            DeviceTypeSort::IdDesc => result.sort_by(|a, b| b.id.cmp(&a.id)),
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(result.into_iter().skip(query.offset).take(limit).collect())
    }

    async fn get_device(&self, id: &str) -> RegistryResult<Option<Device>> {
        Ok(self.devices.read().get(id).cloned())
    }

    async fn get_device_group(&self, id: &str) -> RegistryResult<Option<DeviceGroup>> {
        Ok(self.device_groups.read().get(id).cloned())
    }
}
