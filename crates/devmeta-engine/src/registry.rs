//! Registry facade
//!
//! Bundles a store with the engine configuration and exposes every
//! operation of the matching engine behind one type.

use std::sync::Arc;

use devmeta_core::modifier::{self, ModifierParameters};
use devmeta_core::{
    Aspect, AspectNode, Device, DeviceGroup, DeviceGroupFilterCriteria, DeviceGroupMapping,
    DeviceType, DeviceTypeSelectable, Function, Interaction, MetadataStore, RegistryResult,
};
use tracing::info;

use crate::aspect_index::AspectIndex;
use crate::config::EngineConfig;
use crate::expander::{SelectableExpander, SelectableQuery};
use crate::group_criteria;
use crate::group_mapping::GroupMappingValidator;
use crate::matcher::MatchContext;
use crate::reader::Reader;
use crate::service_group::ServiceGroupModifier;

/// Entry point of the matching engine
pub struct Registry {
    store: Arc<dyn MetadataStore>,
    config: EngineConfig,
    modifier: ServiceGroupModifier,
}

impl Registry {
    /// Create a registry over a store
    pub fn new(store: Arc<dyn MetadataStore>, config: EngineConfig) -> Self {
        info!(
            read_timeout_ms = config.read_timeout_ms,
            allow_not_found = config.service_group.allow_not_found,
            exact_match = config.service_group.exact_match,
            "Creating registry"
        );
        let modifier = ServiceGroupModifier::new(config.service_group.clone());
        Self {
            store,
            config,
            modifier,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn reader(&self) -> Reader<'_> {
        Reader::new(self.store.as_ref(), self.config.read_timeout())
    }

    // =========================================================================
    // Selectables
    // =========================================================================

    /// Device types (and optionally their service group variants) able to
    /// serve the query, with the payload paths serving each criteria
    pub async fn resolve_selectables(
        &self,
        query: &SelectableQuery,
    ) -> RegistryResult<Vec<DeviceTypeSelectable>> {
        SelectableExpander::new(self.reader(), &self.modifier)
            .expand(query)
            .await
    }

    // =========================================================================
    // Aspect index
    // =========================================================================

    /// Rebuild the index of the aspect tree rooted at `root`; returns the
    /// descendant ids of the root
    pub async fn rebuild_aspect_subtree(&self, root: &Aspect) -> RegistryResult<Vec<String>> {
        AspectIndex::new(self.reader()).rebuild(root).await
    }

    /// Get one aspect node
    pub async fn aspect_node(&self, id: &str) -> RegistryResult<AspectNode> {
        AspectIndex::new(self.reader()).get_node(id).await
    }

    /// Get the aspect nodes that exist for `ids`; all nodes when `ids` is
    /// empty
    pub async fn aspect_nodes(&self, ids: &[String]) -> RegistryResult<Vec<AspectNode>> {
        let index = AspectIndex::new(self.reader());
        if ids.is_empty() {
            index.list_all().await
        } else {
            index.list_by_ids(ids).await
        }
    }

    /// Aspect nodes used with measuring functions
    pub async fn aspect_nodes_with_measuring_function(
        &self,
        include_ancestors: bool,
        include_descendants: bool,
    ) -> RegistryResult<Vec<AspectNode>> {
        AspectIndex::new(self.reader())
            .list_with_measuring_function(include_ancestors, include_descendants)
            .await
    }

    // =========================================================================
    // Device groups
    // =========================================================================

    /// Criteria of the generated group of `device`
    pub async fn derive_generated_group_criteria(
        &self,
        device: &Device,
        device_type: &DeviceType,
    ) -> RegistryResult<Vec<DeviceGroupFilterCriteria>> {
        let context =
            MatchContext::load(&self.reader(), &[], std::slice::from_ref(device_type)).await?;
        group_criteria::derive(&context, device, device_type)
    }

    /// The generated group of a device, by plain or composite id
    pub async fn generated_device_group(&self, device_id: &str) -> RegistryResult<DeviceGroup> {
        let reader = self.reader();
        let (device, device_type) = self.modifier.read_device(&reader, device_id).await?;
        let context =
            MatchContext::load(&reader, &[], std::slice::from_ref(&device_type)).await?;
        group_criteria::generated_group(&context, &device, &device_type)
    }

    /// Validate the device/service selection of a device group
    pub async fn validate_group_mapping(
        &self,
        blocked_interaction: Option<Interaction>,
        mapping: &[DeviceGroupMapping],
    ) -> RegistryResult<()> {
        GroupMappingValidator::new(self.reader(), &self.modifier)
            .validate(blocked_interaction, mapping)
            .await
    }

    /// Validate a whole device group
    pub async fn validate_device_group(&self, group: &DeviceGroup) -> RegistryResult<()> {
        GroupMappingValidator::new(self.reader(), &self.modifier)
            .validate_device_group(group)
            .await
    }

    /// Validate a stored device group
    pub async fn validate_stored_device_group(&self, id: &str) -> RegistryResult<DeviceGroup> {
        let group = self.reader().device_group(id).await?;
        self.validate_device_group(&group).await?;
        Ok(group)
    }

    // =========================================================================
    // Devices and device types
    // =========================================================================

    /// Read a device type by plain or composite id
    pub async fn read_device_type(&self, id: &str) -> RegistryResult<DeviceType> {
        self.modifier.read_device_type(&self.reader(), id).await
    }

    /// Read a device by plain or composite id
    pub async fn read_device(&self, id: &str) -> RegistryResult<Device> {
        let (device, _) = self.modifier.read_device(&self.reader(), id).await?;
        Ok(device)
    }

    /// Read a function, classified as measuring or controlling
    pub async fn function(&self, id: &str) -> RegistryResult<Function> {
        self.reader().function(id).await
    }

    // =========================================================================
    // Composite ids
    // =========================================================================

    /// Split an id into its pure id and modifier parameters
    pub fn split_modifier(id: &str) -> (&str, Option<ModifierParameters>) {
        modifier::split(id)
    }

    /// Canonical encoding of modifier parameters
    pub fn encode_modifier_parameter(params: &ModifierParameters) -> String {
        modifier::encode(params)
    }
}
