//! Device group validation
//!
//! Manually authored groups map each criteria row to the devices and
//! services serving it. A mapping is valid when every device is used in
//! every row exactly once and every selected service actually provides the
//! row's capability.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use devmeta_core::{
    Device, DeviceGroup, DeviceGroupMapping, DeviceType, FilterCriteria, Interaction,
    RegistryError, RegistryResult,
};
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::matcher::{CriteriaMatcher, MatchContext, MatchOptions};
use crate::reader::Reader;
use crate::service_group::ServiceGroupModifier;

/// Devices resolved during one validation, keyed by the id used in the
/// group (plain or composite)
type Resolved = HashMap<String, (Device, DeviceType)>;

/// Check that no row selects a device twice and that every device is
/// selected in every row.
pub fn check_uniform_selection(mapping: &[DeviceGroupMapping]) -> RegistryResult<()> {
    let mut usage: BTreeMap<&str, usize> = BTreeMap::new();
    for (row, entry) in mapping.iter().enumerate() {
        let mut in_row: BTreeSet<&str> = BTreeSet::new();
        for selection in &entry.selection {
            if !in_row.insert(selection.device_id.as_str()) {
                return Err(RegistryError::DuplicateDeviceInRow {
                    device_id: selection.device_id.clone(),
                    row,
                });
            }
            *usage.entry(selection.device_id.as_str()).or_default() += 1;
        }
    }
    match usage.into_iter().find(|(_, used)| *used != mapping.len()) {
        Some((device_id, used)) => Err(RegistryError::DeviceNotUniformlySelected {
            device_id: device_id.to_string(),
            used,
            rows: mapping.len(),
        }),
        None => Ok(()),
    }
}

/// Validates device group mappings and whole device groups
pub struct GroupMappingValidator<'a> {
    reader: Reader<'a>,
    modifier: &'a ServiceGroupModifier,
}

impl<'a> GroupMappingValidator<'a> {
    /// Create a validator
    pub fn new(reader: Reader<'a>, modifier: &'a ServiceGroupModifier) -> Self {
        Self { reader, modifier }
    }

    async fn resolve<'i>(&self, ids: impl IntoIterator<Item = &'i str>) -> RegistryResult<Resolved> {
        let unique: BTreeSet<&str> = ids.into_iter().collect();
        let lookups = unique.into_iter().map(|id| async move {
            let resolved = self.modifier.read_device(&self.reader, id).await?;
            Ok::<_, RegistryError>((id.to_string(), resolved))
        });
        let resolved: Resolved = try_join_all(lookups).await?.into_iter().collect();
        debug!(devices = resolved.len(), "Resolved devices");
        Ok(resolved)
    }

    async fn context(
        &self,
        criteria: &[FilterCriteria],
        resolved: &Resolved,
    ) -> RegistryResult<MatchContext> {
        let device_types: Vec<DeviceType> =
            resolved.values().map(|(_, dt)| dt.clone()).collect();
        MatchContext::load(&self.reader, criteria, &device_types).await
    }

    /// Validate a mapping against the group's blocked interaction
    pub async fn validate(
        &self,
        blocked_interaction: Option<Interaction>,
        mapping: &[DeviceGroupMapping],
    ) -> RegistryResult<()> {
        check_uniform_selection(mapping)?;
        let resolved = self
            .resolve(mapping.iter().flat_map(|m| m.selection.iter().map(|s| s.device_id.as_str())))
            .await?;
        let criteria: Vec<FilterCriteria> =
            mapping.iter().map(|m| m.criteria.to_filter_criteria()).collect();
        let context = self.context(&criteria, &resolved).await?;
        check_selections(&context, blocked_interaction, mapping, &resolved)
    }

    /// Validate a whole device group
    pub async fn validate_device_group(&self, group: &DeviceGroup) -> RegistryResult<()> {
        if group.name.trim().is_empty() {
            return Err(RegistryError::InvalidDeviceGroup(format!(
                "group {} has no name",
                group.id
            )));
        }
        let mut seen = BTreeSet::new();
        if let Some(dup) = group.device_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(RegistryError::InvalidDeviceGroup(format!(
                "device {} listed more than once",
                dup
            )));
        }
        if group.is_generated() {
            let generator = group.auto_generated_by_device.as_deref().unwrap_or_default();
            if group.device_ids.len() != 1 || group.device_ids[0] != generator {
                return Err(RegistryError::InvalidDeviceGroup(format!(
                    "generated group {} must contain exactly device {}",
                    group.id, generator
                )));
            }
        }
        check_uniform_selection(&group.devices)?;
        if let Some(device_id) = group
            .devices
            .iter()
            .flat_map(|m| m.selection.iter())
            .map(|s| s.device_id.as_str())
            .find(|id| !seen.contains(id))
        {
            return Err(RegistryError::InvalidDeviceGroup(format!(
                "selected device {} is not a member of the group",
                device_id
            )));
        }

        let resolved = self.resolve(group.device_ids.iter().map(String::as_str)).await?;
        let criteria: Vec<FilterCriteria> = group
            .criteria
            .iter()
            .chain(group.devices.iter().map(|m| &m.criteria))
            .map(|c| c.to_filter_criteria())
            .collect();
        let context = self.context(&criteria, &resolved).await?;

        let matcher = CriteriaMatcher::new(&context);
        for device_id in &group.device_ids {
            let Some((_, device_type)) = resolved.get(device_id) else {
                continue;
            };
            for row in &group.criteria {
                let atom = [row.to_filter_criteria()];
                if matcher
                    .match_device_type(&atom, device_type, MatchOptions::default())
                    .is_none()
                {
                    return Err(RegistryError::InvalidDeviceGroup(format!(
                        "device {} does not satisfy criteria {}",
                        device_id,
                        row.key()
                    )));
                }
            }
        }

        check_selections(&context, group.blocked_interaction, &group.devices, &resolved)?;
        info!(group_id = %group.id, devices = group.device_ids.len(), "Device group is valid");
        Ok(())
    }
}

fn check_selections(
    context: &MatchContext,
    blocked_interaction: Option<Interaction>,
    mapping: &[DeviceGroupMapping],
    resolved: &Resolved,
) -> RegistryResult<()> {
    for entry in mapping {
        let criteria = &entry.criteria;
        for selection in &entry.selection {
            let Some((_, device_type)) = resolved.get(&selection.device_id) else {
                return Err(RegistryError::DeviceNotFound(selection.device_id.clone()));
            };
            if let Some(expected) = criteria.class() {
                if device_type.device_class() != Some(expected) {
                    return Err(RegistryError::DeviceClassMismatch {
                        device_id: selection.device_id.clone(),
                        expected: expected.to_string(),
                        actual: device_type.device_class().unwrap_or_default().to_string(),
                    });
                }
            }
            for service_id in &selection.service_ids {
                let service = device_type.service(service_id).ok_or_else(|| {
                    RegistryError::UnknownService {
                        device_id: selection.device_id.clone(),
                        service_id: service_id.clone(),
                    }
                })?;
                if blocked_interaction == Some(service.interaction) {
                    return Err(RegistryError::BlockedInteraction {
                        service_id: service_id.clone(),
                        interaction: service.interaction,
                    });
                }
                if let Some(aspect_id) = criteria.aspect() {
                    let provided = service
                        .aspect_ids()
                        .into_iter()
                        .any(|a| context.aspect_matches(Some(a), Some(aspect_id)));
                    if !provided {
                        return Err(RegistryError::AspectMismatch {
                            service_id: service_id.clone(),
                            aspect_id: aspect_id.to_string(),
                        });
                    }
                }
                if let Some(function_id) = criteria.function() {
                    if !service.function_ids().contains(function_id) {
                        return Err(RegistryError::FunctionMismatch {
                            service_id: service_id.clone(),
                            function_id: function_id.to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmeta_core::{DeviceGroupFilterCriteria, DeviceSelection};

    fn row(devices: &[&str]) -> DeviceGroupMapping {
        DeviceGroupMapping {
            criteria: DeviceGroupFilterCriteria {
                interaction: Interaction::Request,
                function_id: Some("urn:infai:ses:controlling-function:on".to_string()),
                aspect_id: None,
                device_class_id: None,
            },
            selection: devices
                .iter()
                .map(|d| DeviceSelection {
                    device_id: d.to_string(),
                    service_ids: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn uniform_selection_accepted() {
        check_uniform_selection(&[row(&["d1", "d2"]), row(&["d2", "d1"])]).unwrap();
        check_uniform_selection(&[]).unwrap();
    }

    #[test]
    fn duplicate_in_row() {
        let err = check_uniform_selection(&[row(&["d1"]), row(&["d1", "d1"])]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateDeviceInRow { row: 1, .. }));
    }

    #[test]
    fn device_missing_from_a_row() {
        let err = check_uniform_selection(&[row(&["d1", "d2"]), row(&["d1"])]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DeviceNotUniformlySelected { device_id, used: 1, rows: 2 } if device_id == "d2"
        ));
    }
}
