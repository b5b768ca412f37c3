//! Criteria of auto-generated device groups
//!
//! Every device gets a generated group describing everything it can do.
//! The criteria are derived from the annotated payload variables of its
//! device type.

use std::collections::BTreeMap;

use devmeta_core::modifier;
use devmeta_core::{
    generated_device_group_id, Device, DeviceGroup, DeviceGroupFilterCriteria, DeviceType,
    FunctionKind, RegistryError, RegistryResult,
};
use tracing::debug;

use crate::matcher::MatchContext;

/// Derive the criteria rows a device satisfies, sorted by criteria key.
///
/// Measuring variables yield one row per interaction for their aspect and
/// one per ancestor aspect, or a single aspect-less row when unannotated. Controlling variables yield one row per
/// interaction for the device class.
pub fn derive(
    context: &MatchContext,
    device: &Device,
    device_type: &DeviceType,
) -> RegistryResult<Vec<DeviceGroupFilterCriteria>> {
    let (device_type_id, _) = modifier::split(&device.device_type_id);
    let (expected_id, _) = modifier::split(&device_type.id);
    if device_type_id != expected_id {
        return Err(RegistryError::InvalidDeviceGroup(format!(
            "device {} has device type {}, not {}",
            device.id, device_type_id, expected_id
        )));
    }

    let mut rows: BTreeMap<String, DeviceGroupFilterCriteria> = BTreeMap::new();
    let mut add = |row: DeviceGroupFilterCriteria| {
        rows.entry(row.key()).or_insert(row);
    };

    for service in &device_type.services {
        for variable in service.variables("") {
            let content = variable.variable();
            let Some(function_id) = content.function() else {
                continue;
            };
            for &interaction in service.interaction.expand() {
                match context.function_kind(function_id) {
                    Some(FunctionKind::Measuring) => {
                        let aspects: Vec<Option<String>> = match content.aspect() {
                            Some(aspect_id) => {
                                let node = context.aspect_node(aspect_id);
                                std::iter::once(node.id.clone())
                                    .chain(node.ancestor_ids)
                                    .map(Some)
                                    .collect()
                            }
                            None => vec![None],
                        };
                        for aspect_id in aspects {
                            add(DeviceGroupFilterCriteria {
                                interaction,
                                function_id: Some(function_id.to_string()),
                                aspect_id,
                                device_class_id: None,
                            });
                        }
                    }
                    Some(FunctionKind::Controlling) => add(DeviceGroupFilterCriteria {
                        interaction,
                        function_id: Some(function_id.to_string()),
                        aspect_id: None,
                        device_class_id: device_type.device_class().map(String::from),
                    }),
                    None => debug!(function_id = %function_id, "Skipping unclassified function"),
                }
            }
        }
    }

    Ok(rows.into_values().collect())
}

/// Build the generated group of a device
pub fn generated_group(
    context: &MatchContext,
    device: &Device,
    device_type: &DeviceType,
) -> RegistryResult<DeviceGroup> {
    let criteria = derive(context, device, device_type)?;
    Ok(DeviceGroup {
        id: generated_device_group_id(&device.id),
        name: device.display_name().to_string(),
        device_ids: vec![device.id.clone()],
        criteria,
        blocked_interaction: None,
        devices: Vec::new(),
        auto_generated_by_device: Some(device.id.clone()),
    })
}
