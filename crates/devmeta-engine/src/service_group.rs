//! Service group narrowing
//!
//! A device type declaring service groups (e.g. the sockets of a plug
//! strip) can be addressed per group through a composite id. Narrowing
//! keeps the services of the selected group and rewrites ids and names so
//! the variant is distinguishable from its base.

use devmeta_core::modifier::{self, service_group_selection_id};
use devmeta_core::{
    Attribute, Device, DeviceType, Modifier, RegistryError, RegistryResult, ServiceGroup,
    DISPLAY_NAME_ATTRIBUTE,
};
use tracing::debug;

use crate::config::ServiceGroupConfig;
use crate::reader::Reader;

/// Applies service group selections to device types and devices
#[derive(Debug, Clone, Default)]
pub struct ServiceGroupModifier {
    config: ServiceGroupConfig,
}

impl ServiceGroupModifier {
    /// Create a modifier with the given narrowing behaviour
    pub fn new(config: ServiceGroupConfig) -> Self {
        Self { config }
    }

    fn resolve_group(&self, device_type: &DeviceType, key: &str) -> RegistryResult<ServiceGroup> {
        match device_type.service_group(key) {
            Some(group) => Ok(group.clone()),
            None if self.config.allow_not_found => {
                debug!(device_type_id = %device_type.id, key = %key, "Synthesizing service group");
                Ok(ServiceGroup::new(key, key))
            }
            None => Err(RegistryError::UnknownServiceGroup {
                device_type_id: device_type.id.clone(),
                key: key.to_string(),
            }),
        }
    }

    /// Narrow a device type to the services of group `key`.
    ///
    /// Ungrouped services are kept unless `exact_match` is configured.
    pub fn apply_to_device_type(
        &self,
        device_type: &DeviceType,
        key: &str,
    ) -> RegistryResult<DeviceType> {
        let group = self.resolve_group(device_type, key)?;
        let (pure_id, _) = modifier::split(&device_type.id);

        let mut narrowed = device_type.clone();
        narrowed.services.retain(|service| match service.group_key() {
            Some(k) => k == key,
            None => !self.config.exact_match,
        });
        narrowed.name = format!("{} {}", device_type.name, group.name);
        narrowed.id = service_group_selection_id(pure_id, key);
        Ok(narrowed)
    }

    /// Narrow a device to group `key` of its device type.
    ///
    /// The group name is appended to the device name and its nickname; the
    /// device id and device type id become composite ids.
    pub fn apply_to_device(
        &self,
        device: &Device,
        device_type: &DeviceType,
        key: &str,
    ) -> RegistryResult<Device> {
        let group = self.resolve_group(device_type, key)?;
        let (pure_id, _) = modifier::split(&device.id);
        let (pure_type_id, _) = modifier::split(&device.device_type_id);

        let mut narrowed = device.clone();
        narrowed.name = format!("{} {}", device.name, group.name);
        match narrowed
            .attributes
            .iter_mut()
            .find(|a| a.key == DISPLAY_NAME_ATTRIBUTE)
        {
            Some(nickname) => nickname.value = format!("{} {}", nickname.value, group.name),
            None => narrowed.attributes.push(Attribute::new(
                DISPLAY_NAME_ATTRIBUTE,
                format!("{} {}", device.display_name(), group.name),
            )),
        }
        narrowed.id = service_group_selection_id(pure_id, key);
        narrowed.device_type_id = service_group_selection_id(pure_type_id, key);
        Ok(narrowed)
    }

    /// Apply modifiers to a device type in order
    pub fn modify_device_type(
        &self,
        device_type: DeviceType,
        modifiers: &[Modifier],
    ) -> RegistryResult<DeviceType> {
        modifiers.iter().try_fold(device_type, |dt, m| match m {
            Modifier::ServiceGroupSelection(key) => self.apply_to_device_type(&dt, key),
        })
    }

    /// Apply modifiers to a device in order
    pub fn modify_device(
        &self,
        device: Device,
        device_type: &DeviceType,
        modifiers: &[Modifier],
    ) -> RegistryResult<Device> {
        modifiers.iter().try_fold(device, |d, m| match m {
            Modifier::ServiceGroupSelection(key) => self.apply_to_device(&d, device_type, key),
        })
    }

    /// Read a device type by plain or composite id
    pub async fn read_device_type(&self, reader: &Reader<'_>, id: &str) -> RegistryResult<DeviceType> {
        let (pure_id, params) = modifier::split(id);
        let device_type = reader.device_type(pure_id).await?;
        match params {
            Some(params) => {
                self.modify_device_type(device_type, &Modifier::from_parameters(&params))
            }
            None => Ok(device_type),
        }
    }

    /// Read a device by plain or composite id, together with its
    /// (equally narrowed) device type
    pub async fn read_device(
        &self,
        reader: &Reader<'_>,
        id: &str,
    ) -> RegistryResult<(Device, DeviceType)> {
        let (pure_id, params) = modifier::split(id);
        let device = reader.device(pure_id).await?;
        let (pure_type_id, _) = modifier::split(&device.device_type_id);
        let device_type = reader.device_type(pure_type_id).await?;

        let Some(params) = params else {
            return Ok((device, device_type));
        };
        let modifiers = Modifier::from_parameters(&params);
        let narrowed_device = self.modify_device(device, &device_type, &modifiers)?;
        let narrowed_type = self.modify_device_type(device_type, &modifiers)?;
        Ok((narrowed_device, narrowed_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmeta_core::{Interaction, Service};
    use pretty_assertions::assert_eq;

    fn plug_strip() -> DeviceType {
        DeviceType::new("plug-strip", "Plug Strip")
            .with_device_class("socket")
            .with_service_group(ServiceGroup::new("sg1", "Socket 1"))
            .with_service_group(ServiceGroup::new("sg2", "Socket 2"))
            .with_service(Service::new("s1", "on 1", Interaction::Request).in_group("sg1"))
            .with_service(Service::new("s2", "on 2", Interaction::Request).in_group("sg2"))
            .with_service(Service::new("s3", "energy", Interaction::Event))
    }

    fn service_ids(dt: &DeviceType) -> Vec<&str> {
        dt.services.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn narrows_device_type() {
        let narrowed = ServiceGroupModifier::default()
            .apply_to_device_type(&plug_strip(), "sg1")
            .unwrap();
        assert_eq!(narrowed.id, "plug-strip$service_group_selection=sg1");
        assert_eq!(narrowed.name, "Plug Strip Socket 1");
        assert_eq!(service_ids(&narrowed), vec!["s1", "s3"]);
    }

    #[test]
    fn exact_match_drops_ungrouped() {
        let modifier = ServiceGroupModifier::new(ServiceGroupConfig {
            exact_match: true,
            ..Default::default()
        });
        let narrowed = modifier.apply_to_device_type(&plug_strip(), "sg2").unwrap();
        assert_eq!(service_ids(&narrowed), vec!["s2"]);
    }

    #[test]
    fn unknown_group() {
        let err = ServiceGroupModifier::default()
            .apply_to_device_type(&plug_strip(), "sg9")
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownServiceGroup { key, .. } if key == "sg9"));

        let lenient = ServiceGroupModifier::new(ServiceGroupConfig {
            allow_not_found: true,
            ..Default::default()
        });
        let narrowed = lenient.apply_to_device_type(&plug_strip(), "sg9").unwrap();
        assert_eq!(narrowed.name, "Plug Strip sg9");
        assert_eq!(service_ids(&narrowed), vec!["s3"]);
    }

    #[test]
    fn narrows_device() {
        let device = Device::new("d1", "Strip", "plug-strip")
            .with_attribute(Attribute::new(DISPLAY_NAME_ATTRIBUTE, "Desk"));
        let narrowed = ServiceGroupModifier::default()
            .apply_to_device(&device, &plug_strip(), "sg2")
            .unwrap();
        assert_eq!(narrowed.id, "d1$service_group_selection=sg2");
        assert_eq!(narrowed.device_type_id, "plug-strip$service_group_selection=sg2");
        assert_eq!(narrowed.name, "Strip Socket 2");
        assert_eq!(narrowed.display_name(), "Desk Socket 2");
    }

    #[test]
    fn device_without_nickname_gets_one() {
        let device = Device::new("d1", "Strip", "plug-strip");
        let narrowed = ServiceGroupModifier::default()
            .apply_to_device(&device, &plug_strip(), "sg1")
            .unwrap();
        assert_eq!(narrowed.display_name(), "Strip Socket 1");
    }

    #[test]
    fn modifying_a_variant_keeps_a_single_modifier() {
        let modifier = ServiceGroupModifier::default();
        let once = modifier
            .modify_device_type(plug_strip(), &[Modifier::ServiceGroupSelection("sg1".into())])
            .unwrap();
        let twice = modifier
            .modify_device_type(once, &[Modifier::ServiceGroupSelection("sg1".into())])
            .unwrap();
        assert_eq!(twice.id, "plug-strip$service_group_selection=sg1");
    }
}
