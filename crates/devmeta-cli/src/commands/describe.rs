//! Describe commands - show functions and (possibly narrowed) device types
//! and devices

use anyhow::Result;
use devmeta_core::{DeviceType, DISPLAY_NAME_ATTRIBUTE};
use devmeta_engine::Registry;

use crate::output::{or_dash, OutputContext, OutputFormat, ServiceRow};

fn service_rows(device_type: &DeviceType) -> Vec<ServiceRow> {
    device_type
        .services
        .iter()
        .map(|s| ServiceRow {
            id: s.id.clone(),
            name: s.name.clone(),
            interaction: s.interaction.to_string(),
            group: or_dash(s.group_key()),
            functions: s.function_ids().into_iter().collect::<Vec<_>>().join(" "),
        })
        .collect()
}

/// Show a device type by plain or composite id
pub async fn device_type(registry: &Registry, id: &str, ctx: &OutputContext) -> Result<()> {
    let device_type = registry.read_device_type(id).await?;
    let rows = service_rows(&device_type);

    if ctx.format != OutputFormat::Json {
        let groups: Vec<String> = device_type
            .service_groups
            .iter()
            .map(|g| format!("{} ({})", g.key, g.name))
            .collect();
        ctx.print_kv(&[
            ("ID", device_type.id.clone()),
            ("Name", device_type.name.clone()),
            ("Device Class", or_dash(device_type.device_class())),
            ("Service Groups", groups.join(", ")),
        ]);
    }
    ctx.print_document(&device_type, &rows);
    Ok(())
}

/// Show a device by plain or composite id
pub async fn device(registry: &Registry, id: &str, ctx: &OutputContext) -> Result<()> {
    let device = registry.read_device(id).await?;
    match ctx.format {
        OutputFormat::Json => ctx.print_json(&device),
        _ => ctx.print_kv(&[
            ("ID", device.id.clone()),
            ("Name", device.name.clone()),
            (
                "Nickname",
                or_dash(device.attribute(DISPLAY_NAME_ATTRIBUTE)),
            ),
            ("Device Type", device.device_type_id.clone()),
        ]),
    }
    Ok(())
}

/// Show a function with its measuring/controlling classification
pub async fn function(registry: &Registry, id: &str, ctx: &OutputContext) -> Result<()> {
    let function = registry.function(id).await?;
    match ctx.format {
        OutputFormat::Json => ctx.print_json(&function),
        _ => ctx.print_kv(&[
            ("ID", function.id.clone()),
            ("Name", function.name.clone()),
            ("Kind", or_dash(function.kind().map(|k| k.to_string()).as_deref())),
            ("Concept", or_dash(function.concept_id.as_deref())),
            ("Description", or_dash(function.description.as_deref())),
        ]),
    }
    Ok(())
}
