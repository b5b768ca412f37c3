//! Group commands - generated group criteria and group validation

use anyhow::Result;
use devmeta_engine::Registry;

use crate::output::{or_dash, CriteriaRow, OutputContext, OutputFormat};

/// Show the generated group of a device
pub async fn group_criteria(registry: &Registry, device_id: &str, ctx: &OutputContext) -> Result<()> {
    let group = registry.generated_device_group(device_id).await?;

    let rows: Vec<CriteriaRow> = group
        .criteria
        .iter()
        .map(|c| CriteriaRow {
            interaction: c.interaction.to_string(),
            function_id: or_dash(c.function()),
            aspect_id: or_dash(c.aspect()),
            device_class_id: or_dash(c.class()),
        })
        .collect();

    if ctx.format != OutputFormat::Json {
        ctx.info(&format!("{} ({})", group.id, group.name));
    }
    ctx.print_document(&group, &rows);
    Ok(())
}

/// Validate a stored device group
pub async fn validate_group(registry: &Registry, group_id: &str, ctx: &OutputContext) -> Result<()> {
    match registry.validate_stored_device_group(group_id).await {
        Ok(group) => {
            ctx.success(&format!(
                "Device group {} is valid ({} device(s), {} criteria)",
                group.id,
                group.device_ids.len(),
                group.criteria.len()
            ));
            Ok(())
        }
        Err(e) => {
            ctx.error(&format!("Device group {} is invalid: {}", group_id, e));
            Err(e.into())
        }
    }
}
