//! Split-id command - decode composite ids

use anyhow::Result;
use devmeta_core::modifier;
use devmeta_engine::Registry;

use crate::output::{ModifierRow, OutputContext, OutputFormat};

/// Split a composite id into its pure id and modifiers
pub fn split_id(id: &str, ctx: &OutputContext) -> Result<()> {
    let (pure_id, params) = Registry::split_modifier(id);
    let params = params.unwrap_or_default();

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&serde_json::json!({
            "id": pure_id,
            "modifiers": params,
        }));
        return Ok(());
    }

    ctx.info(&format!("Pure id: {}", pure_id));
    if !params.is_empty() {
        ctx.info(&format!("Canonical: {}", modifier::join(pure_id, &params)));
    }
    let rows: Vec<ModifierRow> = params
        .iter()
        .map(|(key, values)| ModifierRow {
            key: key.clone(),
            values: values.join(", "),
        })
        .collect();
    ctx.print(&rows);
    Ok(())
}
