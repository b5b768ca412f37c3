//! Aspect-nodes command - show the materialized aspect index

use anyhow::Result;
use devmeta_engine::Registry;

use crate::output::{or_dash, AspectNodeRow, OutputContext};

/// List aspect nodes; all of them, the given ids, or those used with
/// measuring functions
pub async fn aspect_nodes(
    registry: &Registry,
    ids: &[String],
    measuring: bool,
    ancestors: bool,
    descendants: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let nodes = if measuring {
        registry
            .aspect_nodes_with_measuring_function(ancestors, descendants)
            .await?
    } else {
        registry.aspect_nodes(ids).await?
    };

    let rows: Vec<AspectNodeRow> = nodes
        .iter()
        .map(|n| AspectNodeRow {
            id: n.id.clone(),
            name: n.name.clone(),
            root_id: n.root_id.clone(),
            parent_id: or_dash(n.parent_id.as_deref()),
            descendants: n.descendent_ids.len(),
        })
        .collect();

    ctx.print_document(&nodes, &rows);
    Ok(())
}
