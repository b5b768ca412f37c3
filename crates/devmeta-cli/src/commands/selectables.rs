//! Selectables command - find device types serving capability criteria

use anyhow::{Context, Result};
use clap::Args;
use devmeta_core::{DeviceTypeSort, FilterCriteria, Interaction};
use devmeta_engine::{Registry, SelectableQuery};

use crate::output::{or_dash, OutputContext, OutputFormat, PathOptionRow};

#[derive(Debug, Args)]
pub struct SelectablesArgs {
    /// Criteria as a JSON array, or @file to read it from a file
    #[arg(short, long)]
    criteria: String,

    /// Prefix prepended to every path
    #[arg(long, default_value = "")]
    prefix: String,

    /// Accepted service interaction (repeatable): event, request, event_and_request
    #[arg(long = "interaction")]
    interactions: Vec<Interaction>,

    /// Also list service group variants
    #[arg(long)]
    include_modified: bool,

    /// Omit the unmodified device types
    #[arg(long)]
    exclude_unmodified: bool,

    /// Every criteria must be served by the device type
    #[arg(long)]
    must_match_all: bool,

    /// Candidate order: name.asc, name.desc, id.asc, id.desc
    #[arg(long, default_value = "name.asc")]
    sort: DeviceTypeSort,

    /// Maximum number of candidate device types
    #[arg(long)]
    limit: Option<usize>,

    /// Candidate device types to skip
    #[arg(long, default_value = "0")]
    offset: usize,
}

impl SelectablesArgs {
    fn query(&self) -> Result<SelectableQuery> {
        let criteria = parse_criteria(&self.criteria)?;
        Ok(SelectableQuery {
            interactions: self.interactions.clone(),
            path_prefix: self.prefix.clone(),
            include_modified: self.include_modified,
            include_unmodified: !self.exclude_unmodified,
            services_must_match_all: self.must_match_all,
            sort: self.sort,
            limit: self.limit,
            offset: self.offset,
            ..SelectableQuery::new(criteria)
        })
    }
}

/// Criteria from inline JSON or `@path`
fn parse_criteria(arg: &str) -> Result<Vec<FilterCriteria>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read criteria file: {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&json).context("Criteria must be a JSON array of criteria objects")
}

/// Resolve selectables and print one row per path option
pub async fn selectables(
    registry: &Registry,
    args: &SelectablesArgs,
    ctx: &OutputContext,
) -> Result<()> {
    let query = args.query()?;
    let result = registry.resolve_selectables(&query).await?;

    if result.is_empty() && ctx.format != OutputFormat::Json {
        ctx.info("No matching device types");
        return Ok(());
    }

    let mut rows = Vec::new();
    for selectable in &result {
        for service in &selectable.services {
            let options = selectable.service_path_options.get(&service.id);
            match options {
                Some(options) => rows.extend(options.iter().map(|o| PathOptionRow {
                    device_type_id: selectable.device_type_id.clone(),
                    service_id: service.id.clone(),
                    interaction: o.interaction.to_string(),
                    path: o.path.clone(),
                    function_id: or_dash(o.function_id.as_deref()),
                    aspect_id: or_dash(o.aspect_node.as_ref().map(|n| n.id.as_str())),
                    configurables: o.configurables.len(),
                })),
                None => rows.push(PathOptionRow {
                    device_type_id: selectable.device_type_id.clone(),
                    service_id: service.id.clone(),
                    interaction: service.interaction.to_string(),
                    path: "-".to_string(),
                    function_id: "-".to_string(),
                    aspect_id: "-".to_string(),
                    configurables: 0,
                }),
            }
        }
    }

    ctx.print_document(&result, &rows);
    Ok(())
}
