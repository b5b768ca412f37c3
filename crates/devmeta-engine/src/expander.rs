//! Selectable expansion over service group variants

use devmeta_core::{
    DeviceType, DeviceTypeQuery, DeviceTypeSelectable, DeviceTypeSort, FilterCriteria,
    Interaction, RegistryError, RegistryResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::matcher::{validate_criteria, CriteriaMatcher, MatchContext, MatchOptions};
use crate::reader::Reader;
use crate::service_group::ServiceGroupModifier;

/// A selectables request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectableQuery {
    /// Capability atoms
    pub criteria: Vec<FilterCriteria>,
    /// Accepted service interactions; empty accepts all
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    /// Prepended to every path option
    #[serde(default)]
    pub path_prefix: String,
    /// Emit service group variants under composite ids
    #[serde(default)]
    pub include_modified: bool,
    /// Emit the unmodified device types
    #[serde(default = "default_true")]
    pub include_unmodified: bool,
    /// Every atom must be satisfied by the device type
    #[serde(default)]
    pub services_must_match_all: bool,
    /// Candidate order
    #[serde(default)]
    pub sort: DeviceTypeSort,
    /// Maximum number of candidate device types
    #[serde(default)]
    pub limit: Option<usize>,
    /// Candidate device types to skip
    #[serde(default)]
    pub offset: usize,
}

fn default_true() -> bool {
    true
}

impl SelectableQuery {
    /// Query for unmodified device types matching `criteria`
    pub fn new(criteria: Vec<FilterCriteria>) -> Self {
        Self {
            criteria,
            interactions: Vec::new(),
            path_prefix: String::new(),
            include_modified: false,
            include_unmodified: true,
            services_must_match_all: false,
            sort: DeviceTypeSort::default(),
            limit: None,
            offset: 0,
        }
    }

    fn options(&self) -> MatchOptions<'_> {
        MatchOptions {
            interactions: &self.interactions,
            path_prefix: &self.path_prefix,
            services_must_match_all: self.services_must_match_all,
        }
    }

    fn store_query(&self) -> DeviceTypeQuery {
        DeviceTypeQuery {
            criteria: self.criteria.clone(),
            sort: self.sort,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Produces selectables for base device types and their service group
/// variants
pub struct SelectableExpander<'a> {
    reader: Reader<'a>,
    modifier: &'a ServiceGroupModifier,
}

impl<'a> SelectableExpander<'a> {
    /// Create an expander
    pub fn new(reader: Reader<'a>, modifier: &'a ServiceGroupModifier) -> Self {
        Self { reader, modifier }
    }

    /// Resolve a selectables request against the store
    pub async fn expand(&self, query: &SelectableQuery) -> RegistryResult<Vec<DeviceTypeSelectable>> {
        validate_criteria(&query.criteria)?;
        if query.criteria.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.reader.device_types(&query.store_query()).await?;
        let context = MatchContext::load(&self.reader, &query.criteria, &candidates).await?;
        let result = self.expand_candidates(&context, query, &candidates);
        info!(
            candidates = candidates.len(),
            selectables = result.len(),
            "Resolved selectables"
        );
        Ok(result)
    }

    /// Expand already fetched candidates
    pub fn expand_candidates(
        &self,
        context: &MatchContext,
        query: &SelectableQuery,
        candidates: &[DeviceType],
    ) -> Vec<DeviceTypeSelectable> {
        let matcher = CriteriaMatcher::new(context);
        let options = query.options();
        let mut result = Vec::new();

        for device_type in candidates {
            // Variants are subsets of the base, so no base match means no
            // variant match.
            let Some(base) = matcher.match_device_type(&query.criteria, device_type, options) else {
                continue;
            };
            if query.include_unmodified {
                result.push(base);
            }
            if query.include_modified {
                for variant in self.variants(device_type) {
                    if let Some(selectable) =
                        matcher.match_device_type(&query.criteria, &variant, options)
                    {
                        result.push(selectable);
                    }
                }
            }
        }
        result
    }

    fn variants(&self, device_type: &DeviceType) -> Vec<DeviceType> {
        device_type
            .used_service_group_keys()
            .into_iter()
            .filter_map(|key| match self.modifier.apply_to_device_type(device_type, key) {
                Ok(variant) => {
                    debug!(device_type_id = %variant.id, services = variant.services.len(), "Built variant");
                    Some(variant)
                }
                Err(RegistryError::UnknownServiceGroup { .. }) => {
                    warn!(device_type_id = %device_type.id, key = %key, "Service uses undeclared group");
                    None
                }
                Err(e) => {
                    warn!(device_type_id = %device_type.id, key = %key, error = %e, "Skipping variant");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_from_json() {
        let query: SelectableQuery = serde_json::from_str(
            r#"{"criteria": [{"function_id": "urn:infai:ses:measuring-function:temperature"}]}"#,
        )
        .unwrap();
        assert!(query.include_unmodified);
        assert!(!query.include_modified);
        assert!(query.interactions.is_empty());
        assert_eq!(query, SelectableQuery {
            criteria: vec![FilterCriteria {
                function_id: Some("urn:infai:ses:measuring-function:temperature".to_string()),
                ..Default::default()
            }],
            ..SelectableQuery::new(Vec::new())
        });
    }
}
