//! Criteria matcher - resolves capability criteria against device types
//!
//! For every service of a device type the matcher walks the input and
//! output payload trees and looks for content variables whose function and
//! aspect satisfy a [`FilterCriteria`] atom. Each hit becomes a
//! [`ServicePathOption`] naming the exact payload location.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use devmeta_core::{
    AspectNode, Configurable, DeviceType, DeviceTypeSelectable, Direction, FilterCriteria,
    Function, FunctionKind, Interaction, RegistryError, RegistryResult, Service,
    ServicePathOption, ServiceVariable,
};
use tracing::debug;

use crate::reader::Reader;

/// Aspect closures and function kinds needed for one matching call.
///
/// Built per call from the store and discarded afterwards; nothing is
/// shared between calls.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    aspects: HashMap<String, AspectNode>,
    functions: HashMap<String, FunctionKind>,
}

impl MatchContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add aspect nodes
    pub fn with_aspect_nodes(mut self, nodes: impl IntoIterator<Item = AspectNode>) -> Self {
        for node in nodes {
            self.aspects.insert(node.id.clone(), node);
        }
        self
    }

    /// Add function classifications
    pub fn with_functions(mut self, functions: impl IntoIterator<Item = Function>) -> Self {
        for function in functions {
            if let Some(kind) = function.kind() {
                self.functions.insert(function.id.clone(), kind);
            }
        }
        self
    }

    /// Fetch everything needed to match `criteria` against `device_types`:
    /// the nodes of every referenced aspect and the kind of every
    /// referenced function.
    pub async fn load(
        reader: &Reader<'_>,
        criteria: &[FilterCriteria],
        device_types: &[DeviceType],
    ) -> RegistryResult<Self> {
        let mut aspect_ids: BTreeSet<String> = BTreeSet::new();
        let mut function_ids: BTreeSet<String> = BTreeSet::new();
        for atom in criteria {
            aspect_ids.extend(atom.aspect().map(String::from));
            function_ids.extend(atom.function().map(String::from));
        }
        for service in device_types.iter().flat_map(|dt| dt.services.iter()) {
            for variable in service.variables("") {
                aspect_ids.extend(variable.variable().aspect().map(String::from));
                function_ids.extend(variable.variable().function().map(String::from));
            }
        }

        let aspect_ids: Vec<String> = aspect_ids.into_iter().collect();
        let function_ids: Vec<String> = function_ids.into_iter().collect();
        let nodes = reader.aspect_nodes(&aspect_ids).await?;
        let functions = reader.functions(&function_ids).await?;
        debug!(
            aspects = nodes.len(),
            functions = functions.len(),
            "Loaded match context"
        );
        Ok(Self::new().with_aspect_nodes(nodes).with_functions(functions))
    }

    /// Closure node of an aspect; unknown aspects get a node that only
    /// relates to itself
    pub fn aspect_node(&self, aspect_id: &str) -> AspectNode {
        self.aspects
            .get(aspect_id)
            .cloned()
            .unwrap_or_else(|| AspectNode::detached(aspect_id))
    }

    /// Measuring or controlling. Functions unknown to the store fall back
    /// to their id prefix.
    pub fn function_kind(&self, function_id: &str) -> Option<FunctionKind> {
        self.functions
            .get(function_id)
            .copied()
            .or_else(|| FunctionKind::from_id(function_id))
    }

    /// Whether a variable's aspect satisfies a wanted aspect. Equal,
    /// ancestor and descendant aspects all match; no wanted aspect matches
    /// anything.
    pub fn aspect_matches(&self, variable_aspect: Option<&str>, wanted: Option<&str>) -> bool {
        let Some(wanted) = wanted else {
            return true;
        };
        let Some(actual) = variable_aspect else {
            return false;
        };
        actual == wanted
            || self.aspects.get(actual).is_some_and(|n| n.is_related_to(wanted))
            || self.aspects.get(wanted).is_some_and(|n| n.is_related_to(actual))
    }
}

/// Reject criteria atoms that cannot select anything
pub fn validate_criteria(criteria: &[FilterCriteria]) -> RegistryResult<()> {
    for (i, atom) in criteria.iter().enumerate() {
        if atom.function().is_none() && atom.class().is_none() {
            return Err(RegistryError::InvalidCriteria(format!(
                "criteria {} needs a function_id or a device_class_id",
                i
            )));
        }
    }
    Ok(())
}

/// Per-call matching parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions<'a> {
    /// Accepted service interactions; empty accepts all
    pub interactions: &'a [Interaction],
    /// Prepended to every path
    pub path_prefix: &'a str,
    /// Every atom must be satisfied by some service of the device type
    pub services_must_match_all: bool,
}

/// Matches criteria against device types
pub struct CriteriaMatcher<'a> {
    context: &'a MatchContext,
}

impl<'a> CriteriaMatcher<'a> {
    /// Create a matcher over a loaded context
    pub fn new(context: &'a MatchContext) -> Self {
        Self { context }
    }

    /// The context this matcher uses
    pub fn context(&self) -> &'a MatchContext {
        self.context
    }

    /// Match every device type, keeping those with at least one selected
    /// service
    pub fn match_device_types(
        &self,
        criteria: &[FilterCriteria],
        device_types: &[DeviceType],
        options: MatchOptions<'_>,
    ) -> RegistryResult<Vec<DeviceTypeSelectable>> {
        validate_criteria(criteria)?;
        Ok(device_types
            .iter()
            .filter_map(|dt| self.match_device_type(criteria, dt, options))
            .collect())
    }

    /// Match one device type.
    ///
    /// A service is selected when it satisfies at least one atom. With
    /// `services_must_match_all`, the device type is only returned when
    /// every atom is satisfied by at least one of its services.
    pub fn match_device_type(
        &self,
        criteria: &[FilterCriteria],
        device_type: &DeviceType,
        options: MatchOptions<'_>,
    ) -> Option<DeviceTypeSelectable> {
        let mut satisfied = vec![false; criteria.len()];
        let mut services = Vec::new();
        let mut path_options = BTreeMap::new();

        for service in &device_type.services {
            if !service.interaction.passes(options.interactions) {
                continue;
            }
            let variables = service.variables(options.path_prefix);
            let mut service_options: Vec<ServicePathOption> = Vec::new();
            let mut selected = false;

            for (i, atom) in criteria.iter().enumerate() {
                if let Some(wanted) = atom.interaction {
                    if !service.interaction.satisfies(wanted) {
                        continue;
                    }
                }
                let matched = match atom.function() {
                    Some(function_id) => self.match_function(
                        atom,
                        function_id,
                        device_type,
                        service,
                        &variables,
                        &mut service_options,
                    ),
                    None => atom.class().is_some() && atom.class() == device_type.device_class(),
                };
                if matched {
                    satisfied[i] = true;
                    selected = true;
                }
            }

            if selected {
                if !service_options.is_empty() {
                    path_options.insert(service.id.clone(), service_options);
                }
                services.push(service.clone());
            }
        }

        if services.is_empty() {
            return None;
        }
        if options.services_must_match_all && satisfied.iter().any(|s| !s) {
            debug!(device_type_id = %device_type.id, "Not every criteria satisfied");
            return None;
        }
        Some(DeviceTypeSelectable {
            device_type_id: device_type.id.clone(),
            services,
            service_path_options: path_options,
        })
    }

    fn match_function(
        &self,
        atom: &FilterCriteria,
        function_id: &str,
        device_type: &DeviceType,
        service: &Service,
        variables: &[ServiceVariable<'_>],
        out: &mut Vec<ServicePathOption>,
    ) -> bool {
        let Some(kind) = self.context.function_kind(function_id) else {
            debug!(function_id = %function_id, "Unclassified function never matches");
            return false;
        };
        if kind == FunctionKind::Controlling {
            if let Some(class) = atom.class() {
                if device_type.device_class() != Some(class) {
                    return false;
                }
            }
        }

        let mut matched = false;
        for variable in variables {
            let content = variable.variable();
            if content.function() != Some(function_id) {
                continue;
            }
            // void variables match on function alone
            if !content.is_void && !self.context.aspect_matches(content.aspect(), atom.aspect()) {
                continue;
            }
            matched = true;
            let path = variable.address();
            if out.iter().any(|o| o.path == path) {
                continue;
            }
            let configurables = if kind == FunctionKind::Controlling
                && variable.direction == Direction::Input
            {
                self.configurables(variables, path)
            } else {
                Vec::new()
            };
            out.push(ServicePathOption {
                service_id: service.id.clone(),
                path: path.to_string(),
                characteristic_id: content.characteristic().map(String::from),
                aspect_node: content.aspect().map(|a| self.context.aspect_node(a)),
                function_id: Some(function_id.to_string()),
                interaction: service.interaction,
                is_controlling_function: kind == FunctionKind::Controlling,
                is_void: content.is_void,
                configurables,
            });
        }
        matched
    }

    /// Other annotated inputs that may be set alongside the input at
    /// `path`
    fn configurables(&self, variables: &[ServiceVariable<'_>], path: &str) -> Vec<Configurable> {
        variables
            .iter()
            .filter(|v| v.direction == Direction::Input && v.address() != path)
            .filter(|v| v.variable().is_leaf() && !v.variable().is_void)
            .filter_map(|v| {
                let content = v.variable();
                content.function().map(|function_id| Configurable {
                    path: v.address().to_string(),
                    characteristic_id: content.characteristic().map(String::from),
                    aspect_node: content.aspect().map(|a| self.context.aspect_node(a)),
                    function_id: function_id.to_string(),
                    value: content.value.clone(),
                    variable_type: content.variable_type,
                })
            })
            .collect()
    }
}
