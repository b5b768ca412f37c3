//! devmeta-engine - Semantic matching over device metadata
//!
//! Given capability criteria ("measure temperature of inside air",
//! "switch on a lamp"), the engine finds the device types able to serve
//! them and the exact payload paths doing so. It also maintains the aspect
//! index, narrows device types to service groups, derives the criteria of
//! auto-generated device groups and validates device group mappings.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use devmeta_core::{FilterCriteria, MetadataStore};
//! use devmeta_engine::{EngineConfig, Registry, SelectableQuery};
//!
//! # async fn example(store: Arc<dyn MetadataStore>) -> devmeta_core::RegistryResult<()> {
//! let registry = Registry::new(store, EngineConfig::default());
//! let query = SelectableQuery::new(vec![FilterCriteria::measuring(
//!     "urn:infai:ses:measuring-function:temperature",
//!     "inside_air",
//! )]);
//! for selectable in registry.resolve_selectables(&query).await? {
//!     println!("{}: {:?}", selectable.device_type_id, selectable.service_ids());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aspect_index;
pub mod config;
pub mod expander;
pub mod group_criteria;
pub mod group_mapping;
pub mod matcher;
pub mod reader;
pub mod registry;
pub mod service_group;

pub use aspect_index::{build_nodes, AspectIndex};
pub use config::{EngineConfig, ServiceGroupConfig};
pub use expander::{SelectableExpander, SelectableQuery};
pub use group_mapping::{check_uniform_selection, GroupMappingValidator};
pub use matcher::{CriteriaMatcher, MatchContext, MatchOptions};
pub use reader::Reader;
pub use registry::Registry;
pub use service_group::ServiceGroupModifier;
