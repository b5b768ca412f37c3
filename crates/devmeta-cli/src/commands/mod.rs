//! Command implementations for devmeta

pub mod aspects;
pub mod describe;
pub mod groups;
pub mod ids;
pub mod selectables;

pub use aspects::aspect_nodes;
pub use describe::{device, device_type, function};
pub use groups::{group_criteria, validate_group};
pub use ids::split_id;
pub use selectables::{selectables, SelectablesArgs};
