//! Shared data models for the registry

mod aspect;
mod content;
mod criteria;
mod device;
mod device_group;
mod device_type;
mod function;
mod selectable;

pub use aspect::*;
pub use content::*;
pub use criteria::*;
pub use device::*;
pub use device_group::*;
pub use device_type::*;
pub use function::*;
pub use selectable::*;

/// Treats `Some("")` like `None`; catalogs written by other tools use empty
/// strings for unset references.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
