//! devmeta-core - Core models, errors and store traits for the device metadata registry
//!
//! This crate provides the data model shared by every part of the registry
//! (aspects, functions, device types, devices, device groups and matching
//! results), the read-model boundary that storage backends implement, and
//! the codec for composite ("modified") resource identifiers.

pub mod error;
pub mod modifier;
pub mod models;
pub mod store;

pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use modifier::{Modifier, ModifierParameters};
pub use models::*;
pub use store::{DeviceTypeQuery, DeviceTypeSort, MetadataStore};
