//! devmeta-store - In-memory metadata store
//!
//! A thread-safe [`MemoryStore`] implementing the registry's
//! [`MetadataStore`](devmeta_core::MetadataStore) boundary, loadable from a
//! YAML or JSON catalog file.
//!
//! # Catalog files
//!
//! ```yaml
//! meta:
//!   name: Demo catalog
//!   version: "1.0"
//!
//! aspects:
//!   - id: air
//!     name: Air
//!     sub_aspects:
//!       - id: inside_air
//!         name: Inside Air
//!
//! functions:
//!   - id: "urn:infai:ses:measuring-function:temperature"
//!     name: Get Temperature
//!
//! device_types:
//!   - id: thermometer
//!     name: Thermometer
//!     device_class_id: thermometer
//!     services:
//!       - id: get_temp
//!         interaction: request
//!         outputs:
//!           - id: c1
//!             content_variable:
//!               id: v1
//!               name: temperature
//!               type: "https://schema.org/Float"
//!               function_id: "urn:infai:ses:measuring-function:temperature"
//!               aspect_id: inside_air
//!
//! devices:
//!   - id: device-1
//!     name: Living room thermometer
//!     device_type_id: thermometer
//! ```
//!
//! Aspect nodes are not part of the catalog. They are derived by rebuilding
//! the aspect index after loading.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{CatalogFile, CatalogMeta, MemoryStore};
