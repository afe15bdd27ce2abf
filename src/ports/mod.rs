//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Persistence
//!
//! - `RecordStore` - Key-value storage for profiles, favorites and sessions
//!
//! ## Collaborators
//!
//! - `CatalogSource` - Read-only recipe catalog
//! - `MenuExporter` - Renders a finished plan to a document
//! - `DishDescriber` - Optional dish descriptions for the recipe view

mod catalog_source;
mod dish_describer;
mod menu_exporter;
mod record_store;

pub use catalog_source::{apply_filter, CatalogError, CatalogSource};
pub use dish_describer::{DescribeError, DishDescriber};
pub use menu_exporter::{ExportError, MenuExporter};
pub use record_store::{stamp_record, RecordKind, RecordStore, StoreError, CREATED_AT, UPDATED_AT};

pub use crate::domain::planning::{ExportFormat, ExportedDocument};
