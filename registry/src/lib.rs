//! Read-only lookup client for projects, versions and their relationships.
//!
//! The gateway treats persistence as an external collaborator: it only ever
//! asks "what project has this slug", "what are this parent's subproject
//! relationships", "what translation of this project uses this language" and
//! "what version of this project has this slug". This crate answers those
//! questions either from an in-process catalog (loaded once from a YAML
//! projects file) or from a remote registry service over HTTP, behind a
//! single [`client::Registry`] type.

pub mod catalog;
pub mod client;
pub mod types;

pub use catalog::{Catalog, CatalogError};
pub use client::{ClientError, Registry};
pub use types::{Project, Relationship, Version};
