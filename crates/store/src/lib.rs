//! Relational store contract for the entity catalog.
//!
//! The [`CatalogStore`] trait is the seam the reminder core consumes;
//! [`PgCatalogStore`] implements it over PostgreSQL. Any backing store
//! that implements the trait will do.

pub mod catalog;
pub mod error;
pub mod pg;

pub use catalog::CatalogStore;
pub use error::StoreError;
pub use pg::PgCatalogStore;
