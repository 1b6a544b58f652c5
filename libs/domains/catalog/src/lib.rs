//! Catalog Domain
//!
//! Read-side access to the relational perfume catalog. This crate exposes the
//! catalog as fully materialized aggregate snapshots so consumers (the search
//! indexing pipeline in particular) never touch lazy association loading.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ CatalogReadRepository│  ← Read port (trait)
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ PgCatalogRepository  │  ← sea-orm implementation
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │       Entities       │  ← perfumes, brands, notes, accords, designers
//! └──────────────────────┘
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

// Re-export commonly used types
pub use error::{CatalogError, CatalogResult};
pub use models::{
    AccordRef, BrandRef, Concentration, DesignerAssociation, DesignerRole, MemberRating,
    NoteAssociation, NoteType, PerfumeAggregate,
};
pub use postgres::PgCatalogRepository;
pub use repository::CatalogReadRepository;
