//! Search Domain
//!
//! The search-and-recommendation indexing pipeline: projects relational
//! perfume aggregates into denormalized search documents, keeps that
//! projection eventually consistent with relational writes via domain
//! events, and answers keyword/similarity/recommendation queries.
//!
//! # Architecture
//!
//! ```text
//!  relational write ──► PerfumeEvent ──► PerfumeEventWorker ─┐
//!                                                            │
//!  IndexingScheduler (daily reindex, weekly preferences) ────┤
//!                                                            ▼
//!                                                    IndexingService
//!                                                            │ mapper
//!                                                            ▼
//!  HTTP caller ──► SearchService ──► SearchRepository ──► document store
//! ```
//!
//! Consistency model: at-least-once, possibly reordered event delivery plus
//! idempotent full-replace writes. The scheduled reindex reconciles whatever
//! the event path got wrong within one period.

pub mod analysis;
pub mod criteria;
pub mod document;
pub mod error;
pub mod events;
pub mod handlers;
pub mod indexer;
pub mod mapper;
pub mod mongo;
pub mod preferences;
pub mod query;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod sync;

// Re-export commonly used types
pub use analysis::{PreferenceAnalysisService, RecomputeReport};
pub use criteria::{SearchCriteria, SortBy};
pub use document::{AccordFacet, DesignerFacet, NoteFacet, PerfumeDocument, SearchPage};
pub use error::{SearchError, SearchResult};
pub use events::{PerfumeEvent, PerfumeEventKind};
pub use handlers::{IndexingApiDoc, SearchApiDoc};
pub use indexer::{IndexingService, ReindexReport};
pub use mongo::{MongoPreferenceRepository, MongoSearchRepository};
pub use preferences::{MemberPreferences, PreferenceRepository, PreferenceVector};
pub use repository::SearchRepository;
pub use scheduler::{IndexingScheduler, ScheduleConfig};
pub use service::SearchService;
pub use sync::{PerfumeEventPublisher, PerfumeEventWorker, SyncConfig};
