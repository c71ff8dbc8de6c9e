//! `catsync-recon`: catalog reconciliation engine.
//!
//! Pure engine crate: receives pre-fetched catalogs, returns a queue of
//! field-level corrections and replays it through an applier.
//! No network or filesystem IO.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod model;
pub mod queue;

pub use catalog::ResourceType;
pub use config::MappingConfig;
pub use engine::{index_by_name, prepare_updates, MatchSummary};
pub use error::{ApplyError, MappingError, StoreError, TransformError};
pub use mapping::{Mapping, MappingEntry, Transform, ValidatedMapping};
pub use model::{FieldValue, SourceRecord, TargetRecord};
pub use queue::{
    apply_updates, Applier, ApplyOptions, ApplySummary, ChangeRecord, QueueStats, QueueStore,
    UpdateQueue, UpdateStatus,
};
