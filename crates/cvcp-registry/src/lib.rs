//! # cvcp-registry
//! Per-subject credit-score registry: submission, computation, bounded
//! history, access control, pause and re-entrancy guards, and batch
//! computation.
//!
//! All state lives in an explicit [`SubjectStore`] owned by the
//! [`Registry`]. Every mutating call validates fully before it writes, so a
//! failed call leaves the store untouched. [`SharedRegistry`] serializes
//! calls from many threads.

pub mod access;
pub mod batch;
pub mod config;
pub mod history;
pub mod lock;
pub mod meter;
pub mod registry;
pub mod shared;
pub mod sink;
pub mod state;
pub mod store;

pub use batch::{BatchReport, SkipReason};
pub use config::{BatchFreshness, RegistryConfig, RegistryParameters};
pub use registry::Registry;
pub use shared::SharedRegistry;
pub use sink::{FanoutSink, MemoryEventLog, TracingSink};
pub use state::{RegistryState, StateError};
pub use store::{SubjectRecord, SubjectStore};
