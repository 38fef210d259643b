//! Core delivery engine: append-only log storage, per-(log, group)
//! consumption state, exclusive time-bounded leases, and the orchestrator
//! that composes them into `acquire_next`/`settle`. This crate has no
//! network or CLI surface; see the `protocol` and `server` crates for that.

pub mod error;
pub mod lease;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod storage;

pub use error::{Error, Result};
pub use lease::{Lease, LeaseManager};
pub use model::{Message, Metadata, MessageState, Value};
pub use orchestrator::{Orchestrator, DEFAULT_MAX_RETRIES};
pub use registry::{ReaperHandle, Registry};
pub use state::StateStore;
pub use storage::Storage;
