//! Client-side synchronization engine.
//!
//! - [`merge`]: incremental history merge
//! - [`cadence`]: drift-corrected polling deadlines
//! - [`supervisor`]: polling loop, visibility gating and subscriptions

pub mod cadence;
pub mod error;
pub mod merge;
pub mod supervisor;

use crate::control::protocol::InterfaceSnapshot;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use cadence::{Cadence, DEFAULT_POLL_INTERVAL};
pub use error::{SyncError, SyncResult};
pub use supervisor::SyncSupervisor;

/// Published snapshot of every known interface, keyed by name.
///
/// Each mutation publishes a new `Arc`; compare with [`Arc::ptr_eq`] to
/// detect change.
pub type DataSet = Arc<BTreeMap<String, InterfaceSnapshot>>;
