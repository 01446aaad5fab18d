//! Error types for the sync engine.

use crate::control::ChannelError;
use thiserror::Error;

/// Errors from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No channel is currently published.
    #[error("Not connected to the capture server")]
    NotConnected,
    /// The request failed on the channel.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
