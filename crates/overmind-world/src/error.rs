//! Error types for the `overmind-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

/// Errors raised while observing the world or querying terrain.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The terrain oracle cannot answer right now.
    #[error("terrain oracle unavailable: {reason}")]
    TerrainUnavailable {
        /// Why the oracle failed.
        reason: String,
    },

    /// The snapshot provider failed to produce an observation.
    #[error("snapshot provider failed: {reason}")]
    ProviderFailed {
        /// Why the provider failed.
        reason: String,
    },

    /// A terrain grid was constructed with invalid dimensions.
    #[error("invalid terrain grid {width}x{height}")]
    InvalidGrid {
        /// Requested width in cells.
        width: u32,
        /// Requested height in cells.
        height: u32,
    },
}
