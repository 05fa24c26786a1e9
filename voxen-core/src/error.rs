//! Programmer-facing construction errors.
//!
//! Per-cell and per-request operations never return `Result` — they return
//! sentinels as specified (`None`, `false`, a clamped value). `VoxenError`
//! exists only for the handful of construction-time failures that are
//! genuine misuse rather than expected runtime conditions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxenError {
    #[error("world dimensions {width}x{height}x{depth} invalid: width/depth must be a positive multiple of 16 and height must be in 1..=128")]
    InvalidDimensions {
        width: i32,
        height: i32,
        depth: i32,
    },

    #[error("failed to load block registry from {path}: {reason}")]
    RegistryLoad { path: String, reason: String },
}
