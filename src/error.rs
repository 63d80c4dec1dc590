//! Error types for fog construction and configuration.

use thiserror::Error;

/// Errors raised while building or validating the fog of war.
///
/// Neighbor and offset lookups never produce an error: they return `None`
/// and the caller treats the cell as absent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FogError {
    /// The logical grid needs at least one column and one row.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGridSize { width: i64, height: i64 },

    /// The proxy window must be positive, odd on both axes and fit on the map.
    #[error("window {window_width}x{window_height} does not fit a {map_width}x{map_height} map: {reason}")]
    WindowCapacity {
        window_width: i64,
        window_height: i64,
        map_width: i64,
        map_height: i64,
        reason: &'static str,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {message}")]
    ConfigRead { path: String, message: String },

    /// The configuration file is not valid TOML for `FogConfig`.
    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    /// A proxy and a logical cell disagree about their binding.
    #[error("stale binding between proxy {proxy} and cell {cell}")]
    StaleBinding { proxy: usize, cell: usize },
}

/// Result alias used across the crate.
pub type FogResult<T> = Result<T, FogError>;
