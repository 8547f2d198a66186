//! Incremental region partition of a 2D occlusion grid.
//!
//! The grid is cut into fixed-size chunks. Each chunk is flood-filled into
//! regions (connected free cells), region identity lives in a union-find over
//! cells, and regions in neighbouring chunks are tied together by boundary
//! links. Blocking or unblocking a cell only touches the owning chunk and the
//! links around it.

pub mod config;
pub mod error;
pub mod fixed_math;
pub mod graph;
pub mod grid;
#[cfg(feature = "bevy")]
pub mod plugin;
pub mod regions;

pub use config::RegionSystemConfig;
pub use error::{ConfigError, GraphError, PartitionFault, RegionError, SearchError};
pub use grid::{GridPos, OcclusionGrid, RegionKey, UnionFind2D};
pub use regions::{NoPayload, PayloadGenerator, Region, RegionLink, RegionSystem};

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log every 100th value of a running counter when `perf_stats` is enabled.
///
/// ```ignore
/// profile_log!(self.edit_count, "[PERF] {} regions after {} edits", n, self.edit_count);
/// ```
///
/// Without the feature this expands to nothing and the arguments are not evaluated.
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($counter:expr, $($arg:tt)*) => {
        if $counter % 100 == 0 {
            ::tracing::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($counter:expr, $($arg:tt)*) => {};
}
