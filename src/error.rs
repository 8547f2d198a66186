use thiserror::Error;

use crate::grid::GridPos;

/// Invalid grid/chunk geometry or an unreadable configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid extent must be positive in both axes, got {width}x{height}")]
    InvalidGridExtent { width: i32, height: i32 },
    #[error("chunk extent must be positive in both axes, got {width}x{height}")]
    InvalidChunkExtent { width: i32, height: i32 },
    #[error("grid extent {grid:?} is not a multiple of chunk extent {chunk:?}")]
    ChunkMismatch { grid: GridPos, chunk: GridPos },
    #[error("cell size must be positive in fixed point, got {0}")]
    InvalidCellSize(f32),
    #[error("world origin ({x}, {y}) is not representable in fixed point")]
    InvalidOrigin { x: f32, y: f32 },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Structural misuse of an [`AdjacencyGraph`](crate::graph::AdjacencyGraph).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} is already in the graph")]
    DuplicateNode(String),
    #[error("edge {0} -> {1} is already in the graph")]
    DuplicateEdge(String, String),
    #[error("self loops are not allowed ({0})")]
    SelfLoop(String),
}

/// Rejected search or expansion arguments.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("search source is not in the graph")]
    SourceNotInGraph,
    #[error("result limit must be -1 (unlimited) or non-negative, got {0}")]
    InvalidResultLimit(i64),
    #[error("max cost must be non-negative, got {0}")]
    NegativeMaxCost(f32),
}

/// Errors from [`RegionSystem`](crate::regions::RegionSystem) operations.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("cell {0:?} is outside the grid")]
    OutOfBounds(GridPos),
}

/// A broken partition invariant, reported by
/// [`RegionSystem::verify_partition`](crate::regions::RegionSystem::verify_partition).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionFault {
    #[error("free cell {0:?} has no region key")]
    UnkeyedFreeCell(GridPos),
    #[error("occluded cell {0:?} still has region key {1:?}")]
    KeyedOccludedCell(GridPos, GridPos),
    #[error("cell {cell:?} points at {key:?}, which is not a registered region")]
    UnknownRegion { cell: GridPos, key: GridPos },
    #[error("region {key:?} records {recorded} cells but owns {actual}")]
    CellCountMismatch {
        key: GridPos,
        recorded: usize,
        actual: usize,
    },
    #[error("cell {cell:?} of region {key:?} lies outside the region's chunk")]
    RegionCrossesChunk { cell: GridPos, key: GridPos },
    #[error("link {link} lists {count} regions after relink")]
    UnpairedLink { link: String, count: usize },
}
