//! Chunked region partition with boundary links.

pub mod link_index;
pub mod region_graph;
pub mod system;
pub mod types;

pub use link_index::LinkIndex;
pub use region_graph::RegionGraph;
pub use system::{RegionStats, RegionSystem};
pub use types::{ChunkId, LinkDirection, NoPayload, PayloadGenerator, Region, RegionLink};

#[cfg(test)]
mod tests;
