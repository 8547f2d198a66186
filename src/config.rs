use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

use crate::error::ConfigError;
use crate::fixed_math::{FixedNum, FixedVec2};
use crate::grid::{GridCoordinateConverter, GridPos};

/// Grid geometry plus the settings of the soak run.
///
/// Loaded from RON (`assets/region_config.ron` by default). Geometry must satisfy
/// [`validate_extents`]; the soak fields are only read by the binary.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RegionSystemConfig {
    // Geometry
    pub grid_width: i32,
    pub grid_height: i32,
    pub chunk_width: i32,
    pub chunk_height: i32,

    // World mapping
    pub cell_size: f32,
    pub origin_x: f32,
    pub origin_y: f32,

    // Soak run
    pub soak_edits: usize,
    pub soak_seed: u64,
    /// Chance that a random edit blocks rather than frees its cell.
    pub soak_block_probability: f64,
    /// Run the full partition check every this many edits (0 = only at the end).
    pub soak_verify_interval: usize,
}

impl Default for RegionSystemConfig {
    fn default() -> Self {
        Self {
            grid_width: 128,
            grid_height: 128,
            chunk_width: 16,
            chunk_height: 16,
            cell_size: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            soak_edits: 20_000,
            soak_seed: 0x5EED,
            soak_block_probability: 0.6,
            soak_verify_interval: 1_000,
        }
    }
}

impl RegionSystemConfig {
    #[inline]
    pub fn grid_extent(&self) -> GridPos {
        GridPos::new(self.grid_width, self.grid_height)
    }

    #[inline]
    pub fn chunk_extent(&self) -> GridPos {
        GridPos::new(self.chunk_width, self.chunk_height)
    }

    /// Checks geometry and the world mapping, returning the chunk counts.
    ///
    /// Cell size and origin must be representable as [`FixedNum`], and the cell
    /// size must stay positive after conversion.
    pub fn validate(&self) -> Result<GridPos, ConfigError> {
        match FixedNum::checked_from_num(self.cell_size) {
            Some(cell) if cell > FixedNum::ZERO => {}
            _ => return Err(ConfigError::InvalidCellSize(self.cell_size)),
        }
        if FixedNum::checked_from_num(self.origin_x).is_none()
            || FixedNum::checked_from_num(self.origin_y).is_none()
        {
            return Err(ConfigError::InvalidOrigin {
                x: self.origin_x,
                y: self.origin_y,
            });
        }
        validate_extents(self.grid_extent(), self.chunk_extent())
    }

    pub fn coordinate_converter(&self) -> GridCoordinateConverter {
        let cell = FixedNum::from_num(self.cell_size);
        GridCoordinateConverter::new(
            FixedVec2::from_f32(self.origin_x, self.origin_y),
            self.grid_extent(),
            FixedVec2::new(cell, cell),
        )
    }
}

/// Checks grid/chunk geometry and returns the number of chunks along each axis.
pub fn validate_extents(grid: GridPos, chunk: GridPos) -> Result<GridPos, ConfigError> {
    if grid.x <= 0 || grid.y <= 0 {
        return Err(ConfigError::InvalidGridExtent {
            width: grid.x,
            height: grid.y,
        });
    }
    if chunk.x <= 0 || chunk.y <= 0 {
        return Err(ConfigError::InvalidChunkExtent {
            width: chunk.x,
            height: chunk.y,
        });
    }
    if grid.x % chunk.x != 0 || grid.y % chunk.y != 0 {
        return Err(ConfigError::ChunkMismatch { grid, chunk });
    }
    Ok(GridPos::new(grid.x / chunk.x, grid.y / chunk.y))
}

/// Read and validate a RON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RegionSystemConfig, ConfigError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: shown.clone(),
        source,
    })?;
    let config: RegionSystemConfig = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: shown.clone(),
        source,
    })?;
    config.validate()?;
    info!("[CONFIG] Loaded region config from {}", shown);
    Ok(config)
}

/// [`load_config`], falling back to the defaults when the file is missing or invalid.
pub fn load_config_or_default(path: impl AsRef<Path>) -> RegionSystemConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            error!("[CONFIG] {}", e);
            error!("[CONFIG] Using default RegionSystemConfig");
            RegionSystemConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RegionSystemConfig::default();
        assert_eq!(config.validate().unwrap(), GridPos::new(8, 8));
    }

    #[test]
    fn test_extent_validation() {
        let ok = validate_extents(GridPos::new(8, 4), GridPos::new(4, 2)).unwrap();
        assert_eq!(ok, GridPos::new(2, 2));

        assert!(matches!(
            validate_extents(GridPos::new(0, 4), GridPos::new(4, 2)),
            Err(ConfigError::InvalidGridExtent { .. })
        ));
        assert!(matches!(
            validate_extents(GridPos::new(8, 4), GridPos::new(4, -1)),
            Err(ConfigError::InvalidChunkExtent { .. })
        ));
        assert!(matches!(
            validate_extents(GridPos::new(8, 5), GridPos::new(4, 2)),
            Err(ConfigError::ChunkMismatch { .. })
        ));
    }

    #[test]
    fn test_world_mapping_must_survive_fixed_point() {
        let tiny = RegionSystemConfig {
            cell_size: 1e-6,
            ..Default::default()
        };
        assert!(matches!(tiny.validate(), Err(ConfigError::InvalidCellSize(_))));

        for cell_size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = RegionSystemConfig {
                cell_size,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "cell size {cell_size} accepted");
        }

        let far = RegionSystemConfig {
            origin_x: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(far.validate(), Err(ConfigError::InvalidOrigin { .. })));
        let nan = RegionSystemConfig {
            origin_y: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::InvalidOrigin { .. })));

        // Smallest accepted cell size still maps the origin to cell (0, 0).
        let fine = RegionSystemConfig {
            cell_size: 1e-4,
            ..Default::default()
        };
        assert!(fine.validate().is_ok());
        let converter = fine.coordinate_converter();
        assert_eq!(
            converter.world_to_grid(FixedVec2::from_f32(0.0, 0.0)),
            Some(GridPos::new(0, 0))
        );
    }

    #[test]
    fn test_parse_partial_ron_uses_defaults() {
        let config: RegionSystemConfig =
            ron::from_str("(grid_width: 32, grid_height: 16, chunk_width: 8, chunk_height: 8)")
                .unwrap();
        assert_eq!(config.grid_extent(), GridPos::new(32, 16));
        assert_eq!(config.soak_seed, RegionSystemConfig::default().soak_seed);
        assert_eq!(config.validate().unwrap(), GridPos::new(4, 2));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_config("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("does/not/exist.ron"));

        let fallback = load_config_or_default("does/not/exist.ron");
        assert_eq!(fallback, RegionSystemConfig::default());
    }

    #[test]
    fn test_bundled_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/region_config.ron");
        let config = load_config(path).expect("bundled config must be valid");
        assert!(config.soak_edits > 0);
    }
}
