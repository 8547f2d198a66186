//! Bevy integration: the region system as a resource, fed by occlusion edit messages.

use bevy::prelude::*;
use std::marker::PhantomData;
use tracing::{error, info, warn};

use crate::config::RegionSystemConfig;
use crate::grid::GridPos;
use crate::regions::{PayloadGenerator, RegionSystem};

/// Request to block (`occluded = true`) or free one cell.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcclusionEdit {
    pub pos: GridPos,
    pub occluded: bool,
}

#[derive(Resource, Deref, DerefMut)]
pub struct RegionMap<P: Send + Sync + 'static, G: Send + Sync + 'static>(pub RegionSystem<P, G>);

/// Edits applied during the last update, for systems that cache region queries.
#[derive(Resource, Default, Debug)]
pub struct RegionEditCount {
    pub last_frame: usize,
    pub total: u64,
}

pub struct RegionSystemPlugin<P, G> {
    pub config: RegionSystemConfig,
    pub generator: G,
    _payload: PhantomData<fn() -> P>,
}

impl<P, G> RegionSystemPlugin<P, G> {
    pub fn new(config: RegionSystemConfig, generator: G) -> Self {
        Self {
            config,
            generator,
            _payload: PhantomData,
        }
    }
}

impl<P, G> Plugin for RegionSystemPlugin<P, G>
where
    P: Send + Sync + 'static,
    G: PayloadGenerator<P> + Clone + Send + Sync + 'static,
{
    fn build(&self, app: &mut App) {
        let system = match RegionSystem::from_config(&self.config, self.generator.clone()) {
            Ok(system) => system,
            Err(e) => {
                error!("[CONFIG] Rejected region config: {}", e);
                panic!("[CONFIG] invalid region config: {e}");
            }
        };
        info!(
            "[REGIONS] Plugin ready with {} regions",
            system.regions().len()
        );

        app.add_message::<OcclusionEdit>();
        app.insert_resource(RegionMap(system));
        app.init_resource::<RegionEditCount>();
        app.add_systems(Update, apply_occlusion_edits::<P, G>);
    }
}

fn apply_occlusion_edits<P, G>(
    mut edits: MessageReader<OcclusionEdit>,
    mut map: ResMut<RegionMap<P, G>>,
    mut count: ResMut<RegionEditCount>,
) where
    P: Send + Sync + 'static,
    G: PayloadGenerator<P> + Send + Sync + 'static,
{
    count.last_frame = 0;
    if edits.is_empty() {
        return;
    }

    for edit in edits.read() {
        match map.set_occlusion(edit.pos, edit.occluded) {
            Ok(true) => count.last_frame += 1,
            Ok(false) => {}
            Err(e) => warn!("[REGIONS] Dropped occlusion edit: {}", e),
        }
    }
    count.total += count.last_frame as u64;
}

/// Region key lookup that treats out-of-grid positions like blocked cells.
pub fn region_at<P, G>(map: &RegionMap<P, G>, pos: GridPos) -> Option<GridPos>
where
    P: Send + Sync + 'static,
    G: PayloadGenerator<P> + Send + Sync + 'static,
{
    let key = map.region_key(pos);
    key.is_some().then(|| key.pos())
}
