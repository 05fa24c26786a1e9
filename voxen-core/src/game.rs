//! `Game`: the explicit, non-global container that owns C1–C6 (spec §9
//! "Design Notes" — this directly replaces the teacher's `bevy_ecs`
//! world-as-global-resource pattern; see DESIGN.md). Nothing here is a
//! singleton: a caller can construct as many `Game`s as it likes.

use crate::mesh::{ChunkMeshBuilder, MeshArtifact, MeshTracker, DEFAULT_SUBMISSION_DEPTH, INITIAL_LOAD_SUBMISSION_DEPTH};
use crate::path::{AsyncPathfinder, EntityId, EntitySize, Path, RequestId};
use crate::world::chunk::{vertical_chunk_count, ChunkPos, ChunkSnapshot, CHUNK_LENGTH};
use crate::world::registry::BlockRegistry;
use crate::world::{BlockPos, ChannelListener, World};
use crate::error::VoxenError;
use nalgebra::Point3;
use std::sync::Arc;

/// Owns the World Grid, Lighting Engine, Mesh Builder, and Pathfinder for
/// one running instance (spec §9). The main thread drives every method
/// here; workers are only ever reached through `mesh_builder`/`pathfinder`.
pub struct Game {
    world: World,
    lighting: crate::world::lighting::LightingEngine,
    mesh_tracker: MeshTracker,
    mesh_builder: ChunkMeshBuilder,
    pathfinder: AsyncPathfinder,
    change_rx: crossbeam_channel::Receiver<BlockPos>,
    initial_load: bool,
}

impl Game {
    pub fn new(width: i32, height: i32, depth: i32, registry: Arc<BlockRegistry>) -> Result<Self, VoxenError> {
        let mut world = World::new(width, height, depth, registry.clone())?;
        let (tx, change_rx) = crossbeam_channel::unbounded();
        world.add_listener(Box::new(ChannelListener::new(tx)));

        Ok(Self {
            world,
            lighting: crate::world::lighting::LightingEngine::new(),
            mesh_tracker: MeshTracker::new(),
            mesh_builder: ChunkMeshBuilder::new(registry.clone()),
            pathfinder: AsyncPathfinder::new(2, registry),
            change_rx,
            initial_load: true,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    fn chunk_positions(&self) -> Vec<ChunkPos> {
        let cx = self.world.width() / CHUNK_LENGTH;
        let cy = vertical_chunk_count(self.world.height());
        let cz = self.world.depth() / CHUNK_LENGTH;
        let mut out = Vec::with_capacity((cx * cy * cz) as usize);
        for y in 0..cy {
            for z in 0..cz {
                for x in 0..cx {
                    out.push(ChunkPos::new(x, y, z));
                }
            }
        }
        out
    }

    /// Floods initial sky/block light from a freshly populated grid (spec
    /// §6 "initialize_lighting() after world gen") and marks every chunk
    /// dirty for the first mesh pass.
    pub fn initialize_lighting(&mut self) {
        self.lighting.initialize(&mut self.world);
        for chunk in self.chunk_positions() {
            self.mesh_tracker.mark_dirty(chunk);
        }
        // `initialize` bypasses the listener chain (it isn't a `set_tile`
        // edit), so there is nothing queued in `change_rx` to drain here.
    }

    /// Drains every block/light change notified since the last call and
    /// folds it into the lighting queue and the per-chunk dirty set. A
    /// changed cell can affect mesh seams in its 26 neighbour chunks too
    /// (spec §4.1), so the whole 27-chunk neighbourhood is marked dirty.
    fn absorb_change_events(&mut self) {
        let changes: Vec<BlockPos> = self.change_rx.try_iter().collect();
        for pos in changes {
            self.lighting.queue_update_at(&mut self.world, pos.x, pos.y, pos.z);
            for chunk in ChunkPos::containing(pos).neighbourhood_27() {
                self.mesh_tracker.mark_dirty(chunk);
            }
        }
    }

    /// Runs lighting to a fixed budget (spec §5 "Ordering guarantees":
    /// after entity ticks, before mesh submission).
    pub fn process_lighting(&mut self, budget: usize) {
        self.absorb_change_events();
        self.lighting.process_updates(&mut self.world, budget);
        // Lighting can itself enqueue further `light_changed` notifications
        // while draining; fold those into the dirty set before meshing.
        self.absorb_change_events();
    }

    /// Captures a snapshot for, and submits, every chunk the tracker marks
    /// `Dirty`, nearest-to-camera first, honouring the per-frame submission
    /// cap (raised during the very first call after `initialize_lighting`,
    /// spec §4.5 "Submit path").
    pub fn submit_mesh_jobs(&mut self, camera: Point3<f32>) -> Vec<ChunkPos> {
        let cap = if self.initial_load {
            INITIAL_LOAD_SUBMISSION_DEPTH
        } else {
            DEFAULT_SUBMISSION_DEPTH
        };

        let mut candidates = Vec::new();
        for chunk in self.chunk_positions() {
            if !self.mesh_tracker.needs_submission(chunk) {
                continue;
            }
            let origin = chunk.origin();
            let center = Point3::new(
                origin.x as f32 + CHUNK_LENGTH as f32 / 2.0,
                origin.y as f32 + CHUNK_LENGTH as f32 / 2.0,
                origin.z as f32 + CHUNK_LENGTH as f32 / 2.0,
            );
            let priority = (center - camera).norm_squared();
            let snapshot = ChunkSnapshot::capture(&self.world, chunk);
            candidates.push((chunk, snapshot, priority));
        }

        let remaining_dirty = candidates.len() > cap;
        let accepted = self.mesh_builder.submit_up_to(candidates, cap);
        for &chunk in &accepted {
            self.mesh_tracker.mark_building(chunk);
        }
        if !remaining_dirty {
            self.initial_load = false;
        }
        accepted
    }

    /// Drains completed meshes, discarding any whose chunk was unloaded
    /// mid-build and re-queuing (as `Dirty`) any edited mid-build (spec
    /// §4.5 "State machine per chunk").
    pub fn drain_mesh_completions(&mut self) -> Vec<MeshArtifact> {
        self.mesh_builder
            .drain()
            .into_iter()
            .filter(|artifact| self.mesh_tracker.mark_drained(artifact.chunk))
            .collect()
    }

    /// Marks a chunk as having left the render distance; any in-flight
    /// build for it is discarded on drain instead of uploaded.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) {
        self.mesh_tracker.mark_unloaded(chunk);
    }

    pub fn queue_path_request(
        &self,
        entity: EntityId,
        start: BlockPos,
        target: BlockPos,
        size: EntitySize,
        max_distance: f32,
    ) -> RequestId {
        self.pathfinder.queue_request(&self.world, entity, start, target, size, max_distance)
    }

    pub fn cancel_path_requests(&self, entity: EntityId) {
        self.pathfinder.cancel_requests(entity);
    }

    pub fn has_pending_path(&self, entity: EntityId) -> bool {
        self.pathfinder.has_pending(entity)
    }

    pub fn drain_path_completions(&self) -> Vec<(EntityId, RequestId, Option<Path>)> {
        self.pathfinder
            .drain()
            .into_iter()
            .map(|completion| (completion.entity, completion.id, completion.path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn flat_game(width: i32, height: i32, depth: i32) -> Game {
        let registry = Arc::new(BlockRegistry::stub());
        let mut game = Game::new(width, height, depth, registry).unwrap();
        let stone = game.world().registry().get_id("stone");
        for x in 0..width {
            for z in 0..depth {
                game.world_mut().set_tile(x, 0, z, stone, 0);
            }
        }
        game.initialize_lighting();
        game
    }

    /// End-to-end scenario 1 (spec §8): torch in a stone-walled cave pocket
    /// lights its neighbours with a one-per-step falloff.
    #[test]
    fn place_torch_in_cave_lights_neighbours() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut game = Game::new(16, 16, 16, registry).unwrap();
        let stone = game.world().registry().get_id("stone");
        for x in 0..16 {
            for y in 0..16 {
                for z in 0..16 {
                    game.world_mut().set_tile(x, y, z, stone, 0);
                }
            }
        }
        for x in 7..=9 {
            for y in 7..=9 {
                for z in 7..=9 {
                    game.world_mut().set_tile(x, y, z, crate::world::registry::AIR, 0);
                }
            }
        }
        game.initialize_lighting();

        let torch = game.world().registry().get_id("torch");
        game.world_mut().set_tile(8, 8, 8, torch, 0);
        game.process_lighting(1_000_000);

        assert_eq!(game.world().get_block_light(8, 8, 8), 14);
        assert_eq!(game.world().get_block_light(9, 8, 8), 13);
    }

    /// End-to-end scenario 2: breaking a ceiling lets sky light back into
    /// the column below it.
    #[test]
    fn break_ceiling_lets_sky_in() {
        // A single stone "ceiling" block over an otherwise open shaft: the
        // room below is dark until that one block is broken.
        let registry = Arc::new(BlockRegistry::stub());
        let mut game = Game::new(16, 16, 16, registry).unwrap();
        let stone = game.world().registry().get_id("stone");
        game.world_mut().set_tile(5, 10, 5, stone, 0);
        game.initialize_lighting();
        assert_eq!(game.world().get_sky_light(5, 5, 5), 0);

        game.world_mut().set_tile(5, 10, 5, crate::world::registry::AIR, 0);
        game.process_lighting(1_000_000);

        assert_eq!(game.world().get_sky_light(5, 5, 5), 15);
    }

    /// End-to-end scenario 3: an edit dirties, builds, and uploads its
    /// chunk, matching the reference mesher over the post-edit snapshot.
    #[test]
    fn rebuild_chunk_after_edit() {
        // 16x8x16 is exactly one chunk, so the initial settle pass is a
        // single submit/drain round-trip.
        let mut game = flat_game(16, 8, 16);
        let camera = Point3::new(8.0, 4.0, 8.0);

        game.submit_mesh_jobs(camera);
        let settle_deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if !game.drain_mesh_completions().is_empty() {
                break;
            }
            assert!(Instant::now() < settle_deadline, "initial mesh pass did not settle in time");
            std::thread::yield_now();
        }

        let stone = game.world().registry().get_id("stone");
        game.world_mut().set_tile(10, 1, 10, stone, 0);
        game.process_lighting(1_000_000);

        let chunk = ChunkPos::containing(BlockPos::new(10, 1, 10));
        assert_eq!(game.mesh_tracker.state(chunk), crate::mesh::ChunkMeshState::Dirty);

        let accepted = game.submit_mesh_jobs(camera);
        assert!(accepted.contains(&chunk));

        let deadline = Instant::now() + Duration::from_secs(5);
        let artifact = loop {
            if let Some(artifact) = game.drain_mesh_completions().into_iter().find(|a| a.chunk == chunk) {
                break artifact;
            }
            assert!(Instant::now() < deadline, "mesh did not complete in time");
            std::thread::yield_now();
        };

        let snapshot = ChunkSnapshot::capture(game.world(), chunk);
        let reference = crate::mesh::generation::mesh_chunk(chunk, &snapshot, game.world().registry());
        assert!(crate::mesh::reference::artifacts_equivalent(&artifact, &reference));
    }

    /// End-to-end scenario 4: a pathfinding request routes around a wall
    /// rather than through it.
    #[test]
    fn path_goes_around_wall() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(32, 8, 32, registry.clone()).unwrap();
        let stone = world.registry().get_id("stone");
        for x in 0..32 {
            for z in 0..32 {
                world.set_tile(x, 0, z, stone, 0);
            }
        }
        for z in 0..32 {
            for y in 1..=3 {
                world.set_tile(10, y, z, stone, 0);
            }
        }

        let pathfinder = AsyncPathfinder::new(1, registry);
        let size = EntitySize { x: 1, y: 2, z: 1 };
        pathfinder.queue_request(&world, 1, BlockPos::new(5, 1, 15), BlockPos::new(15, 1, 15), size, 60.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let path = loop {
            if let Some(completion) = pathfinder.drain().into_iter().find(|c| c.entity == 1) {
                break completion.path.expect("a path around the wall should exist");
            }
            assert!(Instant::now() < deadline, "pathfinder did not complete in time");
            std::thread::yield_now();
        };

        let crossed_wall_illegally = path.waypoints.iter().any(|wp| wp.x == 10 && (0..32).contains(&wp.z));
        assert!(!crossed_wall_illegally);
    }

    /// End-to-end scenario 5: a second request for the same entity
    /// supersedes the first; after drain exactly one result is observed.
    #[test]
    fn path_supersession_yields_exactly_one_result() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(16, 8, 16, registry.clone()).unwrap();
        let stone = world.registry().get_id("stone");
        for x in 0..16 {
            for z in 0..16 {
                world.set_tile(x, 0, z, stone, 0);
            }
        }

        let pathfinder = AsyncPathfinder::new(1, registry);
        let size = EntitySize { x: 1, y: 2, z: 1 };
        pathfinder.queue_request(&world, 9, BlockPos::new(2, 1, 2), BlockPos::new(13, 1, 13), size, 40.0);
        let second = pathfinder.queue_request(&world, 9, BlockPos::new(2, 1, 2), BlockPos::new(3, 1, 2), size, 40.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        std::thread::sleep(Duration::from_millis(50));
        let mut results = Vec::new();
        while Instant::now() < deadline && results.is_empty() {
            results = pathfinder.drain().into_iter().filter(|c| c.entity == 9).collect::<Vec<_>>();
            if results.is_empty() {
                std::thread::yield_now();
            }
        }

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, second);
        assert!(!pathfinder.has_pending(9));
    }

    /// End-to-end scenario 6: removing a torch returns the whole region to
    /// darkness.
    #[test]
    fn removing_torch_returns_region_to_darkness() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut game = Game::new(16, 16, 16, registry).unwrap();
        game.initialize_lighting();

        let torch = game.world().registry().get_id("torch");
        game.world_mut().set_tile(8, 8, 8, torch, 0);
        game.process_lighting(1_000_000);
        assert!(game.world().get_block_light(8, 8, 8) > 0);

        game.world_mut().set_tile(8, 8, 8, crate::world::registry::AIR, 0);
        game.process_lighting(1_000_000);

        for x in 0..16 {
            for y in 0..16 {
                for z in 0..16 {
                    assert_eq!(game.world().get_block_light(x, y, z), 0);
                }
            }
        }
    }
}
