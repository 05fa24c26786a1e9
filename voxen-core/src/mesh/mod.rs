//! Chunk Mesh Builder (C5, spec §4.5), grounded on the teacher's
//! `MesherContext` (a `rayon::ThreadPool` plus a `crossbeam_channel` of
//! completed meshes) but replacing the plain pool with a priority queue so
//! the nearest-to-camera dirty chunk is always built first, and replacing
//! glium's `UploadableMesh` with a GPU-API-agnostic vertex/index buffer pair
//! since this crate owns no renderer.

pub mod generation;
#[cfg(test)]
pub mod reference;
pub mod tracker;

pub use generation::mesh_chunk;
pub use tracker::{ChunkMeshState, MeshTracker};

use crate::world::chunk::ChunkPos;
use crate::world::chunk::ChunkSnapshot;
use crate::world::registry::BlockRegistry;
use crate::Side;
use crossbeam_channel::{Receiver, Sender};
use nalgebra::Vector3;
use ordered_float::NotNan;
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// Per-tick submission caps (spec §4.5 "Submission"): a steady-state tick
/// only ever enqueues a handful of rebuilds, but the very first tick after
/// `Game::new` needs to flush every chunk at once.
pub const DEFAULT_SUBMISSION_DEPTH: usize = 16;
pub const INITIAL_LOAD_SUBMISSION_DEPTH: usize = 256;

/// Which draw pass a triangle belongs to; routed by [`generation::mesh_chunk`]
/// from each block's shape and liquid flag.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MeshLayer {
    Solid,
    Cutout,
    Translucent,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshLayerData {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

/// The full output of meshing one chunk: three independently drawable
/// vertex/index buffers (spec §4.5 "Layers").
#[derive(Clone, Debug, PartialEq)]
pub struct MeshArtifact {
    pub chunk: ChunkPos,
    pub solid: MeshLayerData,
    pub cutout: MeshLayerData,
    pub translucent: MeshLayerData,
}

/// A packed terrain vertex: two `u32`s carrying position, ambient
/// occlusion, light, side, and block id, grounded directly on the
/// teacher's `TerrainVertex` bit layout (`pos_ao`/`light_side_id`) since
/// that layout pre-dates and is independent of glium.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct TerrainVertex {
    /// `xxxx xXXX XXyy yyyY YYYY zzzz zZZZ ZZAA`: position at 5 bits of
    /// integer precision plus 5 bits of sub-block fraction, then 2 bits AO.
    pub pos_ao: u32,
    /// `SSSS BBBB .... .DSS IIII IIII IIII IIII`: sky/block light nibbles,
    /// packed side, then a 16-bit block id.
    pub light_side_id: u32,
}

fn pack_side(side: Side) -> u8 {
    match side {
        Side::Top => 0b001,
        Side::Left => 0b000,
        Side::Front => 0b010,
        Side::Bottom => 0b101,
        Side::Right => 0b100,
        Side::Back => 0b110,
    }
}

impl TerrainVertex {
    /// `pos` is in fractional block units relative to the chunk's local
    /// origin (so a cross-quad corner at `0.06` sub-block offset packs
    /// exactly, not just whole-block positions).
    pub fn pack(pos: Vector3<f32>, side: Side, sky_light: u8, block_light: u8, id: u16, ao: u8) -> Self {
        let to_fixed = |v: f32| -> u16 { (v * 32.0).round().clamp(0.0, 2047.0) as u16 };
        let (x, y, z) = (to_fixed(pos.x), to_fixed(pos.y), to_fixed(pos.z));

        let mut pos_ao = 0u32;
        pos_ao |= x as u32 & 0x7ff;
        pos_ao <<= 10;
        pos_ao |= y as u32 & 0x7ff;
        pos_ao <<= 10;
        pos_ao |= z as u32 & 0x7ff;
        pos_ao <<= 2;
        pos_ao |= ao as u32 & 0x3;

        let mut light = 0u32;
        light |= ((sky_light & 0xf) as u32) << 4;
        light |= (block_light & 0xf) as u32;

        let mut light_side_id = 0u32;
        light_side_id |= light << 8;
        light_side_id |= pack_side(side) as u32;
        light_side_id <<= 16;
        light_side_id |= id as u32;

        Self { pos_ao, light_side_id }
    }
}

struct Job {
    chunk: ChunkPos,
    snapshot: ChunkSnapshot,
    priority: NotNan<f32>,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for Job {}
impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Job {
    /// Reversed so `std::collections::BinaryHeap` (a max-heap) pops the
    /// *smallest* squared camera distance first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority)
    }
}

struct Shared {
    queue: BinaryHeap<Job>,
    building: HashSet<ChunkPos>,
    shutdown: bool,
}

/// Priority-queued mesh builder on a pool of OS threads (spec §5
/// "Scheduling model": `max(1, cores - 1)` workers).
pub struct ChunkMeshBuilder {
    registry: Arc<BlockRegistry>,
    shared: Arc<(Mutex<Shared>, Condvar)>,
    completed_tx: Sender<MeshArtifact>,
    completed_rx: Receiver<MeshArtifact>,
    workers: Vec<std::thread::JoinHandle<()>>,
}

impl ChunkMeshBuilder {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        let worker_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2).saturating_sub(1).max(1);
        Self::with_worker_count(registry, worker_count)
    }

    pub fn with_worker_count(registry: Arc<BlockRegistry>, worker_count: usize) -> Self {
        let shared = Arc::new((
            Mutex::new(Shared {
                queue: BinaryHeap::new(),
                building: HashSet::new(),
                shutdown: false,
            }),
            Condvar::new(),
        ));
        let (completed_tx, completed_rx) = crossbeam_channel::unbounded();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_index in 0..worker_count {
            let shared = shared.clone();
            let completed_tx = completed_tx.clone();
            let registry = registry.clone();
            let handle = std::thread::Builder::new()
                .name(format!("voxen-mesher-{worker_index}"))
                .spawn(move || loop {
                    let (lock, cvar) = &*shared;
                    let job = {
                        let mut guard = lock.lock();
                        loop {
                            if let Some(job) = guard.queue.pop() {
                                break Some(job);
                            }
                            if guard.shutdown {
                                break None;
                            }
                            cvar.wait(&mut guard);
                        }
                    };
                    let job = match job {
                        Some(job) => job,
                        None => return,
                    };

                    let artifact = generation::mesh_chunk(job.chunk, &job.snapshot, &registry);

                    lock.lock().building.remove(&job.chunk);
                    let _ = completed_tx.send(artifact);
                })
                .expect("failed to spawn mesher worker thread");
            workers.push(handle);
        }

        Self {
            registry,
            shared,
            completed_tx,
            completed_rx,
            workers,
        }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// True if this chunk has an outstanding job (either queued or actively
    /// being built) and a resubmission would be redundant.
    pub fn is_building(&self, chunk: ChunkPos) -> bool {
        self.shared.0.lock().building.contains(&chunk)
    }

    /// Submits a single chunk unconditionally, skipping the depth cap.
    /// Returns `false` if it was already queued or building.
    pub fn submit(&self, chunk: ChunkPos, snapshot: ChunkSnapshot, priority: f32) -> bool {
        let mut guard = self.shared.0.lock();
        if !guard.building.insert(chunk) {
            return false;
        }
        guard.queue.push(Job {
            chunk,
            snapshot,
            priority: NotNan::new(priority).unwrap_or(NotNan::new(f32::MAX).unwrap()),
        });
        drop(guard);
        self.shared.1.notify_one();
        true
    }

    /// Submits the nearest-to-camera `cap` candidates not already building
    /// (spec §4.5 "Submission"), leaving the rest for a later tick. Returns
    /// the chunks actually accepted, in submission order.
    pub fn submit_up_to(&self, mut candidates: Vec<(ChunkPos, ChunkSnapshot, f32)>, cap: usize) -> Vec<ChunkPos> {
        candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

        let mut guard = self.shared.0.lock();
        let mut accepted = Vec::new();
        for (chunk, snapshot, priority) in candidates {
            if accepted.len() >= cap {
                break;
            }
            if !guard.building.insert(chunk) {
                continue;
            }
            guard.queue.push(Job {
                chunk,
                snapshot,
                priority: NotNan::new(priority).unwrap_or(NotNan::new(f32::MAX).unwrap()),
            });
            accepted.push(chunk);
        }
        drop(guard);
        if !accepted.is_empty() {
            self.shared.1.notify_all();
        }
        accepted
    }

    /// Drains all meshes completed so far without blocking.
    pub fn drain(&self) -> Vec<MeshArtifact> {
        self.completed_rx.try_iter().collect()
    }
}

impl Drop for ChunkMeshBuilder {
    fn drop(&mut self) {
        self.shared.0.lock().shutdown = true;
        self.shared.1.notify_all();
        for handle in std::mem::take(&mut self.workers) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::registry::BlockRegistry;
    use crate::world::World;
    use std::time::{Duration, Instant};

    fn world_with_stone_at_origin() -> World {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(16, 16, 16, registry).unwrap();
        let stone = world.registry().get_id("stone");
        world.set_tile(4, 4, 4, stone, 0);
        world
    }

    #[test]
    fn submitted_chunk_eventually_completes() {
        let registry = Arc::new(BlockRegistry::stub());
        let builder = ChunkMeshBuilder::with_worker_count(registry, 1);
        let world = world_with_stone_at_origin();
        let chunk = ChunkPos::new(0, 0, 0);
        let snapshot = ChunkSnapshot::capture(&world, chunk);
        assert!(builder.submit(chunk, snapshot, 0.0));

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let completed = builder.drain();
            if let Some(artifact) = completed.into_iter().find(|a| a.chunk == chunk) {
                assert!(!artifact.solid.vertices.is_empty());
                break;
            }
            assert!(Instant::now() < deadline, "mesh did not complete in time");
            std::thread::yield_now();
        }
    }

    #[test]
    fn resubmitting_a_building_chunk_is_rejected() {
        let registry = Arc::new(BlockRegistry::stub());
        // Zero live workers: the job sits in the queue as "building" so the
        // second submit is observably rejected without a race against
        // completion.
        let builder = ChunkMeshBuilder::with_worker_count(registry, 0);
        let world = world_with_stone_at_origin();
        let chunk = ChunkPos::new(0, 0, 0);
        let snapshot = ChunkSnapshot::capture(&world, chunk);
        assert!(builder.submit(chunk, snapshot.clone(), 0.0));
        assert!(!builder.submit(chunk, snapshot, 0.0));
    }

    #[test]
    fn submission_cap_defers_the_rest() {
        let registry = Arc::new(BlockRegistry::stub());
        let builder = ChunkMeshBuilder::with_worker_count(registry, 0);
        let world = world_with_stone_at_origin();
        let candidates: Vec<_> = (0..5)
            .map(|i| {
                let chunk = ChunkPos::new(i, 0, 0);
                (chunk, ChunkSnapshot::capture(&world, chunk), i as f32)
            })
            .collect();
        let accepted = builder.submit_up_to(candidates, 2);
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0], ChunkPos::new(0, 0, 0));
        assert_eq!(accepted[1], ChunkPos::new(1, 0, 0));
    }
}
