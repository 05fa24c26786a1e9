//! Async Pathfinder (C6, spec §4.6), grounded on the original source's
//! `pathfinder/{AsyncPathFinder,PathFinder,Node,BinaryHeap,Path}.{hpp,cpp}`.
//! Search runs on a small worker pool over a [`BlockSnapshot`] (C3); the
//! main thread only submits requests and drains completions.

mod astar;
mod heap;

pub use astar::{find_path, EntitySize};
pub use heap::BinaryHeap;

use crate::world::registry::BlockRegistry;
use crate::world::{BlockPos, BlockSnapshot, World};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type EntityId = u64;
pub type RequestId = u64;

/// A reconstructed path, world-space waypoints from start to goal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub waypoints: Vec<BlockPos>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

struct Request {
    id: RequestId,
    entity: EntityId,
    snapshot: BlockSnapshot,
    start: BlockPos,
    target: BlockPos,
    size: EntitySize,
    max_distance: f32,
}

/// `(id, entity, path)` — `path` is `None` when the search found nothing
/// reachable within `max_distance` (a valid result the consumer may retry
/// or ignore; spec §4.6 "Failure").
pub struct Completion {
    pub id: RequestId,
    pub entity: EntityId,
    pub path: Option<Path>,
}

/// Priority-queued A* pathfinder running on a small pool of OS threads
/// (default 2, spec §5 "Scheduling model").
pub struct AsyncPathfinder {
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<EntityId, RequestId>>>,
    request_tx: Sender<Request>,
    completion_rx: Receiver<Completion>,
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl AsyncPathfinder {
    pub fn new(worker_count: usize, registry: Arc<BlockRegistry>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<Request>();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded::<Completion>();
        let pending: Arc<Mutex<HashMap<EntityId, RequestId>>> = Arc::new(Mutex::new(HashMap::new()));

        let mut workers = Vec::with_capacity(worker_count.max(1));
        for worker_index in 0..worker_count.max(1) {
            let request_rx = request_rx.clone();
            let completion_tx = completion_tx.clone();
            let pending = pending.clone();
            let registry = registry.clone();
            let handle = std::thread::Builder::new()
                .name(format!("voxen-pathfinder-{worker_index}"))
                .spawn(move || {
                    for request in request_rx {
                        // Supersession check: only the most recent request for
                        // this entity is worth computing.
                        let still_current = pending.lock().get(&request.entity) == Some(&request.id);
                        if !still_current {
                            continue;
                        }

                        let path = find_path(
                            &request.snapshot,
                            &registry,
                            request.start,
                            request.target,
                            request.size,
                            request.max_distance,
                        );

                        let mut guard = pending.lock();
                        if guard.get(&request.entity) == Some(&request.id) {
                            guard.remove(&request.entity);
                        }
                        drop(guard);

                        let _ = completion_tx.send(Completion {
                            id: request.id,
                            entity: request.entity,
                            path,
                        });
                    }
                })
                .expect("failed to spawn pathfinder worker thread");
            workers.push(handle);
        }

        Self {
            next_id: AtomicU64::new(1),
            pending,
            request_tx,
            completion_rx,
            _workers: workers,
        }
    }

    /// Captures a block snapshot around `start` and submits a search to the
    /// worker pool, recording it in `pending` so a later request from the
    /// same entity supersedes this one. Returns the request id.
    pub fn queue_request(
        &self,
        world: &World,
        entity: EntityId,
        start: BlockPos,
        target: BlockPos,
        size: EntitySize,
        max_distance: f32,
    ) -> RequestId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().insert(entity, id);

        let radius = BlockSnapshot::radius_for(max_distance);
        let snapshot = BlockSnapshot::capture(world, start.x, start.z, radius);

        let request = Request {
            id,
            entity,
            snapshot,
            start,
            target,
            size,
            max_distance,
        };
        // The pool outlives every request; a full channel only means the
        // process is shutting down.
        let _ = self.request_tx.send(request);
        id
    }

    /// Removes the pending entry so any in-flight or future worker pickup
    /// for this entity's current request is discarded (spec §4.6
    /// "Cancellation").
    pub fn cancel_requests(&self, entity: EntityId) {
        self.pending.lock().remove(&entity);
    }

    /// Whether this entity has a request in flight that has not yet been
    /// drained (spec §6 "Path API").
    pub fn has_pending(&self, entity: EntityId) -> bool {
        self.pending.lock().contains_key(&entity)
    }

    /// Drains all completions available without blocking (called from
    /// `Game::tick`).
    pub fn drain(&self) -> Vec<Completion> {
        self.completion_rx.try_iter().collect()
    }
}

impl Default for AsyncPathfinder {
    fn default() -> Self {
        Self::new(2, Arc::new(BlockRegistry::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::registry::BlockRegistry;
    use std::sync::Arc as StdArc;
    use std::time::{Duration, Instant};

    fn flat_world() -> World {
        let registry = StdArc::new(BlockRegistry::stub());
        let mut world = World::new(16, 8, 16, registry).unwrap();
        let stone = world.registry().get_id("stone");
        for x in 0..16 {
            for z in 0..16 {
                world.set_tile(x, 0, z, stone, 0);
            }
        }
        world
    }

    #[test]
    fn request_completes_with_a_path_on_flat_ground() {
        let world = flat_world();
        let pathfinder = AsyncPathfinder::new(1, StdArc::new(BlockRegistry::stub()));
        let size = EntitySize { x: 1, y: 2, z: 1 };
        pathfinder.queue_request(&world, 1, BlockPos::new(2, 1, 2), BlockPos::new(10, 1, 10), size, 40.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let completions = pathfinder.drain();
            if let Some(completion) = completions.into_iter().find(|c| c.entity == 1) {
                assert!(completion.path.is_some());
                assert!(!completion.path.unwrap().is_empty());
                break;
            }
            assert!(Instant::now() < deadline, "pathfinder did not complete in time");
            std::thread::yield_now();
        }
    }

    #[test]
    fn second_request_supersedes_the_first() {
        let world = flat_world();
        let pathfinder = AsyncPathfinder::new(1, StdArc::new(BlockRegistry::stub()));
        let size = EntitySize { x: 1, y: 2, z: 1 };
        let first = pathfinder.queue_request(&world, 7, BlockPos::new(2, 1, 2), BlockPos::new(10, 1, 10), size, 40.0);
        let second = pathfinder.queue_request(&world, 7, BlockPos::new(2, 1, 2), BlockPos::new(3, 1, 2), size, 40.0);
        assert_ne!(first, second);
        assert_eq!(pathfinder.pending.lock().get(&7), Some(&second));
    }
}
