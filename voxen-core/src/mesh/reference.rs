//! A single-threaded reference mesher for P3 (spec §8 "mesh equivalence").
//!
//! This is deliberately a thin wrapper, not a second implementation:
//! [`super::generation::mesh_chunk`] already contains the only face-emission
//! logic in this crate, and [`ChunkMeshBuilder`](super::ChunkMeshBuilder)'s
//! workers call it directly. P3 therefore checks the worker-pool plumbing
//! (submit/drain, building-set bookkeeping) rather than re-deriving
//! tessellation correctness — see DESIGN.md.

use super::generation::mesh_chunk;
use super::MeshArtifact;
use crate::world::chunk::{ChunkPos, ChunkSnapshot};
use crate::world::registry::BlockRegistry;

pub fn mesh_chunk_reference(chunk: ChunkPos, snapshot: &ChunkSnapshot, registry: &BlockRegistry) -> MeshArtifact {
    mesh_chunk(chunk, snapshot, registry)
}

/// A face reduced to the data P3 compares by: the set of vertex positions
/// plus the side/light/id word, independent of which corner got emitted
/// first or how the 4 vertices were wound into 2 triangles.
fn face_multiset(layer: &super::MeshLayerData) -> Vec<Vec<(u32, u32)>> {
    let mut faces: Vec<Vec<(u32, u32)>> = layer
        .vertices
        .chunks(4)
        .map(|quad| {
            let mut packed: Vec<(u32, u32)> = quad.iter().map(|v| (v.pos_ao, v.light_side_id)).collect();
            packed.sort_unstable();
            packed
        })
        .collect();
    faces.sort_unstable();
    faces
}

/// Compares two artifacts for the same chunk modulo per-face vertex
/// ordering (spec §8 P3: "compares multisets of faces").
pub fn artifacts_equivalent(a: &MeshArtifact, b: &MeshArtifact) -> bool {
    a.chunk == b.chunk
        && face_multiset(&a.solid) == face_multiset(&b.solid)
        && face_multiset(&a.cutout) == face_multiset(&b.cutout)
        && face_multiset(&a.translucent) == face_multiset(&b.translucent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn async_builder_output_matches_reference() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(16, 16, 16, registry.clone()).unwrap();
        let stone = world.registry().get_id("stone");
        let torch = world.registry().get_id("torch");
        world.set_tile(3, 3, 3, stone, 0);
        world.set_tile(3, 4, 3, stone, 0);
        world.set_tile(8, 2, 9, torch, 0);

        let chunk = ChunkPos::new(0, 0, 0);
        let snapshot = ChunkSnapshot::capture(&world, chunk);
        let expected = mesh_chunk_reference(chunk, &snapshot, &registry);

        let builder = super::super::ChunkMeshBuilder::with_worker_count(registry, 1);
        builder.submit(chunk, snapshot, 0.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let actual = loop {
            if let Some(artifact) = builder.drain().into_iter().find(|a| a.chunk == chunk) {
                break artifact;
            }
            assert!(Instant::now() < deadline, "mesh did not complete in time");
            std::thread::yield_now();
        };

        assert!(artifacts_equivalent(&expected, &actual));
    }
}
