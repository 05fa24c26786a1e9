//! Chunk identity (§GLOSSARY "Chunk") and the Chunk Snapshot (C2, spec §4.2).
//!
//! A chunk is a 16×16×16 sub-cube of the World Grid; it exists only as a
//! rebuild granularity for the mesher, not as a storage unit (unlike the
//! teacher's `VoxelWorld`, C1 is one fixed flat grid, not a dynamically
//! loaded `HashMap<ChunkPos, Arc<Chunk>>`).

use crate::util::floor_div;
use crate::world::{BlockPos, World};
use std::sync::Arc;

pub const CHUNK_LENGTH: i32 = 16;
/// Snapshot side length: the 16-wide interior plus a 1-cell margin on both
/// sides, per spec §3 "Chunk Snapshot (C2)".
const SNAPSHOT_LENGTH: i32 = CHUNK_LENGTH + 2;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing a given world-space block position.
    pub fn containing(pos: BlockPos) -> Self {
        Self {
            x: floor_div(pos.x, CHUNK_LENGTH),
            y: floor_div(pos.y, CHUNK_LENGTH),
            z: floor_div(pos.z, CHUNK_LENGTH),
        }
    }

    /// World-space coordinate of this chunk's `(-1,-1,-1)` snapshot corner,
    /// i.e. one cell outside its interior's minimum corner.
    pub fn origin(self) -> BlockPos {
        BlockPos {
            x: self.x * CHUNK_LENGTH,
            y: self.y * CHUNK_LENGTH,
            z: self.z * CHUNK_LENGTH,
        }
    }

    /// The 27 chunks (this one plus all neighbours) that must be marked
    /// dirty when a cell inside this chunk changes, since lighting can reach
    /// across a chunk boundary (spec §4.1).
    pub fn neighbourhood_27(self) -> impl Iterator<Item = ChunkPos> {
        let Self { x, y, z } = self;
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| ChunkPos::new(x + dx, y + dy, z + dz)))
        })
    }
}

/// `ceil(height / CHUNK_LENGTH)`: the number of vertical chunk sections a
/// world of this height spans.
pub fn vertical_chunk_count(height: i32) -> i32 {
    (height + CHUNK_LENGTH - 1) / CHUNK_LENGTH
}

#[inline(always)]
fn local_index(lx: i32, ly: i32, lz: i32) -> usize {
    let x = (lx + 1) as usize;
    let y = (ly + 1) as usize;
    let z = (lz + 1) as usize;
    (y * SNAPSHOT_LENGTH as usize + z) * SNAPSHOT_LENGTH as usize + x
}

/// Immutable 18³ copy of a chunk and its 1-block margin (C2). Handed to a
/// mesh-builder worker; the worker never touches the live [`World`] (I4).
#[derive(Clone)]
pub struct ChunkSnapshot {
    base: BlockPos,
    block_id: Arc<[u8]>,
    metadata: Arc<[u8]>,
    sky_light: Arc<[u8]>,
    block_light: Arc<[u8]>,
}

impl ChunkSnapshot {
    /// Captures a chunk on the main thread. Local coordinates `-1..=16` map
    /// linearly into the backing arrays; cells outside the world read as
    /// `id=0, meta=0, sky=15, block=0` (spec §9 open question, resolved).
    pub fn capture(world: &World, chunk: ChunkPos) -> Self {
        let base = chunk.origin();
        let len = (SNAPSHOT_LENGTH * SNAPSHOT_LENGTH * SNAPSHOT_LENGTH) as usize;
        let mut block_id = vec![0u8; len];
        let mut metadata = vec![0u8; len];
        let mut sky_light = vec![15u8; len];
        let mut block_light = vec![0u8; len];

        for ly in -1..=CHUNK_LENGTH {
            for lz in -1..=CHUNK_LENGTH {
                for lx in -1..=CHUNK_LENGTH {
                    let wx = base.x + lx;
                    let wy = base.y + ly;
                    let wz = base.z + lz;
                    let idx = local_index(lx, ly, lz);
                    if world.in_bounds(wx, wy, wz) {
                        block_id[idx] = world.get_tile_raw(wx, wy, wz);
                        metadata[idx] = world.get_data_raw(wx, wy, wz);
                        sky_light[idx] = world.get_sky_light_raw(wx, wy, wz);
                        block_light[idx] = world.get_block_light_raw(wx, wy, wz);
                    }
                }
            }
        }

        Self {
            base,
            block_id: block_id.into(),
            metadata: metadata.into(),
            sky_light: sky_light.into(),
            block_light: block_light.into(),
        }
    }

    pub fn base(&self) -> BlockPos {
        self.base
    }

    #[inline(always)]
    pub fn block_id(&self, lx: i32, ly: i32, lz: i32) -> u8 {
        self.block_id[local_index(lx, ly, lz)]
    }

    #[inline(always)]
    pub fn metadata(&self, lx: i32, ly: i32, lz: i32) -> u8 {
        self.metadata[local_index(lx, ly, lz)]
    }

    #[inline(always)]
    pub fn sky_light(&self, lx: i32, ly: i32, lz: i32) -> u8 {
        self.sky_light[local_index(lx, ly, lz)]
    }

    #[inline(always)]
    pub fn block_light(&self, lx: i32, ly: i32, lz: i32) -> u8 {
        self.block_light[local_index(lx, ly, lz)]
    }

    /// Whether the cell at local coordinates lets a neighbouring cube face
    /// show through, per the block-kind table's attenuation field.
    pub fn is_transparent(
        &self,
        registry: &crate::world::registry::BlockRegistry,
        lx: i32,
        ly: i32,
        lz: i32,
    ) -> bool {
        registry.is_transparent(crate::world::registry::BlockId(self.block_id(lx, ly, lz)))
    }
}
