//! Per-chunk mesh generation from a [`ChunkSnapshot`] (spec §4.5 "Worker
//! body"). Grounded on the teacher's `mesh_full_cube_side`/`mesh_cross`
//! quad-winding and `TerrainVertex::pack` bit layout, generalized from a
//! single full-cube/cross distinction to the block-shape table (spec §3).

use crate::world::chunk::{ChunkPos, ChunkSnapshot, CHUNK_LENGTH};
use crate::world::lighting::LightingEngine;
use crate::world::registry::{BlockId, BlockRegistry, BlockShape};
use crate::Side;
use nalgebra::Vector3;

use super::{MeshArtifact, MeshLayer, MeshLayerData, TerrainVertex};

const NORMAL_QUAD_CW: [u32; 6] = [3, 2, 0, 0, 1, 3];
const NORMAL_QUAD_CCW: [u32; 6] = [0, 2, 3, 3, 1, 0];

fn side_is_clockwise(side: Side) -> bool {
    matches!(side, Side::Bottom | Side::Front | Side::Left)
}

struct Builder<'a> {
    snapshot: &'a ChunkSnapshot,
    registry: &'a BlockRegistry,
    solid: MeshLayerData,
    cutout: MeshLayerData,
    translucent: MeshLayerData,
}

impl<'a> Builder<'a> {
    fn layer_mut(&mut self, layer: MeshLayer) -> &mut MeshLayerData {
        match layer {
            MeshLayer::Solid => &mut self.solid,
            MeshLayer::Cutout => &mut self.cutout,
            MeshLayer::Translucent => &mut self.translucent,
        }
    }

    fn light_at(&self, lx: i32, ly: i32, lz: i32) -> (u8, u8) {
        (self.snapshot.sky_light(lx, ly, lz), self.snapshot.block_light(lx, ly, lz))
    }

    /// One cube face: 4 vertices plus the 6-index triangle expansion (spec
    /// §4.5 "Quad→triangle expansion", always used since this crate targets
    /// no specific GPU API).
    fn emit_cube_face(&mut self, layer: MeshLayer, lx: i32, ly: i32, lz: i32, side: Side, id: BlockId) {
        let normal = side.normal::<i32>();
        let (sky, block) = self.light_at(lx + normal.x, ly + normal.y, lz + normal.z);
        let tex_id = self.registry.textures(id)[side];

        let h = if side.facing_positive() { 1.0 } else { 0.0 };
        let base = Vector3::new(lx as f32, ly as f32, lz as f32);

        let corners: [Vector3<f32>; 4] = match side {
            Side::Left | Side::Right => [
                Vector3::new(h, 1.0, 0.0),
                Vector3::new(h, 1.0, 1.0),
                Vector3::new(h, 0.0, 0.0),
                Vector3::new(h, 0.0, 1.0),
            ],
            Side::Top | Side::Bottom => [
                Vector3::new(0.0, h, 1.0),
                Vector3::new(1.0, h, 1.0),
                Vector3::new(0.0, h, 0.0),
                Vector3::new(1.0, h, 0.0),
            ],
            Side::Front | Side::Back => [
                Vector3::new(0.0, 1.0, h),
                Vector3::new(1.0, 1.0, h),
                Vector3::new(0.0, 0.0, h),
                Vector3::new(1.0, 0.0, h),
            ],
        };

        let indices = if side_is_clockwise(side) { NORMAL_QUAD_CW } else { NORMAL_QUAD_CCW };
        let data = self.layer_mut(layer);
        let start = data.vertices.len() as u32;
        data.indices.extend(indices.iter().map(|i| start + i));
        for corner in corners {
            data.vertices.push(TerrainVertex::pack(base + corner, side, sky, block, tex_id, 3));
        }
    }

    /// A pair of crossed quads (spec §4.5, "cross/torch" templates),
    /// grounded on `mesh_cross`.
    fn emit_cross(&mut self, layer: MeshLayer, lx: i32, ly: i32, lz: i32, id: BlockId) {
        let (sky, block) = self.light_at(lx, ly, lz);
        let tex_id = self.registry.textures(id)[Side::Right];
        let base = Vector3::new(lx as f32, ly as f32, lz as f32);

        #[rustfmt::skip]
        const CROSS_INDICES: [u32; 12] = [
            0, 1, 2, 0, 2, 3, 0, 2, 1, 0, 3, 2,
        ];

        let data = self.layer_mut(layer);
        let start = data.vertices.len() as u32;
        data.indices.extend(CROSS_INDICES.iter().map(|i| start + i));

        let l = 0.06;
        let h = 0.94;
        for corner in [
            Vector3::new(l, 0.0, l),
            Vector3::new(l, 1.0, l),
            Vector3::new(h, 1.0, h),
            Vector3::new(h, 0.0, h),
        ] {
            data.vertices.push(TerrainVertex::pack(base + corner, Side::Right, sky, block, tex_id, 3));
        }

        let start2 = data.vertices.len() as u32;
        data.indices.extend(CROSS_INDICES.iter().map(|i| start2 + i));
        for corner in [
            Vector3::new(l, 0.0, h),
            Vector3::new(l, 1.0, h),
            Vector3::new(h, 1.0, l),
            Vector3::new(h, 0.0, l),
        ] {
            data.vertices.push(TerrainVertex::pack(base + corner, Side::Right, sky, block, tex_id, 3));
        }
    }

    fn layer_for(&self, shape: BlockShape, id: BlockId) -> MeshLayer {
        match shape {
            BlockShape::Cube if self.registry.is_liquid(id) => MeshLayer::Translucent,
            BlockShape::Cube => MeshLayer::Solid,
            BlockShape::Liquid => MeshLayer::Translucent,
            _ => MeshLayer::Cutout,
        }
    }

    fn mesh_cell(&mut self, lx: i32, ly: i32, lz: i32) {
        let id = BlockId(self.snapshot.block_id(lx, ly, lz));
        if id == crate::world::registry::AIR {
            return;
        }
        let shape = self.registry.shape(id);
        let layer = self.layer_for(shape, id);

        match shape {
            BlockShape::Cube => {
                Side::enumerate(|side| {
                    let normal = side.normal::<i32>();
                    if self.snapshot.is_transparent(self.registry, lx + normal.x, ly + normal.y, lz + normal.z) {
                        self.emit_cube_face(layer, lx, ly, lz, side, id);
                    }
                });
            }
            // Torch, Cross, Liquid, and every other template fall back to a
            // crossed-quad billboard; a dedicated vertex recipe per
            // remaining shape (slab, stair, fence, door, ladder, pane,
            // rail) is future work — see DESIGN.md.
            _ => self.emit_cross(layer, lx, ly, lz, id),
        }
    }
}

/// Meshes one chunk's interior (`0..16` local coordinates) from its
/// snapshot, producing the three per-layer vertex/index buffers (spec
/// §4.5 "Worker body").
pub fn mesh_chunk(chunk: ChunkPos, snapshot: &ChunkSnapshot, registry: &BlockRegistry) -> MeshArtifact {
    let mut builder = Builder {
        snapshot,
        registry,
        solid: MeshLayerData::default(),
        cutout: MeshLayerData::default(),
        translucent: MeshLayerData::default(),
    };

    for lx in 0..CHUNK_LENGTH {
        for ly in 0..CHUNK_LENGTH {
            for lz in 0..CHUNK_LENGTH {
                builder.mesh_cell(lx, ly, lz);
            }
        }
    }

    MeshArtifact {
        chunk,
        solid: builder.solid,
        cutout: builder.cutout,
        translucent: builder.translucent,
    }
}

/// Time-independent brightness, threaded through as a `u8` 0..=15 so the
/// vertex packer stays integral; re-exported so callers outside this
/// module (e.g. a future shading pass) don't need to reach into
/// `world::lighting` directly.
pub fn static_brightness(world: &crate::world::World, x: i32, y: i32, z: i32) -> f32 {
    LightingEngine::brightness_for_mesh(world, x, y, z)
}
