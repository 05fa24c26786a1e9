//! Block Snapshot (C3, spec §4.3): an immutable rectangular copy of block
//! ids used only by the pathfinder. Lighting is irrelevant to pathfinding,
//! so unlike [`crate::world::chunk::ChunkSnapshot`] this carries a single
//! plane. Grounded directly on `BlockSnapshot` in the original C++ source
//! (`pathfinder/AsyncPathFinder.{hpp,cpp}`).

use crate::world::World;

#[derive(Clone)]
pub struct BlockSnapshot {
    min_x: i32,
    min_z: i32,
    width: i32,
    depth: i32,
    height: i32,
    blocks: std::sync::Arc<[u8]>,
}

impl BlockSnapshot {
    /// Captures a `(2*radius+1) x height x (2*radius+1)` region centred on
    /// `(center_x, center_z)`.
    pub fn capture(world: &World, center_x: i32, center_z: i32, radius: i32) -> Self {
        let min_x = center_x - radius;
        let min_z = center_z - radius;
        let width = radius * 2 + 1;
        let depth = radius * 2 + 1;
        let height = world.height();

        let mut blocks = vec![0u8; (width * height * depth) as usize];
        for x in min_x..min_x + width {
            for z in min_z..min_z + depth {
                for y in 0..height {
                    if world.in_bounds(x, y, z) {
                        let lx = x - min_x;
                        let lz = z - min_z;
                        let idx = ((y * depth + lz) * width + lx) as usize;
                        blocks[idx] = world.get_tile_raw(x, y, z);
                    }
                }
            }
        }

        Self {
            min_x,
            min_z,
            width,
            depth,
            height,
            blocks: blocks.into(),
        }
    }

    /// Radius the pathfinder should request: `ceil(max_search_distance) + 4`
    /// (spec §4.3).
    pub fn radius_for(max_search_distance: f32) -> i32 {
        max_search_distance.ceil() as i32 + 4
    }

    /// Returns air (`0`) for any coordinate outside the captured region.
    pub fn get_tile(&self, x: i32, y: i32, z: i32) -> u8 {
        if x < self.min_x
            || x >= self.min_x + self.width
            || z < self.min_z
            || z >= self.min_z + self.depth
            || y < 0
            || y >= self.height
        {
            return 0;
        }
        let lx = x - self.min_x;
        let lz = z - self.min_z;
        let idx = ((y * self.depth + lz) * self.width + lx) as usize;
        self.blocks[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::registry::BlockRegistry;
    use std::sync::Arc;

    #[test]
    fn out_of_range_reads_are_air() {
        let registry = Arc::new(BlockRegistry::stub());
        let world = World::new(16, 16, 16, registry).unwrap();
        let snap = BlockSnapshot::capture(&world, 8, 8, 4);
        assert_eq!(snap.get_tile(1000, 0, 1000), 0);
    }

    #[test]
    fn radius_matches_search_distance_formula() {
        assert_eq!(BlockSnapshot::radius_for(40.0), 44);
        assert_eq!(BlockSnapshot::radius_for(40.4), 45);
    }
}
