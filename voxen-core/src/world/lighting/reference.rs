//! Whole-grid brute-force recompute, used only by tests to check the
//! incremental engine's output against a trivially-correct fixed-point
//! relaxation (spec §9, properties P1/P2/P8).

use super::{is_sky_lit, Layer, MAX_LIGHT};
use crate::world::{World, NEIGHBOUR_OFFSETS};

/// Repeatedly relaxes every cell in `layer` until no cell changes, starting
/// from the grid's current values. Unlike [`super::LightingEngine`] this
/// does no queueing or bounding — it is only fast enough for small test
/// worlds.
pub fn recompute_to_fixed_point(world: &mut World, layer: Layer) {
    let registry = world.registry().clone();
    loop {
        let mut changed = false;
        for x in 0..world.width() {
            for z in 0..world.depth() {
                for y in 0..world.height() {
                    let current = match layer {
                        Layer::Sky => world.get_sky_light_raw(x, y, z),
                        Layer::Block => world.get_block_light_raw(x, y, z),
                    } as i32;
                    let atten = registry.attenuation(world.get_tile(x, y, z)).max(1) as i32;
                    let source = match layer {
                        Layer::Sky if is_sky_lit(world, x, y, z) => MAX_LIGHT,
                        Layer::Sky => 0,
                        Layer::Block => registry.emission(world.get_tile(x, y, z)) as i32,
                    };
                    let max_neighbour = NEIGHBOUR_OFFSETS
                        .iter()
                        .map(|(dx, dy, dz)| {
                            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                            if world.in_bounds(nx, ny, nz) {
                                match layer {
                                    Layer::Sky => world.get_sky_light_raw(nx, ny, nz),
                                    Layer::Block => world.get_block_light_raw(nx, ny, nz),
                                }
                            } else {
                                0
                            }
                            .into()
                        })
                        .max()
                        .unwrap_or(0i32);
                    let target = source.max(max_neighbour - atten).clamp(0, MAX_LIGHT);
                    if target != current {
                        match layer {
                            Layer::Sky => world.set_sky_light_raw(x, y, z, target as u8),
                            Layer::Block => world.set_block_light_raw(x, y, z, target as u8),
                        }
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::registry::BlockRegistry;
    use crate::world::lighting::LightingEngine;
    use std::sync::Arc;

    /// After a handful of random edits, the incrementally-maintained grid
    /// must match a brute-force fixed-point recompute over both layers.
    #[test]
    fn incremental_matches_brute_force_after_random_edits() {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(16, 32, 16, registry.clone()).unwrap();
        let mut engine = LightingEngine::new();
        engine.initialize(&mut world);

        let stone = world.registry().get_id("stone");
        let torch = world.registry().get_id("torch");
        let air = world.registry().get_id("air");
        let edits: &[(i32, i32, i32, crate::world::registry::BlockId)] = &[
            (4, 10, 4, stone),
            (4, 9, 4, stone),
            (5, 5, 5, torch),
            (4, 10, 4, air),
            (6, 6, 6, stone),
            (6, 6, 6, air),
        ];
        for &(x, y, z, id) in edits {
            world.set_tile(x, y, z, id, 0);
            engine.queue_update_at(&mut world, x, y, z);
            engine.process_updates(&mut world, 10_000);
        }

        let mut reference = World::new(16, 32, 16, registry).unwrap();
        for &(x, y, z, id) in edits {
            reference.set_tile(x, y, z, id, 0);
        }
        let mut ref_engine = LightingEngine::new();
        ref_engine.initialize(&mut reference);
        recompute_to_fixed_point(&mut reference, Layer::Sky);
        recompute_to_fixed_point(&mut reference, Layer::Block);

        for x in 0..16 {
            for z in 0..16 {
                for y in 0..32 {
                    assert_eq!(
                        world.get_sky_light(x, y, z),
                        reference.get_sky_light(x, y, z),
                        "sky mismatch at ({x},{y},{z})"
                    );
                    assert_eq!(
                        world.get_block_light(x, y, z),
                        reference.get_block_light(x, y, z),
                        "block mismatch at ({x},{y},{z})"
                    );
                }
            }
        }
    }
}
