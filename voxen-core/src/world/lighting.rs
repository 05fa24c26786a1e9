//! Lighting Engine (C4, spec §4.4), exhaustively grounded on
//! `LightingEngine.cpp` in the original source. Two independent layers
//! (sky, block); this type owns only the queue of pending update
//! rectangles — the light planes themselves live inside [`World`] (C1), so
//! every public method here takes `&mut World` explicitly rather than the
//! engine holding a back-reference to it.

use crate::world::registry::BlockRegistry;
use crate::world::{BlockPos, World, NEIGHBOUR_OFFSETS};
use std::collections::VecDeque;

const MAX_LIGHT: i32 = 15;
const BFS_VISIT_CAP: usize = 50_000;
/// `queue_update` rejects any rectangle whose volume exceeds this.
const MAX_RECT_VOLUME: i64 = 32_768;
/// Only the most recent entries are considered as merge candidates.
const MERGE_LOOKBACK: usize = 5;
/// A rectangle merge is accepted only if it doesn't grow the queued volume
/// by more than this multiple.
const MERGE_MAX_VOLUME_INCREASE: i64 = 2;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Layer {
    Sky,
    Block,
}

/// An axis-aligned integer rectangle, inclusive on both ends.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LightRect {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl LightRect {
    pub fn point(p: BlockPos) -> Self {
        Self { min: p, max: p }
    }

    fn volume(&self) -> i64 {
        let dx = (self.max.x - self.min.x + 1) as i64;
        let dy = (self.max.y - self.min.y + 1) as i64;
        let dz = (self.max.z - self.min.z + 1) as i64;
        dx * dy * dz
    }

    fn contains(&self, other: &LightRect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.min.z >= self.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    /// The smallest rectangle containing both `self` and `other`.
    fn union(&self, other: &LightRect) -> LightRect {
        LightRect {
            min: BlockPos::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: BlockPos::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    fn clamp_to(&self, world: &World) -> Option<LightRect> {
        let min = BlockPos::new(self.min.x.max(0), self.min.y.max(0), self.min.z.max(0));
        let max = BlockPos::new(
            self.max.x.min(world.width() - 1),
            self.max.y.min(world.height() - 1),
            self.max.z.min(world.depth() - 1),
        );
        if min.x > max.x || min.y > max.y || min.z > max.z {
            None
        } else {
            Some(LightRect { min, max })
        }
    }
}

struct QueuedUpdate {
    layer: Layer,
    rect: LightRect,
}

#[derive(Default)]
pub struct LightingEngine {
    queue: VecDeque<QueuedUpdate>,
}

impl LightingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a rectangle for `process_updates` to drain, merging into a
    /// recent same-layer entry when cheap to do so (spec §4.4).
    pub fn queue_update(&mut self, world: &World, layer: Layer, rect: LightRect) {
        let rect = match rect.clamp_to(world) {
            Some(r) => r,
            None => return,
        };
        if rect.volume() > MAX_RECT_VOLUME {
            log::debug!(target: "voxen_core::lighting", "dropping oversized light rect ({} cells)", rect.volume());
            return;
        }

        let lookback_start = self.queue.len().saturating_sub(MERGE_LOOKBACK);
        for entry in self.queue.make_contiguous()[lookback_start..].iter_mut().rev() {
            if entry.layer != layer {
                continue;
            }
            if entry.rect.contains(&rect) {
                return;
            }
            let merged = entry.rect.union(&rect);
            if merged.volume() - entry.rect.volume() <= MERGE_MAX_VOLUME_INCREASE {
                entry.rect = merged;
                return;
            }
        }

        self.queue.push_back(QueuedUpdate { layer, rect });
    }

    /// The block-edit entry point (spec §4.4): decides which of the three
    /// algorithmic paths apply, then always finishes with BFS re-lighting
    /// from the edited cell and its six neighbours, in both layers.
    pub fn queue_update_at(&mut self, world: &mut World, x: i32, y: i32, z: i32) {
        if !world.in_bounds(x, y, z) {
            return;
        }
        let registry = world.registry().clone();

        // Path 1: emitter removal.
        let new_emission = registry.emission(world.get_tile(x, y, z));
        let old_block_light = world.get_block_light_raw(x, y, z);
        if old_block_light > new_emission {
            self.remove_light_bfs(world, &registry, Layer::Block, BlockPos::new(x, y, z), old_block_light as i32);
        }

        let attenuates = registry.attenuation(world.get_tile(x, y, z)) > 0;
        self.update_heightmap_on_edit(world, &registry, x, y, z, attenuates);

        if attenuates {
            // Path 2: sky column response to placement. Starts *below* the
            // edited cell — the edited cell itself just became the ceiling,
            // its own sky-light state is irrelevant to the column below it.
            let mut cy = y - 1;
            loop {
                if cy < 0 {
                    break;
                }
                let fully_opaque = registry.attenuation(world.get_tile(x, cy, z)) >= MAX_LIGHT as u8;
                if fully_opaque {
                    break;
                }
                let was_lit = world.get_sky_light_raw(x, cy, z) > 0;
                let sky_lit = is_sky_lit(world, x, cy, z);
                if was_lit && !sky_lit {
                    let old = world.get_sky_light_raw(x, cy, z);
                    self.remove_light_bfs(world, &registry, Layer::Sky, BlockPos::new(x, cy, z), old as i32);
                }
                cy -= 1;
            }
        } else {
            // Path 3: sky column response to removal. Re-flood the column
            // from the top, recording every newly lit cell.
            let mut lit_seeds = Vec::new();
            let mut accumulated = 0i32;
            for cy in (0..world.height()).rev() {
                let atten = registry.attenuation(world.get_tile(x, cy, z)).max(0) as i32;
                accumulated = (accumulated + atten).min(MAX_LIGHT);
                let value = (MAX_LIGHT - accumulated).max(0) as u8;
                if value > world.get_sky_light_raw(x, cy, z) {
                    world.set_sky_light_raw(x, cy, z, value);
                    lit_seeds.push(BlockPos::new(x, cy, z));
                }
                if accumulated >= MAX_LIGHT {
                    break;
                }
            }
            for seed in lit_seeds {
                self.propagate_light_bfs(world, &registry, Layer::Sky, seed);
            }
        }

        let seed = BlockPos::new(x, y, z);
        self.propagate_light_bfs(world, &registry, Layer::Sky, seed);
        self.propagate_light_bfs(world, &registry, Layer::Block, seed);
        for (dx, dy, dz) in NEIGHBOUR_OFFSETS {
            let n = seed.offset(dx, dy, dz);
            if world.in_bounds(n.x, n.y, n.z) {
                self.propagate_light_bfs(world, &registry, Layer::Sky, n);
                self.propagate_light_bfs(world, &registry, Layer::Block, n);
            }
        }
    }

    /// Keeps `World`'s heightmap correct after a single-cell edit (spec I5 /
    /// P7): `heightmap[x,z]` is always the lowest y such that every cell
    /// above it is non-attenuating. Placing an attenuating block can only
    /// raise it; removing one can only lower it, and only when the edited
    /// cell was the column's current boundary.
    fn update_heightmap_on_edit(&self, world: &mut World, registry: &BlockRegistry, x: i32, y: i32, z: i32, attenuates: bool) {
        let current = world.heightmap_at_raw(x, z);
        if attenuates {
            if y + 1 > current {
                world.set_heightmap_at_raw(x, z, y + 1);
            }
        } else if current == y + 1 {
            let mut new_height = 0;
            for cy in (0..y).rev() {
                if registry.attenuation(world.get_tile(x, cy, z)) > 0 {
                    new_height = cy + 1;
                    break;
                }
            }
            world.set_heightmap_at_raw(x, z, new_height);
        }
    }

    /// Main-thread drain, bounded by `budget` rectangles (spec §4.4).
    pub fn process_updates(&mut self, world: &mut World, budget: usize) {
        let registry = world.registry().clone();
        for _ in 0..budget {
            let update = match self.queue.pop_front() {
                Some(u) => u,
                None => break,
            };
            let rect = update.rect;
            for x in rect.min.x..=rect.max.x {
                for z in rect.min.z..=rect.max.z {
                    for y in rect.min.y..=rect.max.y {
                        let pos = BlockPos::new(x, y, z);
                        let changed = self.recompute_cell(world, &registry, update.layer, pos);
                        if !changed {
                            continue;
                        }
                        // west/down/north always.
                        self.enqueue_if_in_bounds(world, update.layer, pos.offset(-1, 0, 0));
                        self.enqueue_if_in_bounds(world, update.layer, pos.offset(0, -1, 0));
                        self.enqueue_if_in_bounds(world, update.layer, pos.offset(0, 0, -1));
                        // east/up/south only at the rectangle's edges.
                        if x == rect.max.x {
                            self.enqueue_if_in_bounds(world, update.layer, pos.offset(1, 0, 0));
                        }
                        if y == rect.max.y {
                            self.enqueue_if_in_bounds(world, update.layer, pos.offset(0, 1, 0));
                        }
                        if z == rect.max.z {
                            self.enqueue_if_in_bounds(world, update.layer, pos.offset(0, 0, 1));
                        }
                    }
                }
            }
        }
    }

    fn enqueue_if_in_bounds(&mut self, world: &World, layer: Layer, pos: BlockPos) {
        if world.in_bounds(pos.x, pos.y, pos.z) {
            self.queue_update(world, layer, LightRect::point(pos));
        }
    }

    /// One step of the recompute used by `process_updates`: recomputes the
    /// steady-state value for `pos` from its emission/sky-source and
    /// attenuated neighbours; returns whether the stored value changed.
    fn recompute_cell(&self, world: &mut World, registry: &BlockRegistry, layer: Layer, pos: BlockPos) -> bool {
        let current = get_layer(world, layer, pos.x, pos.y, pos.z) as i32;
        let atten = registry.attenuation(world.get_tile(pos.x, pos.y, pos.z)).max(1) as i32;
        let source = match layer {
            Layer::Sky if is_sky_lit(world, pos.x, pos.y, pos.z) => MAX_LIGHT,
            Layer::Sky => 0,
            Layer::Block => registry.emission(world.get_tile(pos.x, pos.y, pos.z)) as i32,
        };
        let max_neighbour = NEIGHBOUR_OFFSETS
            .iter()
            .map(|(dx, dy, dz)| get_layer(world, layer, pos.x + dx, pos.y + dy, pos.z + dz) as i32)
            .max()
            .unwrap_or(0);
        let target = source.max(max_neighbour - atten).clamp(0, MAX_LIGHT);
        if target == current {
            return false;
        }
        set_layer(world, layer, pos.x, pos.y, pos.z, target as u8);
        world.notify_light_changed(pos);
        true
    }

    /// BFS re-lighting from a single seed (spec §4.4 "BFS re-lighting").
    fn propagate_light_bfs(&mut self, world: &mut World, registry: &BlockRegistry, layer: Layer, seed: BlockPos) {
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        let mut visited = 0usize;

        while let Some(pos) = queue.pop_front() {
            if visited >= BFS_VISIT_CAP {
                break;
            }
            visited += 1;
            if !world.in_bounds(pos.x, pos.y, pos.z) {
                continue;
            }

            let current = get_layer(world, layer, pos.x, pos.y, pos.z) as i32;
            let atten = registry.attenuation(world.get_tile(pos.x, pos.y, pos.z)).max(1) as i32;
            let source = match layer {
                Layer::Sky if is_sky_lit(world, pos.x, pos.y, pos.z) => MAX_LIGHT,
                Layer::Sky => 0,
                Layer::Block => registry.emission(world.get_tile(pos.x, pos.y, pos.z)) as i32,
            };
            let max_neighbour = NEIGHBOUR_OFFSETS
                .iter()
                .map(|(dx, dy, dz)| get_layer(world, layer, pos.x + dx, pos.y + dy, pos.z + dz) as i32)
                .max()
                .unwrap_or(0);
            let target = source.max(max_neighbour - atten).clamp(0, MAX_LIGHT);

            if target == current {
                continue;
            }
            set_layer(world, layer, pos.x, pos.y, pos.z, target as u8);
            world.notify_light_changed(pos);

            for (dx, dy, dz) in NEIGHBOUR_OFFSETS {
                let n = pos.offset(dx, dy, dz);
                if !world.in_bounds(n.x, n.y, n.z) {
                    continue;
                }
                let neighbour_value = get_layer(world, layer, n.x, n.y, n.z) as i32;
                if neighbour_value < target - 1 || neighbour_value > target {
                    queue.push_back(n);
                }
            }
        }
    }

    /// BFS darkness removal from a seed with its previous value (spec §4.4
    /// "BFS darkness removal"), grounded on `removeLightBFS`.
    fn remove_light_bfs(
        &mut self,
        world: &mut World,
        registry: &BlockRegistry,
        layer: Layer,
        seed: BlockPos,
        seed_value: i32,
    ) {
        let mut queue = VecDeque::new();
        let mut resources = Vec::new();
        queue.push_back((seed, seed_value));
        set_layer(world, layer, seed.x, seed.y, seed.z, 0);
        world.notify_light_changed(seed);
        let mut visited = 0usize;

        while let Some((pos, removed_value)) = queue.pop_front() {
            if visited >= BFS_VISIT_CAP {
                break;
            }
            visited += 1;

            for (dx, dy, dz) in NEIGHBOUR_OFFSETS {
                let n = pos.offset(dx, dy, dz);
                if !world.in_bounds(n.x, n.y, n.z) {
                    continue;
                }
                let neighbour_value = get_layer(world, layer, n.x, n.y, n.z) as i32;
                if neighbour_value < removed_value {
                    set_layer(world, layer, n.x, n.y, n.z, 0);
                    world.notify_light_changed(n);
                    queue.push_back((n, neighbour_value));
                } else if neighbour_value >= removed_value {
                    resources.push(n);
                }
            }
        }

        for r in resources {
            self.propagate_light_bfs(world, registry, layer, r);
        }
    }

    /// Full initialization after world generation (spec §4.4 `initialize`).
    pub fn initialize(&mut self, world: &mut World) {
        let registry = world.registry().clone();
        let (width, depth) = (world.width(), world.depth());

        for x in 0..width {
            for z in 0..depth {
                let mut accumulated = 0i32;
                let mut heightmap_set = false;
                for y in (0..world.height()).rev() {
                    let atten = registry.attenuation(world.get_tile(x, y, z)).max(0) as i32;
                    if atten > 0 && !heightmap_set {
                        world.set_heightmap_at_raw(x, z, y + 1);
                        heightmap_set = true;
                    }
                    accumulated = (accumulated + atten).min(MAX_LIGHT);
                    let value = (MAX_LIGHT - accumulated).max(0) as u8;
                    world.set_sky_light_raw(x, y, z, value);
                }
                if !heightmap_set {
                    world.set_heightmap_at_raw(x, z, 0);
                }
            }
        }

        for level in (1..MAX_LIGHT).rev() {
            for x in 0..width {
                for z in 0..depth {
                    for y in 0..world.height() {
                        if world.get_sky_light_raw(x, y, z) as i32 == level {
                            self.propagate_light_bfs(world, &registry, Layer::Sky, BlockPos::new(x, y, z));
                        }
                    }
                }
            }
        }

        for x in 0..width {
            for z in 0..depth {
                for y in 0..world.height() {
                    let emission = registry.emission(world.get_tile(x, y, z));
                    if emission > 0 {
                        world.set_block_light_raw(x, y, z, emission);
                        self.propagate_light_bfs(world, &registry, Layer::Block, BlockPos::new(x, y, z));
                    }
                }
            }
        }
    }

    /// `brightness(x,y,z)` with an explicit sky-darken term (spec §4.4).
    pub fn brightness(world: &World, x: i32, y: i32, z: i32, sky_darken: u8) -> f32 {
        let sky = world.get_sky_light(x, y, z) as i32 - sky_darken.min(11) as i32;
        let block = world.get_block_light(x, y, z) as i32;
        BRIGHTNESS_RAMP[sky.max(0).max(block).clamp(0, 15) as usize]
    }

    /// Time-independent brightness used by the mesher (spec §4.4).
    pub fn brightness_for_mesh(world: &World, x: i32, y: i32, z: i32) -> f32 {
        let sky = world.get_sky_light(x, y, z) as i32;
        let block = world.get_block_light(x, y, z) as i32;
        BRIGHTNESS_RAMP[sky.max(block).clamp(0, 15) as usize]
    }
}

/// Rises from 0.05 at index 0 to 1.0 at index 15 (spec §4.4).
const BRIGHTNESS_RAMP: [f32; 16] = [
    0.05, 0.08, 0.12, 0.16, 0.21, 0.27, 0.34, 0.42, 0.51, 0.60, 0.69, 0.78, 0.86, 0.92, 0.97, 1.0,
];

#[inline(always)]
fn is_sky_lit(world: &World, x: i32, y: i32, z: i32) -> bool {
    if y >= world.height() {
        true
    } else if y < 0 {
        false
    } else {
        y >= world.height_at(x, z)
    }
}

#[inline(always)]
fn get_layer(world: &World, layer: Layer, x: i32, y: i32, z: i32) -> u8 {
    match layer {
        Layer::Sky => world.get_sky_light_raw(x, y, z),
        Layer::Block => world.get_block_light_raw(x, y, z),
    }
}

#[inline(always)]
fn set_layer(world: &mut World, layer: Layer, x: i32, y: i32, z: i32, value: u8) {
    match layer {
        Layer::Sky => world.set_sky_light_raw(x, y, z, value),
        Layer::Block => world.set_block_light_raw(x, y, z, value),
    }
}

#[cfg(test)]
mod reference;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::registry::BlockRegistry;
    use std::sync::Arc;

    fn lit_world() -> (World, LightingEngine) {
        let registry = Arc::new(BlockRegistry::stub());
        let mut world = World::new(16, 16, 16, registry).unwrap();
        let mut engine = LightingEngine::new();
        engine.initialize(&mut world);
        (world, engine)
    }

    #[test]
    fn open_sky_column_is_fully_lit() {
        let (world, _engine) = lit_world();
        for y in 0..16 {
            assert_eq!(world.get_sky_light(4, y, 4), 15);
        }
    }

    #[test]
    fn placing_a_ceiling_darkens_the_column_below() {
        let (mut world, mut engine) = lit_world();
        let stone = world.registry().get_id("stone");
        world.set_tile(4, 10, 4, stone, 0);
        engine.queue_update_at(&mut world, 4, 10, 4);
        engine.process_updates(&mut world, 1000);
        assert_eq!(world.get_sky_light(4, 9, 4), 0);
        assert_eq!(world.get_sky_light(4, 11, 4), 15);
    }

    #[test]
    fn removing_ceiling_lets_sky_back_in() {
        let (mut world, mut engine) = lit_world();
        let stone = world.registry().get_id("stone");
        let air = world.registry().get_id("air");
        world.set_tile(4, 10, 4, stone, 0);
        engine.queue_update_at(&mut world, 4, 10, 4);
        engine.process_updates(&mut world, 1000);
        assert_eq!(world.get_sky_light(4, 9, 4), 0);

        world.set_tile(4, 10, 4, air, 0);
        engine.queue_update_at(&mut world, 4, 10, 4);
        engine.process_updates(&mut world, 1000);
        assert_eq!(world.get_sky_light(4, 9, 4), 15);
    }

    #[test]
    fn torch_emits_light_into_darkness() {
        let (mut world, mut engine) = lit_world();
        let stone = world.registry().get_id("stone");
        let torch = world.registry().get_id("torch");
        for y in 8..16 {
            world.set_tile(4, y, 4, stone, 0);
            engine.queue_update_at(&mut world, 4, y, 4);
        }
        engine.process_updates(&mut world, 10_000);
        assert_eq!(world.get_block_light(4, 7, 4), 0);

        world.set_tile(4, 5, 4, torch, 0);
        engine.queue_update_at(&mut world, 4, 5, 4);
        engine.process_updates(&mut world, 10_000);
        assert_eq!(world.get_block_light(4, 5, 4), 14);
        assert!(world.get_block_light(4, 6, 4) > 0);
    }

    #[test]
    fn removing_torch_removes_its_light() {
        let (mut world, mut engine) = lit_world();
        let torch = world.registry().get_id("torch");
        let air = world.registry().get_id("air");
        world.set_tile(4, 5, 4, torch, 0);
        engine.queue_update_at(&mut world, 4, 5, 4);
        engine.process_updates(&mut world, 10_000);
        assert_eq!(world.get_block_light(4, 5, 4), 14);

        world.set_tile(4, 5, 4, air, 0);
        engine.queue_update_at(&mut world, 4, 5, 4);
        engine.process_updates(&mut world, 10_000);
        assert_eq!(world.get_block_light(4, 5, 4), 0);
    }

    #[test]
    fn merge_absorbs_nearby_point_updates() {
        let registry = Arc::new(BlockRegistry::stub());
        let world = World::new(16, 16, 16, registry).unwrap();
        let mut engine = LightingEngine::new();
        engine.queue_update(&world, Layer::Sky, LightRect::point(BlockPos::new(4, 4, 4)));
        engine.queue_update(&world, Layer::Sky, LightRect::point(BlockPos::new(5, 4, 4)));
        assert_eq!(engine.queue.len(), 1);
    }
}
