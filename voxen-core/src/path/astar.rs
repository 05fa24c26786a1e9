//! A* search over a [`BlockSnapshot`] (spec §4.6 "A* algorithm"), grounded
//! on `PathFinder.cpp`/`AsyncPathFinder.cpp` in the original source.

use super::{heap::BinaryHeap, Path};
use crate::world::{BlockPos, BlockSnapshot};
use std::collections::HashMap;

/// An entity's footprint in whole blocks: `floor(bb_width+1)` etc (spec
/// §4.6). Pathfinding treats the entity as an axis-aligned box of this
/// many cells anchored at its feet corner.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EntitySize {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

const MAX_DROP: i32 = 4;
/// Node keys are packed into 30 bits, 10 per axis, biased so modest
/// negative coordinates still pack into a non-negative key.
const COORD_BIAS: i32 = 512;

fn pack(pos: BlockPos) -> u32 {
    let px = (pos.x + COORD_BIAS) as u32 & 0x3FF;
    let py = (pos.y + COORD_BIAS) as u32 & 0x3FF;
    let pz = (pos.z + COORD_BIAS) as u32 & 0x3FF;
    px | (py << 10) | (pz << 20)
}

struct Node {
    pos: BlockPos,
    g: f32,
    f: f32,
    parent: Option<u32>,
    closed: bool,
}

struct Arena {
    nodes: HashMap<u32, Node>,
}

impl Arena {
    fn get_or_create(&mut self, pos: BlockPos) -> u32 {
        let key = pack(pos);
        self.nodes.entry(key).or_insert_with(|| Node {
            pos,
            g: f32::INFINITY,
            f: f32::INFINITY,
            parent: None,
            closed: false,
        });
        key
    }
}

fn euclidean(a: BlockPos, b: BlockPos) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    let dz = (a.z - b.z) as f32;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// `is_free` (spec §4.6): `1` if every cell in the size box is non-solid,
/// `0` if any is solid, `-1` if any is liquid (liquid takes precedence so
/// mobs never path through water/lava even if the rest of the box is
/// open).
fn is_free(snapshot: &BlockSnapshot, registry: &crate::world::registry::BlockRegistry, x: i32, y: i32, z: i32, size: EntitySize) -> i32 {
    let mut any_liquid = false;
    for dx in 0..size.x.max(1) {
        for dy in 0..size.y.max(1) {
            for dz in 0..size.z.max(1) {
                let id = crate::world::registry::BlockId(snapshot.get_tile(x + dx, y + dy, z + dz));
                if registry.is_solid(id) {
                    return 0;
                }
                if registry.is_liquid(id) {
                    any_liquid = true;
                }
            }
        }
    }
    if any_liquid {
        -1
    } else {
        1
    }
}

/// `get_node` (spec §4.6): resolves the neighbour cell a step in a cardinal
/// direction lands on, accounting for step-up and step-down, or `None` if
/// no cell in the column is navigable.
fn get_node(
    snapshot: &BlockSnapshot,
    registry: &crate::world::registry::BlockRegistry,
    x: i32,
    y: i32,
    z: i32,
    step_up: i32,
    size: EntitySize,
) -> Option<BlockPos> {
    let at_y = is_free(snapshot, registry, x, y, z, size);
    let candidate_y = if at_y == 1 {
        y
    } else if step_up == 1 && is_free(snapshot, registry, x, y + step_up, z, size) == 1 {
        y + step_up
    } else {
        return None;
    };

    let mut drop_y = candidate_y;
    for _ in 0..MAX_DROP {
        let below = is_free(snapshot, registry, x, drop_y - 1, z, size);
        match below {
            1 => drop_y -= 1,
            -1 => return None,
            _ => break,
        }
    }

    Some(BlockPos::new(x, drop_y, z))
}

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Runs the full A* search and reconstructs a path, or `None` if the start
/// is already unreachable-from-itself in a way that leaves no progress
/// (spec §4.6: "if closest == start, return no path").
pub fn find_path(
    snapshot: &BlockSnapshot,
    registry: &crate::world::registry::BlockRegistry,
    start: BlockPos,
    target: BlockPos,
    size: EntitySize,
    max_distance: f32,
) -> Option<Path> {
    let mut arena = Arena { nodes: HashMap::new() };
    let mut open = BinaryHeap::new();

    let start_key = arena.get_or_create(start);
    {
        let node = arena.nodes.get_mut(&start_key).unwrap();
        node.g = 0.0;
        node.f = euclidean(start, target);
    }
    open.push(start_key, arena.nodes[&start_key].f);

    let mut closest_key = start_key;
    let mut closest_dist = euclidean(start, target);

    while let Some((current_key, _)) = open.pop_min() {
        if arena.nodes[&current_key].closed {
            continue;
        }
        let current_pos = arena.nodes[&current_key].pos;
        let current_g = arena.nodes[&current_key].g;
        arena.nodes.get_mut(&current_key).unwrap().closed = true;

        if current_pos == target {
            return Some(reconstruct_path(&arena, current_key, size));
        }

        let dist_to_target = euclidean(current_pos, target);
        if dist_to_target < closest_dist {
            closest_dist = dist_to_target;
            closest_key = current_key;
        }

        let above_free = is_free(snapshot, registry, current_pos.x, current_pos.y + size.y.max(1), current_pos.z, size) == 1;
        let step_up = if above_free { 1 } else { 0 };

        for (dx, dz) in CARDINALS {
            let neighbour_pos = match get_node(
                snapshot,
                registry,
                current_pos.x + dx,
                current_pos.y,
                current_pos.z + dz,
                step_up,
                size,
            ) {
                Some(pos) => pos,
                None => continue,
            };

            if euclidean(neighbour_pos, target) >= max_distance {
                continue;
            }

            let step_cost = euclidean(current_pos, neighbour_pos);
            let tentative_g = current_g + step_cost;

            let neighbour_key = arena.get_or_create(neighbour_pos);
            let neighbour_closed = arena.nodes[&neighbour_key].closed;
            if neighbour_closed {
                continue;
            }

            if tentative_g < arena.nodes[&neighbour_key].g {
                let f = tentative_g + euclidean(neighbour_pos, target);
                {
                    let node = arena.nodes.get_mut(&neighbour_key).unwrap();
                    node.g = tentative_g;
                    node.f = f;
                    node.parent = Some(current_key);
                }
                if open.contains(neighbour_key) {
                    open.decrease_key(neighbour_key, f);
                } else {
                    open.push(neighbour_key, f);
                }
            }
        }
    }

    if closest_key == start_key {
        return None;
    }
    Some(reconstruct_path(&arena, closest_key, size))
}

/// Follows `parent` links from `goal_key` back to the start and reverses
/// them; each waypoint is centred on the entity's footprint via integer
/// division (spec §4.6 "Path reconstruction", §9 decision: `size/2`,
/// matching the original's integer-division bias rather than a true
/// float-centred `size/2.0`).
fn reconstruct_path(arena: &Arena, goal_key: u32, size: EntitySize) -> Path {
    let mut waypoints = Vec::new();
    let mut current = Some(goal_key);
    while let Some(key) = current {
        let node = &arena.nodes[&key];
        waypoints.push(BlockPos::new(
            node.pos.x + size.x / 2,
            node.pos.y,
            node.pos.z + size.z / 2,
        ));
        current = node.parent;
    }
    waypoints.reverse();
    Path { waypoints }
}
