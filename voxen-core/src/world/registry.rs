//! The block kind table (spec §3 "Block kind table").
//!
//! A fixed table of at most 256 entries describing everything about a block
//! id that is not per-cell state (metadata/light live in the grid itself,
//! not here). Grounded on the teacher's `world/registry.rs` `BlockRegistry` /
//! `load_registry` shape: a `serde_json` manifest loaded once at `Game`
//! construction, with name -> id lookup for tests and world-gen callers.

use crate::prelude::*;
use serde::Deserialize;
use std::{collections::HashMap, fs::File, path::Path};

/// Block id 0 is always air, matching the grid's "0 = empty" convention.
pub const AIR: BlockId = BlockId(0);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct BlockId(pub u8);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Render/placement shape tag. Cube is face-culled against neighbours; the
/// rest are the "8-13 shape templates" the mesher (C5) knows how to emit.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockShape {
    Cube,
    Cross,
    Torch,
    Liquid,
    Cactus,
    Slab,
    Stair,
    Fence,
    Door,
    Ladder,
    Pane,
    Rail,
}

impl Default for BlockShape {
    fn default() -> Self {
        Self::Cube
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[serde(default)]
pub struct BlockDescription {
    pub name: String,
    pub shape: BlockShape,
    pub solid: bool,
    pub liquid: bool,
    /// 0-15; default is filled in per-shape in [`make_entry`] when absent.
    pub attenuation: Option<u8>,
    pub emission: u8,
    pub friction: f32,
    pub wants_random_ticks: bool,
    pub blocks_building: bool,
    /// per-face texture index into an external (unimplemented here) atlas;
    /// the core only threads the indices through to the mesh artifact.
    pub textures: Faces<u16>,
}

impl Default for BlockDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            shape: BlockShape::Cube,
            solid: true,
            liquid: false,
            attenuation: None,
            emission: 0,
            friction: 0.6,
            wants_random_ticks: false,
            blocks_building: true,
            textures: Faces::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockRegistryEntry {
    pub shape: BlockShape,
    pub solid: bool,
    pub liquid: bool,
    pub attenuation: u8,
    pub emission: u8,
    pub friction: f32,
    pub wants_random_ticks: bool,
    pub blocks_building: bool,
    pub textures: Faces<u16>,
}

fn make_entry(desc: BlockDescription) -> BlockRegistryEntry {
    // Default attenuation: 1 for anything empty-looking (cross/torch/liquid
    // edges let light through almost unattenuated), 15 for a solid cube,
    // matching the spec's "default 1 for empty-looking, 15 for fully opaque".
    let attenuation = desc.attenuation.unwrap_or(if desc.solid && desc.shape == BlockShape::Cube {
        15
    } else {
        1
    });

    BlockRegistryEntry {
        shape: desc.shape,
        solid: desc.solid,
        liquid: desc.liquid,
        attenuation: attenuation.min(15),
        emission: desc.emission.min(15),
        friction: desc.friction,
        wants_random_ticks: desc.wants_random_ticks,
        blocks_building: desc.blocks_building,
        textures: desc.textures,
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RegistryManifest {
    blocks: Vec<BlockDescription>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlockRegistry {
    name_map: HashMap<String, BlockId>,
    entries: Vec<BlockRegistryEntry>,
}

impl BlockRegistry {
    /// The hard-coded fallback table used when no manifest is supplied:
    /// enough kinds to drive the end-to-end scenarios in spec §8 without
    /// requiring external asset data.
    pub fn stub() -> Self {
        let descriptions = vec![
            BlockDescription {
                name: "air".into(),
                shape: BlockShape::Cube,
                solid: false,
                attenuation: Some(0),
                blocks_building: false,
                ..Default::default()
            },
            BlockDescription {
                name: "stone".into(),
                ..Default::default()
            },
            BlockDescription {
                name: "dirt".into(),
                ..Default::default()
            },
            BlockDescription {
                name: "grass".into(),
                ..Default::default()
            },
            BlockDescription {
                name: "glass".into(),
                attenuation: Some(0),
                ..Default::default()
            },
            BlockDescription {
                name: "water".into(),
                shape: BlockShape::Liquid,
                solid: false,
                liquid: true,
                attenuation: Some(2),
                blocks_building: false,
                ..Default::default()
            },
            BlockDescription {
                name: "lava".into(),
                shape: BlockShape::Liquid,
                solid: false,
                liquid: true,
                attenuation: Some(2),
                emission: 15,
                blocks_building: false,
                ..Default::default()
            },
            BlockDescription {
                name: "torch".into(),
                shape: BlockShape::Torch,
                solid: false,
                attenuation: Some(0),
                emission: 14,
                blocks_building: false,
                ..Default::default()
            },
            BlockDescription {
                name: "leaves".into(),
                attenuation: Some(1),
                wants_random_ticks: true,
                ..Default::default()
            },
            BlockDescription {
                name: "sand".into(),
                wants_random_ticks: true,
                ..Default::default()
            },
            BlockDescription {
                name: "cactus".into(),
                shape: BlockShape::Cactus,
                solid: false,
                attenuation: Some(1),
                blocks_building: false,
                ..Default::default()
            },
        ];

        let mut name_map = HashMap::new();
        let mut entries = Vec::with_capacity(descriptions.len());
        for (id, desc) in descriptions.into_iter().enumerate() {
            name_map.insert(desc.name.clone(), BlockId(id as u8));
            entries.push(make_entry(desc));
        }

        Self { name_map, entries }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VoxenError> {
        let path_str = path.as_ref().display().to_string();
        let file = File::open(path.as_ref()).map_err(|source| VoxenError::RegistryLoad {
            path: path_str.clone(),
            reason: source.to_string(),
        })?;
        let manifest: RegistryManifest =
            serde_json::from_reader(file).map_err(|source| VoxenError::RegistryLoad {
                path: path_str,
                reason: source.to_string(),
            })?;

        let mut name_map = HashMap::new();
        let mut entries = Vec::with_capacity(manifest.blocks.len());
        for (id, desc) in manifest.blocks.into_iter().enumerate() {
            name_map.insert(desc.name.clone(), BlockId(id as u8));
            entries.push(make_entry(desc));
        }

        log::debug!(target: "voxen_core::world", "loaded block registry with {} entries", entries.len());
        Ok(Self { name_map, entries })
    }

    pub fn get_id(&self, name: &str) -> BlockId {
        self.name_map[name]
    }

    pub fn try_get_id(&self, name: &str) -> Option<BlockId> {
        self.name_map.get(name).copied()
    }

    #[inline(always)]
    fn entry(&self, id: BlockId) -> &BlockRegistryEntry {
        &self.entries[id.index()]
    }

    #[inline(always)]
    pub fn shape(&self, id: BlockId) -> BlockShape {
        self.entry(id).shape
    }

    #[inline(always)]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.entry(id).solid
    }

    #[inline(always)]
    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.entry(id).liquid
    }

    #[inline(always)]
    pub fn attenuation(&self, id: BlockId) -> u8 {
        self.entry(id).attenuation
    }

    #[inline(always)]
    pub fn emission(&self, id: BlockId) -> u8 {
        self.entry(id).emission
    }

    #[inline(always)]
    pub fn friction(&self, id: BlockId) -> f32 {
        self.entry(id).friction
    }

    #[inline(always)]
    pub fn wants_random_ticks(&self, id: BlockId) -> bool {
        self.entry(id).wants_random_ticks
    }

    #[inline(always)]
    pub fn blocks_building(&self, id: BlockId) -> bool {
        self.entry(id).blocks_building
    }

    #[inline(always)]
    pub fn textures(&self, id: BlockId) -> Faces<u16> {
        self.entry(id).textures
    }

    /// `is_transparent` as used by the mesher for face culling: air and any
    /// non-attenuating block lets a neighbouring face show through.
    #[inline(always)]
    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.attenuation(id) < 15
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::stub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_registry_has_air_at_zero() {
        let reg = BlockRegistry::stub();
        assert_eq!(reg.get_id("air"), AIR);
        assert!(reg.is_transparent(AIR));
        assert!(!reg.is_solid(AIR));
    }

    #[test]
    fn stone_is_opaque_and_solid() {
        let reg = BlockRegistry::stub();
        let stone = reg.get_id("stone");
        assert!(reg.is_solid(stone));
        assert_eq!(reg.attenuation(stone), 15);
        assert!(!reg.is_transparent(stone));
    }

    #[test]
    fn torch_emits_fourteen_and_does_not_attenuate() {
        let reg = BlockRegistry::stub();
        let torch = reg.get_id("torch");
        assert_eq!(reg.emission(torch), 14);
        assert_eq!(reg.attenuation(torch), 0);
        assert!(!reg.blocks_building(torch));
    }
}
