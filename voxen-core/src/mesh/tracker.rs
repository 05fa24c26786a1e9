//! Per-chunk dirty/building state machine (spec §4.5 "State machine per
//! chunk"). Unlike the teacher's `MeshTracker` — which exists to delay
//! meshing a chunk until its 26 neighbours have streamed in — C1 is one
//! fixed grid with no streaming, so there is no constraint graph here, only
//! the five states the spec names.

use crate::world::ChunkPos;
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChunkMeshState {
    Clean,
    Dirty,
    Building,
    DirtyBuilding,
    Unloaded,
}

#[derive(Default)]
pub struct MeshTracker {
    states: HashMap<ChunkPos, ChunkMeshState>,
}

impl MeshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, chunk: ChunkPos) -> ChunkMeshState {
        self.states.get(&chunk).copied().unwrap_or(ChunkMeshState::Clean)
    }

    /// Marks a chunk dirty after an edit touches it. A chunk mid-build
    /// becomes `DirtyBuilding` rather than being resubmitted immediately.
    pub fn mark_dirty(&mut self, chunk: ChunkPos) {
        let entry = self.states.entry(chunk).or_insert(ChunkMeshState::Clean);
        *entry = match *entry {
            ChunkMeshState::Building => ChunkMeshState::DirtyBuilding,
            ChunkMeshState::Unloaded | ChunkMeshState::Clean | ChunkMeshState::Dirty | ChunkMeshState::DirtyBuilding => {
                ChunkMeshState::Dirty
            }
        };
    }

    /// True if this chunk should be submitted to the builder this frame.
    pub fn needs_submission(&self, chunk: ChunkPos) -> bool {
        matches!(self.state(chunk), ChunkMeshState::Dirty)
    }

    pub fn mark_building(&mut self, chunk: ChunkPos) {
        self.states.insert(chunk, ChunkMeshState::Building);
    }

    /// Called on drain for a completed build. Returns whether the result is
    /// still worth uploading (a chunk marked `Unloaded` mid-build is not).
    pub fn mark_drained(&mut self, chunk: ChunkPos) -> bool {
        let entry = self.states.entry(chunk).or_insert(ChunkMeshState::Clean);
        match *entry {
            ChunkMeshState::DirtyBuilding => {
                *entry = ChunkMeshState::Dirty;
                true
            }
            ChunkMeshState::Unloaded => false,
            _ => {
                *entry = ChunkMeshState::Clean;
                true
            }
        }
    }

    pub fn mark_unloaded(&mut self, chunk: ChunkPos) {
        self.states.insert(chunk, ChunkMeshState::Unloaded);
    }
}
