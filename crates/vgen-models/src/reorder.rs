//! Scene reordering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::sequence::Sequence;
use crate::validation::ValidationError;

/// New position for one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReorderEntry {
    pub scene_number: u32,
    pub position: u32,
}

/// Request body for reordering. Either explicit `(scene, position)` pairs
/// or a plain list of scene numbers in their new order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReorderRequest {
    #[serde(default)]
    pub scenes: Vec<ReorderEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<u32>>,
}

impl ReorderRequest {
    pub fn from_order(order: Vec<u32>) -> Self {
        Self {
            scenes: Vec::new(),
            order: Some(order),
        }
    }

    /// Normalize into explicit entries. A plain order gets positions 1..=N.
    pub fn into_entries(self) -> Result<Vec<ReorderEntry>, ValidationError> {
        match self.order {
            Some(_) if !self.scenes.is_empty() => Err(ValidationError::InvalidReorder(
                "provide either `scenes` or `order`, not both".to_string(),
            )),
            Some(order) => Ok(order
                .into_iter()
                .enumerate()
                .map(|(i, scene_number)| ReorderEntry {
                    scene_number,
                    position: i as u32 + 1,
                })
                .collect()),
            None => Ok(self.scenes),
        }
    }
}

/// Result of a reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReorderOutcome {
    /// Scene numbers in their new order
    pub order: Vec<u32>,
    /// Scenes whose continuity source is no longer strictly earlier
    pub stale_continuity: Vec<u32>,
}

/// Check that `entries` cover every scene of `sequence` exactly once with distinct positions.
pub fn validate_reorder(sequence: &Sequence, entries: &[ReorderEntry]) -> Result<(), ValidationError> {
    let existing: HashSet<u32> = sequence.scenes.iter().map(|s| s.scene_number).collect();

    let mut seen_scenes = HashSet::new();
    let mut seen_positions = HashSet::new();
    for entry in entries {
        if !existing.contains(&entry.scene_number) {
            return Err(ValidationError::InvalidReorder(format!(
                "scene {} does not exist",
                entry.scene_number
            )));
        }
        if !seen_scenes.insert(entry.scene_number) {
            return Err(ValidationError::InvalidReorder(format!(
                "scene {} appears more than once",
                entry.scene_number
            )));
        }
        if !seen_positions.insert(entry.position) {
            return Err(ValidationError::InvalidReorder(format!(
                "position {} is assigned more than once",
                entry.position
            )));
        }
    }

    let mut missing: Vec<u32> = existing.difference(&seen_scenes).copied().collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        let list = missing
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ValidationError::InvalidReorder(format!("missing scenes: {}", list)));
    }

    Ok(())
}

impl Sequence {
    /// Apply new positions atomically. On error nothing changes.
    ///
    /// Continuity references are left as they are; scenes whose source is
    /// no longer earlier are reported in the outcome.
    pub fn reorder(&mut self, entries: &[ReorderEntry]) -> Result<ReorderOutcome, ValidationError> {
        validate_reorder(self, entries)?;

        for entry in entries {
            if let Some(scene) = self.scene_mut(entry.scene_number) {
                scene.position = entry.position;
            }
        }
        self.invalidate_export();
        self.refresh_aggregates();

        Ok(ReorderOutcome {
            order: self.scene_order(),
            stale_continuity: self.stale_continuity(),
        })
    }
}
