//! Broad-phase collision detection using spatial partitioning

use crate::registry::BodyRegistry;
use crate::spatial_grid::SpatialGrid;

/// Clear the grid and insert every awake body into the cells its bounding
/// box overlaps. Static bodies never sleep, so they are always present.
pub fn rebuild_grid(grid: &mut SpatialGrid, registry: &BodyRegistry) {
    grid.clear();
    for (slot, body) in registry.iter() {
        if !body.sleeping {
            grid.insert(slot, &body.aabb);
        }
    }
}

/// Candidate pairs from grid occupancy, with static-static pairs dropped and
/// AABB overlap as the final gate.
#[must_use]
pub fn find_candidate_pairs(grid: &SpatialGrid, registry: &BodyRegistry) -> Vec<(usize, usize)> {
    grid.candidate_pairs()
        .into_iter()
        .filter(|&(a, b)| match (registry.slot(a), registry.slot(b)) {
            (Some(body_a), Some(body_b)) => {
                !(body_a.is_static() && body_b.is_static()) && body_a.aabb.overlaps(&body_b.aabb)
            }
            _ => false,
        })
        .collect()
}
