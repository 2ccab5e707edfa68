//! # Sleep Management
//!
//! Dynamic bodies that stay below the velocity threshold for longer than
//! [`SLEEP_DELAY`] seconds are put to sleep: zero velocity, skipped by the
//! integrator and left out of the broad-phase grid. They wake when patched
//! or when an awake body reaches them with a significant relative speed.

use tracing::trace;

use crate::registry::BodyRegistry;
use crate::settings::Settings;
use crate::spatial_grid::SpatialGrid;
use crate::types::Vec3;

/// Simulated seconds a body must stay still before it sleeps.
pub const SLEEP_DELAY: f32 = 1.0;

/// Advance the still-time counters and put qualifying bodies to sleep.
/// Returns the number of bodies that fell asleep.
pub fn update_sleep_states(registry: &mut BodyRegistry, settings: &Settings, dt: f32) -> usize {
    let mut fell_asleep = 0;
    for body in registry.bodies_mut() {
        if !settings.sleep_enabled || !body.is_dynamic() {
            if body.sleeping {
                body.wake();
            }
            body.still_time = 0.0;
            continue;
        }
        if body.sleeping {
            continue;
        }

        let threshold = settings.sleep_velocity_threshold;
        if body.velocity.length() < threshold && body.angular_velocity.length() < threshold {
            body.still_time += dt;
            if body.still_time > SLEEP_DELAY {
                body.sleeping = true;
                body.velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
                fell_asleep += 1;
                trace!(id = %body.id, "body fell asleep");
            }
        } else {
            body.still_time = 0.0;
        }
    }
    fell_asleep
}

/// Wake sleeping bodies overlapped by an awake, moving body and insert them
/// into `grid` so the following narrow phase sees them. Any motion above the
/// solver's convergence tolerance counts, so slow pushers still collide. Returns the slots
/// that were woken.
pub fn wake_touched(
    registry: &mut BodyRegistry,
    grid: &mut SpatialGrid,
    settings: &Settings,
) -> Vec<usize> {
    let sleepers: Vec<usize> = registry
        .iter()
        .filter(|(_, body)| body.sleeping)
        .map(|(slot, _)| slot)
        .collect();
    let mut woken = Vec::new();

    for slot in sleepers {
        let Some(sleeper) = registry.slot(slot) else {
            continue;
        };
        let bounds = sleeper.aabb;
        let touched = grid.query(&bounds).into_iter().any(|other| {
            registry.slot(other).is_some_and(|body| {
                !body.sleeping
                    && !body.is_static()
                    && body.aabb.overlaps(&bounds)
                    && (body.velocity - sleeper.velocity).length() > settings.convergence_tolerance
            })
        });
        if touched {
            if let Some(body) = registry.slot_mut(slot) {
                body.wake();
                trace!(id = %body.id, "body woken by contact");
            }
            grid.insert(slot, &bounds);
            woken.push(slot);
        }
    }
    woken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, BodySpec};
    use crate::collision::rebuild_grid;
    use crate::types::Material;

    fn resting_body() -> BodyRegistry {
        let mut registry = BodyRegistry::new();
        registry
            .add_body(&BodySpec::sphere(0, 0.5), Material::default())
            .unwrap();
        registry
    }

    #[test]
    fn still_body_sleeps_after_delay() {
        let mut registry = resting_body();
        let settings = Settings::default();
        let dt = 0.25;
        for _ in 0..4 {
            assert_eq!(update_sleep_states(&mut registry, &settings, dt), 0);
        }
        assert_eq!(update_sleep_states(&mut registry, &settings, dt), 1);
        let body = registry.get(BodyId(0)).unwrap();
        assert!(body.sleeping);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn motion_resets_still_time() {
        let mut registry = resting_body();
        let settings = Settings::default();
        update_sleep_states(&mut registry, &settings, 0.9);
        registry.get_mut(BodyId(0)).unwrap().velocity = Vec3::new(1.0, 0.0, 0.0);
        update_sleep_states(&mut registry, &settings, 0.9);
        assert_eq!(registry.get(BodyId(0)).unwrap().still_time, 0.0);
    }

    #[test]
    fn disabled_sleep_wakes_everyone() {
        let mut registry = resting_body();
        registry.get_mut(BodyId(0)).unwrap().sleeping = true;
        let settings = Settings {
            sleep_enabled: false,
            ..Settings::default()
        };
        update_sleep_states(&mut registry, &settings, 0.1);
        assert!(!registry.get(BodyId(0)).unwrap().sleeping);
    }

    #[test]
    fn moving_neighbour_wakes_sleeper() {
        let mut registry = resting_body();
        registry.get_mut(BodyId(0)).unwrap().sleeping = true;
        registry
            .add_body(
                &BodySpec::sphere(1, 0.5)
                    .with_position(Vec3::new(0.9, 0.0, 0.0))
                    .with_velocity(Vec3::new(-2.0, 0.0, 0.0)),
                Material::default(),
            )
            .unwrap();
        let mut grid = SpatialGrid::new(4.0);
        rebuild_grid(&mut grid, &registry);
        let woken = wake_touched(&mut registry, &mut grid, &Settings::default());
        assert_eq!(woken, vec![registry.slot_of(BodyId(0)).unwrap()]);
        assert!(!registry.get(BodyId(0)).unwrap().sleeping);
        assert_eq!(grid.candidate_pairs().len(), 1);
    }

    #[test]
    fn resting_neighbour_leaves_sleeper_alone() {
        let mut registry = resting_body();
        registry.get_mut(BodyId(0)).unwrap().sleeping = true;
        registry
            .add_body(
                &BodySpec::sphere(1, 0.5).with_position(Vec3::new(0.9, 0.0, 0.0)),
                Material::default(),
            )
            .unwrap();
        let mut grid = SpatialGrid::new(4.0);
        rebuild_grid(&mut grid, &registry);
        assert!(wake_touched(&mut registry, &mut grid, &Settings::default()).is_empty());
    }
}
