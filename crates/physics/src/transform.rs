//! Transform utilities for physics bodies
//!
//! Bodies carry a unit quaternion; consumers that want Euler angles or 4x4
//! model matrices (the renderer) convert through the helpers here.

use glam::{EulerRot, Mat4, Quat};

use crate::messages::BodyState;
use crate::types::Vec3;

/// Quaternion from XYZ Euler angles in radians.
#[must_use]
pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// XYZ Euler angles in radians from a quaternion.
#[must_use]
pub fn quat_to_euler(q: Quat) -> Vec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Column-major model matrix for a body at `position` with `orientation`.
#[must_use]
pub fn to_transform_matrix(position: Vec3, orientation: Quat) -> [[f32; 4]; 4] {
    Mat4::from_rotation_translation(orientation, position.into()).to_cols_array_2d()
}

/// One renderer instance, laid out for direct upload into a vertex or
/// storage buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceTransform {
    pub model: [[f32; 4]; 4],
    pub body_id: u32,
    pub sleeping: u32,
    pub _pad: [u32; 2],
}

/// Pack a snapshot's body states into instance transforms, preserving order.
#[must_use]
pub fn pack_instances(bodies: &[BodyState]) -> Vec<InstanceTransform> {
    bodies
        .iter()
        .map(|b| {
            let [x, y, z, w] = b.quaternion;
            InstanceTransform {
                model: to_transform_matrix(b.position, Quat::from_xyzw(x, y, z, w)),
                body_id: b.id.0,
                sleeping: u32::from(b.sleeping),
                _pad: [0; 2],
            }
        })
        .collect()
}
