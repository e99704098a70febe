//! Per-step simulation state: positions, velocities, and the force
//! accumulators force kernels write into.

use glam::Vec3;

use crate::model::Model;
use crate::spatial::SpatialTransform;

#[derive(Clone, Debug, Default)]
pub struct State {
    pub particle_q: Vec<Vec3>,
    pub particle_qd: Vec<Vec3>,
    pub particle_f: Vec<Vec3>,

    pub body_q: Vec<SpatialTransform>,
    /// Body spatial velocity, angular-top/linear-bottom, expressed in world frame.
    pub body_qd: Vec<crate::spatial::SpatialVector>,
    pub body_f: Vec<crate::spatial::SpatialVector>,
}

impl State {
    /// Allocates a zeroed state sized to `model`'s particle and body counts.
    pub fn zeros(model: &Model) -> Self {
        State {
            particle_q: vec![Vec3::ZERO; model.particle_count()],
            particle_qd: vec![Vec3::ZERO; model.particle_count()],
            particle_f: vec![Vec3::ZERO; model.particle_count()],
            body_q: vec![SpatialTransform::IDENTITY; model.body_count()],
            body_qd: vec![crate::spatial::SpatialVector::ZERO; model.body_count()],
            body_f: vec![crate::spatial::SpatialVector::ZERO; model.body_count()],
        }
    }

    /// Zeroes the force accumulators in place, keeping positions/velocities.
    /// Not called by `compute_forces` or either `Integrator` impl, which
    /// both work against fresh zeroed buffers instead; this is for a host
    /// driver that reuses a `State` across steps and wants to zero its
    /// accumulators explicitly before reading or rewriting them.
    pub fn clear_forces(&mut self) {
        self.particle_f.iter_mut().for_each(|f| *f = Vec3::ZERO);
        self.body_f
            .iter_mut()
            .for_each(|f| *f = crate::spatial::SpatialVector::ZERO);
    }
}
