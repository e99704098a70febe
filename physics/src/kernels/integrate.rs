//! Semi-implicit Euler integration for particles and rigid bodies. Unlike
//! the force kernels, each element here writes only its own output slot, so
//! no fold/reduce accumulation is needed — a plain `rayon` parallel map
//! suffices.

use glam::{Quat, Vec3};
use rayon::prelude::*;
use tracing::instrument;

use crate::model::Model;
use crate::spatial::{SpatialTransform, SpatialVector};
use crate::state::State;

/// `step(x)`: 1 when `x < 0`, 0 otherwise (Warp convention), used here to
/// gate gravity on `inv_mass != 0` via `step(-inv_mass)`.
fn step(x: f32) -> f32 {
    if x < 0.0 {
        1.0
    } else {
        0.0
    }
}

/// `f_ext` is carried on `state_in.particle_f` (forces a host applies
/// directly, untouched by `compute_forces`); `f_int` is the buffer
/// `compute_forces` just wrote into. Both are summed before integration,
/// matching the source's two-array (`f_ext`, `f_int`) kernel signature.
#[instrument(level = "trace", skip_all)]
pub fn integrate_particles(
    model: &Model,
    state_in: &State,
    dt: f32,
    f_int: &[Vec3],
    out_q: &mut [Vec3],
    out_qd: &mut [Vec3],
) {
    let results: Vec<(Vec3, Vec3)> = (0..state_in.particle_q.len())
        .into_par_iter()
        .map(|tid| {
            let x0 = state_in.particle_q[tid];
            let v0 = state_in.particle_qd[tid];
            let f_ext = state_in.particle_f[tid];
            let fi = f_int[tid];
            let inv_mass = model.particle_inv_mass[tid];

            let v1 = v0 + ((f_ext + fi) * inv_mass + model.gravity * step(-inv_mass)) * dt;
            let x1 = x0 + v1 * dt;
            (x1, v1)
        })
        .collect();

    for (tid, (x1, v1)) in results.into_iter().enumerate() {
        out_q[tid] = x1;
        out_qd[tid] = v1;
    }
}

#[instrument(level = "trace", skip_all)]
pub fn integrate_bodies(
    model: &Model,
    state_in: &State,
    dt: f32,
    body_f_int: &[SpatialVector],
    out_q: &mut [SpatialTransform],
    out_qd: &mut [SpatialVector],
) {
    let results: Vec<(SpatialTransform, SpatialVector)> = (0..state_in.body_q.len())
        .into_par_iter()
        .map(|tid| {
            let q = state_in.body_q[tid];
            let qd = state_in.body_qd[tid];
            let f = state_in.body_f[tid] + body_f_int[tid];

            let inv_mass = model.body_inv_mass[tid];
            let inertia = model.body_inertia[tid];
            let inv_inertia = model.body_inv_inertia[tid];

            let x0 = q.p;
            let r0 = q.q;
            let w0 = qd.top;
            let v0 = qd.bottom;
            let t0 = f.top;
            let f0 = f.bottom;

            let x_com = x0 + r0 * model.body_com[tid];

            let gravity_gate = if inv_mass != 0.0 { 1.0 } else { 0.0 };
            let v1 = v0 + (f0 * inv_mass + model.gravity * gravity_gate) * dt;
            let x1 = x_com + v1 * dt;

            let wb = r0.conjugate() * w0;
            let tb = r0.conjugate() * t0 - wb.cross(inertia * wb);

            let mut w1 = r0 * (wb + inv_inertia * tb * dt);
            let r1 = (r0 + Quat::from_xyzw(w1.x, w1.y, w1.z, 0.0) * r0 * (0.5 * dt)).normalize();

            w1 *= 1.0 - model.body_angular_damping * dt;

            let q1 = SpatialTransform::new(x1 - r1 * model.body_com[tid], r1);
            let qd1 = SpatialVector::new(w1, v1);
            (q1, qd1)
        })
        .collect();

    for (tid, (q1, qd1)) in results.into_iter().enumerate() {
        out_q[tid] = q1;
        out_qd[tid] = qd1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_particle_does_not_fall() {
        let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![0.0];
        let state = State::zeros(&model);
        let mut q = vec![Vec3::ZERO];
        let mut qd = vec![Vec3::ZERO];
        integrate_particles(&model, &state, 0.1, &[Vec3::ZERO], &mut q, &mut qd);
        assert_eq!(q[0], Vec3::ZERO);
        assert_eq!(qd[0], Vec3::ZERO);
    }

    #[test]
    fn free_particle_falls_under_gravity() {
        let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![1.0];
        let state = State::zeros(&model);
        let mut q = vec![Vec3::ZERO];
        let mut qd = vec![Vec3::ZERO];
        integrate_particles(&model, &state, 0.1, &[Vec3::ZERO], &mut q, &mut qd);
        assert!(qd[0].y < 0.0);
        assert!(q[0].y < 0.0);
    }

    #[test]
    fn resting_body_quaternion_stays_normalized() {
        let mut model = Model::new(Vec3::new(0.0, -9.81, 0.0));
        model.body_mass = vec![1.0];
        model.body_com = vec![Vec3::ZERO];
        model.body_inertia = vec![glam::Mat3::IDENTITY];
        model.body_inv_mass = vec![1.0];
        model.body_inv_inertia = vec![glam::Mat3::IDENTITY];
        let state = State::zeros(&model);
        let mut q = vec![SpatialTransform::IDENTITY];
        let mut qd = vec![SpatialVector::ZERO];
        integrate_bodies(&model, &state, 0.01, &[SpatialVector::ZERO], &mut q, &mut qd);
        assert!((q[0].q.length() - 1.0).abs() < 1e-4);
    }
}
