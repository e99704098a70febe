//! Ground, soft (particle<->body), and body-ground contact resolution.
//! Contacts are assumed pre-computed and supplied as arrays (no broad-phase
//! or narrow-phase collision detection lives in this crate).

use glam::Vec3;
use tracing::instrument;

use crate::model::Model;
use crate::spatial::SpatialVector;
use crate::state::State;

use super::{add_into, add_into_spatial, fold_reduce_spatial, fold_reduce_vec3};

/// Warp's `step`: 1 when `x` is negative, 0 otherwise.
fn step(x: f32) -> f32 {
    if x < 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Particle-vs-ground-plane contact, box Coulomb friction.
#[instrument(level = "trace", skip_all)]
pub fn eval_ground_contacts(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    if !model.ground {
        return;
    }
    let n_particles = state.particle_q.len();
    let plane = model.ground_plane;
    let n = Vec3::new(plane.x, plane.y, plane.z);
    let ke = model.soft_contact_ke;
    let kd = model.soft_contact_kd;
    let kf = model.soft_contact_kf;
    let mu = model.soft_contact_mu;

    let indices: Vec<usize> = (0..n_particles).collect();
    let delta = fold_reduce_vec3(&indices, n_particles, |_idx, &tid, acc| {
        let x0 = state.particle_q[tid];
        let v0 = state.particle_qd[tid];

        let c = (n.dot(x0) + plane.w - model.soft_contact_distance).min(0.0);
        let vn = n.dot(v0);
        let vt = v0 - n * vn;

        let fn_ = n * c * ke;
        let fd = n * vn.min(0.0) * kd;

        let lower = mu * c * ke;
        let upper = -lower;
        let vx = Vec3::new(kf, 0.0, 0.0).dot(vt).clamp(lower, upper);
        let vz = Vec3::new(0.0, 0.0, kf).dot(vt).clamp(lower, upper);
        let ft = Vec3::new(vx, 0.0, vz);

        let f_total = fn_ + (fd + ft) * step(c);
        acc[tid] -= f_total;
    });
    add_into(particle_f, &delta);
}

/// Soft contact between particles and rigid bodies: smooth Coulomb
/// friction, distinct from the box-clamped friction used elsewhere.
#[instrument(level = "trace", skip_all)]
pub fn eval_soft_contacts(
    model: &Model,
    state: &State,
    particle_f: &mut [Vec3],
    body_f: &mut [SpatialVector],
) {
    let count = model.soft_contact_count;
    if count == 0 {
        return;
    }
    let n_particles = state.particle_q.len();
    let n_bodies = state.body_q.len();

    let contact_ids: Vec<usize> = (0..count).collect();

    let particle_delta = fold_reduce_vec3(&contact_ids, n_particles, |_idx, &tid, acc| {
        if let Some((f_total, _r, _body_index)) = soft_contact_force(model, state, tid) {
            acc[model.soft_contact_particle[tid]] -= f_total;
        }
    });
    add_into(particle_f, &particle_delta);

    let body_delta = fold_reduce_spatial(&contact_ids, n_bodies, |_idx, &tid, acc| {
        if let Some((f_total, r, Some(b))) = soft_contact_force(model, state, tid) {
            acc[b] = acc[b] + SpatialVector::new(r.cross(f_total), f_total);
        }
    });
    add_into_spatial(body_f, &body_delta);
}

/// Shared penetration/force computation for one soft-contact entry; `None`
/// when the contact is not penetrating (`c > 0`).
fn soft_contact_force(model: &Model, state: &State, tid: usize) -> Option<(Vec3, Vec3, Option<usize>)> {
    let body_index = model.soft_contact_body[tid];
    let particle_index = model.soft_contact_particle[tid];

    let px = state.particle_q[particle_index];
    let pv = state.particle_qd[particle_index];

    let x_wb = if body_index >= 0 {
        state.body_q[body_index as usize]
    } else {
        crate::spatial::SpatialTransform::IDENTITY
    };

    let bx = x_wb.transform_point(model.soft_contact_body_pos[tid]);
    let r = if body_index >= 0 {
        bx - x_wb.transform_point(model.body_com[body_index as usize])
    } else {
        Vec3::ZERO
    };

    let n = model.soft_contact_normal[tid];
    let c = n.dot(px - bx) - model.soft_contact_distance;
    if c > 0.0 {
        return None;
    }

    let body_v_s = if body_index >= 0 {
        state.body_qd[body_index as usize]
    } else {
        SpatialVector::ZERO
    };
    let body_w = body_v_s.top;
    let body_v = body_v_s.bottom;

    let bv = body_v + body_w.cross(r) + x_wb.transform_vector(model.soft_contact_body_vel[tid]);
    let v = pv - bv;

    let vn = n.dot(v);
    let vt = v - n * vn;

    let fn_ = n * c * model.soft_contact_ke;
    let fd = n * vn.min(0.0) * model.soft_contact_kd;

    let vt_len = vt.length();
    let ft = if vt_len > 0.0 {
        (vt / vt_len) * (model.soft_contact_kf * vt_len).min(-model.soft_contact_mu * c * model.soft_contact_ke)
    } else {
        Vec3::ZERO
    };

    let f_total = fn_ + (fd + ft) * step(c);
    let body_index_opt = if body_index >= 0 {
        Some(body_index as usize)
    } else {
        None
    };
    Some((f_total, r, body_index_opt))
}

/// Body-vs-ground contact via per-shape contact points. The ground normal
/// is fixed to `+y`, matching the source's hard-coded up vector for this
/// path (distinct from the general `ground_plane` used by
/// [`eval_ground_contacts`]).
#[instrument(level = "trace", skip_all)]
pub fn eval_body_contacts(model: &Model, state: &State, body_f: &mut [SpatialVector]) {
    if model.contact_count() == 0 {
        return;
    }
    let n_bodies = state.body_q.len();
    let n = Vec3::new(0.0, 1.0, 0.0);

    let delta = fold_reduce_spatial(&model.contact_body0, n_bodies, |tid, &c_body, acc| {
        let c_point = model.contact_point0[tid];
        let c_dist = model.contact_dist[tid];
        let c_mat = model.contact_material[tid];
        let mat = model.shape_materials[c_mat];
        let (ke, kd, kf, mu) = (mat.x, mat.y, mat.z, mat.w);

        let x_wb = state.body_q[c_body];
        let v_wc = state.body_qd[c_body];
        let w = v_wc.top;
        let v = v_wc.bottom;

        let cp = x_wb.transform_point(c_point) - n * c_dist;
        let r = cp - x_wb.transform_point(model.body_com[c_body]);
        let dpdt = v + w.cross(r);

        let c = n.dot(cp).min(0.0);
        let vn = n.dot(dpdt);
        let vt = dpdt - n * vn;

        let fn_ = c * ke;
        let fd = vn.min(0.0) * kd * step(c);

        let lower = mu * (fn_ + fd);
        let upper = -lower;
        let vx = Vec3::new(kf, 0.0, 0.0).dot(vt).clamp(lower, upper);
        let vz = Vec3::new(0.0, 0.0, kf).dot(vt).clamp(lower, upper);
        let ft = Vec3::new(vx, 0.0, vz) * step(c);

        let f_total = n * (fn_ + fd) + ft;
        let t_total = r.cross(f_total);

        acc[c_body] = acc[c_body] - SpatialVector::new(t_total, f_total);
    });
    add_into_spatial(body_f, &delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn resting_particle_above_ground_feels_no_force() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![1.0];
        model.ground = true;
        model.ground_plane = Vec4::new(0.0, 1.0, 0.0, 0.0);
        model.soft_contact_ke = 1.0e4;
        model.soft_contact_kd = 100.0;
        model.soft_contact_kf = 10.0;
        model.soft_contact_mu = 0.5;
        let mut state = State::zeros(&model);
        state.particle_q[0] = Vec3::new(0.0, 1.0, 0.0);
        let mut f = vec![Vec3::ZERO; 1];
        eval_ground_contacts(&model, &state, &mut f);
        assert_eq!(f[0], Vec3::ZERO);
    }

    #[test]
    fn penetrating_particle_is_pushed_up() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![1.0];
        model.ground = true;
        model.ground_plane = Vec4::new(0.0, 1.0, 0.0, 0.0);
        model.soft_contact_ke = 1.0e4;
        model.soft_contact_kd = 100.0;
        model.soft_contact_kf = 10.0;
        model.soft_contact_mu = 0.5;
        let mut state = State::zeros(&model);
        state.particle_q[0] = Vec3::new(0.0, -0.1, 0.0);
        let mut f = vec![Vec3::ZERO; 1];
        eval_ground_contacts(&model, &state, &mut f);
        assert!(f[0].y > 0.0);
    }

    #[test]
    fn nonzero_contact_distance_offsets_the_ground_plane() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![1.0];
        model.ground = true;
        model.ground_plane = Vec4::new(0.0, 1.0, 0.0, 0.0);
        model.soft_contact_ke = 1.0e4;
        model.soft_contact_kd = 100.0;
        model.soft_contact_kf = 10.0;
        model.soft_contact_mu = 0.5;
        model.soft_contact_distance = 0.1;
        let mut state = State::zeros(&model);
        // above the bare plane, but within the contact-distance offset: must penetrate.
        state.particle_q[0] = Vec3::new(0.0, 0.05, 0.0);
        let mut f = vec![Vec3::ZERO; 1];
        eval_ground_contacts(&model, &state, &mut f);
        assert!(f[0].y > 0.0, "particle inside the offset shell should feel a pushing-up force");
    }

    #[test]
    fn disabled_ground_is_noop() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0];
        model.particle_inv_mass = vec![1.0];
        model.ground = false;
        let mut state = State::zeros(&model);
        state.particle_q[0] = Vec3::new(0.0, -0.1, 0.0);
        let mut f = vec![Vec3::ZERO; 1];
        eval_ground_contacts(&model, &state, &mut f);
        assert_eq!(f[0], Vec3::ZERO);
    }
}
