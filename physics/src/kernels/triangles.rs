//! Triangle membrane (Neo-Hookean + area preservation), aerodynamic
//! drag/lift, and the two triangle-contact kernels (self-contact against
//! loose particles, and contact against body-attached contact points).

use glam::Vec3;
use tracing::{instrument, warn};

use crate::geometry::triangle_closest_point_barycentric;
use crate::model::Model;
use crate::state::State;

use super::{add_into, fold_reduce_vec3};

/// Warp's `step`: 1 when `x` is negative, 0 otherwise.
fn step(x: f32) -> f32 {
    if x < 0.0 {
        1.0
    } else {
        0.0
    }
}

#[instrument(level = "trace", skip_all)]
pub fn eval_triangles(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    let n = state.particle_q.len();
    let delta = fold_reduce_vec3(&model.tri_indices, n, |idx, &[i, j, k], acc| {
        let x0 = state.particle_q[i];
        let x1 = state.particle_q[j];
        let x2 = state.particle_q[k];
        let v0 = state.particle_qd[i];
        let v1 = state.particle_qd[j];
        let v2 = state.particle_qd[k];

        let x10 = x1 - x0;
        let x20 = x2 - x0;
        let v10 = v1 - v0;
        let v20 = v2 - v0;

        let dm = model.tri_poses[idx];
        let inv_rest_area = dm.determinant() * 2.0;
        if inv_rest_area == 0.0 {
            warn!(triangle = idx, "zero-area triangle, skipping");
            return;
        }
        let rest_area = 1.0 / inv_rest_area;

        let k_mu = model.tri_ke * rest_area;
        let k_lambda = model.tri_ka * rest_area;
        let k_damp = model.tri_kd * rest_area;

        // glam::Mat2 is column-major: x_axis = (Dm[0,0], Dm[1,0]), y_axis = (Dm[0,1], Dm[1,1]).
        let f1_def = x10 * dm.x_axis.x + x20 * dm.x_axis.y;
        let f2_def = x10 * dm.y_axis.x + x20 * dm.y_axis.y;
        let dfdt1 = v10 * dm.x_axis.x + v20 * dm.x_axis.y;
        let dfdt2 = v10 * dm.y_axis.x + v20 * dm.y_axis.y;

        let p1 = f1_def * k_mu + dfdt1 * k_damp;
        let p2 = f2_def * k_mu + dfdt2 * k_damp;

        let mut f1 = p1 * dm.x_axis.x + p2 * dm.y_axis.x;
        let mut f2 = p1 * dm.x_axis.y + p2 * dm.y_axis.y;
        let alpha = 1.0 + model.tri_ke / model.tri_ka;

        let raw_n = x10.cross(x20);
        let area = raw_n.length() * 0.5;
        let act = model.tri_activations[idx];
        let c = area * inv_rest_area - alpha + act;

        let n_hat = raw_n.normalize_or_zero();
        let dcdq = x20.cross(n_hat) * inv_rest_area * 0.5;
        let dcdr = n_hat.cross(x10) * inv_rest_area * 0.5;

        let f_area = k_lambda * c;
        let dcdt = dcdq.dot(v1) + dcdr.dot(v2) - (dcdq + dcdr).dot(v0);
        let f_damp = k_damp * dcdt;

        f1 += dcdq * (f_area + f_damp);
        f2 += dcdr * (f_area + f_damp);
        let mut f0 = f1 + f2;

        let vmid = (v0 + v1 + v2) * 0.3333;
        let vdir = vmid.normalize_or_zero();
        let f_drag = vmid * (model.tri_drag * area * n_hat.dot(vmid).abs());
        let f_lift = n_hat
            * (model.tri_lift * area * (std::f32::consts::FRAC_PI_2 - n_hat.dot(vdir).clamp(-1.0, 1.0).acos()))
            * vmid.dot(vmid);

        f0 -= f_drag + f_lift;
        f1 += f_drag + f_lift;
        f2 += f_drag + f_lift;

        acc[i] += f0;
        acc[j] -= f1;
        acc[k] -= f2;
    });
    add_into(particle_f, &delta);
}

/// Penalty self-contact between every (particle, triangle) pair not sharing
/// a vertex. `O(particle_count * tri_count)`, matching the source's
/// unculled all-pairs dispatch (no broad-phase; Non-goal per the spec).
#[instrument(level = "trace", skip_all)]
pub fn eval_triangles_contact(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    if !model.enable_tri_collisions {
        return;
    }
    let n = state.particle_q.len();
    let num_particles = state.particle_q.len();

    let pairs: Vec<(usize, usize)> = (0..model.tri_count())
        .flat_map(|face| (0..num_particles).map(move |p| (face, p)))
        .collect();

    let delta = fold_reduce_vec3(&pairs, n, |_idx, &(face_no, particle_no), acc| {
        let [i, j, k] = model.tri_indices[face_no];
        if i == particle_no || j == particle_no || k == particle_no {
            return;
        }
        let pos = state.particle_q[particle_no];
        let p = state.particle_q[i];
        let q = state.particle_q[j];
        let r = state.particle_q[k];

        let bary = triangle_closest_point_barycentric(p, q, r, pos);
        let closest = p * bary.x + q * bary.y + r * bary.z;

        let diff = pos - closest;
        let dist = diff.dot(diff);
        let n_hat = diff.normalize_or_zero();
        let c = (dist - 0.01).min(0.0);
        let fn_ = n_hat * c * 1.0e5;

        acc[particle_no] -= fn_;
        acc[i] += fn_ * bary.x;
        acc[j] += fn_ * bary.y;
        acc[k] += fn_ * bary.z;
    });
    add_into(particle_f, &delta);
}

/// Contact between a triangle mesh and per-shape contact points attached to
/// rigid bodies. Reuses the same box-Coulomb friction formulation as
/// body-ground contact, but distributes force onto the triangle's vertices
/// rather than the body.
#[instrument(level = "trace", skip_all)]
pub fn eval_triangles_body_contacts(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    if model.contact_count() == 0 || model.tri_count() == 0 {
        return;
    }
    let n = state.particle_q.len();
    let num_contacts = model.contact_count();

    let pairs: Vec<(usize, usize)> = (0..model.tri_count())
        .flat_map(|face| (0..num_contacts).map(move |c| (face, c)))
        .collect();

    let delta = fold_reduce_vec3(&pairs, n, |_idx, &(face_no, contact_no), acc| {
        let c_body = model.contact_body0[contact_no];
        let c_point = model.contact_point0[contact_no];
        let c_dist = model.contact_dist[contact_no];
        let c_mat = model.contact_material[contact_no];

        let mat = model.shape_materials[c_mat];
        let (ke, kd, kf, mu) = (mat.x, mat.y, mat.z, mat.w);

        let body = state.body_q[c_body];
        let v0 = state.body_qd[c_body].bottom;
        let w0 = state.body_qd[c_body].top;

        let mut pos = body.transform_point(c_point);
        let r = pos - body.p;
        let rhat = r.normalize_or_zero();
        pos += rhat * c_dist;
        let dpdt = v0 + w0.cross(r);

        let [i, j, k] = model.tri_indices[face_no];
        let p = state.particle_q[i];
        let q = state.particle_q[j];
        let rr = state.particle_q[k];
        let vp = state.particle_qd[i];
        let vq = state.particle_qd[j];
        let vr = state.particle_qd[k];

        let bary = triangle_closest_point_barycentric(p, q, rr, pos);
        let closest = p * bary.x + q * bary.y + rr * bary.z;

        let diff = pos - closest;
        let dist = diff.dot(diff);
        let n_hat = diff.normalize_or_zero();
        let c = (dist - 0.05).min(0.0);

        let fn_ = c * ke;

        let vtri = vp * bary.x + vq * bary.y + vr * bary.z;
        let vrel = vtri - dpdt;
        let vn = n_hat.dot(vrel);
        let vt = vrel - n_hat * vn;

        let fd = -vn.max(0.0) * kd * step(c);

        let lower = mu * (fn_ + fd);
        let upper = -lower;

        let nx = n_hat.cross(Vec3::new(0.0, 0.0, 1.0));
        let nz = n_hat.cross(Vec3::new(1.0, 0.0, 0.0));
        let vx = (nx * kf).dot(vt).clamp(lower, upper);
        let vz = (nz * kf).dot(vt).clamp(lower, upper);
        let ft = (nx * vx + nz * vz) * -step(c);

        let f_total = n_hat * (fn_ + fd) + ft;

        acc[i] += f_total * bary.x;
        acc[j] += f_total * bary.y;
        acc[k] += f_total * bary.z;
    });
    add_into(particle_f, &delta);
}
