//! Tetrahedral Neo-Hookean FEM (rest-stable formulation, Smith et al. 2018):
//! deviatoric force from the deformation gradient plus a hydrostatic
//! volume-preservation term.

use glam::{Mat3, Vec3};
use tracing::{instrument, warn};

use crate::model::Model;
use crate::state::State;

use super::{add_into, fold_reduce_vec3};

#[instrument(level = "trace", skip_all)]
pub fn eval_tetrahedra(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    let n = state.particle_q.len();
    let delta = fold_reduce_vec3(&model.tet_indices, n, |idx, &[i, j, k, l], acc| {
        let x0 = state.particle_q[i];
        let x1 = state.particle_q[j];
        let x2 = state.particle_q[k];
        let x3 = state.particle_q[l];
        let v0 = state.particle_qd[i];
        let v1 = state.particle_qd[j];
        let v2 = state.particle_qd[k];
        let v3 = state.particle_qd[l];

        let x10 = x1 - x0;
        let x20 = x2 - x0;
        let x30 = x3 - x0;
        let v10 = v1 - v0;
        let v20 = v2 - v0;
        let v30 = v3 - v0;

        let ds = Mat3::from_cols(x10, x20, x30);
        let dm = model.tet_poses[idx];

        let inv_rest_volume = dm.determinant() * 6.0;
        if inv_rest_volume == 0.0 {
            warn!(tet = idx, "zero-volume tetrahedron, skipping");
            return;
        }
        let rest_volume = 1.0 / inv_rest_volume;

        let [mu0, lambda0, damp0] = model.tet_materials[idx];
        let alpha = 1.0 + mu0 / lambda0 - mu0 / (4.0 * lambda0);

        let k_mu = mu0 * rest_volume;
        let k_lambda = lambda0 * rest_volume;
        let k_damp = damp0 * rest_volume;

        let f = ds * dm;
        let dfdt = Mat3::from_cols(v10, v20, v30) * dm;

        let col1 = f.x_axis;
        let col2 = f.y_axis;
        let col3 = f.z_axis;
        let ic = col1.dot(col1) + col2.dot(col2) + col3.dot(col3);

        let p = f * (k_mu * (1.0 - 1.0 / (ic + 1.0))) + dfdt * k_damp;
        let h = p * dm.transpose();

        let mut f1 = h.x_axis;
        let mut f2 = h.y_axis;
        let mut f3 = h.z_axis;

        let j_det = f.determinant();
        let s = inv_rest_volume / 6.0;
        let dj_dx1 = x20.cross(x30) * s;
        let dj_dx2 = x30.cross(x10) * s;
        let dj_dx3 = x10.cross(x20) * s;

        let act = model.tet_activations[idx];
        let f_volume = (j_det - alpha + act) * k_lambda;
        let f_damp = (dj_dx1.dot(v1) + dj_dx2.dot(v2) + dj_dx3.dot(v3)) * k_damp;
        let f_total = f_volume + f_damp;

        f1 += dj_dx1 * f_total;
        f2 += dj_dx2 * f_total;
        f3 += dj_dx3 * f_total;
        let f0 = -(f1 + f2 + f3);

        acc[i] -= f0;
        acc[j] -= f1;
        acc[k] -= f2;
        acc[l] -= f3;
    });
    add_into(particle_f, &delta);
}
