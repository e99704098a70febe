//! Dihedral bending force between two triangles sharing an edge (Bridson
//! et al., "Simulation of Clothing with Folds and Wrinkles").

use glam::Vec3;
use tracing::{instrument, warn};

use crate::model::Model;
use crate::state::State;

use super::{add_into, fold_reduce_vec3};

const NORMAL_LENGTH_EPS: f32 = 1.0e-6;

#[instrument(level = "trace", skip_all)]
pub fn eval_bending(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    let n = state.particle_q.len();
    let delta = fold_reduce_vec3(&model.edge_indices, n, |idx, &[i, j, k, l], acc| {
        let (x1, x2, x3, x4) = (
            state.particle_q[i],
            state.particle_q[j],
            state.particle_q[k],
            state.particle_q[l],
        );
        let (v1, v2, v3, v4) = (
            state.particle_qd[i],
            state.particle_qd[j],
            state.particle_qd[k],
            state.particle_qd[l],
        );

        let n1 = (x3 - x1).cross(x4 - x1);
        let n2 = (x4 - x2).cross(x3 - x2);
        let n1_length = n1.length();
        let n2_length = n2.length();
        if n1_length < NORMAL_LENGTH_EPS || n2_length < NORMAL_LENGTH_EPS {
            warn!(edge = idx, "degenerate bending normal, skipping");
            return;
        }

        let rcp_n1 = 1.0 / n1_length;
        let rcp_n2 = 1.0 / n2_length;
        let cos_theta = n1.dot(n2) * rcp_n1 * rcp_n2;

        let n1 = n1 * rcp_n1 * rcp_n1;
        let n2 = n2 * rcp_n2 * rcp_n2;

        let e = x4 - x3;
        let e_hat = e.normalize_or_zero();
        let e_length = e.length();

        let s = n2.cross(n1).dot(e_hat).signum();
        let angle = cos_theta.clamp(-1.0, 1.0).acos() * s;

        let d1 = n1 * e_length;
        let d2 = n2 * e_length;
        let d3 = n1 * (x1 - x4).dot(e_hat) + n2 * (x2 - x4).dot(e_hat);
        let d4 = n1 * (x3 - x1).dot(e_hat) + n2 * (x3 - x2).dot(e_hat);

        let f_elastic = model.edge_ke * (angle - model.edge_rest_angle[idx]);
        let f_damp = model.edge_kd * (d1.dot(v1) + d2.dot(v2) + d3.dot(v3) + d4.dot(v4));
        let f_total = -e_length * (f_elastic + f_damp);

        acc[i] += d1 * f_total;
        acc[j] += d2 * f_total;
        acc[k] += d3 * f_total;
        acc[l] += d4 * f_total;
    });
    add_into(particle_f, &delta);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_quad_at_rest_angle_produces_no_force() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0; 4];
        model.particle_inv_mass = vec![1.0; 4];
        model.edge_indices = vec![[0, 1, 2, 3]];
        model.edge_rest_angle = vec![0.0];
        model.edge_ke = 10.0;
        model.edge_kd = 0.0;
        let mut state = State::zeros(&model);
        // i, j opposite vertices; k, l the shared edge. All coplanar (z=0) => flat, angle 0.
        state.particle_q[0] = Vec3::new(0.0, 1.0, 0.0);
        state.particle_q[1] = Vec3::new(0.0, -1.0, 0.0);
        state.particle_q[2] = Vec3::new(-1.0, 0.0, 0.0);
        state.particle_q[3] = Vec3::new(1.0, 0.0, 0.0);
        let mut f = vec![Vec3::ZERO; 4];
        eval_bending(&model, &state, &mut f);
        for fi in &f {
            assert!(fi.length() < 1e-2, "flat quad at rest should produce ~zero force: {fi:?}");
        }
    }

    #[test]
    fn degenerate_edge_produces_no_force() {
        let mut model = Model::new(Vec3::ZERO);
        model.particle_mass = vec![1.0; 4];
        model.particle_inv_mass = vec![1.0; 4];
        model.edge_indices = vec![[0, 1, 2, 3]];
        model.edge_rest_angle = vec![0.0];
        model.edge_ke = 10.0;
        model.edge_kd = 0.0;
        let mut state = State::zeros(&model);
        // collapse vertex i onto k and l, making n1 zero-length.
        state.particle_q[0] = Vec3::ZERO;
        state.particle_q[2] = Vec3::ZERO;
        state.particle_q[3] = Vec3::new(1.0, 0.0, 0.0);
        state.particle_q[1] = Vec3::new(0.0, 1.0, 0.0);
        let mut f = vec![Vec3::ZERO; 4];
        eval_bending(&model, &state, &mut f);
        assert!(f.iter().all(|v| *v == Vec3::ZERO));
    }
}
