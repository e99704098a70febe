//! Linear (Hookean) spring force between two particles.

use glam::Vec3;
use tracing::{instrument, warn};

use crate::model::Model;
use crate::state::State;

use super::{add_into, fold_reduce_vec3};

#[instrument(level = "trace", skip_all)]
pub fn eval_springs(model: &Model, state: &State, particle_f: &mut [Vec3]) {
    let n = state.particle_q.len();
    let delta = fold_reduce_vec3(&model.spring_indices, n, |idx, &[i, j], acc| {
        let d = state.particle_q[i] - state.particle_q[j];
        let len = d.length();
        if len <= 0.0 {
            warn!(spring = idx, "zero-length spring, skipping");
            return;
        }
        let n_hat = d / len;
        let c = len - model.spring_rest_length[idx];
        let c_dot = n_hat.dot(state.particle_qd[i] - state.particle_qd[j]);
        let f = n_hat * (model.spring_stiffness[idx] * c + model.spring_damping[idx] * c_dot);
        acc[i] -= f;
        acc[j] += f;
    });
    add_into(particle_f, &delta);
}
