//! Muscle actuators: each muscle is a polyline of body-attached anchor
//! points; every consecutive pair of distinct links gets an
//! equal-and-opposite force along the anchor-to-anchor direction, scaled by
//! activation.

use tracing::instrument;

use crate::model::Model;
use crate::spatial::SpatialVector;
use crate::state::State;

use super::{add_into_spatial, fold_reduce_spatial};

#[instrument(level = "trace", skip_all)]
pub fn eval_muscles(model: &Model, state: &State, body_f: &mut [SpatialVector]) {
    let n_bodies = state.body_q.len();
    let ids: Vec<usize> = (0..model.muscle_count()).collect();

    let delta = fold_reduce_spatial(&ids, n_bodies, |m, &_m2, acc| {
        let m_start = model.muscle_start[m];
        let m_end = model.muscle_start[m + 1] - 1;
        let activation = model.muscle_activation[m];

        for i in m_start..m_end {
            let link_0 = model.muscle_links[i];
            let link_1 = model.muscle_links[i + 1];
            if link_0 == link_1 {
                continue;
            }

            let r0 = model.muscle_points[i];
            let r1 = model.muscle_points[i + 1];

            let pos_0 = state.body_q[link_0].transform_point(r0);
            let pos_1 = state.body_q[link_1].transform_point(r1);

            let n = (pos_1 - pos_0).normalize_or_zero();
            let f = n * activation;

            acc[link_0] = acc[link_0] - SpatialVector::new(pos_0.cross(f), f);
            acc[link_1] = acc[link_1] + SpatialVector::new(pos_1.cross(f), f);
        }
    });
    add_into_spatial(body_f, &delta);
}
