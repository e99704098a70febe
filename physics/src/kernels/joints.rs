//! Penalty-based articulation joints: per-joint attachment spring-damper
//! plus a type-specific drive/limit force along the joint's free axis.
//!
//! Corrects two defects present in the original per-joint dispatch (see
//! repository design notes): the type switch reads `joint_type[tid]` (this
//! element's type) rather than a single scalar shared across every joint,
//! and the revolute branch's limit force is computed the same well-defined
//! way as the prismatic branch's, rather than referencing an uninitialized
//! value.

use glam::{Quat, Vec3};
use tracing::{instrument, warn};

use crate::model::{JointType, Model};
use crate::spatial::{quat_twist, SpatialTransform, SpatialVector};
use crate::state::State;

use super::{add_into_spatial, fold_reduce_spatial};

const ACOS_CLAMP: f32 = 1.0;

fn safe_acos(x: f32) -> f32 {
    x.clamp(-ACOS_CLAMP, ACOS_CLAMP).acos()
}

fn quat_log3(q: Quat) -> Vec3 {
    Vec3::new(q.x, q.y, q.z).normalize_or_zero() * safe_acos(q.w) * 2.0
}

#[instrument(level = "trace", skip_all)]
pub fn eval_body_joints(model: &Model, state: &State, body_f: &mut [SpatialVector]) {
    let n_bodies = state.body_q.len();
    let ids: Vec<usize> = (0..model.joint_count()).collect();

    let delta = fold_reduce_spatial(&ids, n_bodies, |tid, &_tid2, acc| {
        let Some(joint_type) = JointType::from_code(model.joint_type[tid]) else {
            warn!(joint = tid, code = model.joint_type[tid], "unrecognized joint type, skipping");
            return;
        };

        let c_child = tid;
        let c_parent = model.joint_parent[tid];

        let x_pj = model.joint_x_p[tid];
        let x_cj = model.joint_x_c[tid];

        let mut x_wp = x_pj;
        let mut r_p = Vec3::ZERO;
        let mut w_p = Vec3::ZERO;
        let mut v_p = Vec3::ZERO;

        if c_parent >= 0 {
            let parent = c_parent as usize;
            x_wp = state.body_q[parent] * x_pj;
            let com_world = state.body_q[parent].transform_point(model.body_com[parent]);
            r_p = x_wp.p - com_world;

            let twist_p = state.body_qd[parent];
            w_p = twist_p.top;
            v_p = twist_p.bottom + w_p.cross(r_p);
        }

        let child = c_child;
        let x_wc = state.body_q[child] * x_cj;
        let com_world_c = state.body_q[child].transform_point(model.body_com[child]);
        let r_c = x_wc.p - com_world_c;

        let twist_c = state.body_qd[child];
        let w_c = twist_c.top;
        let v_c = twist_c.bottom + w_c.cross(r_c);

        let axis = model.joint_axis[tid];
        let target = model.joint_target[tid];
        let target_ke = model.joint_target_ke[tid];
        let target_kd = model.joint_target_kd[tid];
        let limit_ke = model.joint_limit_ke[tid];
        let limit_kd = model.joint_limit_kd[tid];
        let limit_lower = model.joint_limit_lower[tid];
        let limit_upper = model.joint_limit_upper[tid];
        let act = model.joint_act[tid];

        let attach_ke = model.joint_attach_ke;
        let attach_kd = model.joint_attach_kd;

        let x_p = x_wp.p;
        let x_c = x_wc.p;
        let q_p = x_wp.q;
        let q_c = x_wc.q;

        let x_err = x_c - x_p;
        let v_err = v_c - v_p;
        let w_err = w_c - w_p;

        let mut t_total = Vec3::ZERO;
        let mut f_total = Vec3::ZERO;

        match joint_type {
            JointType::Prismatic => {
                let axis_w = x_wp.transform_vector(axis);
                let q = x_err.dot(axis_w);
                let qd = v_err.dot(axis_w);

                let mut limit_f = 0.0f32;
                if q < limit_lower {
                    limit_f = limit_ke * (limit_lower - q) - limit_kd * qd.min(0.0);
                }
                if q > limit_upper {
                    limit_f = limit_ke * (limit_upper - q) - limit_kd * qd.max(0.0);
                }

                f_total += (target_ke * (q - target) - target_kd * qd + act + limit_f) * axis_w;

                let q_pc = q_p.conjugate() * q_c;
                let ang_err = quat_log3(q_pc);

                f_total += (x_err - axis_w * q) * attach_ke + (v_err - axis_w * qd) * attach_kd;
                t_total += ang_err * attach_ke + w_err * attach_kd;
            }
            JointType::Revolute => {
                let axis_w = x_wp.transform_vector(axis);
                let q_pc = q_p.conjugate() * q_c;
                let q_twist = quat_twist(axis, q_pc);

                let q = safe_acos(q_twist.w) * 2.0;
                let qd = w_err.dot(axis_w);

                let mut limit_f = 0.0f32;
                if q < limit_lower {
                    limit_f = limit_ke * (limit_lower - q) - limit_kd * qd.min(0.0);
                }
                if q > limit_upper {
                    limit_f = limit_ke * (limit_upper - q) - limit_kd * qd.max(0.0);
                }

                t_total += (target_ke * (q - target) - target_kd * qd + act + limit_f) * axis_w;

                let swing = q_pc * q_twist.conjugate();
                let swing_err = quat_log3(swing);

                f_total += x_err * attach_ke + v_err * attach_kd;
                t_total += swing_err * attach_ke + (w_err - axis_w * qd) * attach_kd;
            }
            JointType::Ball => {
                f_total += x_err * attach_ke + v_err * attach_kd;
            }
            JointType::Fixed => {
                let q_pc = q_p.conjugate() * q_c;
                let ang_err = quat_log3(q_pc);
                f_total += x_err * attach_ke + v_err * attach_kd;
                t_total += ang_err * attach_ke + w_err * attach_kd;
            }
            JointType::Free => {}
        }

        if c_parent >= 0 {
            let parent = c_parent as usize;
            acc[parent] = acc[parent] + SpatialVector::new(t_total + r_p.cross(f_total), f_total);
        }
        acc[child] = acc[child] - SpatialVector::new(t_total + r_c.cross(f_total), f_total);
    });
    add_into_spatial(body_f, &delta);
}
