//! Force-kernel dispatch and the two integration strategies: an explicit
//! semi-implicit (symplectic) Euler step, and a variational implicit step
//! that solves for the end-of-step particle velocity with a first-order
//! [`Optimizer`](crate::optimizer::Optimizer).

use glam::Vec3;
use tracing::instrument;

use crate::error::{SimError, SimResult};
use crate::kernels::integrate::{integrate_bodies, integrate_particles};
use crate::kernels::{bending, contacts, joints, muscles, springs, tetrahedra, triangles};
use crate::model::Model;
use crate::optimizer::{Mode, Optimizer};
use crate::spatial::SpatialVector;
use crate::state::State;

/// Dispatches every force kernel gated by `Model`'s configuration flags,
/// accumulating into `particle_f`/`body_f`. Neither buffer is cleared here;
/// callers are expected to pass in freshly zeroed buffers (`State::zeros`,
/// or a fresh `vec![Vec3::ZERO; ...]`/`vec![SpatialVector::ZERO; ...]`).
#[instrument(level = "trace", skip_all)]
pub fn compute_forces(model: &Model, state: &State, particle_f: &mut [Vec3], body_f: &mut [SpatialVector]) {
    if model.spring_count() > 0 {
        springs::eval_springs(model, state, particle_f);
    }

    if model.tri_count() > 0 && model.tri_ke > 0.0 {
        triangles::eval_triangles(model, state, particle_f);

        if model.enable_tri_collisions {
            triangles::eval_triangles_contact(model, state, particle_f);
        }
    }

    if model.edge_count() > 0 {
        bending::eval_bending(model, state, particle_f);
    }

    if model.ground && model.particle_count() > 0 {
        contacts::eval_ground_contacts(model, state, particle_f);
    }

    if model.tet_count() > 0 {
        tetrahedra::eval_tetrahedra(model, state, particle_f);
    }

    if model.body_count() > 0 && model.contact_count() > 0 && model.ground {
        contacts::eval_body_contacts(model, state, body_f);
    }

    if model.body_count() > 0 {
        joints::eval_body_joints(model, state, body_f);
    }

    if model.particle_count() > 0 && model.shape_count > 0 {
        contacts::eval_soft_contacts(model, state, particle_f, body_f);
    }

    if model.muscle_count() > 0 {
        muscles::eval_muscles(model, state, body_f);
    }
}

/// Advances a simulation state forward by `dt`. `state_in` and `state_out`
/// may be the same object for [`SemiImplicit`]; [`VariationalImplicit`]
/// requires them to be distinct buffers.
pub trait Integrator {
    fn simulate(&mut self, model: &Model, state_in: &State, state_out: &mut State, dt: f32) -> SimResult<()>;
}

/// Explicit symplectic Euler: compute forces once at `state_in`, then
/// integrate bodies and particles independently. Unconditionally stable
/// only for time steps small relative to the stiffest force in the model.
#[derive(Default)]
pub struct SemiImplicit;

impl Integrator for SemiImplicit {
    #[instrument(level = "trace", skip_all, name = "semi_implicit_simulate")]
    fn simulate(&mut self, model: &Model, state_in: &State, state_out: &mut State, dt: f32) -> SimResult<()> {
        let mut particle_f = vec![Vec3::ZERO; state_in.particle_q.len()];
        let mut body_f = vec![SpatialVector::ZERO; state_in.body_q.len()];

        compute_forces(model, state_in, &mut particle_f, &mut body_f);

        if model.body_count() > 0 {
            integrate_bodies(model, state_in, dt, &body_f, &mut state_out.body_q, &mut state_out.body_qd);
        }

        if model.particle_count() > 0 {
            integrate_particles(
                model,
                state_in,
                dt,
                &particle_f,
                &mut state_out.particle_q,
                &mut state_out.particle_qd,
            );
        }

        Ok(())
    }
}

/// Solves for the implicit end-of-step particle velocity by driving the
/// velocity-level residual `r(v) = m(v - v0) - f(x0 + v*dt, v)*dt - m*g*dt`
/// to zero with a first-order [`Optimizer`]. Rigid bodies are out of scope:
/// only particle state is touched.
pub struct VariationalImplicit {
    mode: Mode,
    alpha: f32,
    max_iters: usize,
    report: bool,
}

impl VariationalImplicit {
    pub fn new(mode: Mode, alpha: f32, max_iters: usize, report: bool) -> Self {
        VariationalImplicit { mode, alpha, max_iters, report }
    }
}

impl Integrator for VariationalImplicit {
    #[instrument(level = "trace", skip_all, name = "variational_implicit_simulate")]
    fn simulate(&mut self, model: &Model, state_in: &State, state_out: &mut State, dt: f32) -> SimResult<()> {
        if std::ptr::eq(state_in, &*state_out) {
            return Err(SimError::AliasedState);
        }

        let n = model.particle_count();
        if n == 0 {
            return Ok(());
        }

        // predicted state: explicit step using only the externally-supplied force.
        for tid in 0..n {
            let v0 = state_in.particle_qd[tid];
            let inv_mass = model.particle_inv_mass[tid];
            let gate = if inv_mass != 0.0 { 1.0 } else { 0.0 };
            let v1 = v0 + (state_in.particle_f[tid] * inv_mass + model.gravity * gate) * dt;
            state_out.particle_qd[tid] = v1;
            state_out.particle_q[tid] = state_in.particle_q[tid] + v1 * dt;
        }

        let mut x: Vec<f32> = state_out
            .particle_qd
            .iter()
            .flat_map(|v| [v.x, v.y, v.z])
            .collect();

        let mut opt = Optimizer::new(n * 3, self.mode);
        let mut particle_f = vec![Vec3::ZERO; n];

        opt.solve(
            &mut x,
            |x, dfdx| {
                particle_f.iter_mut().for_each(|f| *f = Vec3::ZERO);

                for tid in 0..n {
                    let v = Vec3::new(x[tid * 3], x[tid * 3 + 1], x[tid * 3 + 2]);
                    state_out.particle_qd[tid] = v;
                    state_out.particle_q[tid] = state_in.particle_q[tid] + v * dt;
                }

                compute_forces(model, state_out, &mut particle_f, &mut Vec::new());

                for tid in 0..n {
                    let m = model.particle_mass[tid];
                    let v0 = state_in.particle_qd[tid];
                    let v1 = Vec3::new(x[tid * 3], x[tid * 3 + 1], x[tid * 3 + 2]);
                    let err = if m > 0.0 {
                        (v1 - v0) * m - particle_f[tid] * dt - model.gravity * dt * m
                    } else {
                        Vec3::ZERO
                    };
                    dfdx[tid * 3] = err.x;
                    dfdx[tid * 3 + 1] = err.y;
                    dfdx[tid * 3 + 2] = err.z;
                }
            },
            self.max_iters,
            self.alpha,
            self.report,
        );

        for tid in 0..n {
            let v1 = Vec3::new(x[tid * 3], x[tid * 3 + 1], x[tid * 3 + 2]);
            state_out.particle_qd[tid] = v1;
            state_out.particle_q[tid] = state_in.particle_q[tid] + v1 * dt;
        }

        Ok(())
    }
}
