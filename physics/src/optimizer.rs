//! First-order iterative solver consumed by the variational implicit
//! integrator. No convergence guarantee: runs exactly `max_iters` iterations.

use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    GradientDescent,
    /// Nesterov-like momentum with fixed decay `beta = 0.9`.
    Momentum,
}

pub struct Optimizer {
    mode: Mode,
    /// Momentum buffer, unused in `Mode::GradientDescent`.
    m: Vec<f32>,
}

const MOMENTUM_BETA: f32 = 0.9;

impl Optimizer {
    pub fn new(n: usize, mode: Mode) -> Self {
        Optimizer {
            mode,
            m: vec![0.0; n],
        }
    }

    /// Repeatedly calls `grad_func(x, dfdx)` to fill the residual buffer,
    /// then advances `x` in place. `report` logs the residual's L2 norm at
    /// `trace!` each iteration.
    pub fn solve(
        &mut self,
        x: &mut [f32],
        mut grad_func: impl FnMut(&[f32], &mut [f32]),
        max_iters: usize,
        alpha: f32,
        report: bool,
    ) {
        let mut dfdx = vec![0.0f32; x.len()];
        for iter in 0..max_iters {
            dfdx.iter_mut().for_each(|v| *v = 0.0);
            grad_func(x, &mut dfdx);

            if report {
                let norm = dfdx.iter().map(|v| v * v).sum::<f32>().sqrt();
                trace!(iter, residual_norm = norm, "optimizer step");
            }

            match self.mode {
                Mode::GradientDescent => {
                    for (xi, gi) in x.iter_mut().zip(dfdx.iter()) {
                        *xi -= alpha * gi;
                    }
                }
                Mode::Momentum => {
                    for ((xi, gi), mi) in x.iter_mut().zip(dfdx.iter()).zip(self.m.iter_mut()) {
                        *mi = MOMENTUM_BETA * *mi - alpha * gi;
                        *xi += *mi;
                    }
                }
            }
        }
    }
}
